pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod documents;
pub mod doctor;
pub mod serve;

use folio_assistant::AssistantSession;
use folio_config::AppConfig;
use folio_core::profile::Profile;
use std::path::PathBuf;

/// Paths given on the command line, applied on top of the loaded config.
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub profile: Option<PathBuf>,
}

impl Overrides {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
    }
}

pub fn load_config(overrides: &Overrides) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &overrides.config {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .map_err(|e| format!("Failed to load config: {e}"))?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            config
        }
        None => AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?,
    };

    if let Some(profile) = &overrides.profile {
        config.profile.path = profile.display().to_string();
    }
    Ok(config)
}

pub fn load_profile(config: &AppConfig) -> Result<Profile, Box<dyn std::error::Error>> {
    let path = config.profile_path();
    Profile::load(&path).map_err(|e| format!("Failed to load profile: {e}").into())
}

pub fn load_session(config: &AppConfig) -> Result<AssistantSession, Box<dyn std::error::Error>> {
    let profile = load_profile(config)?;
    Ok(AssistantSession::from_config(config, profile)?)
}
