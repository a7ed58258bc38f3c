//! `folio config` — Configuration management commands.

use super::{Overrides, load_config};
use folio_config::AppConfig;

pub fn show(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;

    println!("# {}", overrides.config_path().display());
    println!("# profile: {}", config.profile_path().display());
    println!();
    print!("{}", toml::to_string_pretty(&config.redacted())?);
    Ok(())
}

pub fn init(overrides: &Overrides, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = overrides.config_path();
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;

    println!("✅ Wrote {}", path.display());
    println!("   Put your profile JSON next to it, or set profile.path.");
    Ok(())
}

pub fn path(overrides: &Overrides) {
    println!("{}", overrides.config_path().display());
}
