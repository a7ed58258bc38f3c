//! `folio doctor` — Diagnose configuration, profile and providers.

use super::{Overrides, load_config};
use folio_assistant::build_documents;
use folio_config::{AppConfig, GenerationStrategy};
use folio_core::profile::Profile;
use folio_providers::router::build_from_config;
use folio_providers::{ModelLoader, ProbingLoader};

pub async fn run(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Folio Doctor — System Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    let config_path = overrides.config_path();
    if !config_path.exists() {
        println!("  ⚠️  No config file at {} — using defaults", config_path.display());
        println!("      Run `folio config init` to create one");
        issues += 1;
    }

    let config = match load_config(overrides) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            summary(issues + 1);
            return Ok(());
        }
    };

    let profile_path = config.profile_path();
    match Profile::load(&profile_path) {
        Ok(profile) => println!(
            "  ✅ Profile valid: {} ({} documents)",
            profile.basics.name,
            build_documents(&profile).len()
        ),
        Err(e) => {
            println!("  ❌ Profile {}: {e}", profile_path.display());
            issues += 1;
        }
    }

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured — fine for local providers only");
    }

    issues += check_providers(&config).await;

    summary(issues);
    Ok(())
}

/// Probe each model the configuration needs. Returns the number of failures.
async fn check_providers(config: &AppConfig) -> usize {
    let router = build_from_config(config);

    let mut roles = vec![(
        "Embedding",
        config.embedding_provider(),
        config.embedding.model.as_str(),
    )];
    if config.generation.strategy == GenerationStrategy::Llm {
        roles.push((
            "Generation",
            config.generation_provider(),
            config.generation.model.as_str(),
        ));
    } else {
        println!("  ✅ Generation: templates only");
    }

    let mut failures = 0;
    for (role, provider_name, model) in roles {
        let Some(provider) = router.get_or_default(provider_name) else {
            println!("  ❌ {role}: provider '{provider_name}' is not configured");
            failures += 1;
            continue;
        };

        let loader = ProbingLoader::new(provider, model);
        match loader.load(&|_: f32, _: &str| {}).await {
            Ok(_) => println!("  ✅ {role}: {model} via {provider_name}"),
            Err(e) => {
                println!("  ❌ {role}: {model} via {provider_name} — {e}");
                failures += 1;
            }
        }
    }
    failures
}

fn summary(issues: usize) {
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }
}
