//! `medplan doctor` — Diagnose configuration and upstream reachability.

use medplan_config::AppConfig;

use super::services::Services;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 medplan Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file, using defaults — run `medplan onboard`");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured — set MEDPLAN_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    let services = Services::from_config(&config)?;

    match services.provider.health_check().await {
        Ok(true) => println!("  ✅ Provider '{}' reachable", config.default_provider),
        Ok(false) => {
            println!("  ⚠️  Provider '{}' answered but is not healthy", config.default_provider);
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Provider '{}' unreachable: {e}", config.default_provider);
            issues += 1;
        }
    }

    match services.registry.health_check().await {
        Ok(true) => println!("  ✅ Registry reachable at {}", config.registry.base_url),
        Ok(false) => {
            println!("  ⚠️  Registry at {} is not healthy", config.registry.base_url);
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Registry unreachable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
