//! `dfbridge doctor` — Diagnose configuration and upstream reachability.

use std::path::Path;

use dfbridge_config::AppConfig;
use dfbridge_core::Provider;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 dfbridge Doctor");
    println!("=================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);
    if path.exists() {
        println!("  ✅ Config file found at {}", path.display());
    } else {
        println!("  ℹ️  No config file at {} — using defaults + environment", path.display());
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    if config.gateway.webhook_secret.is_some() {
        println!("  ✅ Webhook secret configured");
    } else {
        println!("  ⚠️  No WEBHOOK_SECRET — /webhook accepts unauthenticated calls");
        issues += 1;
    }

    if !config.has_api_key() {
        println!("  ❌ No API key. Set DEEPSEEK_API_KEY or api_key in the config file");
        println!("\n  ⚠️  {} issue(s) found. See above for details.", issues + 1);
        return Ok(());
    }

    match dfbridge_providers::build_from_config(&config) {
        Ok(provider) => {
            println!("  ✅ API key configured");
            match provider.health_check().await {
                Ok(true) => println!("  ✅ Completion endpoint reachable ({})", config.base_url),
                Ok(false) => {
                    println!(
                        "  ❌ Completion endpoint answered with an error ({}) — check the API key",
                        config.base_url
                    );
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Completion endpoint unreachable: {e}");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
