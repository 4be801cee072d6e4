//! `parley doctor` — Check configuration and credentials.

use parley_config::AppConfig;
use parley_core::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Parley Doctor");
    println!("=============\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ok    Config file found at {}", config_path.display());
    } else {
        println!("  info  No config file, using defaults ({})", config_path.display());
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ok    Configuration valid");
            config
        }
        Err(e) => {
            println!("  FAIL  Configuration invalid: {e}");
            println!("\n  1 issue found. See above for details.");
            return Ok(());
        }
    };

    println!(
        "  info  Model {} via {} (history budget {} tokens)",
        config.provider.model, config.provider.name, config.trim.max_tokens
    );

    match parley_providers::build_from_config(&config) {
        Ok(provider) => {
            println!("  ok    API key configured");
            match provider.health_check().await {
                Ok(true) => println!("  ok    Model API reachable"),
                Ok(false) => {
                    println!("  WARN  Model API answered but reported unhealthy");
                    issues += 1;
                }
                Err(e) => {
                    println!("  WARN  Model API unreachable: {e}");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  FAIL  {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
