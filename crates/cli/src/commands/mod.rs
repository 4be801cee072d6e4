pub mod chat;
pub mod doctor;
pub mod serve;

use parley_config::{AppConfig, ConfigError};

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// Print setup hints when the model API credential is missing.
pub(crate) fn explain_missing_key(err: &ConfigError) {
    if let ConfigError::MissingApiKey { var } = err {
        eprintln!();
        eprintln!("  ERROR: {err}");
        eprintln!();
        eprintln!("  Export it, or put it in a .env file in this directory:");
        eprintln!("    {var}=gsk_...");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
    }
}
