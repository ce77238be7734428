//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{NotifierError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP__)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    // Add default config file if it exists
    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    // Add environment variables with APP__ prefix
    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config: AppConfig = builder
        .build()
        .map_err(|e| NotifierError::Configuration(e.to_string()))?
        .try_deserialize()
        .map_err(|e| NotifierError::Configuration(e.to_string()))?;

    apply_flat_env(config)
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    // Try to load from .env file
    dotenvy::dotenv().ok();

    apply_flat_env(AppConfig::default())
}

/// Overlay the flat variable names the deployment scripts export
///
/// `PREDICT_API_KEY`, `PREDICT_SIGNER_ADDRESS`, `PREDICT_BASE_URL`,
/// `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`, `POLL_INTERVAL`, `TESTNET`.
fn apply_flat_env(mut config: AppConfig) -> Result<AppConfig> {
    if let Ok(api_key) = std::env::var("PREDICT_API_KEY") {
        config.predict.api_key = Some(api_key);
    }
    if let Ok(signer) = std::env::var("PREDICT_SIGNER_ADDRESS") {
        config.predict.signer_address = Some(signer);
    }
    if let Ok(base_url) = std::env::var("PREDICT_BASE_URL") {
        config.predict.base_url = base_url;
    }
    if let Ok(testnet) = std::env::var("TESTNET") {
        config.predict.testnet = testnet.eq_ignore_ascii_case("true");
    }

    if let Ok(bot_token) = std::env::var("TELEGRAM_BOT_TOKEN") {
        config.telegram.bot_token = Some(bot_token);
    }
    if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
        config.telegram.chat_id = Some(chat_id);
    }

    if let Ok(interval) = std::env::var("POLL_INTERVAL") {
        config.settings.poll_interval_seconds = interval
            .parse()
            .map_err(|e| NotifierError::Configuration(format!("invalid POLL_INTERVAL: {}", e)))?;
    }

    Ok(config)
}
