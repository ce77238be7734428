//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{NotifierError, Result};
use crate::engine::model::default_alert_window;
use crate::engine::thresholds::{ThresholdBand, ThresholdTable};
use crate::predict::rest::{MAINNET_URL, TESTNET_URL};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// predict.fun API configuration
    #[serde(default)]
    pub predict: PredictConfig,
    /// Telegram delivery configuration
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Scoring and deduplication settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Dispatch retry settings
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Notification record store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            predict: PredictConfig::default(),
            telegram: TelegramConfig::default(),
            pipeline: PipelineConfig::default(),
            dispatch: DispatchConfig::default(),
            store: StoreConfig::default(),
            settings: AppSettings::default(),
        }
    }
}

impl AppConfig {
    /// Check that required credentials are present and well-formed
    pub fn validate(&self) -> Result<()> {
        if self.predict.api_key.as_deref().unwrap_or_default().is_empty() {
            return Err(NotifierError::Configuration(
                "predict.api_key is required".to_string(),
            ));
        }

        let signer = self.predict.signer_address.as_deref().unwrap_or_default();
        if !is_eth_address(signer) {
            return Err(NotifierError::Configuration(format!(
                "predict.signer_address is not a valid address: {:?}",
                signer
            )));
        }

        if self
            .telegram
            .bot_token
            .as_deref()
            .unwrap_or_default()
            .is_empty()
        {
            return Err(NotifierError::Configuration(
                "telegram.bot_token is required".to_string(),
            ));
        }

        if self
            .telegram
            .chat_id
            .as_deref()
            .unwrap_or_default()
            .is_empty()
        {
            return Err(NotifierError::Configuration(
                "telegram.chat_id is required".to_string(),
            ));
        }

        if self.settings.poll_interval_seconds == 0 {
            return Err(NotifierError::Configuration(
                "settings.poll_interval_seconds must be positive".to_string(),
            ));
        }

        if self.pipeline.alert_window <= Decimal::ZERO {
            return Err(NotifierError::Configuration(
                "pipeline.alert_window must be positive".to_string(),
            ));
        }

        self.threshold_table()?;

        Ok(())
    }

    /// Build the classification table from the configured bands
    pub fn threshold_table(&self) -> Result<ThresholdTable> {
        let bands = self
            .pipeline
            .thresholds
            .iter()
            .map(|band| ThresholdBand::new(band.low, band.high, band.label.clone(), band.notify))
            .collect();
        ThresholdTable::new(bands)
    }
}

/// 0x-prefixed 20-byte hex address
fn is_eth_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// predict.fun platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    /// API key sent as the x-api-key header
    #[serde(default)]
    pub api_key: Option<String>,
    /// Signer address whose orders are watched
    #[serde(default)]
    pub signer_address: Option<String>,
    /// Base URL for the REST API
    #[serde(default = "default_predict_base_url")]
    pub base_url: String,
    /// Use the testnet host (ignored when base_url is overridden)
    #[serde(default)]
    pub testnet: bool,
    /// Page size for the open-orders query
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Page size for the recent-matches query
    #[serde(default = "default_matches_page_size")]
    pub matches_page_size: u32,
}

impl PredictConfig {
    /// Base URL honouring the testnet flag
    pub fn effective_base_url(&self) -> &str {
        if self.testnet && self.base_url == MAINNET_URL {
            TESTNET_URL
        } else {
            &self.base_url
        }
    }
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            signer_address: None,
            base_url: default_predict_base_url(),
            testnet: false,
            page_size: default_page_size(),
            matches_page_size: default_matches_page_size(),
        }
    }
}

fn default_predict_base_url() -> String {
    MAINNET_URL.to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_matches_page_size() -> u32 {
    20
}

/// Telegram delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Destination chat
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Bot API host (overridable for tests)
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_url: default_telegram_api_url(),
        }
    }
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

/// One classification band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdBandConfig {
    /// Inclusive lower bound
    pub low: Decimal,
    /// Exclusive upper bound (inclusive for the final band)
    pub high: Decimal,
    /// Label recorded on predictions and notifications
    pub label: String,
    /// Whether scores in this band produce notifications
    #[serde(default = "default_notify")]
    pub notify: bool,
}

fn default_notify() -> bool {
    true
}

/// Scoring and deduplication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Classification bands, contiguous and ordered by score
    #[serde(default = "default_threshold_bands")]
    pub thresholds: Vec<ThresholdBandConfig>,
    /// Seconds before an unchanged classification may notify again
    #[serde(default = "default_re_notify_interval")]
    pub re_notify_interval_secs: u64,
    /// Relative price distance treated as "far from filling"
    #[serde(default = "default_alert_window")]
    pub alert_window: Decimal,
    /// Concurrent model invocations while scoring
    #[serde(default = "default_scoring_concurrency")]
    pub scoring_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            thresholds: default_threshold_bands(),
            re_notify_interval_secs: default_re_notify_interval(),
            alert_window: default_alert_window(),
            scoring_concurrency: default_scoring_concurrency(),
        }
    }
}

fn default_threshold_bands() -> Vec<ThresholdBandConfig> {
    vec![
        ThresholdBandConfig {
            low: dec!(0.0),
            high: dec!(0.5),
            label: "normal".to_string(),
            notify: false,
        },
        ThresholdBandConfig {
            low: dec!(0.5),
            high: dec!(0.9),
            label: "at-risk".to_string(),
            notify: true,
        },
        ThresholdBandConfig {
            low: dec!(0.9),
            high: dec!(1.0),
            label: "critical".to_string(),
            notify: true,
        },
    ]
}

fn default_re_notify_interval() -> u64 {
    3600
}

fn default_scoring_concurrency() -> usize {
    1
}

/// Dispatch retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff in milliseconds, doubled per retry
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

/// Notification record store and event journal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON record file
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Records retained per order
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    /// Path of the JSON event journal file
    #[serde(default = "default_journal_path")]
    pub journal_path: String,
    /// Announced hashes retained per event kind
    #[serde(default = "default_seen_cap")]
    pub seen_cap: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            history_cap: default_history_cap(),
            journal_path: default_journal_path(),
            seen_cap: default_seen_cap(),
        }
    }
}

fn default_store_path() -> String {
    "notification_records.json".to_string()
}

fn default_history_cap() -> usize {
    50
}

fn default_journal_path() -> String {
    "event_journal.json".to_string()
}

fn default_seen_cap() -> usize {
    500
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seconds between evaluation cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            poll_interval_seconds: default_poll_interval(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}
