//! Telegram Bot API transport

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::common::errors::{DispatchError, NotifierError, Result};
use crate::common::traits::NotificationTransport;
use crate::common::types::NotificationPayload;

/// Default Bot API host
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Request body for the sendMessage method
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Subset of the Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

/// Transport delivering notifications to one Telegram chat
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    /// HTTP client
    client: Client,
    /// Bot API host (overridable for tests)
    api_url: String,
    /// Bot token
    bot_token: String,
    /// Destination chat
    chat_id: String,
}

impl TelegramTransport {
    /// Create a transport against the public Bot API
    pub fn new(bot_token: &str, chat_id: &str) -> Result<Self> {
        Self::with_api_url(DEFAULT_API_URL, bot_token, chat_id, Duration::from_secs(10))
    }

    /// Create a transport with a custom API host and timeout
    pub fn with_api_url(
        api_url: &str,
        bot_token: &str,
        chat_id: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token)
    }

    /// Map a non-2xx Bot API response to a dispatch error class
    ///
    /// 429 is transient and carries Telegram's retry-after hint; other 5xx
    /// are transient; everything else is permanent.
    fn classify_failure(status: StatusCode, body: &str) -> DispatchError {
        let api: Option<ApiResponse> = serde_json::from_str(body).ok();
        let description = api
            .as_ref()
            .and_then(|r| r.description.clone())
            .unwrap_or_else(|| body.chars().take(200).collect());

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = api.and_then(|r| r.parameters).and_then(|p| p.retry_after);
            return DispatchError::Transient {
                message: format!("rate limited: {}", description),
                retry_after_seconds: retry_after,
            };
        }

        if status.is_server_error() {
            return DispatchError::transient(format!(
                "Telegram returned status {}: {}",
                status, description
            ));
        }

        DispatchError::permanent(format!(
            "Telegram returned status {}: {}",
            status, description
        ))
    }
}

#[async_trait]
impl NotificationTransport for TelegramTransport {
    #[instrument(skip(self, payload), fields(order_id = %payload.order_id))]
    async fn send(&self, payload: &NotificationPayload) -> std::result::Result<(), DispatchError> {
        let url = self.send_message_url();
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: &payload.text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = match self.client.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() => {
                return Err(DispatchError::transient(format!("request failed: {}", e)));
            }
            Err(e) => {
                return Err(DispatchError::permanent(format!("request failed: {}", e)));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            if let Ok(api) = serde_json::from_str::<ApiResponse>(&body) {
                if !api.ok {
                    return Err(DispatchError::permanent(format!(
                        "Telegram rejected message: {}",
                        api.description.unwrap_or_else(|| "no description".to_string())
                    )));
                }
            }
            debug!("Telegram accepted message");
            return Ok(());
        }

        Err(Self::classify_failure(status, &body))
    }
}
