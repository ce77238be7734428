//! REST API client for predict.fun

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use super::messages::{ApiEnvelope, MarketData, MatchEntry, OpenOrderEntry, OrderbookData};
use crate::common::errors::{NotifierError, Result};

/// Production API host
pub const MAINNET_URL: &str = "https://api.predict.fun";
/// Testnet API host
pub const TESTNET_URL: &str = "https://api-testnet.predict.fun";

/// REST API client for predict.fun
#[derive(Debug, Clone)]
pub struct PredictRestClient {
    /// HTTP client
    client: Client,
    /// Base URL for the API
    base_url: String,
    /// API key sent as the x-api-key header
    api_key: String,
}

impl PredictRestClient {
    /// Create a new REST client
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url).header("x-api-key", &self.api_key)
    }

    /// Get open orders for a signer address
    #[instrument(skip(self))]
    pub async fn get_open_orders(
        &self,
        signer_address: &str,
        first: u32,
    ) -> Result<Vec<OpenOrderEntry>> {
        let url = format!(
            "{}/v1/orders?signerAddress={}&status=OPEN&first={}",
            self.base_url, signer_address, first
        );
        debug!("Fetching open orders from: {}", url);

        let response = self.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let envelope: ApiEnvelope<Vec<OpenOrderEntry>> = response.json().await?;
        unwrap_envelope(envelope, "open orders")
    }

    /// Get the most recent executed matches for a signer address
    #[instrument(skip(self))]
    pub async fn get_order_matches(
        &self,
        signer_address: &str,
        first: u32,
    ) -> Result<Vec<MatchEntry>> {
        let url = format!(
            "{}/v1/orders/matches?signerAddress={}&first={}",
            self.base_url, signer_address, first
        );
        debug!("Fetching order matches from: {}", url);

        let response = self.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let envelope: ApiEnvelope<Vec<MatchEntry>> = response.json().await?;
        unwrap_envelope(envelope, "order matches")
    }

    /// Get market details
    #[instrument(skip(self))]
    pub async fn get_market(&self, market_id: i64) -> Result<MarketData> {
        let url = format!("{}/v1/markets/{}", self.base_url, market_id);
        debug!("Fetching market from: {}", url);

        let response = self.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let envelope: ApiEnvelope<MarketData> = response.json().await?;
        unwrap_envelope(envelope, "market")
    }

    /// Get the order book for a market
    #[instrument(skip(self))]
    pub async fn get_orderbook(&self, market_id: i64) -> Result<OrderbookData> {
        let url = format!("{}/v1/markets/{}/orderbook", self.base_url, market_id);
        debug!("Fetching orderbook from: {}", url);

        let response = self.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let envelope: ApiEnvelope<OrderbookData> = response.json().await?;
        unwrap_envelope(envelope, "orderbook")
    }
}

fn unwrap_envelope<T>(envelope: ApiEnvelope<T>, context: &str) -> Result<T> {
    if !envelope.success {
        return Err(NotifierError::InvalidResponse(format!(
            "{} request was not successful",
            context
        )));
    }
    envelope
        .data
        .ok_or_else(|| NotifierError::InvalidResponse(format!("{} response missing data", context)))
}
