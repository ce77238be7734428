//! Common test utilities and fixtures
//!
//! Shared by the integration test binaries; each binary uses a subset.
#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Mutex;

use predict_order_notifier::common::errors::{DispatchError, NotifierError, Result};
use predict_order_notifier::common::traits::{NotificationTransport, OrderSource, PredictionModel};
use predict_order_notifier::common::types::{NotificationPayload, Order, OrderStatus, Side};
use predict_order_notifier::engine::thresholds::{ThresholdBand, ThresholdTable};

/// An open buy order resting just below the market
pub fn sample_order(id: &str) -> Order {
    Order {
        id: id.to_string(),
        market_id: 7,
        market_title: Some("Will it rain tomorrow?".to_string()),
        side: Side::Buy,
        limit_price: Some(dec!(0.45)),
        size: dec!(100),
        size_filled: dec!(25),
        market_price: Some(dec!(0.46)),
        status: OrderStatus::Open,
    }
}

/// A rendered payload ready for a transport
pub fn sample_payload(order_id: &str) -> NotificationPayload {
    NotificationPayload {
        order_id: order_id.to_string(),
        classification: "critical".to_string(),
        text: "<b>Order Alert</b>".to_string(),
    }
}

/// Two bands: scores below 0.5 are quiet, the rest notify
pub fn two_band_table() -> ThresholdTable {
    ThresholdTable::new(vec![
        ThresholdBand::new(dec!(0.0), dec!(0.5), "normal", false),
        ThresholdBand::new(dec!(0.5), dec!(1.0), "critical", true),
    ])
    .unwrap()
}

/// The default three-band layout used by most pipeline tests
pub fn three_band_table() -> ThresholdTable {
    ThresholdTable::new(vec![
        ThresholdBand::new(dec!(0.0), dec!(0.5), "normal", false),
        ThresholdBand::new(dec!(0.5), dec!(0.9), "at-risk", true),
        ThresholdBand::new(dec!(0.9), dec!(1.0), "critical", true),
    ])
    .unwrap()
}

/// Order source returning a fixed batch on every fetch
pub struct StaticOrderSource {
    pub orders: Vec<Order>,
}

#[async_trait]
impl OrderSource for StaticOrderSource {
    async fn fetch_open_orders(&self) -> Result<Vec<Order>> {
        Ok(self.orders.clone())
    }
}

/// Model returning a scripted score per order id
///
/// Orders without a scripted score fail with a model invocation error,
/// which the pipeline counts and skips.
pub struct ScriptedModel {
    scores: HashMap<String, Decimal>,
}

impl ScriptedModel {
    pub fn new(scores: &[(&str, Decimal)]) -> Self {
        Self {
            scores: scores
                .iter()
                .map(|(id, score)| (id.to_string(), *score))
                .collect(),
        }
    }
}

#[async_trait]
impl PredictionModel for ScriptedModel {
    async fn score(&self, order: &Order) -> Result<Decimal> {
        self.scores
            .get(&order.id)
            .copied()
            .ok_or_else(|| NotifierError::ModelInvocation {
                order_id: order.id.clone(),
                message: "no scripted score".to_string(),
            })
    }
}

/// Transport that accepts everything and records what it saw
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<NotificationPayload>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn send(&self, payload: &NotificationPayload) -> std::result::Result<(), DispatchError> {
        self.sent.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// Transport rejecting every payload with a permanent failure
pub struct RejectingTransport;

#[async_trait]
impl NotificationTransport for RejectingTransport {
    async fn send(&self, _payload: &NotificationPayload) -> std::result::Result<(), DispatchError> {
        Err(DispatchError::permanent("chat not found"))
    }
}

/// Canned predict.fun API bodies for mock-server tests
pub mod api_responses {
    /// `GET /v1/orders`: two resting limit orders plus one market order
    ///
    /// Order `0xaaa` is a buy on market 7 at 0.45 (25 of 100 filled);
    /// order `0xbbb` is a sell on market 9 at 0.60.
    pub const OPEN_ORDERS: &str = r#"{
        "success": true,
        "data": [
            {
                "order": {
                    "hash": "0xaaa",
                    "side": 0,
                    "makerAmount": "45000000000000000000",
                    "takerAmount": "100000000000000000000"
                },
                "marketId": 7,
                "amount": "100000000000000000000",
                "amountFilled": "25000000000000000000",
                "strategy": "LIMIT"
            },
            {
                "order": {
                    "hash": "0xccc",
                    "side": 0,
                    "makerAmount": "10000000000000000000",
                    "takerAmount": "20000000000000000000"
                },
                "marketId": 7,
                "amount": "20000000000000000000",
                "amountFilled": "0",
                "strategy": "MARKET"
            },
            {
                "order": {
                    "hash": "0xbbb",
                    "side": 1,
                    "makerAmount": "50000000000000000000",
                    "takerAmount": "30000000000000000000"
                },
                "marketId": 9,
                "amount": "50000000000000000000",
                "amountFilled": "0",
                "strategy": "LIMIT"
            }
        ]
    }"#;

    /// `GET /v1/markets/7`: a titled market
    pub const MARKET_7: &str = r#"{
        "success": true,
        "data": { "title": "Will it rain tomorrow?" }
    }"#;

    /// `GET /v1/markets/9`: no title, forcing the readable fallback
    pub const MARKET_9: &str = r#"{
        "success": true,
        "data": {}
    }"#;

    /// `GET /v1/markets/7/orderbook`: best ask 0.46
    pub const ORDERBOOK_7: &str = r#"{
        "success": true,
        "data": {
            "bids": [["440000000000000000", "10000000000000000000"]],
            "asks": [["460000000000000000", "8000000000000000000"]]
        }
    }"#;

    /// `GET /v1/markets/9/orderbook`: best bid 0.55
    pub const ORDERBOOK_9: &str = r#"{
        "success": true,
        "data": {
            "bids": [["550000000000000000", "4000000000000000000"]],
            "asks": [["620000000000000000", "6000000000000000000"]]
        }
    }"#;

    /// `GET /v1/orders/matches`: one settled fill plus one still settling
    ///
    /// The second entry has no transaction hash yet and is skipped until a
    /// later poll returns it complete.
    pub const ORDER_MATCHES: &str = r#"{
        "success": true,
        "data": [
            {
                "transactionHash": "0xtx1",
                "amountFilled": "25000000000000000000",
                "priceExecuted": "450000000000000000",
                "executedAt": "2026-08-26T10:00:00Z",
                "market": { "title": "Will it rain tomorrow?" },
                "taker": { "outcome": { "name": "Yes" }, "quoteType": "Bid" }
            },
            {
                "amountFilled": "5000000000000000000",
                "market": { "title": "Will it rain tomorrow?" }
            }
        ]
    }"#;

    /// An envelope reporting failure without a data payload
    pub const FAILED_ENVELOPE: &str = r#"{ "success": false }"#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use predict_order_notifier::predict::messages::{ApiEnvelope, OpenOrderEntry};

    #[test]
    fn test_sample_order_has_open_size() {
        let order = sample_order("0x1");
        assert_eq!(order.size_remaining(), dec!(75));
    }

    #[test]
    fn test_two_band_table_splits_at_half() {
        let table = two_band_table();
        assert_eq!(table.classify(dec!(0.1)).unwrap().label, "normal");
        assert_eq!(table.classify(dec!(0.95)).unwrap().label, "critical");
    }

    #[test]
    fn test_open_orders_fixture_parses() {
        let envelope: ApiEnvelope<Vec<OpenOrderEntry>> =
            serde_json::from_str(api_responses::OPEN_ORDERS).unwrap();
        let entries = envelope.data.unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries.iter().filter(|e| e.is_limit()).count(), 2);
        assert_eq!(entries[0].limit_price(), Some(dec!(0.45)));
    }
}
