//! Bundled prediction model scoring fill likelihood of a limit order

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::Result;
use crate::common::traits::PredictionModel;
use crate::common::types::{Order, Side};

/// Default alert window: score reaches zero once the market trades 10%
/// or more away from the limit price.
pub fn default_alert_window() -> Decimal {
    dec!(0.10)
}

/// Scores fill likelihood from the distance between an order's limit price
/// and the best opposing market price
///
/// The relative distance is `(market - limit) / limit` for buys and
/// `(limit - market) / limit` for sells, so it shrinks as the market moves
/// toward the order. A crossed or touched book scores `1.0`, a distance at
/// or beyond the alert window scores `0.0`, and the score falls linearly in
/// between. Orders with no known market price or no limit price score `0.0`
/// (dormant, not an error).
#[derive(Debug, Clone)]
pub struct FillProximityModel {
    alert_window: Decimal,
}

impl FillProximityModel {
    /// Create a model with the given alert window (relative distance)
    pub fn new(alert_window: Decimal) -> Self {
        Self { alert_window }
    }

    fn score_order(&self, order: &Order) -> Decimal {
        let (limit, market) = match (order.limit_price, order.market_price) {
            (Some(limit), Some(market)) => (limit, market),
            _ => return Decimal::ZERO,
        };
        if limit <= Decimal::ZERO || market <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let distance = match order.side {
            Side::Buy => (market - limit) / limit,
            Side::Sell => (limit - market) / limit,
        };

        if distance <= Decimal::ZERO {
            return Decimal::ONE;
        }
        if distance >= self.alert_window {
            return Decimal::ZERO;
        }

        Decimal::ONE - distance / self.alert_window
    }
}

impl Default for FillProximityModel {
    fn default() -> Self {
        Self::new(default_alert_window())
    }
}

#[async_trait]
impl PredictionModel for FillProximityModel {
    async fn score(&self, order: &Order) -> Result<Decimal> {
        Ok(self.score_order(order))
    }
}
