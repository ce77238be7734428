//! Scoring engine applying the model and threshold table to a batch

use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, Stream, StreamExt};
use tracing::debug;

use crate::common::errors::{NotifierError, Result};
use crate::common::traits::PredictionModel;
use crate::common::types::{Order, Prediction};

use super::thresholds::ThresholdTable;

/// Applies the prediction model to each order and classifies the result
///
/// Produces one prediction per input order, preserving input order even
/// when model invocations run concurrently. A per-order failure (oracle
/// error or score outside the table's domain) is reported for that order
/// only; scoring the rest of the batch continues. No side effects beyond
/// invoking the model.
pub struct ScoringEngine {
    model: Arc<dyn PredictionModel>,
    thresholds: ThresholdTable,
    concurrency: usize,
}

impl ScoringEngine {
    /// Create an engine that scores orders sequentially
    pub fn new(model: Arc<dyn PredictionModel>, thresholds: ThresholdTable) -> Self {
        Self {
            model,
            thresholds,
            concurrency: 1,
        }
    }

    /// Run up to `concurrency` model invocations in flight at once
    ///
    /// Output order still matches input order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Lazily score a batch, yielding one result per order in input order
    pub fn score_stream<'a>(
        &'a self,
        orders: &'a [Order],
    ) -> impl Stream<Item = Result<Prediction>> + 'a {
        stream::iter(orders)
            .map(move |order| self.score_order(order))
            .buffered(self.concurrency)
    }

    /// Score a batch eagerly, collecting all per-order results
    pub async fn score_batch(&self, orders: &[Order]) -> Vec<Result<Prediction>> {
        self.score_stream(orders).collect().await
    }

    async fn score_order(&self, order: &Order) -> Result<Prediction> {
        let score = self.model.score(order).await.map_err(|e| {
            NotifierError::ModelInvocation {
                order_id: order.id.clone(),
                message: e.to_string(),
            }
        })?;

        let band = self.thresholds.classify(score).ok_or_else(|| {
            let (low, high) = self.thresholds.domain();
            NotifierError::ModelInvocation {
                order_id: order.id.clone(),
                message: format!("score {} outside threshold domain [{}, {}]", score, low, high),
            }
        })?;

        debug!(order_id = %order.id, %score, label = %band.label, "scored order");

        Ok(Prediction {
            order_id: order.id.clone(),
            score,
            label: band.label.clone(),
            notify: band.notify,
            evaluated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{OrderStatus, Side};
    use crate::engine::thresholds::ThresholdBand;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    /// Model that replays a fixed score (or error) per order id
    struct ScriptedModel {
        scores: HashMap<String, Decimal>,
    }

    impl ScriptedModel {
        fn new(scores: &[(&str, Decimal)]) -> Self {
            Self {
                scores: scores
                    .iter()
                    .map(|(id, s)| (id.to_string(), *s))
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
                .ok_or_else(|| NotifierError::Internal("oracle unavailable".to_string()))
        }
    }

    fn order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            market_id: 1,
            market_title: None,
            side: Side::Buy,
            limit_price: Some(dec!(0.5)),
            size: dec!(10),
            size_filled: Decimal::ZERO,
            market_price: Some(dec!(0.52)),
            status: OrderStatus::Open,
        }
    }

    fn table() -> ThresholdTable {
        ThresholdTable::new(vec![
            ThresholdBand::new(dec!(0.0), dec!(0.5), "normal", false),
            ThresholdBand::new(dec!(0.5), dec!(1.0), "critical", true),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let model = ScriptedModel::new(&[
            ("a", dec!(0.1)),
            ("b", dec!(0.6)),
            ("c", dec!(0.95)),
        ]);
        let engine = ScoringEngine::new(Arc::new(model), table()).with_concurrency(4);

        let results = engine
            .score_batch(&[order("a"), order("b"), order("c")])
            .await;

        let labels: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().label.clone())
            .collect();
        assert_eq!(labels, vec!["normal", "critical", "critical"]);

        let ids: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().order_id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failing_order_does_not_block_the_batch() {
        // "b" has no scripted score, so the oracle errors for it
        let model = ScriptedModel::new(&[("a", dec!(0.2)), ("c", dec!(0.7))]);
        let engine = ScoringEngine::new(Arc::new(model), table());

        let results = engine
            .score_batch(&[order("a"), order("b"), order("c")])
            .await;

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(NotifierError::ModelInvocation { ref order_id, .. }) if order_id == "b"
        ));
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_a_model_error() {
        let model = ScriptedModel::new(&[("a", dec!(1.5))]);
        let engine = ScoringEngine::new(Arc::new(model), table());

        let results = engine.score_batch(&[order("a")]).await;

        assert!(matches!(
            results[0],
            Err(NotifierError::ModelInvocation { ref order_id, .. }) if order_id == "a"
        ));
    }

    #[tokio::test]
    async fn test_notify_flag_follows_band() {
        let model = ScriptedModel::new(&[("a", dec!(0.1)), ("b", dec!(0.9))]);
        let engine = ScoringEngine::new(Arc::new(model), table());

        let results = engine.score_batch(&[order("a"), order("b")]).await;

        assert!(!results[0].as_ref().unwrap().notify);
        assert!(results[1].as_ref().unwrap().notify);
    }
}
