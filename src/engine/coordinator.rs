//! Cycle coordinator driving fetch, score, dedup, dispatch

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::{pin_mut, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::common::errors::Result;
use crate::common::traits::{OrderSource, RecordStore};
use crate::common::types::{
    CycleSummary, DeliveryOutcome, FireReason, NotificationPayload, Order, Prediction,
};
use crate::engine::dedup::DedupPolicy;
use crate::engine::scoring::ScoringEngine;
use crate::notify::dispatcher::NotificationDispatcher;
use crate::notify::render;

/// Phase the coordinator is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CyclePhase {
    Idle = 0,
    Fetching = 1,
    Scoring = 2,
    Deduping = 3,
    Dispatching = 4,
    Summarizing = 5,
    Failed = 6,
}

impl CyclePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CyclePhase::Idle,
            1 => CyclePhase::Fetching,
            2 => CyclePhase::Scoring,
            3 => CyclePhase::Deduping,
            4 => CyclePhase::Dispatching,
            5 => CyclePhase::Summarizing,
            _ => CyclePhase::Failed,
        }
    }
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Fetching => "fetching",
            CyclePhase::Scoring => "scoring",
            CyclePhase::Deduping => "deduping",
            CyclePhase::Dispatching => "dispatching",
            CyclePhase::Summarizing => "summarizing",
            CyclePhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Drives one evaluation cycle end to end
///
/// Per-order errors are counted in the summary and never abort the cycle.
/// `Failed` is entered only on an unrecoverable error: the order source
/// unavailable, or the record store unreadable (deduplication cannot be
/// trusted without it). Cancellation is cooperative, observed between
/// orders; an in-flight dispatch always runs to completion.
pub struct RunCoordinator {
    /// Where orders come from
    source: Arc<dyn OrderSource>,
    /// Scores and classifies orders
    scoring: ScoringEngine,
    /// Decides whether an actionable prediction fires or is suppressed
    dedup: DedupPolicy,
    /// Sends payloads with retry
    dispatcher: NotificationDispatcher,
    /// Notification history backing deduplication
    store: Arc<dyn RecordStore>,
    /// Current phase flag
    phase: Arc<AtomicU8>,
    /// Cancellation flag, checked at order boundaries
    cancel: Arc<AtomicBool>,
}

impl RunCoordinator {
    pub fn new(
        source: Arc<dyn OrderSource>,
        scoring: ScoringEngine,
        dedup: DedupPolicy,
        dispatcher: NotificationDispatcher,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            source,
            scoring,
            dedup,
            dispatcher,
            store,
            phase: Arc::new(AtomicU8::new(CyclePhase::Idle as u8)),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current phase
    pub fn phase(&self) -> CyclePhase {
        CyclePhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Shared cancellation flag; flip it to stop the cycle at the next
    /// order boundary
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Request cancellation of the current cycle
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn set_phase(&self, phase: CyclePhase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
        debug!(%phase, "cycle phase");
    }

    /// Run one full cycle and return its summary
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let started = Instant::now();
        let mut summary = CycleSummary::default();

        self.set_phase(CyclePhase::Fetching);
        let orders = match self.source.fetch_open_orders().await {
            Ok(orders) => orders,
            Err(e) => {
                error!("order source unavailable: {}", e);
                self.set_phase(CyclePhase::Failed);
                return Err(e);
            }
        };
        info!(orders = orders.len(), "fetched open orders");

        self.set_phase(CyclePhase::Scoring);
        let mut predictions: Vec<Prediction> = Vec::with_capacity(orders.len());
        {
            let stream = self.scoring.score_stream(&orders);
            pin_mut!(stream);
            while let Some(result) = stream.next().await {
                summary.evaluated += 1;
                match result {
                    Ok(prediction) => predictions.push(prediction),
                    Err(e) => {
                        summary.model_errors += 1;
                        warn!("skipping order: {}", e);
                    }
                }
                if self.is_cancelled() {
                    warn!("cancellation requested, stopping scoring");
                    break;
                }
            }
        }

        self.set_phase(CyclePhase::Deduping);
        let orders_by_id: HashMap<&str, &Order> =
            orders.iter().map(|o| (o.id.as_str(), o)).collect();
        let now = Utc::now();
        let mut due: Vec<(&Order, Prediction, FireReason)> = Vec::new();

        for prediction in predictions {
            if self.is_cancelled() {
                warn!("cancellation requested, stopping deduplication");
                break;
            }

            if !prediction.notify {
                debug!(
                    order_id = %prediction.order_id,
                    label = %prediction.label,
                    "not an actionable classification"
                );
                continue;
            }

            let latest = match self.store.latest(&prediction.order_id).await {
                Ok(latest) => latest,
                Err(e) => {
                    error!("record store unreadable: {}", e);
                    self.set_phase(CyclePhase::Failed);
                    return Err(e);
                }
            };

            match self.dedup.evaluate(&prediction, latest.as_ref(), now) {
                Some(reason) => {
                    if let Some(order) = orders_by_id.get(prediction.order_id.as_str()).copied() {
                        due.push((order, prediction, reason));
                    }
                }
                None => {
                    summary.suppressed += 1;
                    debug!(order_id = %prediction.order_id, "suppressed by dedup policy");
                }
            }
        }

        self.set_phase(CyclePhase::Dispatching);
        for (order, prediction, reason) in &due {
            if self.is_cancelled() {
                warn!("cancellation requested, skipping remaining dispatches");
                break;
            }

            info!(
                order_id = %prediction.order_id,
                label = %prediction.label,
                %reason,
                "dispatching notification"
            );
            let payload = NotificationPayload {
                order_id: prediction.order_id.clone(),
                classification: prediction.label.clone(),
                text: render::render_alert(order, prediction, reason),
            };

            let record = self.dispatcher.dispatch(&payload).await;
            match record.outcome {
                DeliveryOutcome::Delivered => summary.sent += 1,
                DeliveryOutcome::Failed => summary.failed += 1,
            }

            // The send already happened; a persistence failure only costs
            // dedup accuracy for this order, so log and keep going
            if let Err(e) = self.store.append(record).await {
                error!(
                    order_id = %prediction.order_id,
                    "failed to persist notification record: {}",
                    e
                );
            }
        }

        self.set_phase(CyclePhase::Summarizing);
        info!(
            evaluated = summary.evaluated,
            sent = summary.sent,
            suppressed = summary.suppressed,
            failed = summary.failed,
            model_errors = summary.model_errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cycle complete"
        );

        self.set_phase(CyclePhase::Idle);
        Ok(summary)
    }
}
