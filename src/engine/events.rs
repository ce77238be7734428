//! Event watcher announcing fills and newly placed orders

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::common::errors::Result;
use crate::common::traits::{EventJournal, OrderSource};
use crate::common::types::{DeliveryOutcome, EventSummary, NotificationPayload, Order, OrderFill};
use crate::notify::dispatcher::NotificationDispatcher;
use crate::notify::render;

/// Announces executed fills and newly placed orders
///
/// Runs alongside the evaluation cycle on the same poll cadence. Each sweep
/// diffs the source's recent activity against the journal: anything unseen
/// is marked first and then announced, so a hash is announced at most once
/// even across restarts. A failed fetch skips that half of the sweep and
/// the other half still runs. Cancellation is cooperative, observed between
/// entries; an in-flight dispatch always runs to completion.
pub struct EventWatcher {
    /// Where fills and open orders come from
    source: Arc<dyn OrderSource>,
    /// Hashes already announced
    journal: Arc<dyn EventJournal>,
    /// Sends payloads with retry
    dispatcher: NotificationDispatcher,
    /// Cancellation flag, checked at entry boundaries
    cancel: Arc<AtomicBool>,
}

impl EventWatcher {
    pub fn new(
        source: Arc<dyn OrderSource>,
        journal: Arc<dyn EventJournal>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            source,
            journal,
            dispatcher,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared cancellation flag; flip it to stop the sweep at the next
    /// entry boundary
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Request cancellation of the current sweep
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Baseline the journal unless a prior startup already completed one
    ///
    /// The journal's baseline marker is checked first, so a startup that
    /// was interrupted mid-baseline retries here instead of treating its
    /// half-marked journal as history and announcing the rest of the
    /// backlog.
    #[instrument(skip(self))]
    pub async fn ensure_baselined(&self) -> Result<()> {
        if self.journal.is_baselined().await? {
            debug!("journal already baselined");
            return Ok(());
        }
        self.baseline().await
    }

    /// Mark the source's current activity as seen without announcing it
    ///
    /// Run once at startup so the first sweep only announces activity that
    /// happened after the process came up, not the existing backlog. Both
    /// feeds are fetched before anything is marked, so a failed fetch
    /// leaves the journal untouched; the baseline marker is set last, once
    /// the whole backlog is marked.
    #[instrument(skip(self))]
    pub async fn baseline(&self) -> Result<()> {
        let fills = self.source.fetch_recent_fills().await?;
        let orders = self.source.fetch_open_orders().await?;

        for fill in &fills {
            self.journal.mark_fill(&fill.tx_hash).await?;
        }
        for order in &orders {
            self.journal.mark_order(&order.id).await?;
        }
        self.journal.mark_baselined().await?;

        info!(
            fills = fills.len(),
            orders = orders.len(),
            "baselined existing activity"
        );
        Ok(())
    }

    /// Run one activity sweep and return its summary
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> EventSummary {
        let started = Instant::now();
        let mut summary = EventSummary::default();

        match self.source.fetch_recent_fills().await {
            Ok(fills) => {
                debug!(fills = fills.len(), "fetched recent fills");
                self.announce_fills(&fills, &mut summary).await;
            }
            Err(e) => warn!("fill feed unavailable, skipping fills this sweep: {}", e),
        }

        if self.is_cancelled() {
            warn!("cancellation requested, skipping placement sweep");
            return summary;
        }

        match self.source.fetch_open_orders().await {
            Ok(orders) => {
                debug!(orders = orders.len(), "fetched open orders");
                self.announce_placements(&orders, &mut summary).await;
            }
            Err(e) => warn!(
                "order source unavailable, skipping placements this sweep: {}",
                e
            ),
        }

        info!(
            fills_sent = summary.fills_sent,
            placements_sent = summary.placements_sent,
            failed = summary.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "event sweep complete"
        );
        summary
    }

    async fn announce_fills(&self, fills: &[OrderFill], summary: &mut EventSummary) {
        for fill in fills {
            if self.is_cancelled() {
                warn!("cancellation requested, skipping remaining fills");
                break;
            }

            match self.journal.has_seen_fill(&fill.tx_hash).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    // An unreadable journal must not cause a repeat
                    // announcement, so the entry is skipped
                    warn!(tx_hash = %fill.tx_hash, "journal read failed, skipping fill: {}", e);
                    continue;
                }
            }

            // Marked before the send; a crash between the two loses this
            // one message instead of repeating it on every restart
            if let Err(e) = self.journal.mark_fill(&fill.tx_hash).await {
                warn!(tx_hash = %fill.tx_hash, "journal write failed, skipping fill: {}", e);
                continue;
            }

            info!(tx_hash = %fill.tx_hash, side = %fill.side, "announcing fill");
            let payload = NotificationPayload {
                order_id: fill.tx_hash.clone(),
                classification: "order-filled".to_string(),
                text: render::render_fill(fill),
            };

            let record = self.dispatcher.dispatch(&payload).await;
            match record.outcome {
                DeliveryOutcome::Delivered => summary.fills_sent += 1,
                DeliveryOutcome::Failed => summary.failed += 1,
            }
        }
    }

    async fn announce_placements(&self, orders: &[Order], summary: &mut EventSummary) {
        for order in orders {
            if self.is_cancelled() {
                warn!("cancellation requested, skipping remaining placements");
                break;
            }

            match self.journal.has_seen_order(&order.id).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    warn!(order_id = %order.id, "journal read failed, skipping placement: {}", e);
                    continue;
                }
            }

            if let Err(e) = self.journal.mark_order(&order.id).await {
                warn!(order_id = %order.id, "journal write failed, skipping placement: {}", e);
                continue;
            }

            info!(order_id = %order.id, side = %order.side, "announcing new order");
            let payload = NotificationPayload {
                order_id: order.id.clone(),
                classification: "order-placed".to_string(),
                text: render::render_placed(order),
            };

            let record = self.dispatcher.dispatch(&payload).await;
            match record.outcome {
                DeliveryOutcome::Delivered => summary.placements_sent += 1,
                DeliveryOutcome::Failed => summary.failed += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::{DispatchError, NotifierError};
    use crate::common::traits::NotificationTransport;
    use crate::common::types::{OrderStatus, Side};
    use crate::engine::journal::{InMemoryEventJournal, JsonFileEventJournal};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct ActivitySource {
        fills: Vec<OrderFill>,
        orders: Vec<Order>,
    }

    #[async_trait]
    impl OrderSource for ActivitySource {
        async fn fetch_open_orders(&self) -> Result<Vec<Order>> {
            Ok(self.orders.clone())
        }

        async fn fetch_recent_fills(&self) -> Result<Vec<OrderFill>> {
            Ok(self.fills.clone())
        }
    }

    struct DownSource;

    #[async_trait]
    impl OrderSource for DownSource {
        async fn fetch_open_orders(&self) -> Result<Vec<Order>> {
            Err(NotifierError::SourceUnavailable("connect refused".into()))
        }

        async fn fetch_recent_fills(&self) -> Result<Vec<OrderFill>> {
            Err(NotifierError::SourceUnavailable("connect refused".into()))
        }
    }

    struct FillsOnlySource {
        fills: Vec<OrderFill>,
    }

    #[async_trait]
    impl OrderSource for FillsOnlySource {
        async fn fetch_open_orders(&self) -> Result<Vec<Order>> {
            Err(NotifierError::SourceUnavailable("connect refused".into()))
        }

        async fn fetch_recent_fills(&self) -> Result<Vec<OrderFill>> {
            Ok(self.fills.clone())
        }
    }

    struct OkTransport;

    #[async_trait]
    impl NotificationTransport for OkTransport {
        async fn send(
            &self,
            _payload: &NotificationPayload,
        ) -> std::result::Result<(), DispatchError> {
            Ok(())
        }
    }

    struct RejectingTransport;

    #[async_trait]
    impl NotificationTransport for RejectingTransport {
        async fn send(
            &self,
            _payload: &NotificationPayload,
        ) -> std::result::Result<(), DispatchError> {
            Err(DispatchError::permanent("chat not found"))
        }
    }

    fn fill(tx_hash: &str) -> OrderFill {
        OrderFill {
            tx_hash: tx_hash.to_string(),
            market_title: Some("Test market".to_string()),
            outcome: Some("Yes".to_string()),
            side: Side::Buy,
            size_filled: Some(dec!(25)),
            price: Some(dec!(0.45)),
            executed_at: None,
        }
    }

    fn order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            market_id: 1,
            market_title: Some("Test market".to_string()),
            side: Side::Buy,
            limit_price: Some(dec!(0.45)),
            size: dec!(100),
            size_filled: dec!(0),
            market_price: Some(dec!(0.46)),
            status: OrderStatus::Open,
        }
    }

    fn watcher(
        source: Arc<dyn OrderSource>,
        transport: Arc<dyn NotificationTransport>,
    ) -> EventWatcher {
        watcher_with_journal(source, Arc::new(InMemoryEventJournal::new()), transport)
    }

    fn watcher_with_journal(
        source: Arc<dyn OrderSource>,
        journal: Arc<dyn EventJournal>,
        transport: Arc<dyn NotificationTransport>,
    ) -> EventWatcher {
        let dispatcher =
            NotificationDispatcher::new(transport).with_backoff_base(Duration::from_millis(1));
        EventWatcher::new(source, journal, dispatcher)
    }

    #[tokio::test]
    async fn test_baseline_announces_nothing() {
        let source = Arc::new(ActivitySource {
            fills: vec![fill("0xtx1")],
            orders: vec![order("0xorder1")],
        });
        let watcher = watcher(source, Arc::new(OkTransport));

        watcher.baseline().await.unwrap();
        let summary = watcher.run_cycle().await;

        assert_eq!(summary, EventSummary::default());
    }

    #[tokio::test]
    async fn test_interrupted_baseline_retries_without_announcing_backlog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");

        // First startup: the fills fetch works but the orders fetch fails,
        // so the baseline never completes
        {
            let journal = JsonFileEventJournal::open(&path, 500).await.unwrap();
            let source = Arc::new(FillsOnlySource {
                fills: vec![fill("0xtx1")],
            });
            let watcher = watcher_with_journal(source, Arc::new(journal), Arc::new(OkTransport));
            assert!(watcher.ensure_baselined().await.is_err());
        }

        // Next startup against the same journal file: the backlog that
        // predates the first startup is baselined, not announced
        let journal = JsonFileEventJournal::open(&path, 500).await.unwrap();
        let source = Arc::new(ActivitySource {
            fills: vec![fill("0xtx1")],
            orders: vec![order("0xorder1")],
        });
        let watcher = watcher_with_journal(source, Arc::new(journal), Arc::new(OkTransport));
        watcher.ensure_baselined().await.unwrap();

        let summary = watcher.run_cycle().await;
        assert_eq!(summary, EventSummary::default());
    }

    #[tokio::test]
    async fn test_completed_baseline_is_not_repeated() {
        let journal: Arc<dyn EventJournal> = Arc::new(InMemoryEventJournal::new());
        let empty = Arc::new(ActivitySource {
            fills: vec![],
            orders: vec![],
        });
        let watcher = watcher_with_journal(empty, journal.clone(), Arc::new(OkTransport));
        watcher.ensure_baselined().await.unwrap();

        // A fill that happened after the baseline is announced even when a
        // restart calls ensure_baselined again
        let source = Arc::new(ActivitySource {
            fills: vec![fill("0xtx1")],
            orders: vec![],
        });
        let watcher = watcher_with_journal(source, journal, Arc::new(OkTransport));
        watcher.ensure_baselined().await.unwrap();

        let summary = watcher.run_cycle().await;
        assert_eq!(summary.fills_sent, 1);
    }

    #[tokio::test]
    async fn test_new_fill_is_announced_once() {
        let source = Arc::new(ActivitySource {
            fills: vec![fill("0xtx1")],
            orders: vec![],
        });
        let watcher = watcher(source, Arc::new(OkTransport));

        let first = watcher.run_cycle().await;
        assert_eq!(first.fills_sent, 1);
        assert_eq!(first.failed, 0);

        let second = watcher.run_cycle().await;
        assert_eq!(second, EventSummary::default());
    }

    #[tokio::test]
    async fn test_new_order_is_announced_once() {
        let source = Arc::new(ActivitySource {
            fills: vec![],
            orders: vec![order("0xorder1")],
        });
        let watcher = watcher(source, Arc::new(OkTransport));

        let first = watcher.run_cycle().await;
        assert_eq!(first.placements_sent, 1);

        let second = watcher.run_cycle().await;
        assert_eq!(second, EventSummary::default());
    }

    #[tokio::test]
    async fn test_failed_dispatch_still_marks_seen() {
        let source = Arc::new(ActivitySource {
            fills: vec![fill("0xtx1")],
            orders: vec![],
        });
        let watcher = watcher(source, Arc::new(RejectingTransport));

        let first = watcher.run_cycle().await;
        assert_eq!(first.fills_sent, 0);
        assert_eq!(first.failed, 1);

        // The hash is marked even though delivery failed, so the fill is
        // not retried on the next sweep
        let second = watcher.run_cycle().await;
        assert_eq!(second, EventSummary::default());
    }

    #[tokio::test]
    async fn test_unavailable_source_yields_empty_sweep() {
        let watcher = watcher(Arc::new(DownSource), Arc::new(OkTransport));
        let summary = watcher.run_cycle().await;

        assert_eq!(summary, EventSummary::default());
    }

    #[tokio::test]
    async fn test_cancel_stops_at_entry_boundary() {
        let source = Arc::new(ActivitySource {
            fills: vec![fill("0xtx1"), fill("0xtx2")],
            orders: vec![order("0xorder1")],
        });
        let watcher = watcher(source, Arc::new(OkTransport));
        watcher.request_cancel();

        let summary = watcher.run_cycle().await;

        assert_eq!(summary, EventSummary::default());
    }
}
