//! Port traits between the pipeline core and its external collaborators

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::errors::{DispatchError, Result};
use super::types::{NotificationPayload, NotificationRecord, Order, OrderFill};

/// Source of the orders to evaluate each cycle
///
/// Read-only from the core's perspective: query operations returning the
/// current state. A failure of a query itself means there is nothing to
/// process, so implementations return `NotifierError::SourceUnavailable` and
/// the caller aborts that sweep.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Fetch the current batch of orders needing evaluation
    async fn fetch_open_orders(&self) -> Result<Vec<Order>>;

    /// Fetch the most recent executed matches for the account
    ///
    /// Sources without a match feed keep the default empty response and the
    /// event watcher simply never announces fills.
    async fn fetch_recent_fills(&self) -> Result<Vec<OrderFill>> {
        Ok(Vec::new())
    }
}

/// Scoring oracle mapping an order's features to a score
///
/// Treated as pure and possibly slow. The core imposes no timeout of its
/// own; an implementation wrapping a remote oracle should time out on its
/// side and report the expiry as an error. Scores must land inside the
/// configured threshold table's domain or the order is skipped.
#[async_trait]
pub trait PredictionModel: Send + Sync {
    /// Score one order
    async fn score(&self, order: &Order) -> Result<Decimal>;
}

/// Outbound message transport
///
/// Implementations classify failures so the dispatcher knows what to retry:
/// network/timeout errors are `Transient` (optionally carrying a server
/// retry-after hint), anything that will not resolve by retrying is
/// `Permanent`.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Deliver a rendered payload to the configured destination
    async fn send(&self, payload: &NotificationPayload) -> std::result::Result<(), DispatchError>;
}

/// Persistence for notification records backing deduplication
///
/// Append-only history per order identifier. `latest` and `append` for one
/// key must not interleave when used concurrently; implementations serialize
/// access internally.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Most recent record for an order, if any
    async fn latest(&self, order_id: &str) -> Result<Option<NotificationRecord>>;

    /// Append a record to the order's history
    async fn append(&self, record: NotificationRecord) -> Result<()>;
}

/// Persistence for the hashes the event watcher has already announced
///
/// Two independent namespaces: fill transaction hashes and open-order
/// hashes. Marking is idempotent. The watcher marks a hash before
/// dispatching its announcement, so a crash mid-send loses at most that one
/// message rather than repeating it on restart. The baseline marker is set
/// only once the startup backlog is fully marked; an interrupted baseline
/// leaves it unset so the next startup retries instead of announcing the
/// half it never marked.
#[async_trait]
pub trait EventJournal: Send + Sync {
    /// Whether a fill transaction hash was already announced
    async fn has_seen_fill(&self, tx_hash: &str) -> Result<bool>;

    /// Record a fill transaction hash as announced
    async fn mark_fill(&self, tx_hash: &str) -> Result<()>;

    /// Whether an open-order hash was already announced
    async fn has_seen_order(&self, order_id: &str) -> Result<bool>;

    /// Record an open-order hash as announced
    async fn mark_order(&self, order_id: &str) -> Result<()>;

    /// Whether a startup baseline has completed against this journal
    async fn is_baselined(&self) -> Result<bool>;

    /// Record that a startup baseline completed
    async fn mark_baselined(&self) -> Result<()>;
}
