//! Core types shared across the notification pipeline

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle status of an order as reported by the source
///
/// The predict.fun source queries `status=OPEN` and so only ever emits
/// `Open`; the remaining states are the rest of the API's status domain,
/// for sources that return full order lifecycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Open => write!(f, "OPEN"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// One open order under evaluation
///
/// Supplied fresh by the order source each cycle and treated as immutable
/// for the duration of that cycle. `market_price` is the best opposing book
/// price (best ask for a buy order, best bid for a sell order); `None` when
/// the book is empty or enrichment failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier, stable across cycles
    pub id: String,
    /// Market this order rests on
    pub market_id: i64,
    /// Human-readable market title, when enrichment succeeded
    #[serde(default)]
    pub market_title: Option<String>,
    /// Buy or sell
    pub side: Side,
    /// Limit price of the order (0.00 to 1.00 for prediction markets)
    pub limit_price: Option<Decimal>,
    /// Total order size in shares
    pub size: Decimal,
    /// Portion of the order already filled
    pub size_filled: Decimal,
    /// Best opposing price currently on the book
    pub market_price: Option<Decimal>,
    /// Lifecycle status reported by the source
    pub status: OrderStatus,
}

impl Order {
    /// Size still resting on the book
    pub fn size_remaining(&self) -> Decimal {
        self.size - self.size_filled
    }
}

/// One executed match reported by the order source
///
/// Identified by the on-chain transaction hash, which is what the event
/// journal keys on. Everything beyond the hash and side is best-effort:
/// the source fills in what the API returned and leaves the rest `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    /// Transaction hash of the match, unique per fill
    pub tx_hash: String,
    /// Market the fill happened on, when the API included it
    #[serde(default)]
    pub market_title: Option<String>,
    /// Outcome name the fill traded, when the API included it
    #[serde(default)]
    pub outcome: Option<String>,
    /// Side of the resting order that got hit
    pub side: Side,
    /// Shares executed in this match
    pub size_filled: Option<Decimal>,
    /// Price the match executed at
    pub price: Option<Decimal>,
    /// Execution timestamp as reported by the source, unparsed
    #[serde(default)]
    pub executed_at: Option<String>,
}

impl OrderFill {
    /// Value of the fill (size times price), when both are known
    pub fn notional(&self) -> Option<Decimal> {
        match (self.size_filled, self.price) {
            (Some(size), Some(price)) => Some(size * price),
            _ => None,
        }
    }
}

/// The model's scored and classified assessment of one order
///
/// Created once per order per cycle; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Order this prediction is for
    pub order_id: String,
    /// Model score in the threshold table's domain
    pub score: Decimal,
    /// Label of the threshold band the score landed in
    pub label: String,
    /// Whether the band is actionable (candidates for dispatch)
    pub notify: bool,
    /// When the model was invoked
    pub evaluated_at: DateTime<Utc>,
}

/// Why a notification fired for a prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FireReason {
    /// No prior record existed for the order
    FirstNotification,
    /// Classification differs from the last recorded notification
    ClassificationChanged { previous: String },
    /// The re-notify interval elapsed since the last record
    IntervalElapsed,
}

impl std::fmt::Display for FireReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FireReason::FirstNotification => write!(f, "first alert for this order"),
            FireReason::ClassificationChanged { previous } => {
                write!(f, "classification changed from {}", previous)
            }
            FireReason::IntervalElapsed => write!(f, "re-notify interval elapsed"),
        }
    }
}

/// Delivery outcome of a dispatch attempt sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    /// The transport accepted the message
    Delivered,
    /// Permanent failure, or retries exhausted
    Failed,
}

/// Record of one notification attempt sequence for an order
///
/// Append-only: a record is never overwritten, only superseded by a newer
/// record for the same order. Failed deliveries are recorded too, so a
/// known-bad target is not retried until the re-notify interval elapses or
/// the classification changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Order the notification was about
    pub order_id: String,
    /// Classification that triggered it
    pub classification: String,
    /// When the dispatch sequence completed
    pub sent_at: DateTime<Utc>,
    /// Delivered or failed
    pub outcome: DeliveryOutcome,
    /// Total transport attempts made (1 = no retries)
    pub attempts: u32,
}

/// Rendered message handed to the notification transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Order the message is about
    pub order_id: String,
    /// Classification being announced
    pub classification: String,
    /// Rendered message body (HTML)
    pub text: String,
}

/// Counts for one evaluation cycle
///
/// The single source of truth for what happened in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Orders the cycle attempted to evaluate
    pub evaluated: usize,
    /// Notifications delivered
    pub sent: usize,
    /// Actionable predictions suppressed by deduplication
    pub suppressed: usize,
    /// Dispatch sequences that ended in failure
    pub failed: usize,
    /// Orders skipped because the model invocation failed
    pub model_errors: usize,
}

impl std::fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "evaluated={} sent={} suppressed={} failed={} model_errors={}",
            self.evaluated, self.sent, self.suppressed, self.failed, self.model_errors
        )
    }
}

/// Counts for one order-activity sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventSummary {
    /// Fill announcements delivered
    pub fills_sent: usize,
    /// New-order announcements delivered
    pub placements_sent: usize,
    /// Dispatch sequences that ended in failure
    pub failed: usize,
}

impl std::fmt::Display for EventSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fills_sent={} placements_sent={} failed={}",
            self.fills_sent, self.placements_sent, self.failed
        )
    }
}
