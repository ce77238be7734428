//! PredictOrderNotifier Library
//!
//! A Rust service that scores a signer's open predict.fun limit orders for
//! fill proximity and delivers deduplicated Telegram alerts.

pub mod common;
pub mod config;
pub mod engine;
pub mod notify;
pub mod predict;

// Re-export commonly used types
pub use common::errors::{DispatchError, NotifierError, Result};
pub use common::traits::{
    EventJournal, NotificationTransport, OrderSource, PredictionModel, RecordStore,
};
pub use common::types::{
    CycleSummary, DeliveryOutcome, EventSummary, FireReason, NotificationPayload,
    NotificationRecord, Order, OrderFill, OrderStatus, Prediction, Side,
};
pub use config::types::AppConfig;
pub use engine::{
    CyclePhase, DedupPolicy, EventWatcher, FillProximityModel, InMemoryEventJournal,
    InMemoryRecordStore, JsonFileEventJournal, JsonFileRecordStore, RunCoordinator, ScoringEngine,
    ThresholdBand, ThresholdTable,
};
pub use notify::{NotificationDispatcher, TelegramTransport};
pub use predict::{PredictOrderSource, PredictRestClient};
