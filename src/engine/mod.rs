//! Engine module - scoring, classification, deduplication, cycle driving

pub mod coordinator;
pub mod dedup;
pub mod events;
pub mod journal;
pub mod model;
pub mod scoring;
pub mod store;
pub mod thresholds;

pub use coordinator::{CyclePhase, RunCoordinator};
pub use dedup::DedupPolicy;
pub use events::EventWatcher;
pub use journal::{InMemoryEventJournal, JsonFileEventJournal};
pub use model::FillProximityModel;
pub use scoring::ScoringEngine;
pub use store::{InMemoryRecordStore, JsonFileRecordStore};
pub use thresholds::{ThresholdBand, ThresholdTable};
