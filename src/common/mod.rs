//! Common module - shared types, errors, and port traits

pub mod errors;
pub mod traits;
pub mod types;
