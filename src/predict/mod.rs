//! Predict module - client implementation for the predict.fun API

pub mod messages;
pub mod rest;
pub mod source;

pub use rest::PredictRestClient;
pub use source::PredictOrderSource;
