//! Error types for the application

use thiserror::Error;

/// Result type alias using our NotifierError
pub type Result<T> = std::result::Result<T, NotifierError>;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum NotifierError {
    /// Model invocation failed for a single order (recoverable, the batch continues)
    #[error("model invocation failed for order {order_id}: {message}")]
    ModelInvocation { order_id: String, message: String },

    /// Order source unreachable (fatal to the cycle)
    #[error("order source unavailable: {0}")]
    SourceUnavailable(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid API response
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Record store errors
    #[error("record store error: {0}")]
    Store(String),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl NotifierError {
    /// Whether this error aborts the whole cycle rather than one order
    pub fn is_cycle_fatal(&self) -> bool {
        matches!(
            self,
            NotifierError::SourceUnavailable(_) | NotifierError::Store(_)
        )
    }
}

/// Classified failure returned by a notification transport
///
/// The dispatcher retries `Transient` failures with exponential backoff and
/// surfaces `Permanent` failures immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Network/timeout class failure, worth retrying
    #[error("transient dispatch failure: {message}, retry after {retry_after_seconds:?} seconds")]
    Transient {
        message: String,
        retry_after_seconds: Option<u64>,
    },

    /// Failure that will not resolve by retrying (bad recipient, malformed payload)
    #[error("permanent dispatch failure: {message}")]
    Permanent { message: String },
}

impl DispatchError {
    /// Transient failure without a retry-after hint
    pub fn transient(message: impl Into<String>) -> Self {
        DispatchError::Transient {
            message: message.into(),
            retry_after_seconds: None,
        }
    }

    /// Permanent failure
    pub fn permanent(message: impl Into<String>) -> Self {
        DispatchError::Permanent {
            message: message.into(),
        }
    }

    /// Whether the dispatcher should retry this failure
    pub fn is_transient(&self) -> bool {
        matches!(self, DispatchError::Transient { .. })
    }
}
