//! Notification dispatch with retry and exponential backoff

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use crate::common::errors::DispatchError;
use crate::common::traits::NotificationTransport;
use crate::common::types::{DeliveryOutcome, NotificationPayload, NotificationRecord};

/// Upper bound on a computed backoff wait; a server retry-after hint may
/// exceed it
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Sends payloads through the transport, retrying transient failures
///
/// Every dispatch produces a record: `Delivered` on success, `Failed` on a
/// permanent failure or once retries are exhausted. Failed records are
/// persisted like delivered ones so deduplication stops resending to a
/// known-bad target until the interval elapses or the classification
/// changes.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn NotificationTransport>,
    /// Additional attempts after the first
    max_retries: u32,
    /// Delay before the first retry, doubled each retry after
    backoff_base: Duration,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn NotificationTransport>) -> Self {
        Self {
            transport,
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }

    /// Set the number of retries after the first attempt
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Send one payload, retrying transient failures
    ///
    /// Never fails; the outcome lands in the returned record. An in-flight
    /// dispatch runs its full retry sequence even when the surrounding cycle
    /// is being cancelled.
    #[instrument(skip(self, payload), fields(order_id = %payload.order_id))]
    pub async fn dispatch(&self, payload: &NotificationPayload) -> NotificationRecord {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            match self.transport.send(payload).await {
                Ok(()) => {
                    debug!(attempt, "notification delivered");
                    return self.record(payload, DeliveryOutcome::Delivered, attempt);
                }
                Err(DispatchError::Permanent { message }) => {
                    error!(attempt, "permanent dispatch failure: {}", message);
                    return self.record(payload, DeliveryOutcome::Failed, attempt);
                }
                Err(DispatchError::Transient {
                    message,
                    retry_after_seconds,
                }) => {
                    if attempt >= max_attempts {
                        error!(
                            "dispatch failed after {} attempts: {}",
                            max_attempts, message
                        );
                        return self.record(payload, DeliveryOutcome::Failed, attempt);
                    }

                    let delay = self.backoff_delay(attempt, retry_after_seconds);
                    warn!(
                        "Retry {}/{}: {} (waiting {}ms)",
                        attempt,
                        self.max_retries,
                        message,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Wait before the retry following attempt `attempt` (1-based)
    ///
    /// Exponential with a cap; a server retry-after hint wins when larger.
    fn backoff_delay(&self, attempt: u32, retry_after_seconds: Option<u64>) -> Duration {
        let exponential = self
            .backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(MAX_BACKOFF);

        match retry_after_seconds {
            Some(seconds) => exponential.max(Duration::from_secs(seconds)),
            None => exponential,
        }
    }

    fn record(
        &self,
        payload: &NotificationPayload,
        outcome: DeliveryOutcome,
        attempts: u32,
    ) -> NotificationRecord {
        NotificationRecord {
            order_id: payload.order_id.clone(),
            classification: payload.classification.clone(),
            sent_at: Utc::now(),
            outcome,
            attempts,
        }
    }
}
