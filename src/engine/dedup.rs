//! Notification deduplication

use chrono::{DateTime, Duration, Utc};

use crate::common::types::{FireReason, NotificationRecord, Prediction};

/// Decides whether a prediction should produce a new notification
///
/// A pure function of the prediction, the most recent record for the order,
/// the current time, and the configured re-notify interval. No hidden
/// state, so the same inputs always produce the same decision.
#[derive(Debug, Clone)]
pub struct DedupPolicy {
    re_notify_interval: Duration,
}

impl DedupPolicy {
    pub fn new(re_notify_interval: Duration) -> Self {
        Self { re_notify_interval }
    }

    /// Policy from a plain seconds value, as carried in configuration
    pub fn from_secs(re_notify_interval_secs: u64) -> Self {
        Self::new(Duration::seconds(re_notify_interval_secs as i64))
    }

    /// Evaluate the decision rule
    ///
    /// Fires when no prior record exists, when the classification differs
    /// from the prior record's, or when the interval since the prior record
    /// has elapsed. Returns the fire reason, or `None` to suppress.
    pub fn evaluate(
        &self,
        prediction: &Prediction,
        latest: Option<&NotificationRecord>,
        now: DateTime<Utc>,
    ) -> Option<FireReason> {
        let record = match latest {
            None => return Some(FireReason::FirstNotification),
            Some(record) => record,
        };

        if record.classification != prediction.label {
            return Some(FireReason::ClassificationChanged {
                previous: record.classification.clone(),
            });
        }

        if now - record.sent_at > self.re_notify_interval {
            return Some(FireReason::IntervalElapsed);
        }

        None
    }
}
