//! Record stores backing notification deduplication

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::common::errors::{NotifierError, Result};
use crate::common::traits::RecordStore;
use crate::common::types::NotificationRecord;

type RecordMap = HashMap<String, Vec<NotificationRecord>>;

/// Volatile store keeping per-order histories in memory
///
/// Suitable for tests and single-run invocations; state is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<RecordMap>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full history for an order, oldest first
    pub async fn history(&self, order_id: &str) -> Vec<NotificationRecord> {
        self.records
            .read()
            .await
            .get(order_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of orders with at least one record
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn latest(&self, order_id: &str) -> Result<Option<NotificationRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(order_id)
            .and_then(|history| history.last())
            .cloned())
    }

    async fn append(&self, record: NotificationRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records
            .entry(record.order_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }
}

/// JSON-file-backed store surviving process restarts
///
/// Loads the whole map once at open and writes it back after every append,
/// holding the write lock across the disk write so appends for any key
/// never interleave. History per order is capped; the oldest records are
/// dropped once the cap is exceeded.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    history_cap: usize,
    records: RwLock<RecordMap>,
}

impl JsonFileRecordStore {
    /// Default number of records retained per order
    pub const DEFAULT_HISTORY_CAP: usize = 50;

    /// Open the store, loading any existing file
    ///
    /// A missing file starts an empty store. A file that fails to parse is
    /// treated as empty with a warning rather than blocking startup.
    pub async fn open(path: impl AsRef<Path>, history_cap: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<RecordMap>(&contents) {
                Ok(records) => {
                    info!(path = %path.display(), orders = records.len(), "loaded record store");
                    records
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "record store unreadable, starting empty");
                    RecordMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RecordMap::new(),
            Err(e) => {
                return Err(NotifierError::Store(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path,
            history_cap: history_cap.max(1),
            records: RwLock::new(records),
        })
    }

    async fn persist(&self, records: &RecordMap) -> Result<()> {
        let contents = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, contents).await.map_err(|e| {
            NotifierError::Store(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn latest(&self, order_id: &str) -> Result<Option<NotificationRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(order_id)
            .and_then(|history| history.last())
            .cloned())
    }

    async fn append(&self, record: NotificationRecord) -> Result<()> {
        let mut records = self.records.write().await;
        let history = records.entry(record.order_id.clone()).or_default();
        history.push(record);

        let excess = history.len().saturating_sub(self.history_cap);
        if excess > 0 {
            history.drain(..excess);
        }

        self.persist(&records).await
    }
}
