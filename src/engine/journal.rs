//! Event journals tracking which fills and placements were announced

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::common::errors::{NotifierError, Result};
use crate::common::traits::EventJournal;

/// On-disk shape of the journal: two flat hash lists, oldest first, plus
/// the baseline-complete marker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SeenHashes {
    #[serde(default)]
    fills: Vec<String>,
    #[serde(default)]
    orders: Vec<String>,
    #[serde(default)]
    baselined: bool,
}

/// Insert a hash unless present, evicting the oldest past the cap
///
/// Returns whether the list changed.
fn insert_capped(list: &mut Vec<String>, hash: &str, cap: usize) -> bool {
    if list.iter().any(|seen| seen == hash) {
        return false;
    }
    list.push(hash.to_string());
    let excess = list.len().saturating_sub(cap);
    if excess > 0 {
        list.drain(..excess);
    }
    true
}

/// Volatile journal keeping seen hashes in memory
///
/// Suitable for tests and single-run invocations; state is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryEventJournal {
    fills: RwLock<HashSet<String>>,
    orders: RwLock<HashSet<String>>,
    baselined: AtomicBool,
}

impl InMemoryEventJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventJournal for InMemoryEventJournal {
    async fn has_seen_fill(&self, tx_hash: &str) -> Result<bool> {
        Ok(self.fills.read().await.contains(tx_hash))
    }

    async fn mark_fill(&self, tx_hash: &str) -> Result<()> {
        self.fills.write().await.insert(tx_hash.to_string());
        Ok(())
    }

    async fn has_seen_order(&self, order_id: &str) -> Result<bool> {
        Ok(self.orders.read().await.contains(order_id))
    }

    async fn mark_order(&self, order_id: &str) -> Result<()> {
        self.orders.write().await.insert(order_id.to_string());
        Ok(())
    }

    async fn is_baselined(&self) -> Result<bool> {
        Ok(self.baselined.load(Ordering::SeqCst))
    }

    async fn mark_baselined(&self) -> Result<()> {
        self.baselined.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// JSON-file-backed journal surviving process restarts
///
/// Loads the whole journal once at open and writes it back after every new
/// mark, holding the write lock across the disk write so marks never
/// interleave. Each namespace keeps at most `seen_cap` hashes; the oldest
/// are dropped once the cap is exceeded. Marking an already-seen hash is a
/// no-op and skips the disk write.
#[derive(Debug)]
pub struct JsonFileEventJournal {
    path: PathBuf,
    seen_cap: usize,
    seen: RwLock<SeenHashes>,
}

impl JsonFileEventJournal {
    /// Default number of hashes retained per namespace
    pub const DEFAULT_SEEN_CAP: usize = 500;

    /// Open the journal, loading any existing file
    ///
    /// A missing file starts an empty journal. A file that fails to parse
    /// is treated as empty with a warning rather than blocking startup.
    pub async fn open(path: impl AsRef<Path>, seen_cap: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let seen = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<SeenHashes>(&contents) {
                Ok(seen) => {
                    info!(
                        path = %path.display(),
                        fills = seen.fills.len(),
                        orders = seen.orders.len(),
                        "loaded event journal"
                    );
                    seen
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "event journal unreadable, starting empty");
                    SeenHashes::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SeenHashes::default(),
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
            seen_cap: seen_cap.max(1),
            seen: RwLock::new(seen),
        })
    }

    async fn persist(&self, seen: &SeenHashes) -> Result<()> {
        let contents = serde_json::to_string_pretty(seen)?;
        tokio::fs::write(&self.path, contents).await.map_err(|e| {
            NotifierError::Store(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl EventJournal for JsonFileEventJournal {
    async fn has_seen_fill(&self, tx_hash: &str) -> Result<bool> {
        Ok(self.seen.read().await.fills.iter().any(|seen| seen == tx_hash))
    }

    async fn mark_fill(&self, tx_hash: &str) -> Result<()> {
        let mut seen = self.seen.write().await;
        if !insert_capped(&mut seen.fills, tx_hash, self.seen_cap) {
            return Ok(());
        }
        self.persist(&seen).await
    }

    async fn has_seen_order(&self, order_id: &str) -> Result<bool> {
        Ok(self.seen.read().await.orders.iter().any(|seen| seen == order_id))
    }

    async fn mark_order(&self, order_id: &str) -> Result<()> {
        let mut seen = self.seen.write().await;
        if !insert_capped(&mut seen.orders, order_id, self.seen_cap) {
            return Ok(());
        }
        self.persist(&seen).await
    }

    async fn is_baselined(&self) -> Result<bool> {
        Ok(self.seen.read().await.baselined)
    }

    async fn mark_baselined(&self) -> Result<()> {
        let mut seen = self.seen.write().await;
        if seen.baselined {
            return Ok(());
        }
        seen.baselined = true;
        self.persist(&seen).await
    }
}
