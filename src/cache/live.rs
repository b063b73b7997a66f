//! Live build cache shared with the build server
//!
//! The cache file location is sent with every build request; the build
//! server keeps its own freshness bookkeeping inside the entries, and this
//! side stores the latest successful stats per cache key.

use crate::bundle::Stats;
use crate::cache::write_json_atomic;
use crate::error::{PackwrightError, PackwrightResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::fs;
use tracing::{debug, warn};

/// Cached build entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Build statistics, shaped like a fresh build's data
    pub stats: Stats,

    /// When this side last recorded the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Build server freshness metadata, kept verbatim
    #[serde(flatten)]
    pub server_meta: Map<String, Value>,
}

/// Cache file contents; entries are only decoded on lookup
type CacheFile = Map<String, Value>;

/// Per-file locks serializing read-modify-write cycles in this process
fn file_lock(path: &Path) -> Arc<tokio::sync::Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>> = OnceLock::new();

    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(locks.entry(path.to_path_buf()).or_default())
}

/// Live cache backed by a single JSON file
///
/// The file is shared with the build server. Entries this side cannot
/// decode are left exactly as they are.
#[derive(Debug, Clone)]
pub struct LiveCache {
    path: PathBuf,
}

impl LiveCache {
    /// Open the cache stored at `path` (the file need not exist yet)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the entry for a cache key
    ///
    /// A missing or unreadable file is a miss; the build server may be
    /// rewriting it. So is an entry without usable `stats`.
    pub async fn get(&self, key: &str) -> PackwrightResult<Option<CacheEntry>> {
        let Some(mut entries) = self.load().await? else {
            return Ok(None);
        };

        let entry = match entries.remove(key) {
            Some(value) => match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Ignoring undecodable live cache entry {}: {}", key, e);
                    None
                }
            },
            None => None,
        };

        debug!(
            "Live cache {} for {}",
            if entry.is_some() { "hit" } else { "miss" },
            key
        );
        Ok(entry)
    }

    /// Record successful stats for a cache key
    ///
    /// Only `key` changes; other entries and the replaced entry's extra
    /// fields are kept. A file that exists but cannot be parsed is left
    /// untouched and nothing is recorded.
    pub async fn record(&self, key: &str, stats: &Stats) -> PackwrightResult<()> {
        let lock = file_lock(&self.path);
        let _guard = lock.lock().await;

        let mut entries = if self.path.exists() {
            match self.load().await? {
                Some(entries) => entries,
                None => {
                    warn!(
                        "Not recording {}: {} is not a JSON object",
                        key,
                        self.path.display()
                    );
                    return Ok(());
                }
            }
        } else {
            CacheFile::new()
        };

        let mut entry = match entries.remove(key) {
            Some(Value::Object(previous)) => previous,
            _ => Map::new(),
        };
        entry.insert("stats".to_string(), Value::Object(stats.clone()));
        entry.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);
        entries.insert(key.to_string(), Value::Object(entry));

        write_json_atomic(&self.path, &entries).await?;
        debug!("Recorded {} in live cache {}", key, self.path.display());
        Ok(())
    }

    async fn load(&self) -> PackwrightResult<Option<CacheFile>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            PackwrightError::io(format!("reading cache file {}", self.path.display()), e)
        })?;

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) => {
                warn!("Ignoring unreadable cache file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }
}
