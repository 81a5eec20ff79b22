//! Year-keyed snapshot cache
//!
//! Historical snapshots never expire. A stored record that fails to decode
//! or validate is evicted and reported as a miss.

pub mod store;

pub use store::{DirectoryStore, KeyValueStore, MemoryStore};

use crate::core::calendar::Year;
use crate::core::error::{ChronoError, Result};
use crate::snapshot::model::Snapshot;
use crate::snapshot::schema::parse_snapshot;

/// Default key prefix; the year is appended verbatim
pub const DEFAULT_PREFIX: &str = "chronomap_data_";

/// Persistence for year -> snapshot
pub trait SnapshotCache: Send + Sync {
    /// Cached snapshot for `year`; corrupt entries read as absent
    fn get(&self, year: Year) -> Option<Snapshot>;

    /// Store `snapshot` under `year`, replacing any previous record
    fn put(&self, year: Year, snapshot: &Snapshot) -> Result<()>;

    fn invalidate(&self, year: Year);

    fn contains(&self, year: Year) -> bool {
        self.get(year).is_some()
    }
}

/// Snapshot cache storing JSON records in a [`KeyValueStore`]
#[derive(Debug)]
pub struct JsonSnapshotCache<S> {
    store: S,
    prefix: String,
}

impl<S: KeyValueStore> JsonSnapshotCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, DEFAULT_PREFIX)
    }

    pub fn with_prefix(store: S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn key_for(&self, year: Year) -> String {
        format!("{}{}", self.prefix, year)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn evict_corrupt(&self, key: &str, reason: String) {
        let err = ChronoError::CacheCorrupt {
            key: key.to_string(),
            reason,
        };
        tracing::warn!("{} - evicting", err);
        if let Err(e) = self.store.remove(key) {
            tracing::warn!("Failed to evict {}: {}", key, e);
        }
    }
}

impl JsonSnapshotCache<MemoryStore> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: KeyValueStore> SnapshotCache for JsonSnapshotCache<S> {
    fn get(&self, year: Year) -> Option<Snapshot> {
        let key = self.key_for(year);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(ChronoError::CacheCorrupt { reason, .. }) => {
                self.evict_corrupt(&key, reason);
                return None;
            }
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match parse_snapshot(&raw, year) {
            Ok(snapshot) => Some(snapshot),
            Err(violation) => {
                self.evict_corrupt(&key, violation.to_string());
                None
            }
        }
    }

    fn put(&self, year: Year, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.store.set(&self.key_for(year), &json)
    }

    fn invalidate(&self, year: Year) {
        let key = self.key_for(year);
        if let Err(e) = self.store.remove(&key) {
            tracing::warn!("Failed to invalidate {}: {}", key, e);
        }
    }
}
