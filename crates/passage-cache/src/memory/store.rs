//! In-memory coordination store backed by a sharded concurrent map.
//!
//! Only suitable when a single process serves all traffic: leases and
//! counters are not visible to any other process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use passage_core::error::AppError;
use passage_core::result::AppResult;
use passage_core::traits::CoordinationStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: impl Into<String>, ttl: Duration) -> Self {
        Self {
            value: value.into(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory coordination store with per-entry expiry.
///
/// Atomic operations are performed under the map's shard lock for the key,
/// so they are linearizable within the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Periodically purge expired entries in the background.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = store.purge_expired();
                if removed > 0 {
                    debug!(removed, "Purged expired in-memory store entries");
                }
            }
        })
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => return Ok(None),
        };
        if value.is_none() {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        let acquired = match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    false
                } else {
                    occupied.insert(Entry::new(value, ttl));
                    true
                }
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry::new(value, ttl));
                true
            }
        };
        Ok(acquired)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> AppResult<bool> {
        let now = Instant::now();
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.is_live(now) && entry.value == expected);
        Ok(removed.is_some())
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) if occupied.get().is_live(now) => {
                let current: i64 = occupied.get().value.parse().map_err(|_| {
                    AppError::cache(format!("Value at '{key}' is not an integer counter"))
                })?;
                let next = current + 1;
                occupied.get_mut().value = next.to_string();
                Ok(next)
            }
            MapEntry::Occupied(mut occupied) => {
                occupied.insert(Entry::new("1", ttl));
                Ok(1)
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry::new("1", ttl));
                Ok(1)
            }
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
