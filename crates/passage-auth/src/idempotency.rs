//! Replay stamps for registration.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use passage_cache::{StoreManager, keys};
use passage_core::result::AppResult;
use passage_core::traits::CoordinationStore;

/// The recorded outcome of a completed registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyStamp {
    /// HTTP status the original request produced.
    pub status: u16,
    /// Identity the original request created.
    pub user_id: Uuid,
}

/// Replay cache mapping request fingerprints to stamped outcomes.
///
/// Stamps are never rewritten; they simply expire.
#[derive(Debug, Clone)]
pub struct IdempotencyCache {
    store: Arc<StoreManager>,
}

impl IdempotencyCache {
    /// Create a cache on the given store.
    pub fn new(store: Arc<StoreManager>) -> Self {
        Self { store }
    }

    /// Business fingerprint of a registration.
    pub fn registration_key(email: &str, username: &str) -> String {
        keys::register_stamp(email, username)
    }

    /// Key for a client-supplied idempotency key.
    pub fn request_key(client_key: &str) -> String {
        keys::request_stamp(client_key)
    }

    /// Look up a stamp. A value that does not parse is dropped and reported as a miss.
    pub async fn get(&self, key: &str) -> AppResult<Option<IdempotencyStamp>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(stamp) => Ok(Some(stamp)),
            Err(e) => {
                warn!(key, error = %e, "Discarding malformed idempotency stamp");
                self.discard(key).await?;
                Ok(None)
            }
        }
    }

    /// Record a stamp for `ttl`.
    pub async fn put(&self, key: &str, stamp: &IdempotencyStamp, ttl: Duration) -> AppResult<()> {
        self.store.set_json(key, stamp, ttl).await
    }

    /// Remove a stamp.
    pub async fn discard(&self, key: &str) -> AppResult<()> {
        self.store.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_cache::memory::MemoryStore;

    fn cache() -> (IdempotencyCache, Arc<StoreManager>) {
        let store = Arc::new(StoreManager::from_provider(Arc::new(MemoryStore::new())));
        (IdempotencyCache::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (cache, _) = cache();
        let key = IdempotencyCache::registration_key("a@x.com", "alice");
        let stamp = IdempotencyStamp {
            status: 201,
            user_id: Uuid::new_v4(),
        };
        cache.put(&key, &stamp, Duration::from_secs(600)).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(stamp));
    }

    #[tokio::test]
    async fn test_malformed_stamp_is_discarded() {
        let (cache, store) = cache();
        let key = IdempotencyCache::request_key("client-key-1");
        store.set(&key, "{not json", Duration::from_secs(60)).await.unwrap();

        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(!store.exists(&key).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stamp_expires() {
        let (cache, _) = cache();
        let key = IdempotencyCache::registration_key("a@x.com", "alice");
        let stamp = IdempotencyStamp {
            status: 201,
            user_id: Uuid::new_v4(),
        };
        cache.put(&key, &stamp, Duration::from_secs(600)).await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        assert!(cache.get(&key).await.unwrap().is_none());
    }
}
