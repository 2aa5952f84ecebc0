//! Coordination store trait for the shared key-value backend.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for the remote key-value store shared by every server process.
///
/// Every coordination primitive (leases, idempotency stamps, rate counters,
/// revocation entries) is built on these operations. Implementations must
/// make `set_nx`, `compare_and_delete`, and `incr_with_expiry` atomic on the
/// store side; callers never emulate them with a read followed by a write.
#[async_trait]
pub trait CoordinationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Delete a key.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a live key exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Set a value only if the key does not already exist (SET NX EX).
    /// Returns `true` if the value was set, `false` if the key was held.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool>;

    /// Delete the key only if its current value equals `expected`.
    /// Returns `true` if the key was deleted.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> AppResult<bool>;

    /// Increment an integer counter by 1, setting `ttl` only when the
    /// increment created the key. Returns the new value.
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> AppResult<i64>;

    /// Get a typed value by deserializing from JSON.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key).await? {
            Some(value) => {
                let parsed = serde_json::from_str(&value)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value by serializing to JSON.
    async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>
    where
        Self: Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set(key, &json, ttl).await
    }

    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
