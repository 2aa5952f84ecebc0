//! Store manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use passage_core::config::StoreConfig;
use passage_core::error::AppError;
use passage_core::result::AppResult;
use passage_core::traits::CoordinationStore;

/// Store manager that wraps the configured coordination store.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner store.
    inner: Arc<dyn CoordinationStore>,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    pub async fn new(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn CoordinationStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis coordination store");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisStore::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory coordination store (single process only)");
                let store = crate::memory::MemoryStore::new();
                store.spawn_sweeper(Duration::from_secs(60));
                Arc::new(store)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a store manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CoordinationStore>) -> Self {
        Self { inner: provider }
    }

    /// Get a reference to the inner provider.
    pub fn provider(&self) -> &dyn CoordinationStore {
        self.inner.as_ref()
    }
}

#[async_trait]
impl CoordinationStore for StoreManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.set_nx(key, value, ttl).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> AppResult<bool> {
        self.inner.compare_and_delete(key, expected).await
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        self.inner.incr_with_expiry(key, ttl).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_provider_is_rejected() {
        let config = StoreConfig {
            provider: "memcached".to_string(),
            ..StoreConfig::default()
        };
        let err = StoreManager::new(&config).await.unwrap_err();
        assert_eq!(err.kind, passage_core::error::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_json_helpers_through_manager() {
        let manager = StoreManager::from_provider(Arc::new(crate::memory::MemoryStore::new()));
        manager
            .set_json("k", &serde_json::json!({"status": 201}), Duration::from_secs(5))
            .await
            .unwrap();
        let value: Option<serde_json::Value> = manager.get_json("k").await.unwrap();
        assert_eq!(value.unwrap()["status"], 201);
    }
}
