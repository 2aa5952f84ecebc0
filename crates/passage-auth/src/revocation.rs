//! Deny-list of revoked credential ids.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use passage_cache::{StoreManager, keys};
use passage_core::result::AppResult;
use passage_core::traits::CoordinationStore;

use crate::credential::Claims;

/// Deny-list backed by the coordination store.
///
/// Each entry lives exactly as long as the credential it revokes would have,
/// so the list never grows without bound.
#[derive(Debug, Clone)]
pub struct RevocationRegistry {
    store: Arc<StoreManager>,
}

impl RevocationRegistry {
    /// Create a registry on the given store.
    pub fn new(store: Arc<StoreManager>) -> Self {
        Self { store }
    }

    /// Deny `jti` until `expires_at` (seconds since epoch).
    ///
    /// Returns `false` without writing when the credential is already expired.
    pub async fn deny_until(&self, jti: Uuid, expires_at: i64) -> AppResult<bool> {
        let remaining = expires_at - Utc::now().timestamp();
        if remaining <= 0 {
            return Ok(false);
        }
        self.store
            .set(
                &keys::denied_jti(&jti.to_string()),
                "1",
                Duration::from_secs(remaining as u64),
            )
            .await?;
        debug!(%jti, ttl_seconds = remaining, "Credential denied");
        Ok(true)
    }

    /// Deny `jti` only if no one has denied it yet.
    ///
    /// Returns `true` for exactly one caller per live credential, which
    /// makes single-use rotation race-free across processes.
    pub async fn deny_first(&self, jti: Uuid, expires_at: i64) -> AppResult<bool> {
        let remaining = expires_at - Utc::now().timestamp();
        if remaining <= 0 {
            return Ok(false);
        }
        self.store
            .set_nx(
                &keys::denied_jti(&jti.to_string()),
                "1",
                Duration::from_secs(remaining as u64),
            )
            .await
    }

    /// Deny the credential described by `claims`.
    pub async fn deny(&self, claims: &Claims) -> AppResult<bool> {
        self.deny_until(claims.jti, claims.exp).await
    }

    /// Whether `jti` is currently denied.
    pub async fn is_denied(&self, jti: Uuid) -> AppResult<bool> {
        self.store.exists(&keys::denied_jti(&jti.to_string())).await
    }
}
