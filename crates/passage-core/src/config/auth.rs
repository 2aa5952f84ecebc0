//! Authentication configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credential, hashing, and registration configuration.
///
/// Read once at startup; the signing secret is never mutated afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for credential signing (HMAC-SHA256). Required.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// `iss` claim stamped into and required from every credential.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// `aud` claim stamped into and required from every credential.
    #[serde(default = "default_audience")]
    pub jwt_audience: String,
    /// Access credential TTL in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_seconds: u64,
    /// Refresh credential TTL in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_seconds: u64,
    /// Clock skew tolerated when checking `exp`.
    #[serde(default)]
    pub leeway_seconds: u64,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_hash_memory")]
    pub password_hash_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_hash_iterations")]
    pub password_hash_iterations: u32,
    /// TTL of the registration lock leases.
    #[serde(default = "default_lock_ttl")]
    pub register_lock_ttl_seconds: u64,
    /// TTL of registration idempotency stamps.
    #[serde(default = "default_idempotency_ttl")]
    pub idempotency_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_issuer: default_issuer(),
            jwt_audience: default_audience(),
            access_ttl_seconds: default_access_ttl(),
            refresh_ttl_seconds: default_refresh_ttl(),
            leeway_seconds: 0,
            password_hash_memory_kib: default_hash_memory(),
            password_hash_iterations: default_hash_iterations(),
            register_lock_ttl_seconds: default_lock_ttl(),
            idempotency_ttl_seconds: default_idempotency_ttl(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "****"))
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_audience", &self.jwt_audience)
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("register_lock_ttl_seconds", &self.register_lock_ttl_seconds)
            .field("idempotency_ttl_seconds", &self.idempotency_ttl_seconds)
            .finish()
    }
}

fn default_issuer() -> String {
    "passage".to_string()
}

fn default_audience() -> String {
    "passage-clients".to_string()
}

fn default_access_ttl() -> u64 {
    15 * 60
}

fn default_refresh_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_hash_memory() -> u32 {
    19 * 1024
}

fn default_hash_iterations() -> u32 {
    2
}

fn default_lock_ttl() -> u64 {
    30
}

fn default_idempotency_ttl() -> u64 {
    600
}
