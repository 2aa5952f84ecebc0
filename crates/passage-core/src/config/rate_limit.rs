//! Rate limit configuration.

use serde::{Deserialize, Serialize};

/// A fixed-window limit: at most `max` requests per `window_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePolicy {
    /// Window length in seconds.
    pub window_seconds: u64,
    /// Maximum admitted requests per window.
    pub max: u64,
}

/// Per-route-group rate limit policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enforced at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Take the caller address from `X-Forwarded-For`. Enable only behind a
    /// proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
    /// Register, login, and refresh. Keyed by caller address.
    #[serde(default = "default_auth")]
    pub auth: RatePolicy,
    /// Logout and logout-all. Keyed by user id.
    #[serde(default = "default_logout")]
    pub logout: RatePolicy,
    /// Admin actions. Keyed by the admin's user id.
    #[serde(default = "default_logout")]
    pub admin: RatePolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            trust_forwarded_for: false,
            auth: default_auth(),
            logout: default_logout(),
            admin: default_logout(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_auth() -> RatePolicy {
    RatePolicy {
        window_seconds: 10,
        max: 5,
    }
}

fn default_logout() -> RatePolicy {
    RatePolicy {
        window_seconds: 60,
        max: 10,
    }
}
