//! Fixed-window request admission.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use passage_cache::{StoreManager, keys};
use passage_core::config::RatePolicy;
use passage_core::result::AppResult;
use passage_core::traits::CoordinationStore;

/// Result of asking the limiter for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Within the window's budget.
    Allowed {
        /// Requests seen in the current window, including this one.
        count: i64,
    },
    /// Over budget until the window expires.
    Denied {
        /// Requests seen in the current window, including this one.
        count: i64,
    },
}

impl Admission {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Fixed-window counter per (identity, route).
///
/// The window opens on the first request and is not sliding, so a burst
/// straddling a window boundary can reach twice the budget.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<StoreManager>,
    enabled: bool,
}

impl RateLimiter {
    /// Create a limiter on the given store.
    pub fn new(store: Arc<StoreManager>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Count one request from `identity` on `route` against `policy`.
    pub async fn admit(
        &self,
        identity: &str,
        route: &str,
        policy: RatePolicy,
    ) -> AppResult<Admission> {
        if !self.enabled {
            return Ok(Admission::Allowed { count: 0 });
        }
        let key = keys::rate_limit(identity, route);
        let count = self
            .store
            .incr_with_expiry(&key, Duration::from_secs(policy.window_seconds))
            .await?;
        if count > policy.max as i64 {
            debug!(identity, route, count, max = policy.max, "Rate limit exceeded");
            Ok(Admission::Denied { count })
        } else {
            Ok(Admission::Allowed { count })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_cache::memory::MemoryStore;

    fn limiter(enabled: bool) -> RateLimiter {
        RateLimiter::new(
            Arc::new(StoreManager::from_provider(Arc::new(MemoryStore::new()))),
            enabled,
        )
    }

    const POLICY: RatePolicy = RatePolicy {
        window_seconds: 10,
        max: 5,
    };

    #[tokio::test(start_paused = true)]
    async fn test_denies_over_budget_until_window_ends() {
        let limiter = limiter(true);
        for _ in 0..5 {
            assert!(limiter.admit("1.2.3.4", "/api/auth/login", POLICY).await.unwrap().is_allowed());
        }
        assert_eq!(
            limiter.admit("1.2.3.4", "/api/auth/login", POLICY).await.unwrap(),
            Admission::Denied { count: 6 }
        );

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(
            limiter.admit("1.2.3.4", "/api/auth/login", POLICY).await.unwrap(),
            Admission::Allowed { count: 1 }
        );
    }

    #[tokio::test]
    async fn test_identities_and_routes_are_separate() {
        let limiter = limiter(true);
        for _ in 0..5 {
            limiter.admit("a", "/r", POLICY).await.unwrap();
        }
        assert!(!limiter.admit("a", "/r", POLICY).await.unwrap().is_allowed());
        assert!(limiter.admit("b", "/r", POLICY).await.unwrap().is_allowed());
        assert!(limiter.admit("a", "/other", POLICY).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_disabled_limiter_admits_everything() {
        let limiter = limiter(false);
        for _ in 0..20 {
            assert!(limiter.admit("a", "/r", POLICY).await.unwrap().is_allowed());
        }
    }
}
