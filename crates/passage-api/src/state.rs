//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use passage_auth::{AuthSessionOrchestrator, CredentialService, RateLimiter};
use passage_cache::StoreManager;
use passage_core::config::AppConfig;
use passage_core::result::AppResult;
use passage_database::UserDirectory;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration, immutable after startup.
    pub config: Arc<AppConfig>,
    /// Coordination store (Redis or in-memory).
    pub store: Arc<StoreManager>,
    /// User directory (Postgres or in-memory).
    pub directory: Arc<dyn UserDirectory>,
    /// Session lifecycle orchestrator.
    pub auth: Arc<AuthSessionOrchestrator>,
    /// Fixed-window request limiter.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build the state from configuration and the two backing stores.
    ///
    /// Fails if the signing secret is not configured.
    pub fn new(
        config: Arc<AppConfig>,
        directory: Arc<dyn UserDirectory>,
        store: Arc<StoreManager>,
    ) -> AppResult<Self> {
        let credentials = Arc::new(CredentialService::new(&config.auth)?);
        let auth = Arc::new(AuthSessionOrchestrator::new(
            Arc::clone(&directory),
            Arc::clone(&store),
            credentials,
            &config.auth,
        ));
        let rate_limiter = Arc::new(RateLimiter::new(
            Arc::clone(&store),
            config.rate_limit.enabled,
        ));

        Ok(Self {
            config,
            store,
            directory,
            auth,
            rate_limiter,
        })
    }
}
