//! Passage Server: session credential service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use passage_api::{AppState, build_router};
use passage_cache::StoreManager;
use passage_core::config::AppConfig;
use passage_core::error::AppError;
use passage_database::{
    DatabasePool, MemoryUserDirectory, PasswordHasher, UserDirectory, UserRepository,
};

#[tokio::main]
async fn main() {
    let env = std::env::var("PASSAGE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Open the configured user directory, running migrations for Postgres.
async fn open_directory(
    config: &AppConfig,
) -> Result<(Arc<dyn UserDirectory>, Option<DatabasePool>), AppError> {
    let hasher = PasswordHasher::from_config(&config.auth)?;

    match config.directory.provider.as_str() {
        "postgres" => {
            tracing::info!("Connecting to database...");
            let pool = DatabasePool::connect(&config.database).await?;

            pool.migrate().await?;

            let repo = UserRepository::new(pool.pool().clone(), hasher);
            Ok((Arc::new(repo), Some(pool)))
        }
        "memory" => {
            tracing::warn!("Using in-memory user directory; identities are lost on restart");
            Ok((Arc::new(MemoryUserDirectory::new(hasher)), None))
        }
        other => Err(AppError::configuration(format!(
            "Unknown directory provider: '{other}'"
        ))),
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Passage v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // ── Step 1: User directory ───────────────────────────────────
    let (directory, db_pool) = open_directory(&config).await?;

    // ── Step 2: Coordination store ───────────────────────────────
    tracing::info!(provider = %config.store.provider, "Initializing coordination store...");
    let store = Arc::new(StoreManager::new(&config.store).await?);
    tracing::info!("Coordination store initialized");

    // ── Step 3: Application state and router ─────────────────────
    let state = AppState::new(Arc::clone(&config), directory, store)?;
    let app = build_router(state);

    // ── Step 4: Bind and serve ───────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!(addr = %addr, "Passage listening");

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
    });

    // ── Step 5: Graceful shutdown ────────────────────────────────
    let result = tokio::select! {
        joined = &mut server => Some(joined),
        _ = shutdown_signal() => None,
    };

    let result = match result {
        Some(joined) => joined,
        None => {
            tracing::info!("Shutdown signal received, draining connections...");
            let _ = shutdown_tx.send(true);
            let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
            match tokio::time::timeout(grace, &mut server).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(grace_seconds = grace.as_secs(), "Grace period elapsed");
                    server.abort();
                    Ok(Ok(()))
                }
            }
        }
    };

    if let Some(pool) = db_pool {
        pool.close().await;
    }

    match result {
        Ok(Ok(())) => {
            tracing::info!("Passage shut down gracefully");
            Ok(())
        }
        Ok(Err(e)) => Err(AppError::internal(format!("Server error: {e}"))),
        Err(e) => Err(AppError::internal(format!("Server task failed: {e}"))),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
