//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `PASSAGE__*` environment variables. Each sub-module
//! represents a logical configuration section. The loaded configuration is
//! immutable for the lifetime of the process.

pub mod auth;
pub mod database;
pub mod logging;
pub mod rate_limit;
pub mod server;
pub mod store;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::database::{DatabaseConfig, DirectoryConfig};
pub use self::logging::LoggingConfig;
pub use self::rate_limit::{RateLimitConfig, RatePolicy};
pub use self::server::ServerConfig;
pub use self::store::{RedisStoreConfig, StoreConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// configuration (default.toml + environment overlay + env vars).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// User directory backend selection.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Database connection settings (used by the `postgres` directory).
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Coordination store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Credential and registration settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Per-route rate limit policies.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `PASSAGE__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PASSAGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
