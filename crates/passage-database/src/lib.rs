//! # passage-database
//!
//! The user directory: the persistent record store for identities.
//! Provides the [`UserDirectory`] trait, a PostgreSQL implementation, an
//! in-memory implementation for single-process runs and tests, and the
//! Argon2 hasher every write path uses.

pub mod connection;
pub mod directory;
pub mod memory;
pub mod migration;
pub mod password;
pub mod repositories;

pub use connection::DatabasePool;
pub use directory::{DUPLICATE_IDENTITY, UserDirectory};
pub use memory::MemoryUserDirectory;
pub use password::PasswordHasher;
pub use repositories::UserRepository;
