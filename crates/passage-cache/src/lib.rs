//! # passage-cache
//!
//! Coordination store implementations for Passage. Supports two modes:
//!
//! - **redis**: the shared store every server process talks to, using the
//!   [redis](https://crates.io/crates/redis) crate
//! - **memory**: an in-process store for single-node runs and tests
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::StoreManager;
