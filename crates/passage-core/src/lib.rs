//! # passage-core
//!
//! Core crate for Passage. Contains the coordination-store trait,
//! configuration schemas, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Passage crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
