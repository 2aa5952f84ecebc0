//! # passage-api
//!
//! HTTP API layer for Passage built on Axum.
//!
//! Provides the auth and admin endpoints, middleware (rate limiting,
//! logging), extractors, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use router::build_router;
pub use state::AppState;
