//! Custom Axum extractors.

pub mod auth;
pub mod client;
pub mod json;
pub mod path;

pub use auth::AuthUser;
pub use client::ClientAddr;
pub use json::ValidatedJson;
