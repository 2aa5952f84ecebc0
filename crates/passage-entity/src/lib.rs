//! # passage-entity
//!
//! Domain entity models for Passage. `User` is the persistent identity
//! record owned by the user directory; the session core reads it and
//! mutates only `token_version` and `is_active`.

pub mod user;
