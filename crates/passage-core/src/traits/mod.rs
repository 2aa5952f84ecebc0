//! Core traits defined in `passage-core` and implemented by other crates.

pub mod store;

pub use store::CoordinationStore;
