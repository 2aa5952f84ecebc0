//! Convenience result type alias for Passage.

use crate::error::AppError;

/// A specialized `Result` type for Passage operations.
///
/// Every crate returns `AppResult<T>` instead of spelling out
/// `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;
