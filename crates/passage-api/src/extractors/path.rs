//! Path parameter helpers.

use uuid::Uuid;

use passage_core::error::AppError;

/// Parse a user id from a path segment, mapping failure to a 400.
pub fn parse_uuid(value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|_| AppError::validation(format!("Invalid UUID: '{value}'")))
}
