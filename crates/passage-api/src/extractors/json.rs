//! JSON body extractor that reports malformed bodies and failed field
//! validation as 400 responses with field-level details.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use passage_core::error::AppError;

use crate::error::ApiError;

/// Deserialized and validated JSON request body.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// Flatten validator errors into `{field: [messages]}`.
pub fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let mut details = serde_json::Map::new();
    for (field, issues) in errors.field_errors() {
        let messages: Vec<serde_json::Value> = issues
            .iter()
            .map(|issue| {
                let message = issue
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| issue.code.to_string());
                serde_json::Value::String(message)
            })
            .collect();
        details.insert(field.to_string(), serde_json::Value::Array(messages));
    }
    serde_json::Value::Object(details)
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::validation("Invalid request body")
                    .with_details(serde_json::json!({ "body": [rejection.body_text()] }))
            })?;

        value.validate().map_err(|errors| {
            AppError::validation("Validation failed").with_details(validation_details(&errors))
        })?;

        Ok(Self(value))
    }
}
