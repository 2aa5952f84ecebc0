//! `AuthUser` extractor: pulls the bearer credential from the Authorization
//! header, runs the full credential gate, and yields the caller's context.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use passage_auth::AuthContext;
use passage_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated caller available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

impl AuthUser {
    /// Returns the inner `AuthContext`.
    pub fn context(&self) -> &AuthContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = AuthContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Read the bearer credential from the Authorization header.
pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Rate-limit middleware may already have authenticated this request
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(AuthUser(ctx.clone()));
        }

        let token = bearer_token(parts)?;
        let ctx = state.auth.authenticate(token).await?;
        parts.extensions.insert(ctx.clone());

        Ok(AuthUser(ctx))
    }
}
