//! Auth handlers: register, login, me, logout, logout-all, refresh.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use passage_core::error::AppError;

use crate::dto::request::{LoginRequest, RefreshTokenBody, RegisterRequest};
use crate::dto::response::{AuthResponse, MeResponse, OkResponse, TokensResponse, UserResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// Client-chosen replay key for registration.
pub const IDEMPOTENCY_KEY: &str = "idempotency-key";
/// Alternative carrier for the refresh credential.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Refresh credential from the `X-Refresh-Token` header, else the body.
///
/// An empty or unparseable body counts as absent.
fn refresh_token_of(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    header_value(headers, REFRESH_TOKEN_HEADER).or_else(|| {
        serde_json::from_slice::<RefreshTokenBody>(body)
            .ok()
            .and_then(|b| b.refresh_token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let key = header_value(&headers, IDEMPOTENCY_KEY);
    let outcome = state.auth.register(req.into_input(key)).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(outcome))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let outcome = state.auth.login(req.into()).await?;
    Ok(Json(AuthResponse::from(outcome)))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: UserResponse::from(&auth.user),
    })
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<OkResponse>> {
    let refresh = refresh_token_of(&headers, &body);
    state.auth.logout(auth.context(), refresh.as_deref()).await?;
    Ok(Json(OkResponse::ok()))
}

/// POST /api/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<OkResponse>> {
    let refresh = refresh_token_of(&headers, &body);
    state
        .auth
        .logout_all(auth.context(), refresh.as_deref())
        .await?;
    Ok(Json(OkResponse::ok()))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<TokensResponse>> {
    let token = refresh_token_of(&headers, &body).ok_or_else(|| {
        AppError::validation("Validation failed").with_details(
            serde_json::json!({ "refresh_token": ["Refresh token is required"] }),
        )
    })?;
    let tokens = state.auth.refresh(&token).await?;
    Ok(Json(TokensResponse { tokens }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_wins_over_body() {
        let mut headers = HeaderMap::new();
        headers.insert(REFRESH_TOKEN_HEADER, HeaderValue::from_static("from-header"));
        let body = Bytes::from_static(br#"{"refresh_token":"from-body"}"#);
        assert_eq!(refresh_token_of(&headers, &body).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_body_fallback_and_garbage() {
        let headers = HeaderMap::new();
        let body = Bytes::from_static(br#"{"refreshToken":"camel"}"#);
        assert_eq!(refresh_token_of(&headers, &body).as_deref(), Some("camel"));
        assert_eq!(refresh_token_of(&headers, &Bytes::from_static(b"not json")), None);
        assert_eq!(refresh_token_of(&headers, &Bytes::new()), None);
    }
}
