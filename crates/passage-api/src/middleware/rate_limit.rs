//! Fixed-window rate limit middleware.
//!
//! Anonymous auth routes are keyed by caller address. Logout and admin
//! routes authenticate first and are keyed by the caller's user id; the
//! resolved `AuthContext` is left in the request extensions so handlers do
//! not run the credential gate twice.

use axum::extract::{FromRequestParts, MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use passage_auth::Admission;
use passage_core::config::RatePolicy;
use passage_core::error::AppError;

use crate::error::ApiResult;
use crate::extractors::{AuthUser, ClientAddr};
use crate::state::AppState;

const RATE_LIMITED: &str = "Too many requests, please slow down";

fn route_of(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

async fn enforce(
    state: &AppState,
    identity: &str,
    route: &str,
    policy: RatePolicy,
) -> Result<(), AppError> {
    match state.rate_limiter.admit(identity, route, policy).await? {
        Admission::Allowed { .. } => Ok(()),
        Admission::Denied { .. } => Err(AppError::rate_limited(RATE_LIMITED)),
    }
}

/// Register, login, and refresh: keyed by caller address.
pub async fn auth_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let (parts, body) = request.into_parts();
    let client = ClientAddr::from_parts(&parts, state.config.rate_limit.trust_forwarded_for);
    let request = Request::from_parts(parts, body);
    let route = route_of(&request);

    enforce(&state, client.as_str(), &route, state.config.rate_limit.auth).await?;
    Ok(next.run(request).await)
}

async fn authenticated_limit(
    state: &AppState,
    request: Request,
    next: Next,
    policy: RatePolicy,
) -> ApiResult<Response> {
    let route = route_of(&request);
    let (mut parts, body) = request.into_parts();
    let AuthUser(ctx) = AuthUser::from_request_parts(&mut parts, state).await?;

    enforce(state, &ctx.user.id.to_string(), &route, policy).await?;
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Logout and logout-all: keyed by user id.
pub async fn logout_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let policy = state.config.rate_limit.logout;
    authenticated_limit(&state, request, next, policy).await
}

/// Admin actions: keyed by the admin's user id.
pub async fn admin_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let policy = state.config.rate_limit.admin;
    authenticated_limit(&state, request, next, policy).await
}
