//! Route definitions for the Passage HTTP API.
//!
//! All routes are mounted under `/api`. Each route group carries its own
//! rate-limit layer so the limiter sees the matched route.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Request bodies on this API are small JSON documents.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    let api_routes = Router::new()
        .merge(auth_routes(&state))
        .merge(session_routes(&state))
        .merge(admin_routes(&state))
        .route("/health", get(handlers::health::health_check));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Anonymous auth endpoints, limited per caller address.
fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::auth_rate_limit,
        ))
}

/// Authenticated session endpoints. Logout routes are limited per user.
fn session_routes(state: &AppState) -> Router<AppState> {
    let logout = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/logout-all", post(handlers::auth::logout_all))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::logout_rate_limit,
        ));

    Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .merge(logout)
}

/// Admin account management, limited per admin.
fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/admin/users/{id}/logout-all",
            post(handlers::admin::logout_all),
        )
        .route(
            "/admin/users/{id}/deactivate",
            post(handlers::admin::deactivate),
        )
        .route(
            "/admin/users/{id}/reactivate",
            post(handlers::admin::reactivate),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::admin_rate_limit,
        ))
}
