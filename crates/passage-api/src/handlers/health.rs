//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use passage_core::AppError;
use passage_core::traits::CoordinationStore;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

fn status_label(result: Result<bool, AppError>, component: &str) -> &'static str {
    match result {
        Ok(true) => "ok",
        Ok(false) => "unavailable",
        Err(e) => {
            warn!(component, error = %e, "Health check failed");
            "unavailable"
        }
    }
}

/// GET /api/health
///
/// 200 when the store and the directory both answer, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = status_label(state.store.health_check().await, "store");
    let directory = status_label(state.directory.health_check().await, "directory");
    let healthy = store == "ok" && directory == "ok";

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            store: store.to_string(),
            directory: directory.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
