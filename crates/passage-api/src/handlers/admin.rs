//! Admin handlers: forced logout, deactivation, reactivation.

use axum::Json;
use axum::extract::{Path, State};
use tracing::info;

use crate::dto::response::OkResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::extractors::path::parse_uuid;
use crate::state::AppState;

/// POST /api/admin/users/{id}/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let target = parse_uuid(&id)?;
    state.auth.admin_logout_all(auth.context(), target).await?;
    Ok(Json(OkResponse::ok()))
}

/// POST /api/admin/users/{id}/deactivate
pub async fn deactivate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let target = parse_uuid(&id)?;
    let user = state.auth.deactivate(auth.context(), target).await?;
    info!(admin_id = %auth.user.id, user_id = %user.id, "Account deactivated via API");
    Ok(Json(OkResponse::ok()))
}

/// POST /api/admin/users/{id}/reactivate
pub async fn reactivate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let target = parse_uuid(&id)?;
    let user = state.auth.reactivate(auth.context(), target).await?;
    info!(admin_id = %auth.user.id, user_id = %user.id, "Account reactivated via API");
    Ok(Json(OkResponse::ok()))
}
