//! Notification API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::models::Notification;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::notification as notification_repo;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Query params for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// List the caller's notifications, newest first
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let records =
        notification_repo::list_for(&state.db, user.id, query.limit, query.offset)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(records))
}

/// Mark one of the caller's notifications as read
pub async fn mark_read(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<()>>> {
    let updated = notification_repo::mark_read(&state.db, id, user.id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    if !updated {
        return Err(AppError::not_found(format!("Notification {id} not found")));
    }
    Ok(ok(()))
}
