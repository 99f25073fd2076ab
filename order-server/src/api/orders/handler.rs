//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::models::{Order, Role};
use shared::request::{OrderDraft, TransitionRequest};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::order as order_repo;
use crate::orders;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Query params for listing orders
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

/// Submit a new order (customer)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(draft): Json<OrderDraft>,
) -> AppResult<Json<Order>> {
    if user.role != Role::Customer {
        return Err(AppError::forbidden("Only customers submit orders"));
    }
    let order = orders::create_order(&state, &user, draft).await?;
    Ok(Json(order))
}

/// List all orders, newest first (operator)
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    if !user.is_operator() {
        return Err(AppError::forbidden("Operator role required"));
    }
    let orders = order_repo::find_all(&state.db, query.limit, query.offset)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(orders))
}

/// Get order by id (owner or operator)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = order_repo::get(&state.db, id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .filter(|o| o.deleted_at.is_none())
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    if !user.is_operator() && order.customer.id != user.id {
        return Err(AppError::forbidden("Not your order"));
    }
    Ok(Json(order))
}

/// Transition order status (operator)
pub async fn transition_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<TransitionRequest>,
) -> AppResult<Json<Order>> {
    let order = orders::transition(&state, &user, id, payload.status).await?;
    Ok(Json(order))
}

/// Soft-delete an order in terminal status (operator)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<()>>> {
    orders::delete_order(&state, &user, id).await?;
    Ok(ok(()))
}
