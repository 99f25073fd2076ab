//! Order State Machine
//!
//! Validates and applies lifecycle transitions:
//!
//! ```text
//! pending ──▶ processing ──▶ shipped ──▶ delivered
//!    │
//!    └──▶ cancelled
//! ```
//!
//! Only operators may transition, strict adjacency is enforced, and the
//! notification record shares the transaction with the status update so
//! no transition can be observed without its durable ledger entry. The
//! bus publish follows the commit on the same task.

use shared::event::OrderEvent;
use shared::models::{NotificationCategory, Order, OrderStatus};
use shared::util;

use super::error::OrderError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, notification, order as order_repo};

/// Notification category and customer-facing message for a transition
fn describe(status: OrderStatus) -> (NotificationCategory, &'static str) {
    match status {
        OrderStatus::Processing => (
            NotificationCategory::OrderAccepted,
            "Order accepted and being prepared",
        ),
        OrderStatus::Shipped => (NotificationCategory::StatusChanged, "Order shipped"),
        OrderStatus::Delivered => (NotificationCategory::StatusChanged, "Order delivered"),
        OrderStatus::Cancelled => (NotificationCategory::OrderRejected, "Order cancelled"),
        // Nothing transitions back into pending; intake covers it
        OrderStatus::Pending => (
            NotificationCategory::StatusChanged,
            "Order submitted, awaiting approval",
        ),
    }
}

/// Apply a lifecycle transition.
///
/// The requested status must be the immediate successor of the current one
/// in the graph above; anything else is rejected with `InvalidTransition`
/// and the stored status stays untouched.
pub async fn transition(
    state: &ServerState,
    actor: &CurrentUser,
    order_id: i64,
    requested: OrderStatus,
) -> Result<Order, OrderError> {
    // Customers never mutate status directly, whatever the route says
    if !actor.is_operator() {
        return Err(OrderError::OperatorOnly);
    }

    let mut tx = state.db.begin().await.map_err(RepoError::from)?;

    let order = order_repo::find_by_id(&mut tx, order_id)
        .await?
        .filter(|o| o.deleted_at.is_none())
        .ok_or(OrderError::OrderNotFound(order_id))?;

    if !order.status.can_transition_to(requested) {
        return Err(OrderError::InvalidTransition {
            from: order.status,
            to: requested,
        });
    }

    let now = util::now_millis();
    order_repo::update_status(&mut tx, order_id, requested, now).await?;

    let (category, message) = describe(requested);
    notification::record(&mut tx, order.customer.id, order_id, category, message).await?;

    tx.commit().await.map_err(RepoError::from)?;

    let mut updated = order;
    updated.status = requested;
    updated.updated_at = now;

    tracing::info!(
        order_id,
        operator_id = actor.id,
        status = %requested,
        "Order transitioned"
    );

    state.publish_event(OrderEvent::OrderStatusChanged {
        order_id,
        status: requested,
        updated_at: now,
        order: updated.clone(),
    });

    Ok(updated)
}

/// Soft-delete an order from a terminal status.
///
/// The row is retained for audit; only the marker is set. Publishes
/// `OrderDeleted` after the commit.
pub async fn delete_order(
    state: &ServerState,
    actor: &CurrentUser,
    order_id: i64,
) -> Result<(), OrderError> {
    if !actor.is_operator() {
        return Err(OrderError::OperatorOnly);
    }

    let mut tx = state.db.begin().await.map_err(RepoError::from)?;

    let order = order_repo::find_by_id(&mut tx, order_id)
        .await?
        .filter(|o| o.deleted_at.is_none())
        .ok_or(OrderError::OrderNotFound(order_id))?;

    if !order.status.is_terminal() {
        return Err(OrderError::NotDeletable(order.status));
    }

    let now = util::now_millis();
    order_repo::soft_delete(&mut tx, order_id, now).await?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(order_id, operator_id = actor.id, "Order soft-deleted");

    state.publish_event(OrderEvent::OrderDeleted { order_id });

    Ok(())
}
