//! Order Intake Service
//!
//! Validates a submitted cart, reserves inventory, and persists the order
//! atomically. Every step up to the commit runs inside one transaction;
//! dropping the transaction on any early return releases the reservations
//! with it. The notification write and the bus publish happen strictly
//! after the commit, never before.

use shared::event::OrderEvent;
use shared::models::{
    CustomerSummary, NotificationCategory, Order, OrderLine, OrderStatus, PaymentStatus,
};
use shared::request::{LineDraft, OrderDraft};
use shared::util;

use super::error::OrderError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::product::ReserveOutcome;
use crate::db::repository::{RepoError, notification, order as order_repo, product};

/// Maximum quantity per line
const MAX_QUANTITY: i32 = 9999;
/// Maximum unit price per line (cents)
const MAX_UNIT_PRICE: i64 = 100_000_000;
/// Maximum delivery address length
const MAX_ADDRESS_LEN: usize = 500;

/// Validate a submitted cart before touching storage
fn validate_draft(draft: &OrderDraft) -> Result<(), OrderError> {
    if draft.lines.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let address = draft.delivery_address.trim();
    if address.is_empty() {
        return Err(OrderError::Validation("delivery address is required".into()));
    }
    if address.len() > MAX_ADDRESS_LEN {
        return Err(OrderError::Validation(format!(
            "delivery address exceeds {MAX_ADDRESS_LEN} characters"
        )));
    }

    for line in &draft.lines {
        let quantity = line.quantity();
        if quantity <= 0 {
            return Err(OrderError::Validation(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        if quantity > MAX_QUANTITY {
            return Err(OrderError::Validation(format!(
                "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
            )));
        }

        let unit_price = line.unit_price();
        if unit_price < 0 {
            return Err(OrderError::Validation(format!(
                "unit price must be non-negative, got {unit_price}"
            )));
        }
        if unit_price > MAX_UNIT_PRICE {
            return Err(OrderError::Validation(format!(
                "unit price exceeds maximum allowed ({MAX_UNIT_PRICE}), got {unit_price}"
            )));
        }

        if let LineDraft::Bundle { title, items, .. } = line {
            if title.trim().is_empty() {
                return Err(OrderError::Validation("bundle title is required".into()));
            }
            if items.is_empty() {
                return Err(OrderError::Validation(
                    "bundle must reference at least one product".into(),
                ));
            }
        }
    }

    Ok(())
}

/// Create an order from a validated cart.
///
/// Inside one transaction: resolve and reserve every product line, persist
/// the order with status `pending`, persist the lines with their
/// price-at-order-time, commit. On success the notification record is
/// written and `OrderCreated` is published — in that order, after the
/// commit.
///
/// Lines carry the unit price the customer saw at submission time; the
/// total is the sum of those frozen prices and is never re-derived from
/// the catalog.
pub async fn create_order(
    state: &ServerState,
    customer: &CurrentUser,
    draft: OrderDraft,
) -> Result<Order, OrderError> {
    validate_draft(&draft)?;

    let mut tx = state.db.begin().await.map_err(RepoError::from)?;

    let mut lines = Vec::with_capacity(draft.lines.len());
    for line in &draft.lines {
        match line {
            LineDraft::Product {
                product_id,
                quantity,
                unit_price,
            } => {
                // The reservation UPDATE is the first statement touching
                // this row, so concurrent intakes serialize on it and the
                // stock invariant holds.
                let outcome =
                    product::reserve_stock(&mut tx, *product_id, *quantity as i64).await?;
                match outcome {
                    ReserveOutcome::Reserved { name, .. } => {
                        lines.push(OrderLine::Product {
                            product_id: *product_id,
                            name,
                            quantity: *quantity,
                            unit_price: *unit_price,
                        });
                    }
                    ReserveOutcome::InsufficientStock { available } => {
                        // Dropping the transaction rolls back any earlier
                        // reservations of this order.
                        return Err(OrderError::InsufficientStock {
                            product_id: *product_id,
                            requested: *quantity as i64,
                            available,
                        });
                    }
                    ReserveOutcome::NotFound => {
                        return Err(OrderError::ProductNotFound(*product_id));
                    }
                }
            }
            LineDraft::Bundle {
                title,
                description,
                items,
                quantity,
                unit_price,
            } => {
                // Bundles are materialized snapshots; their constituents
                // were validated at presentation time, no stock check here.
                lines.push(OrderLine::Bundle {
                    title: title.clone(),
                    description: description.clone(),
                    items: items.clone(),
                    quantity: *quantity,
                    unit_price: *unit_price,
                });
            }
        }
    }

    let total_amount: i64 = lines.iter().map(OrderLine::line_total).sum();
    let now = util::now_millis();
    let order = Order {
        id: util::snowflake_id(),
        customer: CustomerSummary {
            id: customer.id,
            name: Some(customer.name.clone()),
        },
        lines,
        total_amount,
        delivery_address: draft.delivery_address.trim().to_string(),
        payment_method: draft.payment_method,
        payment_status: PaymentStatus::Pending,
        status: OrderStatus::Pending,
        comment: draft.comment.clone(),
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    order_repo::insert(&mut tx, &order).await?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        order_id = order.id,
        customer_id = customer.id,
        total_amount,
        "Order created"
    );

    // After commit: durable notification first, then the real-time push.
    // Neither may fail the request — the order already exists.
    match state.db.acquire().await {
        Ok(mut conn) => {
            if let Err(e) = notification::record(
                &mut conn,
                customer.id,
                order.id,
                NotificationCategory::StatusChanged,
                "Order submitted, awaiting approval",
            )
            .await
            {
                tracing::error!(order_id = order.id, error = %e, "Failed to write intake notification");
            }
        }
        Err(e) => {
            tracing::error!(order_id = order.id, error = %e, "Failed to acquire connection for intake notification");
        }
    }

    state.publish_event(OrderEvent::OrderCreated {
        order: order.clone(),
    });

    Ok(order)
}
