//! State machine tests: adjacency, authorization, deletion gating, and
//! the notification ledger

mod common;

use order_server::db::repository::{notification, order as order_repo};
use order_server::orders::{self, OrderError};
use shared::models::{
    NotificationCategory, OrderStatus, PaymentMethod,
};
use shared::request::{LineDraft, OrderDraft};

async fn submitted_order(
    state: &order_server::ServerState,
    customer_id: i64,
) -> shared::models::Order {
    let product_id = common::seed_product(state, "Tea sampler", 1500, 100).await;
    orders::create_order(
        state,
        &common::customer(customer_id),
        OrderDraft {
            lines: vec![LineDraft::Product {
                product_id,
                quantity: 1,
                unit_price: 1500,
            }],
            delivery_address: "5 Quay Lane".into(),
            payment_method: PaymentMethod::Cash,
            comment: None,
        },
    )
    .await
    .expect("order intake")
}

#[tokio::test]
async fn happy_path_walks_the_graph() {
    let (state, _dir) = common::test_state().await;
    let order = submitted_order(&state, 42).await;
    let operator = common::operator(1);

    assert_eq!(order.status, OrderStatus::Pending);

    let order = orders::transition(&state, &operator, order.id, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Processing);

    let order = orders::transition(&state, &operator, order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);

    let order = orders::transition(&state, &operator, order.id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);

    // Every step left a durable notification
    let records = notification::list_for(&state.db, 42, 50, 0).await.unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|n| n.order_id == order.id && !n.is_read));
    let accepted = records
        .iter()
        .filter(|n| n.category == NotificationCategory::OrderAccepted)
        .count();
    let status_changed = records
        .iter()
        .filter(|n| n.category == NotificationCategory::StatusChanged)
        .count();
    assert_eq!(accepted, 1); // processing
    assert_eq!(status_changed, 3); // intake, shipped, delivered
}

#[tokio::test]
async fn non_adjacent_jumps_are_rejected() {
    let (state, _dir) = common::test_state().await;
    let order = submitted_order(&state, 42).await;
    let operator = common::operator(1);

    // pending → shipped skips processing
    let err = orders::transition(&state, &operator, order.id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped,
        }
    ));

    // Stored status is untouched
    let stored = order_repo::get(&state.db, order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn terminal_statuses_are_closed() {
    let (state, _dir) = common::test_state().await;
    let order = submitted_order(&state, 42).await;
    let operator = common::operator(1);

    for status in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        orders::transition(&state, &operator, order.id, status)
            .await
            .unwrap();
    }

    // delivered → processing must be rejected and leave the row alone
    let err = orders::transition(&state, &operator, order.id, OrderStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    let stored = order_repo::get(&state.db, order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn customers_cannot_drive_the_state_machine() {
    let (state, _dir) = common::test_state().await;
    let order = submitted_order(&state, 42).await;

    let err = orders::transition(
        &state,
        &common::customer(42),
        order.id,
        OrderStatus::Processing,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OrderError::OperatorOnly));
}

#[tokio::test]
async fn cancellation_is_pending_only() {
    let (state, _dir) = common::test_state().await;
    let order = submitted_order(&state, 42).await;
    let operator = common::operator(1);

    orders::transition(&state, &operator, order.id, OrderStatus::Processing)
        .await
        .unwrap();

    let err = orders::transition(&state, &operator, order.id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
async fn deletion_requires_a_terminal_status() {
    let (state, _dir) = common::test_state().await;
    let order = submitted_order(&state, 42).await;
    let operator = common::operator(1);

    let err = orders::delete_order(&state, &operator, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotDeletable(OrderStatus::Pending)));

    orders::transition(&state, &operator, order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    orders::delete_order(&state, &operator, order.id)
        .await
        .unwrap();

    // Soft-deleted: row retained with the marker set, hidden from listings
    let stored = order_repo::get(&state.db, order.id).await.unwrap().unwrap();
    assert!(stored.deleted_at.is_some());
    let listed = order_repo::find_all(&state.db, 50, 0).await.unwrap();
    assert!(listed.iter().all(|o| o.id != order.id));

    // And gone for further lifecycle work
    let err = orders::delete_order(&state, &operator, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(_)));
}

#[tokio::test]
async fn unknown_order_is_reported_as_missing() {
    let (state, _dir) = common::test_state().await;
    let err = orders::transition(
        &state,
        &common::operator(1),
        987654,
        OrderStatus::Processing,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(987654)));
}

#[tokio::test]
async fn read_flag_is_owner_scoped() {
    let (state, _dir) = common::test_state().await;
    let order = submitted_order(&state, 42).await;

    let records = notification::list_for(&state.db, 42, 10, 0).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].order_id, order.id);

    // Another customer cannot flip the flag
    assert!(
        !notification::mark_read(&state.db, records[0].id, 7)
            .await
            .unwrap()
    );
    assert!(
        notification::mark_read(&state.db, records[0].id, 42)
            .await
            .unwrap()
    );

    let records = notification::list_for(&state.db, 42, 10, 0).await.unwrap();
    assert!(records[0].is_read);
}
