//! Intake transaction tests: the stock invariant and rollback atomicity

mod common;

use order_server::orders::{self, OrderError};
use shared::models::PaymentMethod;
use shared::request::{LineDraft, OrderDraft};

fn product_draft(product_id: i64, quantity: i32, unit_price: i64) -> OrderDraft {
    OrderDraft {
        lines: vec![LineDraft::Product {
            product_id,
            quantity,
            unit_price,
        }],
        delivery_address: "12 Harbour Road".into(),
        payment_method: PaymentMethod::Card,
        comment: None,
    }
}

#[tokio::test]
async fn concurrent_orders_never_oversell() {
    let (state, _dir) = common::test_state().await;
    let product_id = common::seed_product(&state, "Gift crate", 2500, 3).await;

    let s1 = state.clone();
    let s2 = state.clone();
    let h1 = tokio::spawn(async move {
        orders::create_order(&s1, &common::customer(100), product_draft(product_id, 3, 2500)).await
    });
    let h2 = tokio::spawn(async move {
        orders::create_order(&s2, &common::customer(200), product_draft(product_id, 3, 2500)).await
    });

    let r1 = h1.await.unwrap();
    let r2 = h2.await.unwrap();

    // Exactly one submission wins the stock
    let successes = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = if r1.is_err() { r1 } else { r2 };
    assert!(matches!(
        loser.unwrap_err(),
        OrderError::InsufficientStock {
            requested: 3,
            available: 0,
            ..
        }
    ));

    assert_eq!(common::stock_of(&state, product_id).await, 0);
}

#[tokio::test]
async fn many_concurrent_singles_drain_stock_exactly() {
    let (state, _dir) = common::test_state().await;
    let product_id = common::seed_product(&state, "Espresso beans", 1250, 5).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            orders::create_order(
                &state,
                &common::customer(1000 + i),
                product_draft(product_id, 1, 1250),
            )
            .await
        }));
    }

    let mut successes = 0;
    let mut shortfalls = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(OrderError::InsufficientStock { .. }) => shortfalls += 1,
            Err(other) => panic!("unexpected intake error: {other}"),
        }
    }

    assert_eq!(successes, 5);
    assert_eq!(shortfalls, 5);
    assert_eq!(common::stock_of(&state, product_id).await, 0);
}

#[tokio::test]
async fn failed_intake_rolls_back_reservations() {
    let (state, _dir) = common::test_state().await;
    let product_id = common::seed_product(&state, "Olive oil", 900, 5).await;

    // Second line references a product that does not exist; the first
    // line's reservation must be rolled back with the transaction.
    let draft = OrderDraft {
        lines: vec![
            LineDraft::Product {
                product_id,
                quantity: 2,
                unit_price: 900,
            },
            LineDraft::Product {
                product_id: 424242,
                quantity: 1,
                unit_price: 100,
            },
        ],
        delivery_address: "12 Harbour Road".into(),
        payment_method: PaymentMethod::Cash,
        comment: None,
    };

    let result = orders::create_order(&state, &common::customer(1), draft).await;
    assert!(matches!(
        result.unwrap_err(),
        OrderError::ProductNotFound(424242)
    ));
    assert_eq!(common::stock_of(&state, product_id).await, 5);
}

#[tokio::test]
async fn shortfall_on_second_line_rolls_back_first() {
    let (state, _dir) = common::test_state().await;
    let first = common::seed_product(&state, "Crackers", 300, 4).await;
    let second = common::seed_product(&state, "Caviar", 9900, 1).await;

    let draft = OrderDraft {
        lines: vec![
            LineDraft::Product {
                product_id: first,
                quantity: 1,
                unit_price: 300,
            },
            LineDraft::Product {
                product_id: second,
                quantity: 3,
                unit_price: 9900,
            },
        ],
        delivery_address: "12 Harbour Road".into(),
        payment_method: PaymentMethod::Cash,
        comment: None,
    };

    let result = orders::create_order(&state, &common::customer(1), draft).await;
    assert!(matches!(
        result.unwrap_err(),
        OrderError::InsufficientStock {
            requested: 3,
            available: 1,
            ..
        }
    ));
    assert_eq!(common::stock_of(&state, first).await, 4);
    assert_eq!(common::stock_of(&state, second).await, 1);
}

#[tokio::test]
async fn bundle_lines_skip_the_stock_check() {
    let (state, _dir) = common::test_state().await;
    let product_id = common::seed_product(&state, "Soap", 450, 1).await;

    let draft = OrderDraft {
        lines: vec![LineDraft::Bundle {
            title: "Spa box".into(),
            description: "Soap three ways".into(),
            items: vec![shared::models::BundleItem {
                product_id,
                name: "Soap".into(),
                quantity: 3,
            }],
            quantity: 2,
            unit_price: 1800,
        }],
        delivery_address: "12 Harbour Road".into(),
        payment_method: PaymentMethod::Card,
        comment: Some("gift wrap".into()),
    };

    let order = orders::create_order(&state, &common::customer(7), draft)
        .await
        .expect("bundle order");
    assert_eq!(order.total_amount, 3600);
    // The bundle snapshot does not touch the constituent's stock
    assert_eq!(common::stock_of(&state, product_id).await, 1);
}

#[tokio::test]
async fn total_is_frozen_from_submitted_prices() {
    let (state, _dir) = common::test_state().await;
    // Catalog price differs from the submitted cart price; the cart wins
    // and is frozen.
    let product_id = common::seed_product(&state, "Candles", 999, 10).await;

    let order = orders::create_order(
        &state,
        &common::customer(7),
        product_draft(product_id, 2, 950),
    )
    .await
    .expect("order");
    assert_eq!(order.total_amount, 1900);

    let stored = order_server::db::repository::order::get(&state.db, order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_amount, 1900);
    assert_eq!(stored.lines.len(), 1);
    assert_eq!(stored.lines[0].unit_price(), 950);
}
