#![allow(dead_code)]

//! Shared helpers for integration tests

use order_server::auth::CurrentUser;
use order_server::db::repository::product;
use order_server::{Config, ServerState};
use shared::models::{ProductCreate, Role};
use tempfile::TempDir;

/// Fresh server state over a scratch database; keep the TempDir alive for
/// the duration of the test
pub async fn test_state() -> (ServerState, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0, 0);
    let state = ServerState::initialize(&config).await;
    (state, dir)
}

pub fn operator(id: i64) -> CurrentUser {
    CurrentUser {
        id,
        name: format!("operator-{id}"),
        role: Role::Operator,
    }
}

pub fn customer(id: i64) -> CurrentUser {
    CurrentUser {
        id,
        name: format!("customer-{id}"),
        role: Role::Customer,
    }
}

pub async fn seed_product(state: &ServerState, name: &str, price: i64, stock: i64) -> i64 {
    product::create(
        &state.db,
        ProductCreate {
            name: name.to_string(),
            price,
            stock_quantity: stock,
        },
    )
    .await
    .expect("seed product")
    .id
}

pub async fn stock_of(state: &ServerState, product_id: i64) -> i64 {
    product::find_by_id(&state.db, product_id)
        .await
        .expect("product lookup")
        .expect("product exists")
        .stock_quantity
}
