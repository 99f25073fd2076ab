//! Product Repository
//!
//! Catalog reads plus the inventory ledger: the only code path that ever
//! decrements stock. The decrement is a single conditional UPDATE executed
//! on the caller's order-creation transaction, so a rolled-back order
//! releases its reservation and the stored quantity can never go negative.

use super::RepoResult;
use shared::models::{Product, ProductCreate};
use shared::util;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Outcome of a stock reservation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Stock decremented; carries the resolved product for snapshotting
    Reserved { name: String, price: i64 },
    /// Product exists but cannot cover the requested quantity
    InsufficientStock { available: i64 },
    /// No active product with this id
    NotFound,
}

fn row_to_product(row: SqliteRow) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        stock_quantity: row.get("stock_quantity"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let row = sqlx::query(
        "SELECT id, name, price, stock_quantity, is_active, created_at, updated_at FROM product WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_product))
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let now = util::now_millis();
    let id = util::snowflake_id();
    sqlx::query(
        "INSERT INTO product (id, name, price, stock_quantity, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.price)
    .bind(data.stock_quantity)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(Product {
        id,
        name: data.name,
        price: data.price,
        stock_quantity: data.stock_quantity,
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

/// Atomically reserve `quantity` units of a product on the caller's
/// transaction.
///
/// The UPDATE is deliberately the first statement the intake transaction
/// runs against this row: its `stock_quantity >= ?` predicate both takes
/// the write lock and enforces the never-negative invariant, so two
/// concurrent reservations serialize and at most the available quantity
/// is ever handed out.
pub async fn reserve_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> RepoResult<ReserveOutcome> {
    let now = util::now_millis();
    let updated = sqlx::query(
        "UPDATE product SET stock_quantity = stock_quantity - ?1, updated_at = ?2 WHERE id = ?3 AND is_active = 1 AND stock_quantity >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 1 {
        let row = sqlx::query("SELECT name, price FROM product WHERE id = ?")
            .bind(product_id)
            .fetch_one(&mut *conn)
            .await?;
        return Ok(ReserveOutcome::Reserved {
            name: row.get("name"),
            price: row.get("price"),
        });
    }

    // Nothing updated: distinguish a missing product from a shortfall
    let row = sqlx::query("SELECT stock_quantity FROM product WHERE id = ? AND is_active = 1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => Ok(ReserveOutcome::InsufficientStock {
            available: row.get("stock_quantity"),
        }),
        None => Ok(ReserveOutcome::NotFound),
    }
}
