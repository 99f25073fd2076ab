//! Notification Repository
//!
//! Append-only ledger of customer-facing status changes. Only the read
//! flag is ever mutated, and only by the owning customer.

use super::RepoResult;
use shared::models::{Notification, NotificationCategory};
use shared::util;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

fn row_to_notification(row: &SqliteRow) -> Notification {
    Notification {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        order_id: row.get("order_id"),
        category: row.get("category"),
        message: row.get("message"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    }
}

/// Append a record on the caller's connection (or transaction)
pub async fn record(
    conn: &mut SqliteConnection,
    customer_id: i64,
    order_id: i64,
    category: NotificationCategory,
    message: &str,
) -> RepoResult<Notification> {
    let id = util::snowflake_id();
    let now = util::now_millis();
    sqlx::query(
        "INSERT INTO notification (id, customer_id, order_id, category, message, is_read, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
    )
    .bind(id)
    .bind(customer_id)
    .bind(order_id)
    .bind(category)
    .bind(message)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(Notification {
        id,
        customer_id,
        order_id,
        category,
        message: message.to_string(),
        is_read: false,
        created_at: now,
    })
}

/// List a customer's records newest-first
pub async fn list_for(
    pool: &SqlitePool,
    customer_id: i64,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<Notification>> {
    let rows = sqlx::query(
        "SELECT id, customer_id, order_id, category, message, is_read, created_at FROM notification WHERE customer_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(customer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(row_to_notification).collect())
}

/// Flip the read flag; only the owning customer's rows match
pub async fn mark_read(pool: &SqlitePool, id: i64, customer_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE notification SET is_read = 1 WHERE id = ? AND customer_id = ?",
    )
    .bind(id)
    .bind(customer_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
