//! Order Repository
//!
//! Order + line persistence. Mutations take a borrowed connection so the
//! intake service and the state machine can keep them inside their own
//! transactions; list reads go straight to the pool.

use super::{RepoError, RepoResult};
use shared::models::{BundleItem, CustomerSummary, Order, OrderLine, OrderStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT id, customer_id, customer_name, total_amount, delivery_address, payment_method, payment_status, status, comment, deleted_at, created_at, updated_at FROM customer_order";

const LINE_SELECT: &str = "SELECT kind, product_id, product_name, title, description, bundle_items, quantity, unit_price FROM order_line WHERE order_id = ? ORDER BY line_index";

fn row_to_order(row: &SqliteRow, lines: Vec<OrderLine>) -> Order {
    Order {
        id: row.get("id"),
        customer: CustomerSummary {
            id: row.get("customer_id"),
            name: row.get("customer_name"),
        },
        lines,
        total_amount: row.get("total_amount"),
        delivery_address: row.get("delivery_address"),
        payment_method: row.get("payment_method"),
        payment_status: row.get("payment_status"),
        status: row.get("status"),
        comment: row.get("comment"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_line(row: &SqliteRow) -> RepoResult<OrderLine> {
    let kind: String = row.get("kind");
    match kind.as_str() {
        "product" => Ok(OrderLine::Product {
            product_id: row.get("product_id"),
            name: row.get("product_name"),
            quantity: row.get("quantity"),
            unit_price: row.get("unit_price"),
        }),
        "bundle" => {
            let raw: String = row.get("bundle_items");
            let items: Vec<BundleItem> = serde_json::from_str(&raw)
                .map_err(|e| RepoError::Database(format!("Corrupt bundle_items column: {e}")))?;
            Ok(OrderLine::Bundle {
                title: row.get("title"),
                description: row.get("description"),
                items,
                quantity: row.get("quantity"),
                unit_price: row.get("unit_price"),
            })
        }
        other => Err(RepoError::Database(format!("Unknown line kind: {other}"))),
    }
}

async fn fetch_lines(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<OrderLine>> {
    let rows = sqlx::query(LINE_SELECT)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    rows.iter().map(row_to_line).collect()
}

/// Persist an order and all of its lines on the caller's transaction
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO customer_order (id, customer_id, customer_name, total_amount, delivery_address, payment_method, payment_status, status, comment, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(order.id)
    .bind(order.customer.id)
    .bind(&order.customer.name)
    .bind(order.total_amount)
    .bind(&order.delivery_address)
    .bind(order.payment_method)
    .bind(order.payment_status)
    .bind(order.status)
    .bind(&order.comment)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    for (index, line) in order.lines.iter().enumerate() {
        let id = shared::util::snowflake_id();
        match line {
            OrderLine::Product {
                product_id,
                name,
                quantity,
                unit_price,
            } => {
                sqlx::query(
                    "INSERT INTO order_line (id, order_id, line_index, kind, product_id, product_name, quantity, unit_price) VALUES (?1, ?2, ?3, 'product', ?4, ?5, ?6, ?7)",
                )
                .bind(id)
                .bind(order.id)
                .bind(index as i64)
                .bind(product_id)
                .bind(name)
                .bind(quantity)
                .bind(unit_price)
                .execute(&mut *conn)
                .await?;
            }
            OrderLine::Bundle {
                title,
                description,
                items,
                quantity,
                unit_price,
            } => {
                // Serializing our own closed types cannot fail
                let items_json =
                    serde_json::to_string(items).expect("bundle items serialization");
                sqlx::query(
                    "INSERT INTO order_line (id, order_id, line_index, kind, title, description, bundle_items, quantity, unit_price) VALUES (?1, ?2, ?3, 'bundle', ?4, ?5, ?6, ?7, ?8)",
                )
                .bind(id)
                .bind(order.id)
                .bind(index as i64)
                .bind(title)
                .bind(description)
                .bind(items_json)
                .bind(quantity)
                .bind(unit_price)
                .execute(&mut *conn)
                .await?;
            }
        }
    }

    Ok(())
}

/// Fetch one order with expanded lines (soft-deleted rows included; the
/// caller decides whether a deleted order is visible)
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => {
            let lines = fetch_lines(conn, id).await?;
            Ok(Some(row_to_order(&row, lines)))
        }
        None => Ok(None),
    }
}

/// Pool convenience wrapper around [`find_by_id`]
pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let mut conn = pool.acquire().await?;
    find_by_id(&mut conn, id).await
}

/// List orders newest-first, soft-deleted excluded
pub async fn find_all(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "{ORDER_SELECT} WHERE deleted_at IS NULL ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut conn = pool.acquire().await?;
    let rows = sqlx::query(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

    let mut orders = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: i64 = row.get("id");
        let lines = fetch_lines(&mut conn, id).await?;
        orders.push(row_to_order(row, lines));
    }
    Ok(orders)
}

/// Persist a status change on the caller's transaction
pub async fn update_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: OrderStatus,
    now: i64,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE customer_order SET status = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    Ok(())
}

/// Set the soft-delete marker; the row is retained for audit
pub async fn soft_delete(conn: &mut SqliteConnection, id: i64, now: i64) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE customer_order SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    Ok(())
}
