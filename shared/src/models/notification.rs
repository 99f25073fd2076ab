//! Notification Model

use serde::{Deserialize, Serialize};

/// Notification category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum NotificationCategory {
    StatusChanged,
    OrderAccepted,
    OrderRejected,
}

/// Durable record of a customer-facing status change
///
/// Append-only; only `is_read` is ever mutated. A client that missed the
/// real-time push reconstructs history from these records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub customer_id: i64,
    pub order_id: i64,
    pub category: NotificationCategory,
    pub message: String,
    pub is_read: bool,
    pub created_at: i64,
}
