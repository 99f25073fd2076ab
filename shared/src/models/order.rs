//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status
///
/// The only legal walk is `Pending → Processing → Shipped → Delivered`,
/// with `Pending → Cancelled` as the single side exit. `Delivered` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Statuses reachable from this one in a single legal transition
    pub fn successors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.successors().contains(&target)
    }

    /// Terminal statuses admit no further transition and gate deletion
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    Cash,
    Card,
}

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

/// Owning-customer summary embedded in order snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Constituent product reference inside a bundle line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BundleItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
}

/// Order line
///
/// Either a plain product reference or a materialized bundle snapshot.
/// `unit_price` is captured once at intake and never recomputed, so the
/// stored total stays internally consistent even if catalog prices move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OrderLine {
    #[serde(rename_all = "camelCase")]
    Product {
        product_id: i64,
        /// Product name resolved at intake
        name: String,
        quantity: i32,
        /// Price-at-order-time in cents
        unit_price: i64,
    },
    #[serde(rename_all = "camelCase")]
    Bundle {
        title: String,
        description: String,
        items: Vec<BundleItem>,
        quantity: i32,
        /// Price-at-order-time in cents
        unit_price: i64,
    },
}

impl OrderLine {
    pub fn quantity(&self) -> i32 {
        match self {
            OrderLine::Product { quantity, .. } | OrderLine::Bundle { quantity, .. } => *quantity,
        }
    }

    pub fn unit_price(&self) -> i64 {
        match self {
            OrderLine::Product { unit_price, .. } | OrderLine::Bundle { unit_price, .. } => {
                *unit_price
            }
        }
    }

    /// Line total in cents
    pub fn line_total(&self) -> i64 {
        self.unit_price() * self.quantity() as i64
    }
}

/// Order entity
///
/// This is also the full snapshot carried by bus events: lines are always
/// expanded, so recipients never need a follow-up fetch to render it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub customer: CustomerSummary,
    pub lines: Vec<OrderLine>,
    /// Total amount in cents, frozen at intake
    pub total_amount: i64,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Soft-delete marker; the row is retained for audit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}
