//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// Stock is only ever decremented through the inventory reservation inside
/// the order-creation transaction; `stock_quantity` never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Unit price in cents
    pub price: i64,
    pub stock_quantity: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload (seeding / catalog import)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub name: String,
    /// Unit price in cents
    pub price: i64,
    pub stock_quantity: i64,
}
