//! Request payloads shared between clients and the HTTP API

use serde::{Deserialize, Serialize};

use crate::models::{BundleItem, OrderStatus, PaymentMethod};

/// A cart submitted for intake
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub lines: Vec<LineDraft>,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A single cart line as submitted
///
/// Prices are the ones the customer saw; intake freezes them as
/// price-at-order-time rather than re-deriving from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LineDraft {
    #[serde(rename_all = "camelCase")]
    Product {
        product_id: i64,
        quantity: i32,
        /// Unit price in cents as displayed at submission time
        unit_price: i64,
    },
    #[serde(rename_all = "camelCase")]
    Bundle {
        title: String,
        description: String,
        items: Vec<BundleItem>,
        quantity: i32,
        /// Unit price in cents as displayed at submission time
        unit_price: i64,
    },
}

impl LineDraft {
    pub fn quantity(&self) -> i32 {
        match self {
            LineDraft::Product { quantity, .. } | LineDraft::Bundle { quantity, .. } => *quantity,
        }
    }

    pub fn unit_price(&self) -> i64 {
        match self {
            LineDraft::Product { unit_price, .. } | LineDraft::Bundle { unit_price, .. } => {
                *unit_price
            }
        }
    }
}

/// Body of `POST /api/orders/{id}/status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionRequest {
    pub status: OrderStatus,
}
