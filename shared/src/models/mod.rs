//! Domain models shared between server and clients

pub mod notification;
pub mod order;
pub mod product;

pub use notification::{Notification, NotificationCategory};
pub use order::{
    BundleItem, CustomerSummary, Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus,
};
pub use product::{Product, ProductCreate};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actor role carried by the credential service's verified claims.
///
/// Operators are store staff driving the fulfillment lifecycle; customers
/// only ever see their own orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Operator,
    Customer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Operator => write!(f, "operator"),
            Role::Customer => write!(f, "customer"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operator" => Ok(Role::Operator),
            "customer" => Ok(Role::Customer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}
