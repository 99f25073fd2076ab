//! Order lifecycle events
//!
//! The closed set of events the distribution bus carries. Subscribers
//! pattern-match exhaustively instead of probing optional fields; each
//! variant carries everything a recipient needs to render it.

use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderStatus};

/// Order lifecycle event
///
/// Published synchronously, in-process, immediately after the transaction
/// that caused it commits — never before. Wire field names are stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum OrderEvent {
    /// A new order entered the pipeline in `Pending` status
    OrderCreated { order: Order },
    /// An order moved through the lifecycle graph
    #[serde(rename_all = "camelCase")]
    OrderStatusChanged {
        order_id: i64,
        status: OrderStatus,
        updated_at: i64,
        /// Full snapshot so subscribers never need a follow-up fetch
        order: Order,
    },
    /// An order was soft-deleted from a terminal status
    #[serde(rename_all = "camelCase")]
    OrderDeleted { order_id: i64 },
}

impl OrderEvent {
    /// The order this event concerns
    pub fn order_id(&self) -> i64 {
        match self {
            OrderEvent::OrderCreated { order } => order.id,
            OrderEvent::OrderStatusChanged { order_id, .. }
            | OrderEvent::OrderDeleted { order_id } => *order_id,
        }
    }

    /// Stable event-kind label (logging / metrics)
    pub fn kind(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated { .. } => "OrderCreated",
            OrderEvent::OrderStatusChanged { .. } => "OrderStatusChanged",
            OrderEvent::OrderDeleted { .. } => "OrderDeleted",
        }
    }

    /// Customer id that owns the order this event concerns, when the
    /// event carries enough to know (deletions intentionally do not).
    pub fn owner_id(&self) -> Option<i64> {
        match self {
            OrderEvent::OrderCreated { order }
            | OrderEvent::OrderStatusChanged { order, .. } => Some(order.customer.id),
            OrderEvent::OrderDeleted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerSummary, PaymentMethod, PaymentStatus};

    fn sample_order() -> Order {
        Order {
            id: 7,
            customer: CustomerSummary {
                id: 42,
                name: Some("Ada".into()),
            },
            lines: vec![],
            total_amount: 0,
            delivery_address: "1 Main St".into(),
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            comment: None,
            deleted_at: None,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn wire_field_names_are_stable() {
        let event = OrderEvent::OrderStatusChanged {
            order_id: 7,
            status: OrderStatus::Processing,
            updated_at: 99,
            order: sample_order(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "OrderStatusChanged");
        assert_eq!(json["orderId"], 7);
        assert_eq!(json["status"], "PROCESSING");
        assert_eq!(json["updatedAt"], 99);
        assert_eq!(json["order"]["totalAmount"], 0);
        assert_eq!(json["order"]["paymentMethod"], "card");
    }

    #[test]
    fn deleted_event_has_no_owner() {
        let event = OrderEvent::OrderDeleted { order_id: 7 };
        assert_eq!(event.order_id(), 7);
        assert_eq!(event.owner_id(), None);
    }
}
