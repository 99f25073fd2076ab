//! Per-subscriber delivery filtering
//!
//! Every connection is enrolled with exactly one scope, derived from its
//! verified credentials at handshake time — never from client input.
//! Operators get the full firehose; a customer only sees status changes
//! for orders it owns.

use std::fmt;

use shared::event::OrderEvent;
use shared::models::Role;

use crate::auth::CurrentUser;

/// Subscription scope of one bus connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberScope {
    /// Role-scoped broadcast: all event kinds, all orders
    Operator,
    /// Identity-scoped room keyed by customer id
    Customer(i64),
}

impl SubscriberScope {
    pub fn for_user(user: &CurrentUser) -> Self {
        match user.role {
            Role::Operator => SubscriberScope::Operator,
            Role::Customer => SubscriberScope::Customer(user.id),
        }
    }

    /// Should this event be delivered to a connection with this scope?
    pub fn allows(&self, event: &OrderEvent) -> bool {
        match self {
            SubscriberScope::Operator => true,
            SubscriberScope::Customer(id) => matches!(
                event,
                OrderEvent::OrderStatusChanged { order, .. } if order.customer.id == *id
            ),
        }
    }
}

impl fmt::Display for SubscriberScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberScope::Operator => write!(f, "operator"),
            SubscriberScope::Customer(id) => write!(f, "customer:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{
        CustomerSummary, Order, OrderStatus, PaymentMethod, PaymentStatus,
    };

    fn order_for(customer_id: i64) -> Order {
        Order {
            id: 1,
            customer: CustomerSummary {
                id: customer_id,
                name: None,
            },
            lines: vec![],
            total_amount: 500,
            delivery_address: "addr".into(),
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            comment: None,
            deleted_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn status_changed(customer_id: i64) -> OrderEvent {
        OrderEvent::OrderStatusChanged {
            order_id: 1,
            status: OrderStatus::Processing,
            updated_at: 1,
            order: order_for(customer_id),
        }
    }

    #[test]
    fn operator_receives_everything() {
        let scope = SubscriberScope::Operator;
        assert!(scope.allows(&OrderEvent::OrderCreated {
            order: order_for(42)
        }));
        assert!(scope.allows(&status_changed(42)));
        assert!(scope.allows(&OrderEvent::OrderDeleted { order_id: 1 }));
    }

    #[test]
    fn customer_receives_only_own_status_changes() {
        let scope = SubscriberScope::Customer(42);
        assert!(scope.allows(&status_changed(42)));
        assert!(!scope.allows(&status_changed(7)));
        assert!(!scope.allows(&OrderEvent::OrderCreated {
            order: order_for(42)
        }));
        assert!(!scope.allows(&OrderEvent::OrderDeleted { order_id: 1 }));
    }
}
