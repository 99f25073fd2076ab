//! Order domain errors

use shared::models::OrderStatus;
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::utils::AppError;

/// Errors raised by intake and the state machine
///
/// Every business-rule variant is reported with no partial mutation: the
/// originating transaction rolls back, reservations included.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order must contain at least one line")]
    EmptyOrder,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Illegal status transition: {from} -> {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order in status {0} cannot be deleted")]
    NotDeletable(OrderStatus),

    #[error("Operator role required")]
    OperatorOnly,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyOrder | OrderError::Validation(_) => {
                AppError::validation(err.to_string())
            }
            OrderError::ProductNotFound(_) | OrderError::OrderNotFound(_) => {
                AppError::not_found(err.to_string())
            }
            OrderError::InsufficientStock { .. }
            | OrderError::InvalidTransition { .. }
            | OrderError::NotDeletable(_) => AppError::business_rule(err.to_string()),
            OrderError::OperatorOnly => AppError::forbidden(err.to_string()),
            OrderError::Repo(RepoError::NotFound(msg)) => AppError::not_found(msg),
            OrderError::Repo(RepoError::Database(msg)) => AppError::database(msg),
        }
    }
}
