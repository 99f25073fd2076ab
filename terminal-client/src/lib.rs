//! Terminal Client - operator/customer client for the order pipeline
//!
//! Connects to the order server's event distribution bus for real-time
//! order state, hosts the alert escalation controller that keeps
//! unacknowledged orders loud, and provides the HTTP pull fallback used
//! to reconcile after a disconnect.

pub mod alert;
pub mod config;
pub mod error;
pub mod http;
pub mod message;

pub use alert::{AlertEscalation, AlertSink, DEFAULT_CUE_INTERVAL};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpApi;
pub use message::{MessageClient, MessageError};

// Re-export shared types for convenience
pub use shared::event::OrderEvent;
pub use shared::models::{Notification, Order, OrderStatus};
