//! Event distribution bus
//!
//! Real-time, authenticated publish/subscribe channel broadcasting order
//! lifecycle events to role-scoped and identity-scoped subscribers.
//!
//! - [`bus`] - subscriber registry, scoped fan-out, TCP accept loop
//! - [`scope`] - per-subscriber delivery predicate
//! - [`transport`] - wire frame codec (TCP and in-process duplex)

pub mod bus;
pub mod scope;
pub mod transport;

pub use bus::{BusConfig, ConnectedSubscriber, EventBus, ScopedReceiver};
pub use scope::SubscriberScope;
