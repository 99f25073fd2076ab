//! Shared types for the order pipeline
//!
//! Common types used by both the order server and the terminal clients:
//! domain models, the order event union, the bus wire framing, request
//! payloads, and id/time utilities.

pub mod event;
pub mod message;
pub mod models;
pub mod request;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Event and wire re-exports (for convenient access)
pub use event::OrderEvent;
pub use message::{BusFrame, FrameType, PROTOCOL_VERSION};
