//! Event bus client
//!
//! Connects to the order server's event distribution channel, performs
//! the authenticated handshake, and fans received events out to local
//! subscribers.

pub mod client;
pub mod transport;

pub use client::MessageClient;
pub use transport::{MemoryTransport, TcpTransport, Transport};

use thiserror::Error;

/// Bus client error
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Handshake refused: {0}")]
    HandshakeRefused(String),

    #[error(transparent)]
    Frame(#[from] shared::message::FrameError),
}
