//! Bus wire framing
//!
//! Frames exchanged between order-server and clients over the event
//! distribution channel, for both in-process (memory) and network (TCP)
//! transports. On the wire a frame is encoded as:
//!
//! ```text
//! ┌──────────┬──────────────┬──────────────┐
//! │ type: u8 │ len: u32 LE  │ payload JSON │
//! └──────────┴──────────────┴──────────────┘
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::OrderEvent;

/// 协议版本号
pub const PROTOCOL_VERSION: u16 = 1;

/// Frame types on the event distribution channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    /// Connection opener (client → server), carries the bearer token
    Handshake = 0,
    /// Handshake outcome (server → client)
    HandshakeAck = 1,
    /// Order lifecycle event (server → client)
    Event = 2,
}

impl TryFrom<u8> for FrameType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FrameType::Handshake),
            1 => Ok(FrameType::HandshakeAck),
            2 => Ok(FrameType::Event),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameType::Handshake => write!(f, "handshake"),
            FrameType::HandshakeAck => write!(f, "handshake_ack"),
            FrameType::Event => write!(f, "event"),
        }
    }
}

/// Frame decode error
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("unexpected frame type: expected {expected}, got {got}")]
    UnexpectedType { expected: FrameType, got: FrameType },

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A single frame on the event distribution channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusFrame {
    pub frame_type: FrameType,
    pub payload: Vec<u8>,
}

impl BusFrame {
    pub fn new(frame_type: FrameType, payload: Vec<u8>) -> Self {
        Self {
            frame_type,
            payload,
        }
    }

    /// Build a handshake frame (client → server)
    pub fn handshake(payload: &HandshakePayload) -> Self {
        Self::encode(FrameType::Handshake, payload)
    }

    /// Build a handshake acknowledgment frame (server → client)
    pub fn handshake_ack(payload: &HandshakeAck) -> Self {
        Self::encode(FrameType::HandshakeAck, payload)
    }

    /// Build an event frame (server → client)
    pub fn event(event: &OrderEvent) -> Self {
        Self::encode(FrameType::Event, event)
    }

    fn encode<T: Serialize>(frame_type: FrameType, payload: &T) -> Self {
        // Serializing our own closed types cannot fail
        let payload = serde_json::to_vec(payload).expect("frame payload serialization");
        Self {
            frame_type,
            payload,
        }
    }

    /// Decode the payload, checking the frame type first
    pub fn decode<T: DeserializeOwned>(&self, expected: FrameType) -> Result<T, FrameError> {
        if self.frame_type != expected {
            return Err(FrameError::UnexpectedType {
                expected,
                got: self.frame_type,
            });
        }
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

/// 握手载荷 (客户端 -> 服务端)
///
/// The token is validated with the same JWT scheme as the HTTP boundary;
/// the derived scope decides which events this connection receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakePayload {
    /// 协议版本
    pub version: u16,
    /// Bearer token (same credential as `Authorization: Bearer …`)
    pub token: String,
    /// Client name/identifier, for logs only
    pub client_name: Option<String>,
}

/// Handshake outcome (服务端 -> 客户端)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeAck {
    pub accepted: bool,
    /// Granted scope description, e.g. "operator" or "customer:42"
    pub scope: Option<String>,
    /// Refusal reason when not accepted
    pub reason: Option<String>,
}

impl HandshakeAck {
    pub fn granted(scope: impl Into<String>) -> Self {
        Self {
            accepted: true,
            scope: Some(scope.into()),
            reason: None,
        }
    }

    pub fn refused(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            scope: None,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_type_roundtrip() {
        for t in [FrameType::Handshake, FrameType::HandshakeAck, FrameType::Event] {
            assert_eq!(FrameType::try_from(t as u8), Ok(t));
        }
        assert!(FrameType::try_from(9).is_err());
    }

    #[test]
    fn handshake_frame_roundtrip() {
        let payload = HandshakePayload {
            version: PROTOCOL_VERSION,
            token: "tok".into(),
            client_name: Some("till-1".into()),
        };
        let frame = BusFrame::handshake(&payload);
        let decoded: HandshakePayload = frame.decode(FrameType::Handshake).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn decode_rejects_wrong_frame_type() {
        let frame = BusFrame::handshake(&HandshakePayload {
            version: PROTOCOL_VERSION,
            token: "tok".into(),
            client_name: None,
        });
        let err = frame.decode::<HandshakeAck>(FrameType::HandshakeAck);
        assert!(err.is_err());
    }
}
