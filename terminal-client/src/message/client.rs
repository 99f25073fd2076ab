//! Message Client
//!
//! Authenticated subscription to the order server's event channel. The
//! client performs the handshake, then a background task reads event
//! frames and fans them out to local subscribers over a broadcast
//! channel.

use std::sync::Arc;

use tokio::io::DuplexStream;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use shared::event::OrderEvent;
use shared::message::{
    BusFrame, FrameType, HandshakeAck, HandshakePayload, PROTOCOL_VERSION,
};

use super::transport::{MemoryTransport, TcpTransport, Transport};
use super::MessageError;

/// Local fan-out channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Bus client with typed event subscription
#[derive(Debug, Clone)]
pub struct MessageClient {
    transport: Arc<dyn Transport>,
    events_tx: broadcast::Sender<OrderEvent>,
    scope: Option<String>,
    shutdown_token: CancellationToken,
}

impl MessageClient {
    /// Connect over TCP and authenticate
    pub async fn connect_tcp(
        addr: &str,
        token: &str,
        client_name: Option<String>,
    ) -> Result<Self, MessageError> {
        let transport = Arc::new(TcpTransport::connect(addr).await?);
        Self::establish(transport, token, client_name).await
    }

    /// Connect over an in-process duplex pipe and authenticate
    pub async fn connect_duplex(
        stream: DuplexStream,
        token: &str,
        client_name: Option<String>,
    ) -> Result<Self, MessageError> {
        let transport = Arc::new(MemoryTransport::from_duplex(stream));
        Self::establish(transport, token, client_name).await
    }

    async fn establish(
        transport: Arc<dyn Transport>,
        token: &str,
        client_name: Option<String>,
    ) -> Result<Self, MessageError> {
        let handshake = HandshakePayload {
            version: PROTOCOL_VERSION,
            token: token.to_string(),
            client_name,
        };
        transport
            .write_frame(&BusFrame::handshake(&handshake))
            .await?;

        let ack: HandshakeAck = transport
            .read_frame()
            .await?
            .decode(FrameType::HandshakeAck)?;
        if !ack.accepted {
            return Err(MessageError::HandshakeRefused(
                ack.reason.unwrap_or_else(|| "refused".to_string()),
            ));
        }
        tracing::info!(scope = ?ack.scope, "Bus connection established");

        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let client = Self {
            transport,
            events_tx,
            scope: ack.scope,
            shutdown_token: CancellationToken::new(),
        };
        client.spawn_read_loop();
        Ok(client)
    }

    /// Background reader: event frames → local broadcast
    fn spawn_read_loop(&self) {
        let transport = self.transport.clone();
        let events_tx = self.events_tx.clone();
        let shutdown = self.shutdown_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,

                    frame = transport.read_frame() => match frame {
                        Ok(frame) if frame.frame_type == FrameType::Event => {
                            match frame.decode::<OrderEvent>(FrameType::Event) {
                                Ok(event) => {
                                    // No local subscriber is fine; events
                                    // are best-effort on this side too.
                                    let _ = events_tx.send(event);
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "Dropping undecodable event frame");
                                }
                            }
                        }
                        Ok(frame) => {
                            tracing::debug!(frame_type = %frame.frame_type, "Ignoring unexpected frame");
                        }
                        Err(e) => {
                            tracing::info!(error = %e, "Bus connection closed");
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Subscribe to the typed event stream
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events_tx.subscribe()
    }

    /// The scope granted at handshake, e.g. "operator" or "customer:42"
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Stop the background reader
    pub fn close(&self) {
        self.shutdown_token.cancel();
    }
}
