//! 事件分发总线
//!
//! # 架构
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      EventBus                            │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │  broadcast::Sender<OrderEvent>                    │  │
//! │  └───────────────────────────────────────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │  per-connection forward task
//!                          │  (scope filter applied here)
//!          ┌───────────────┼───────────────┐
//!          ▼               ▼               ▼
//!     operator conn   customer conn   in-process duplex
//! ```
//!
//! Publication happens synchronously, in-process, immediately after the
//! originating transaction commits — the broadcast channel preserves that
//! order, so no reordering queue ever sits between commit and publish.
//! Delivery is at-most-once: a lagged or disconnected subscriber misses
//! events and reconciles through the notification ledger.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use shared::event::OrderEvent;
use shared::message::{BusFrame, FrameType, HandshakeAck, HandshakePayload, PROTOCOL_VERSION};
use shared::util;

use super::scope::SubscriberScope;
use super::transport::{read_frame, write_frame};
use crate::auth::JwtService;
use crate::utils::AppError;

/// Configuration for the event distribution bus
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub listen_addr: String,
    /// Capacity of the broadcast channel (default: 1024)
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8081".to_string(),
            channel_capacity: 1024,
        }
    }
}

/// A connected, authenticated subscriber
#[derive(Debug, Clone)]
pub struct ConnectedSubscriber {
    pub id: String,
    pub scope: SubscriberScope,
    pub client_name: Option<String>,
    pub connected_at: i64,
}

/// 事件总线 - 负责订阅者管理和按作用域分发
///
/// The subscriber registry is a concurrency-safe map because publishes and
/// connection churn happen concurrently with no ordering relationship.
#[derive(Debug, Clone)]
pub struct EventBus {
    events_tx: broadcast::Sender<OrderEvent>,
    config: BusConfig,
    shutdown_token: CancellationToken,
    clients: Arc<DashMap<String, ConnectedSubscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::from_config(BusConfig::default())
    }

    pub fn from_config(config: BusConfig) -> Self {
        let (events_tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            events_tx,
            config,
            shutdown_token: CancellationToken::new(),
            clients: Arc::new(DashMap::new()),
        }
    }

    /// Publish an order lifecycle event to every subscriber whose scope
    /// admits it.
    ///
    /// Never fails: an empty bus simply drops the event, and the durable
    /// notification ledger remains the source of truth for catch-up.
    pub fn publish(&self, event: OrderEvent) {
        tracing::debug!(
            kind = event.kind(),
            order_id = event.order_id(),
            receivers = self.events_tx.receiver_count(),
            "Publishing order event"
        );
        let _ = self.events_tx.send(event);
    }

    /// Subscribe to the raw, unfiltered event stream (in-process use)
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events_tx.subscribe()
    }

    /// Subscribe with a delivery scope applied, as a connected client
    /// would see the stream
    pub fn subscribe_scoped(&self, scope: SubscriberScope) -> ScopedReceiver {
        ScopedReceiver {
            scope,
            rx: self.events_tx.subscribe(),
        }
    }

    /// Currently connected subscribers (ops/debugging)
    pub fn connected_subscribers(&self) -> Vec<ConnectedSubscriber> {
        self.clients.iter().map(|e| e.value().clone()).collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.clients.len()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// 优雅关闭总线，取消所有连接任务
    pub fn shutdown(&self) {
        tracing::info!("Shutting down event bus");
        self.shutdown_token.cancel();
    }

    /// Open an authenticated in-process connection.
    ///
    /// Returns the client end of a duplex pipe; the server end is handled
    /// by the same code path as a TCP connection, handshake included.
    pub fn open_in_process(&self, jwt: Arc<JwtService>) -> tokio::io::DuplexStream {
        let (client_end, server_end) = tokio::io::duplex(64 * 1024);
        let bus = self.clone();
        let conn_id = format!("memory-{}", Uuid::new_v4());
        tokio::spawn(async move {
            bus.handle_connection(server_end, conn_id, jwt).await;
        });
        client_end
    }

    /// Accept loop for network subscribers
    pub async fn serve(&self, jwt: Arc<JwtService>) -> Result<(), AppError> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind event bus: {e}")))?;

        tracing::info!("Event bus listening on {}", self.config.listen_addr);

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Event bus accept loop shutting down");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let bus = self.clone();
                            let jwt = jwt.clone();
                            let conn_id = format!("tcp-{}", Uuid::new_v4());
                            tracing::debug!(%addr, %conn_id, "Bus connection accepted");
                            tokio::spawn(async move {
                                bus.handle_connection(stream, conn_id, jwt).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept bus connection: {e}");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Drive one subscriber connection from handshake to disconnect
    async fn handle_connection<S>(&self, stream: S, conn_id: String, jwt: Arc<JwtService>)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);

        // The first frame must be a handshake carrying a valid bearer
        // token; anything else refuses the connection.
        let handshake = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            read_frame(&mut reader),
        )
        .await;

        let payload: HandshakePayload = match handshake {
            Ok(Ok(frame)) => match frame.decode(FrameType::Handshake) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "Malformed bus handshake");
                    let ack = HandshakeAck::refused("malformed handshake");
                    let _ = write_frame(&mut writer, &BusFrame::handshake_ack(&ack)).await;
                    return;
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(%conn_id, error = %e, "Bus handshake read failed");
                return;
            }
            Err(_) => {
                tracing::warn!(%conn_id, "Bus handshake timed out");
                return;
            }
        };

        if payload.version != PROTOCOL_VERSION {
            let ack = HandshakeAck::refused(format!(
                "protocol version mismatch: server={PROTOCOL_VERSION} client={}",
                payload.version
            ));
            let _ = write_frame(&mut writer, &BusFrame::handshake_ack(&ack)).await;
            return;
        }

        let user = match jwt.authenticate(&payload.token) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(target: "security", %conn_id, error = %e, "Bus handshake rejected");
                let ack = HandshakeAck::refused("invalid credentials");
                let _ = write_frame(&mut writer, &BusFrame::handshake_ack(&ack)).await;
                return;
            }
        };

        let scope = SubscriberScope::for_user(&user);
        let ack = HandshakeAck::granted(scope.to_string());
        if write_frame(&mut writer, &BusFrame::handshake_ack(&ack))
            .await
            .is_err()
        {
            return;
        }

        // Subscribe BEFORE registering so no event published after the ack
        // can be missed by this connection.
        let mut rx = self.events_tx.subscribe();
        self.clients.insert(
            conn_id.clone(),
            ConnectedSubscriber {
                id: conn_id.clone(),
                scope,
                client_name: payload.client_name.clone(),
                connected_at: util::now_millis(),
            },
        );
        tracing::info!(%conn_id, %scope, client_name = ?payload.client_name, "Bus subscriber enrolled");

        // Forward events to this subscriber (server → client)
        let forward_shutdown = self.shutdown_token.clone();
        let forward_conn_id = conn_id.clone();
        let forward = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = forward_shutdown.cancelled() => break,

                    msg = rx.recv() => match msg {
                        Ok(event) => {
                            if !scope.allows(&event) {
                                continue;
                            }
                            if let Err(e) =
                                write_frame(&mut writer, &BusFrame::event(&event)).await
                            {
                                tracing::info!(conn_id = %forward_conn_id, error = %e, "Subscriber write failed, disconnecting");
                                break;
                            }
                        }
                        // At-most-once delivery: a slow subscriber that
                        // lagged off the channel reconciles via the
                        // notification ledger, the bus never replays.
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(conn_id = %forward_conn_id, missed, "Subscriber lagged, events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });

        // Drain the client side only to notice disconnects; subscribers
        // have nothing to say after the handshake.
        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                frame = read_frame(&mut reader) => match frame {
                    Ok(frame) => {
                        tracing::debug!(%conn_id, frame_type = %frame.frame_type, "Ignoring unexpected client frame");
                    }
                    Err(_) => break,
                }
            }
        }

        forward.abort();
        self.clients.remove(&conn_id);
        tracing::info!(%conn_id, "Bus subscriber disconnected");
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A filtered in-process subscription, seeing exactly what a connected
/// client with the same scope would see
pub struct ScopedReceiver {
    scope: SubscriberScope,
    rx: broadcast::Receiver<OrderEvent>,
}

impl ScopedReceiver {
    pub async fn recv(&mut self) -> Result<OrderEvent, broadcast::error::RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if self.scope.allows(&event) {
                return Ok(event);
            }
        }
    }

    pub fn try_recv(&mut self) -> Result<OrderEvent, broadcast::error::TryRecvError> {
        loop {
            let event = self.rx.try_recv()?;
            if self.scope.allows(&event) {
                return Ok(event);
            }
        }
    }
}
