//! Transport abstraction for the bus client
//!
//! Wire layout per frame: 1-byte frame type, 4-byte little-endian payload
//! length, JSON payload — the same codec the server speaks.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf,
};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use shared::message::{BusFrame, FrameType};

use super::MessageError;

/// Upper bound on a single frame payload
const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Transport abstraction for bus communication
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn read_frame(&self) -> Result<BusFrame, MessageError>;
    async fn write_frame(&self, frame: &BusFrame) -> Result<(), MessageError>;
}

async fn read_from_stream<R: AsyncRead + Unpin>(reader: &mut R) -> Result<BusFrame, MessageError> {
    // Read frame type (1 byte)
    let mut type_buf = [0u8; 1];
    reader.read_exact(&mut type_buf).await?;

    let frame_type = FrameType::try_from(type_buf[0])
        .map_err(|_| MessageError::InvalidMessage(format!("Invalid frame type: {}", type_buf[0])))?;

    // Read payload length (4 bytes)
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(MessageError::InvalidMessage(format!(
            "Frame too large: {len} bytes"
        )));
    }

    // Read payload
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(BusFrame::new(frame_type, payload))
}

async fn write_to_stream<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &BusFrame,
) -> Result<(), MessageError> {
    let mut data = Vec::with_capacity(5 + frame.payload.len());
    data.push(frame.frame_type as u8);
    data.extend_from_slice(&(frame.payload.len() as u32).to_le_bytes());
    data.extend_from_slice(&frame.payload);

    writer.write_all(&data).await?;
    writer.flush().await?;
    Ok(())
}

// ========== TCP Transport ==========

/// TCP transport implementation
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self, MessageError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| MessageError::Connection(e.to_string()))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_frame(&self) -> Result<BusFrame, MessageError> {
        let mut reader = self.reader.lock().await;
        read_from_stream(&mut *reader).await
    }

    async fn write_frame(&self, frame: &BusFrame) -> Result<(), MessageError> {
        let mut writer = self.writer.lock().await;
        write_to_stream(&mut *writer, frame).await
    }
}

// ========== Memory Transport (In-Process) ==========

/// In-process transport over a duplex pipe
///
/// The other end of the pipe is handled by the server's regular
/// connection path, handshake and all — used by tests and embedded
/// deployments where client and server share a process.
#[derive(Debug)]
pub struct MemoryTransport {
    reader: Arc<Mutex<ReadHalf<DuplexStream>>>,
    writer: Arc<Mutex<WriteHalf<DuplexStream>>>,
}

impl MemoryTransport {
    pub fn from_duplex(stream: DuplexStream) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_frame(&self) -> Result<BusFrame, MessageError> {
        let mut reader = self.reader.lock().await;
        read_from_stream(&mut *reader).await
    }

    async fn write_frame(&self, frame: &BusFrame) -> Result<(), MessageError> {
        let mut writer = self.writer.lock().await;
        write_to_stream(&mut *writer, frame).await
    }
}
