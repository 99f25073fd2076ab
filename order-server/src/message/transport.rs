//! Frame codec for the event distribution channel
//!
//! On-wire layout per frame: 1-byte frame type, 4-byte little-endian
//! payload length, JSON payload. The helpers are generic over the stream
//! so the same code serves TCP sockets and in-process duplex pipes.

use shared::message::{BusFrame, FrameType};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::utils::AppError;

/// Upper bound on a single frame payload; anything larger is a broken or
/// hostile peer
const MAX_FRAME_LEN: usize = 1024 * 1024;

pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<BusFrame, AppError> {
    // Read frame type (1 byte)
    let mut type_buf = [0u8; 1];
    reader
        .read_exact(&mut type_buf)
        .await
        .map_err(|e| AppError::internal(format!("Read frame type failed: {e}")))?;

    let frame_type = FrameType::try_from(type_buf[0])
        .map_err(|_| AppError::validation(format!("Invalid frame type: {}", type_buf[0])))?;

    // Read payload length (4 bytes)
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| AppError::internal(format!("Read frame length failed: {e}")))?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(AppError::validation(format!("Frame too large: {len} bytes")));
    }

    // Read payload
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| AppError::internal(format!("Read frame payload failed: {e}")))?;

    Ok(BusFrame::new(frame_type, payload))
}

pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &BusFrame,
) -> Result<(), AppError> {
    let mut data = Vec::with_capacity(5 + frame.payload.len());
    data.push(frame.frame_type as u8);
    data.extend_from_slice(&(frame.payload.len() as u32).to_le_bytes());
    data.extend_from_slice(&frame.payload);

    writer
        .write_all(&data)
        .await
        .map_err(|e| AppError::internal(format!("Write frame failed: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| AppError::internal(format!("Flush frame failed: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::{HandshakePayload, PROTOCOL_VERSION};

    #[tokio::test]
    async fn frame_roundtrip_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let frame = BusFrame::handshake(&HandshakePayload {
            version: PROTOCOL_VERSION,
            token: "tok".into(),
            client_name: Some("till-1".into()),
        });
        write_frame(&mut a, &frame).await.unwrap();
        let read = read_frame(&mut b).await.unwrap();
        assert_eq!(read, frame);
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        // type byte + absurd length prefix
        let mut bytes = vec![2u8];
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        tokio::io::AsyncWriteExt::write_all(&mut a, &bytes).await.unwrap();
        assert!(read_frame(&mut b).await.is_err());
    }
}
