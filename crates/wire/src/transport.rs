// SPDX-License-Identifier: MIT

//! Worker IPC transport (C6): a framed, length-prefixed, bidirectional
//! byte stream between parent and child.
//!
//! Wire format: 4-byte big-endian length prefix, then that many bytes of
//! payload. Flow control is whatever the OS pipe buffers provide — both
//! sides are expected to drain concurrently (§5).

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Transport- and protocol-level failures (§4.5, §7).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Short read / partial frame at end-of-stream.
    #[error("worker process is gone")]
    WorkerGone,
    /// Decode failure — fatal to the worker; the caller's next mutating
    /// call should restart it (§7).
    #[error("protocol violation: {0}")]
    Decode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn map_eof(err: std::io::Error) -> ProtocolError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::WorkerGone
    } else {
        ProtocolError::Io(err)
    }
}

/// Read one length-prefixed frame. Returns `WorkerGone` if the stream
/// ends before a full frame (including the length prefix itself) is read.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(map_eof)?;
    let len = u32::from_be_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(map_eof)?;
    Ok(payload)
}

/// Write one length-prefixed frame and flush.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::Decode("payload too large to frame".to_string()))?
        .to_be_bytes();
    writer.write_all(&len).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Serialize a value to its raw (unframed) JSON payload.
pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(value).map_err(|e| ProtocolError::Decode(e.to_string()))
}

/// Deserialize a value from a raw (unframed) JSON payload.
pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
