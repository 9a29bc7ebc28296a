//! Length-prefixed JSON framing.
//!
//! Every message is one frame: a 4-byte big-endian payload length followed by
//! the JSON encoding of the message.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload accepted or produced.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    /// Peer closed the connection before a complete frame arrived.
    #[error("connection closed before a full frame was read")]
    Closed,

    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    TooLarge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("unencodable message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl FrameError {
    /// True for failures in the bytes themselves rather than in the transport.
    pub fn is_decode(&self) -> bool {
        matches!(self, FrameError::Decode(_) | FrameError::TooLarge(_))
    }

    fn from_read(error: std::io::Error) -> Self {
        if error.kind() == ErrorKind::UnexpectedEof {
            FrameError::Closed
        } else {
            FrameError::Io(error)
        }
    }
}

/// A byte stream that carries whole messages.
#[derive(Debug)]
pub struct FramedStream<S> {
    inner: S,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Read and decode exactly one message.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<T, FrameError> {
        let len = self.inner.read_u32().await.map_err(FrameError::from_read)? as usize;
        if len > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge(len));
        }

        let mut payload = vec![0u8; len];
        self.inner
            .read_exact(&mut payload)
            .await
            .map_err(FrameError::from_read)?;

        serde_json::from_slice(&payload).map_err(FrameError::Decode)
    }

    /// Encode and write exactly one message.
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<(), FrameError> {
        let payload = serde_json::to_vec(message).map_err(FrameError::Encode)?;
        if payload.len() > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge(payload.len()));
        }

        let mut frame = Vec::with_capacity(4 + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(&payload);

        self.inner.write_all(&frame).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Shut down the write half, signalling end of stream to the peer.
    pub async fn shutdown(&mut self) -> Result<(), FrameError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}
