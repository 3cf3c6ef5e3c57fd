// Length-prefixed framing over a byte stream
//
// Every frame is a 4-byte big-endian length followed by exactly that many
// payload bytes. Handshake messages, encrypted commands and encrypted replies
// all travel this way; no caller ever sees a partial frame.

use crate::game::error::TransportError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload accepted in either direction (16 MiB)
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// A framed, bidirectional message channel
pub struct MessageChannel<S> {
    stream: S,
}

impl<S> MessageChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a connected stream
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Write one frame and flush it
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge(payload.len()));
        }

        let mut frame = Vec::with_capacity(4 + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(payload);

        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Block until one whole frame has arrived
    pub async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        self.receive_max(MAX_FRAME_LEN).await
    }

    /// Like `receive`, but reject any frame longer than `limit` before
    /// reading its body
    pub async fn receive_max(&mut self, limit: usize) -> Result<Vec<u8>, TransportError> {
        let len = self
            .stream
            .read_u32()
            .await
            .map_err(TransportError::from_read)? as usize;

        if len > limit.min(MAX_FRAME_LEN) {
            return Err(TransportError::FrameTooLarge(len));
        }

        let mut payload = vec![0u8; len];
        self.stream
            .read_exact(&mut payload)
            .await
            .map_err(TransportError::from_read)?;

        Ok(payload)
    }

    /// Shut down the write half so the peer sees end-of-stream
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Recover the underlying stream
    pub fn into_inner(self) -> S {
        self.stream
    }
}
