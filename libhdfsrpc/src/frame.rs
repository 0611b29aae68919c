//! Buffered framing over an async byte stream.
//!
//! A datanode answers a block op with a varint-framed response and then
//! streams packets on the same socket. The varint's width is only known after
//! reading it, so a read usually pulls in more than the varint: the first
//! bytes of the response body, and sometimes of the packet stream behind it.
//! [`FrameStream`] keeps those bytes in a single buffer and every subsequent
//! read drains that buffer before touching the socket again.

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{error::RpcError, varint};

/// Socket read granularity.
const READ_CHUNK: usize = 8 * 1024;

/// A byte stream plus the bytes already read from it but not yet consumed.
#[derive(Debug)]
pub struct FrameStream<S> {
    stream: S,
    in_hand: BytesMut,
}

impl<S> FrameStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            in_hand: BytesMut::new(),
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Bytes read from the socket and not consumed yet.
    pub fn in_hand(&self) -> &[u8] {
        &self.in_hand
    }

    /// Write `bytes` and flush.
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<(), RpcError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read whatever the socket has into the buffer.
    ///
    /// End of stream is an error: every caller is in the middle of a frame.
    async fn fill(&mut self) -> Result<usize, RpcError> {
        if self.in_hand.capacity() == self.in_hand.len() {
            self.in_hand.reserve(READ_CHUNK);
        }
        let n = self.stream.read_buf(&mut self.in_hand).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "peer closed the connection mid-frame",
            )
            .into());
        }
        Ok(n)
    }

    /// Read until at least `n` bytes are in hand.
    async fn fill_to(&mut self, n: usize) -> Result<(), RpcError> {
        if self.in_hand.len() < n {
            self.in_hand.reserve(n - self.in_hand.len());
        }
        while self.in_hand.len() < n {
            self.fill().await?;
        }
        Ok(())
    }

    pub async fn read_u32(&mut self) -> Result<u32, RpcError> {
        self.fill_to(4).await?;
        Ok(self.in_hand.get_u32())
    }

    pub async fn read_u16(&mut self) -> Result<u16, RpcError> {
        self.fill_to(2).await?;
        Ok(self.in_hand.get_u16())
    }

    /// Read exactly `n` bytes.
    pub async fn read_bytes(&mut self, n: usize) -> Result<Bytes, RpcError> {
        self.fill_to(n).await?;
        Ok(self.in_hand.split_to(n).freeze())
    }

    /// Fill `dst` completely, buffered bytes first, then straight from the
    /// socket.
    pub async fn read_into(&mut self, dst: &mut [u8]) -> Result<(), RpcError> {
        let buffered = self.in_hand.len().min(dst.len());
        self.in_hand.copy_to_slice(&mut dst[..buffered]);
        if buffered < dst.len() {
            self.stream.read_exact(&mut dst[buffered..]).await?;
        }
        Ok(())
    }

    /// Consume and discard exactly `n` bytes.
    pub async fn skip(&mut self, mut n: usize) -> Result<(), RpcError> {
        loop {
            let buffered = self.in_hand.len().min(n);
            self.in_hand.advance(buffered);
            n -= buffered;
            if n == 0 {
                return Ok(());
            }
            self.fill().await?;
        }
    }

    /// Read one `[varint length][message]` frame and return the message bytes.
    ///
    /// Bytes read past the end of the message stay in hand.
    pub async fn read_delimited(&mut self, max_len: usize) -> Result<Bytes, RpcError> {
        let (len, prefix) = loop {
            if let Some(decoded) = varint::decode(&self.in_hand)? {
                break decoded;
            }
            self.fill().await?;
        };
        let len = usize::try_from(len)
            .ok()
            .filter(|&len| len <= max_len)
            .ok_or_else(|| {
                RpcError::Malformed(format!("message length {len} exceeds limit {max_len}"))
            })?;
        self.in_hand.advance(prefix);
        self.read_bytes(len).await
    }

    /// Shut down the write half. Buffered bytes are discarded.
    pub async fn shutdown(&mut self) -> Result<(), RpcError> {
        self.in_hand.clear();
        self.stream.shutdown().await?;
        Ok(())
    }
}
