//! Varint-delimited message packing.
//!
//! Every sub-part of a namenode frame, every datanode request and response,
//! and the read acknowledgment travel as
//! ```text
//! [varint: message length][message bytes]
//! ```
//! Namenode frames additionally wrap their parts in a 4-byte big-endian total
//! length, see [`with_total_len`].

use bytes::{BufMut, BytesMut};
use prost::Message;

use crate::{error::RpcError, varint};

/// Pack `msg` as `[varint(len)][bytes]`.
#[must_use]
pub fn pack<M: Message>(msg: &M) -> Vec<u8> {
    let mut buf = Vec::new();
    pack_into(msg, &mut buf);
    buf
}

/// Append `msg` to `buf` as `[varint(len)][bytes]`, returning the bytes written.
pub fn pack_into<M: Message>(msg: &M, buf: &mut impl BufMut) -> usize {
    let body = msg.encode_to_vec();
    let prefix = varint::encode(body.len() as u64, buf);
    buf.put_slice(&body);
    prefix + body.len()
}

/// Read one varint-delimited message from the start of `bytes`.
///
/// Returns the message and the number of bytes consumed, prefix included.
pub fn unpack<M: Message + Default>(bytes: &[u8]) -> Result<(M, usize), RpcError> {
    let (len, prefix) = varint::decode(bytes)?
        .ok_or_else(|| RpcError::malformed("truncated length prefix"))?;
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| prefix.checked_add(len))
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| {
            RpcError::Malformed(format!(
                "message declares {len} bytes, only {} available",
                bytes.len() - prefix
            ))
        })?;
    let msg = M::decode(&bytes[prefix..end])?;
    Ok((msg, end))
}

/// Prefix `parts` with their 4-byte big-endian total length.
pub fn with_total_len(parts: &[u8]) -> Result<BytesMut, RpcError> {
    let total = u32::try_from(parts.len()).map_err(|_| {
        RpcError::Malformed(format!("frame of {} bytes exceeds u32 length", parts.len()))
    })?;
    let mut frame = BytesMut::with_capacity(4 + parts.len());
    frame.put_u32(total);
    frame.put_slice(parts);
    Ok(frame)
}
