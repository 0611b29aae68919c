//! Unsigned LEB128 varints, the length prefix of every protobuf-delimited
//! message on both HDFS protocols.
//!
//! Each byte carries 7 payload bits, least significant group first; the high
//! bit is set on every byte except the last.

use bytes::BufMut;

use crate::error::RpcError;

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Longest encoding of a `u32`, the widest length either protocol frames.
pub const MAX_VARINT32_LEN: usize = 5;

const CONTINUATION: u8 = 0x80;
const PAYLOAD: u8 = 0x7f;

/// Number of bytes [`encode`] writes for `value`.
#[must_use]
#[inline]
pub const fn encoded_len(value: u64) -> usize {
    // One byte per started group of 7 significant bits; zero still takes one.
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Append `value` to `buf`, returning the number of bytes written.
pub fn encode(mut value: u64, buf: &mut impl BufMut) -> usize {
    let mut written = 0;
    loop {
        written += 1;
        if value < u64::from(CONTINUATION) {
            buf.put_u8(value as u8);
            return written;
        }
        buf.put_u8((value as u8 & PAYLOAD) | CONTINUATION);
        value >>= 7;
    }
}

/// Decode a varint from the start of `bytes`.
///
/// Returns `Ok(None)` when `bytes` ends before the final byte of the varint,
/// so the caller can read more and retry, and `Ok(Some((value, consumed)))`
/// once complete. Encodings longer than [`MAX_VARINT_LEN`] or overflowing a
/// `u64` are rejected.
pub fn decode(bytes: &[u8]) -> Result<Option<(u64, usize)>, RpcError> {
    let mut value: u64 = 0;
    for (i, &byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        let group = u64::from(byte & PAYLOAD);
        // The tenth byte may only contribute the single remaining bit.
        if i == MAX_VARINT_LEN - 1 && group > 1 {
            return Err(RpcError::malformed("varint overflows 64 bits"));
        }
        value |= group << (7 * i);
        if byte & CONTINUATION == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    if bytes.len() >= MAX_VARINT_LEN {
        return Err(RpcError::malformed("varint longer than 10 bytes"));
    }
    Ok(None)
}
