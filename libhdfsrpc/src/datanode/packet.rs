//! Block read packet stream.
//!
//! After a successful `READ_BLOCK` the datanode streams packets:
//! ```text
//! [4 bytes] packet length (big-endian u32): itself + checksums + data
//! [2 bytes] header length (big-endian u16)
//! [header length bytes] PacketHeaderProto
//! [packet length - 4 - data_len bytes] checksums
//! [data_len bytes] data
//! ```
//! until a header sets `last_packet_in_block`. The client then acknowledges
//! with `[varint][ClientReadStatusProto { SUCCESS }]`.

use libhdfsproto::hdfs::{ClientReadStatusProto, PacketHeaderProto, Status};
use prost::Message;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use super::DatanodeClient;
use crate::{envelope, error::RpcError};

/// Size of the packet length field, counted in its own value.
const PACKET_LEN_FIELD: usize = 4;

impl<S> DatanodeClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Drain the packet stream of a block read into `dest` and acknowledge it.
    ///
    /// Returns the number of bytes written. Fails with
    /// [`RpcError::BufferTooSmall`] before reading a packet's data if it
    /// would not fit.
    pub async fn receive_block(&mut self, dest: &mut [u8]) -> Result<usize, RpcError> {
        let mut written = 0usize;
        loop {
            let packet_len = self.stream.read_u32().await? as usize;
            let header_len = usize::from(self.stream.read_u16().await?);
            let header = PacketHeaderProto::decode(self.stream.read_bytes(header_len).await?)?;

            let data_len = usize::try_from(header.data_len).map_err(|_| {
                RpcError::Malformed(format!("negative packet data length {}", header.data_len))
            })?;
            let checksum_len = packet_len
                .checked_sub(PACKET_LEN_FIELD + data_len)
                .ok_or_else(|| {
                    RpcError::Malformed(format!(
                        "packet length {packet_len} too short for {data_len} data bytes"
                    ))
                })?;
            let end = written
                .checked_add(data_len)
                .filter(|&end| end <= dest.len())
                .ok_or(RpcError::BufferTooSmall {
                    needed: written.saturating_add(data_len),
                    capacity: dest.len(),
                })?;
            trace!(
                seqno = header.seqno,
                offset = header.offset_in_block,
                data_len,
                checksum_len,
                last = header.last_packet_in_block,
                "packet"
            );

            self.stream.skip(checksum_len).await?;
            self.stream.read_into(&mut dest[written..end]).await?;
            written = end;

            if header.last_packet_in_block {
                break;
            }
        }

        let ack = envelope::pack(&ClientReadStatusProto {
            status: Status::Success.into(),
        });
        self.stream.write_all(&ack).await?;
        debug!(peer = %self.peer, bytes = written, "block read complete");
        Ok(written)
    }
}
