//! Datanode data-transfer client.
//!
//! There is no handshake: the first bytes on a fresh connection are a block
//! op.
//! ```text
//! [2 bytes] data transfer version (0x001c)
//! [1 byte]  opcode
//! [varint][op request message]
//! ```
//! The datanode answers with `[varint][BlockOpResponseProto]`; for reads, the
//! packet stream handled by [`DatanodeClient::receive_block`] follows on the
//! same socket.

mod packet;

use libhdfsproto::{
    common::TokenProto,
    hdfs::{
        BaseHeaderProto, BlockOpResponseProto, ClientOperationHeaderProto, ExtendedBlockProto,
        OpReadBlockProto,
    },
};
use prost::Message;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tracing::{debug, instrument};

use crate::{
    config::DatanodeConfig,
    envelope,
    error::RpcError,
    frame::FrameStream,
    protocol::{Op, block_op_header},
};

/// A datanode's answer to a block op.
///
/// The response is kept even when its status maps to an error, since fields
/// such as `first_bad_link` and `message` explain the failure.
#[derive(Debug)]
pub struct BlockOpReply {
    pub response: BlockOpResponseProto,
    pub status: Result<(), RpcError>,
}

impl BlockOpReply {
    /// The response if its status is a success, else the mapped error.
    pub fn into_result(self) -> Result<BlockOpResponseProto, RpcError> {
        self.status.map(|()| self.response)
    }
}

/// Connection to a datanode, one per block operation.
#[derive(Debug)]
pub struct DatanodeClient<S = TcpStream> {
    stream: FrameStream<S>,
    peer: String,
    config: DatanodeConfig,
}

impl DatanodeClient<TcpStream> {
    /// Connect with [`DatanodeConfig::default`].
    pub async fn connect(host: &str, port: u16) -> Result<Self, RpcError> {
        Self::connect_with_config(host, port, DatanodeConfig::default()).await
    }

    #[instrument(skip(config))]
    pub async fn connect_with_config(
        host: &str,
        port: u16,
        config: DatanodeConfig,
    ) -> Result<Self, RpcError> {
        let peer = format!("{host}:{port}");
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| RpcError::HostUnreachable {
                addr: peer.clone(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%peer, error = %e, "failed to set TCP_NODELAY");
        }
        debug!(%peer, "connected to datanode");
        Ok(Self::from_stream(stream, peer, config))
    }
}

impl<S> DatanodeClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already connected stream.
    pub fn from_stream(stream: S, peer: impl Into<String>, config: DatanodeConfig) -> Self {
        Self {
            stream: FrameStream::new(stream),
            peer: peer.into(),
            config,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Send one block op and read the datanode's response.
    ///
    /// `Err` means the exchange itself failed; a response carrying an error
    /// status is returned as a [`BlockOpReply`] with `status` set.
    #[instrument(skip(self, op, request), fields(peer = %self.peer, op = op.name()))]
    pub async fn call<Req: Message>(
        &mut self,
        op: Op,
        request: &Req,
    ) -> Result<BlockOpReply, RpcError> {
        let mut frame = block_op_header(op).to_vec();
        envelope::pack_into(request, &mut frame);
        self.stream.write_all(&frame).await?;

        let body = self
            .stream
            .read_delimited(self.config.max_response_len)
            .await?;
        let response = BlockOpResponseProto::decode(body)?;
        let status = RpcError::from_block_op_status(response.status, response.message.as_deref());
        if let Err(e) = &status {
            debug!(error = %e, "block op rejected");
        }
        Ok(BlockOpReply { response, status })
    }

    /// Read `len` bytes of `block` starting at `offset` into `dest`.
    ///
    /// Returns the number of bytes written.
    pub async fn read_block(
        &mut self,
        block: &ExtendedBlockProto,
        token: Option<&TokenProto>,
        offset: u64,
        len: u64,
        dest: &mut [u8],
    ) -> Result<usize, RpcError> {
        let capacity = dest.len();
        if usize::try_from(len).map_or(true, |len| len > capacity) {
            return Err(RpcError::BufferTooSmall {
                needed: usize::try_from(len).unwrap_or(usize::MAX),
                capacity,
            });
        }
        let request = OpReadBlockProto {
            header: Some(ClientOperationHeaderProto {
                base_header: Some(BaseHeaderProto {
                    block: Some(block.clone()),
                    token: token.cloned(),
                }),
                client_name: self.config.client_name.clone(),
            }),
            offset,
            len,
            send_checksums: Some(self.config.send_checksums),
        };
        self.call(Op::ReadBlock, &request).await?.into_result()?;
        self.receive_block(dest).await
    }
}
