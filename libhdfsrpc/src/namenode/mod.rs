//! Namenode IPC client.
//!
//! A [`NamenodeClient`] owns one TCP connection. Connecting sends the
//! connection header and the connection context, then starts a background
//! task renewing the client's leases. Each call holds the connection lock
//! from the moment its call id is taken until its response is parsed, so
//! calls from foreground tasks and the lease renewer never interleave on the
//! wire and call ids follow lock order.
//!
//! A call abandoned after its request was written, or failing before its
//! response was read whole, leaves the socket out of step with the call ids.
//! The connection is closed in that case rather than resynchronised.
//!
//! Request frame:
//! ```text
//! [4 bytes] total length of what follows (big-endian u32)
//! [varint][RpcRequestHeaderProto]
//! [varint][RequestHeaderProto]
//! [varint][request message]
//! ```
//!
//! Response frame:
//! ```text
//! [4 bytes] total length of what follows (big-endian u32)
//! [varint][RpcResponseHeaderProto]
//! [varint][response message]          only on SUCCESS
//! ```

mod lease;

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use bytes::{Bytes, BytesMut};
use libhdfsproto::common::{
    IpcConnectionContextProto, RequestHeaderProto, RpcKindProto, RpcRequestHeaderProto,
    RpcResponseHeaderProto, UserInformationProto, rpc_request_header_proto::OperationProto,
    rpc_response_header_proto::RpcStatusProto,
};
use prost::Message;
use tokio::{net::TcpStream, sync::watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub use self::lease::LeaseStats;
use self::lease::LeaseRenewer;
use crate::{
    config::NamenodeConfig,
    envelope,
    error::RpcError,
    frame::FrameStream,
    protocol::{
        CLIENT_PROTOCOL, CONNECTION_CONTEXT_CALL_ID, ConnectionHeader, NamenodeMethod,
        ProtocolDescriptor,
    },
};

/// Socket and call-id counter, only touched with the connection lock held.
struct Connection {
    /// `None` once disconnected.
    stream: Option<FrameStream<TcpStream>>,
    next_call_id: i32,
    /// Set while a request is on the wire and its response not yet read.
    in_flight: bool,
}

impl Connection {
    /// Take the next call id. Ids wrap to 0 after `i32::MAX`.
    fn take_call_id(&mut self) -> i32 {
        let id = self.next_call_id;
        self.next_call_id = self.next_call_id.wrapping_add(1) & i32::MAX;
        id
    }
}

/// State shared between the client handle and the lease renewer.
struct Shared {
    peer: String,
    config: NamenodeConfig,
    /// 16 bytes identifying this connection in every request header.
    client_id: [u8; 16],
    connected: AtomicBool,
    /// Flipped to `true` by `disconnect`, waking any call blocked on I/O.
    closing: watch::Sender<bool>,
    conn: tokio::sync::Mutex<Connection>,
    lease: Mutex<Option<LeaseRenewer>>,
    renewals: AtomicU64,
    renewal_failures: AtomicU64,
}

impl Shared {
    fn request_header(&self, call_id: i32, retry_count: i32) -> RpcRequestHeaderProto {
        RpcRequestHeaderProto {
            rpc_kind: Some(RpcKindProto::RpcProtocolBuffer.into()),
            rpc_op: Some(OperationProto::RpcFinalPacket.into()),
            call_id,
            client_id: self.client_id.to_vec(),
            retry_count: Some(retry_count),
        }
    }

    #[instrument(level = "debug", skip(self, protocol, request), fields(peer = %self.peer))]
    async fn call<Req, Resp>(
        &self,
        protocol: &ProtocolDescriptor,
        method: &str,
        request: &Req,
    ) -> Result<Resp, RpcError>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let mut conn = self.conn.lock().await;
        let closing = *self.closing.borrow();
        if conn.stream.is_none() || closing {
            return Err(RpcError::NotConnected);
        }
        if conn.in_flight {
            warn!(peer = %self.peer, "previous call abandoned mid-exchange, closing connection");
            self.close_locked(&mut conn).await;
            return Err(RpcError::NotConnected);
        }
        let call_id = conn.take_call_id();

        let mut parts = BytesMut::new();
        envelope::pack_into(&self.request_header(call_id, 0), &mut parts);
        envelope::pack_into(
            &RequestHeaderProto {
                method_name: method.to_owned(),
                declaring_class_protocol_name: protocol.name.to_owned(),
                client_protocol_version: protocol.version,
            },
            &mut parts,
        );
        envelope::pack_into(request, &mut parts);
        let frame = envelope::with_total_len(&parts)?;

        conn.in_flight = true;
        let stream = conn.stream.as_mut().ok_or(RpcError::NotConnected)?;
        let mut closing = self.closing.subscribe();
        let exchanged = {
            let io = exchange(stream, &frame, self.config.max_response_len);
            tokio::select! {
                biased;
                _ = closing.wait_for(|closing| *closing) => Err(RpcError::NotConnected),
                exchanged = io => exchanged,
            }
        };
        let payload = match exchanged {
            Ok(payload) => payload,
            Err(e) => {
                warn!(call_id, error = %e, "exchange failed, closing connection");
                self.close_locked(&mut conn).await;
                return Err(e);
            }
        };
        conn.in_flight = false;
        let (header, consumed): (RpcResponseHeaderProto, _) = envelope::unpack(&payload)?;

        match RpcStatusProto::try_from(header.status) {
            Ok(RpcStatusProto::Success) => {
                if i64::from(header.call_id) != i64::from(call_id) {
                    return Err(RpcError::Malformed(format!(
                        "response for call {} while waiting for call {call_id}",
                        header.call_id
                    )));
                }
                let (response, _) = envelope::unpack(&payload[consumed..])?;
                debug!(call_id, "call succeeded");
                Ok(response)
            }
            Ok(RpcStatusProto::Fatal) => {
                let err = RpcError::from_rpc_response(&header);
                warn!(call_id, error = %err, "fatal response, closing connection");
                self.close_locked(&mut conn).await;
                Err(err)
            }
            Ok(RpcStatusProto::Error) | Err(_) => {
                let err = RpcError::from_rpc_response(&header);
                debug!(call_id, error = %err, "call failed");
                Err(err)
            }
        }
    }

    async fn invoke<M: NamenodeMethod>(&self, request: &M::Request) -> Result<M::Response, RpcError> {
        self.call(&M::PROTOCOL, M::NAME, request).await
    }

    /// Shut the socket down and signal the renewer without waiting for it.
    ///
    /// Must not join the renewer: it may be blocked on the lock the caller
    /// holds.
    async fn close_locked(&self, conn: &mut Connection) {
        conn.in_flight = false;
        if let Some(mut stream) = conn.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(peer = %self.peer, error = %e, "socket shutdown failed");
            }
            info!(peer = %self.peer, "disconnected from namenode");
        }
        self.connected.store(false, Ordering::Release);
        let renewer = self.lease.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(renewer) = renewer {
            renewer.cancel();
        }
    }
}

/// Write one request frame and read its whole response payload.
async fn exchange(
    stream: &mut FrameStream<TcpStream>,
    frame: &[u8],
    max_response_len: usize,
) -> Result<Bytes, RpcError> {
    stream.write_all(frame).await?;
    let len = stream.read_u32().await? as usize;
    if len > max_response_len {
        return Err(RpcError::Malformed(format!(
            "response of {len} bytes exceeds limit {max_response_len}"
        )));
    }
    stream.read_bytes(len).await
}

/// Client connection to a namenode.
pub struct NamenodeClient {
    shared: Arc<Shared>,
}

impl NamenodeClient {
    /// Connect with [`NamenodeConfig::default`].
    pub async fn connect(host: &str, port: u16) -> Result<Self, RpcError> {
        Self::connect_with_config(host, port, NamenodeConfig::default()).await
    }

    #[instrument(skip(config))]
    pub async fn connect_with_config(
        host: &str,
        port: u16,
        config: NamenodeConfig,
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

        let shared = Arc::new(Shared {
            peer,
            client_id: *Uuid::new_v4().as_bytes(),
            connected: AtomicBool::new(false),
            closing: watch::Sender::new(false),
            conn: tokio::sync::Mutex::new(Connection {
                stream: Some(FrameStream::new(stream)),
                next_call_id: 0,
                in_flight: false,
            }),
            lease: Mutex::new(None),
            renewals: AtomicU64::new(0),
            renewal_failures: AtomicU64::new(0),
            config,
        });
        let client = Self { shared };

        if let Err(e) = client.handshake().await {
            warn!(peer = %client.shared.peer, error = %e, "namenode handshake failed");
            client.disconnect().await;
            return Err(e);
        }

        let renewer = LeaseRenewer::spawn(
            Arc::clone(&client.shared),
            client.shared.config.lease_renewal_interval,
        );
        *client.shared.lease.lock().unwrap_or_else(|e| e.into_inner()) = Some(renewer);
        client.shared.connected.store(true, Ordering::Release);
        info!(peer = %client.shared.peer, "connected to namenode");
        Ok(client)
    }

    /// Send the connection header and the connection context.
    async fn handshake(&self) -> Result<(), RpcError> {
        let shared = &self.shared;
        let context = IpcConnectionContextProto {
            user_info: Some(UserInformationProto {
                effective_user: shared.config.effective_user(),
                real_user: None,
            }),
            protocol: Some(CLIENT_PROTOCOL.name.to_owned()),
        };
        let mut parts = BytesMut::new();
        envelope::pack_into(
            &shared.request_header(CONNECTION_CONTEXT_CALL_ID, -1),
            &mut parts,
        );
        envelope::pack_into(&context, &mut parts);
        let frame = envelope::with_total_len(&parts)?;

        let mut conn = shared.conn.lock().await;
        let stream = conn.stream.as_mut().ok_or(RpcError::NotConnected)?;
        stream.write_all(&ConnectionHeader::simple().encode()).await?;
        stream.write_all(&frame).await?;
        Ok(())
    }

    /// Invoke `method` of `protocol` and decode its response as `Resp`.
    ///
    /// Exactly one call id is used per call on a connected client, whatever
    /// the outcome. A `FATAL` response closes the connection before the
    /// error is returned.
    pub async fn call<Req, Resp>(
        &self,
        protocol: &ProtocolDescriptor,
        method: &str,
        request: &Req,
    ) -> Result<Resp, RpcError>
    where
        Req: Message,
        Resp: Message + Default,
    {
        self.shared.call(protocol, method, request).await
    }

    /// Typed form of [`Self::call`].
    pub async fn invoke<M: NamenodeMethod>(
        &self,
        request: &M::Request,
    ) -> Result<M::Response, RpcError> {
        self.shared.invoke::<M>(request).await
    }

    /// Stop the lease renewer and close the socket. Safe to call repeatedly.
    ///
    /// A call blocked on the socket is woken and fails with
    /// [`RpcError::NotConnected`] instead of holding the connection open.
    #[instrument(skip(self), fields(peer = %self.shared.peer))]
    pub async fn disconnect(&self) {
        let renewer = self
            .shared
            .lease
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(renewer) = renewer {
            renewer.stop().await;
        }
        self.shared.closing.send_replace(true);
        let mut conn = self.shared.conn.lock().await;
        self.shared.close_locked(&mut conn).await;
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// `host:port` this client dialled.
    pub fn peer(&self) -> &str {
        &self.shared.peer
    }

    pub fn client_name(&self) -> &str {
        &self.shared.config.client_name
    }

    /// Outcome counts of background lease renewals so far.
    pub fn lease_stats(&self) -> LeaseStats {
        LeaseStats {
            renewals: self.shared.renewals.load(Ordering::Relaxed),
            failures: self.shared.renewal_failures.load(Ordering::Relaxed),
        }
    }
}

impl Drop for NamenodeClient {
    fn drop(&mut self) {
        let renewer = self
            .shared
            .lease
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(renewer) = renewer {
            renewer.cancel();
        }
    }
}
