//! Error types for the HDFS wire engine.
//!
//! Every fallible operation returns [`RpcError`]. Server-reported failures on
//! either protocol are folded into the same enum by
//! [`RpcError::from_rpc_response`] (namenode) and
//! [`RpcError::from_block_op_status`] (datanode); [`RpcError::kind`] gives the
//! coarse, copyable [`ErrorKind`] callers usually branch on.

use std::{fmt, io};

use libhdfsproto::{
    common::{
        RpcResponseHeaderProto,
        rpc_response_header_proto::{RpcErrorCodeProto, RpcStatusProto},
    },
    hdfs::Status,
};
use thiserror::Error;

/// Coarse classification of an [`RpcError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The peer could not be connected to.
    HostUnreachable,
    /// Transport failure, or a checksum failure reported by a datanode.
    Io,
    /// The connection was closed before or during the call.
    NotConnected,
    /// The server rejected the caller's identity or token.
    PermissionDenied,
    /// Client and server speak incompatible RPC versions.
    RpcVersionMismatch,
    /// The server could not process the RPC exchange itself.
    BadRpcExchange,
    /// The request was rejected, or the failure could not be classified.
    InvalidArgument,
    /// The entity the request would create already exists.
    AlreadyExists,
    /// The server does not implement the requested operation.
    NotImplemented,
    /// The server answered with a status this client does not support.
    NotSupported,
    /// A block read would overflow the caller's buffer.
    BufferTooSmall,
    /// Bytes on the wire do not form a valid frame or message.
    Malformed,
}

impl ErrorKind {
    /// Get human-readable description of this kind
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            ErrorKind::HostUnreachable => "host unreachable",
            ErrorKind::Io => "input/output error",
            ErrorKind::NotConnected => "not connected",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::RpcVersionMismatch => "RPC version mismatch",
            ErrorKind::BadRpcExchange => "bad RPC exchange",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::NotImplemented => "not implemented",
            ErrorKind::NotSupported => "not supported",
            ErrorKind::BufferTooSmall => "buffer too small",
            ErrorKind::Malformed => "malformed frame",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Unified error type for namenode and datanode operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connecting the socket failed.
    #[error("host {addr} unreachable: {source}")]
    HostUnreachable {
        /// `host:port` that was dialled.
        addr: String,
        /// Underlying connect error.
        #[source]
        source: io::Error,
    },

    /// Send or receive failed, including short reads.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The connection has been disconnected.
    #[error("connection is closed")]
    NotConnected,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("RPC version mismatch: {0}")]
    RpcVersionMismatch(String),

    #[error("bad RPC exchange: {0}")]
    BadRpcExchange(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("not supported: {0}")]
    NotSupported(String),

    /// A datanode reported a checksum error.
    #[error("remote I/O error: {0}")]
    RemoteIo(String),

    /// Writing the next packet would run past the destination buffer.
    #[error("destination buffer too small: {needed} bytes needed, capacity is {capacity}")]
    BufferTooSmall {
        /// Bytes the stream has delivered so far, including the rejected packet.
        needed: usize,
        /// Length of the caller's buffer.
        capacity: usize,
    },

    /// Framing violation detected while parsing wire bytes.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// A protobuf message inside a well-formed frame did not decode.
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}

impl RpcError {
    /// Create a [`RpcError::Malformed`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn malformed<E: fmt::Display>(e: E) -> Self {
        Self::Malformed(e.to_string())
    }

    /// Coarse classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::HostUnreachable { .. } => ErrorKind::HostUnreachable,
            Self::Io(_) | Self::RemoteIo(_) => ErrorKind::Io,
            Self::NotConnected => ErrorKind::NotConnected,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::RpcVersionMismatch(_) => ErrorKind::RpcVersionMismatch,
            Self::BadRpcExchange(_) => ErrorKind::BadRpcExchange,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
            Self::NotSupported(_) => ErrorKind::NotSupported,
            Self::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            Self::Malformed(_) | Self::Decode(_) => ErrorKind::Malformed,
        }
    }

    /// Map a non-success namenode response header to an error.
    ///
    /// The mapping depends only on `errorDetail`; a missing or unrecognised
    /// detail yields the generic [`RpcError::InvalidArgument`].
    #[must_use]
    pub fn from_rpc_response(header: &RpcResponseHeaderProto) -> Self {
        let message = server_message(header);
        let Some(detail) = header.error_detail else {
            return Self::InvalidArgument(message);
        };
        match RpcErrorCodeProto::try_from(detail) {
            Ok(RpcErrorCodeProto::FatalUnauthorized) => Self::PermissionDenied(message),
            Ok(
                RpcErrorCodeProto::FatalVersionMismatch
                | RpcErrorCodeProto::ErrorRpcVersionMismatch,
            ) => Self::RpcVersionMismatch(message),
            Ok(RpcErrorCodeProto::FatalInvalidRpcHeader | RpcErrorCodeProto::ErrorRpcServer) => {
                Self::BadRpcExchange(message)
            }
            Ok(
                RpcErrorCodeProto::ErrorApplication
                | RpcErrorCodeProto::ErrorNoSuchMethod
                | RpcErrorCodeProto::ErrorNoSuchProtocol
                | RpcErrorCodeProto::ErrorSerializingResponse
                | RpcErrorCodeProto::FatalUnknown
                | RpcErrorCodeProto::FatalUnsupportedSerialization
                | RpcErrorCodeProto::FatalDeserializingRequest,
            ) => Self::InvalidArgument(message),
            Err(_) => Self::InvalidArgument(format!("unrecognized error detail {detail}: {message}")),
        }
    }

    /// Map a datanode block-op status to `Ok(())` or an error.
    pub fn from_block_op_status(status: i32, message: Option<&str>) -> Result<(), Self> {
        let describe = |name: &str| match message {
            Some(text) if !text.is_empty() => format!("{name}: {text}"),
            _ => name.to_owned(),
        };
        match Status::try_from(status) {
            Ok(Status::Success | Status::ChecksumOk) => Ok(()),
            Ok(Status::Error) => Err(Self::InvalidArgument(describe("ERROR"))),
            Ok(Status::ErrorInvalid) => Err(Self::InvalidArgument(describe("ERROR_INVALID"))),
            Ok(Status::ErrorChecksum) => Err(Self::RemoteIo(describe("ERROR_CHECKSUM"))),
            Ok(Status::ErrorExists) => Err(Self::AlreadyExists(describe("ERROR_EXISTS"))),
            Ok(Status::ErrorAccessToken) => {
                Err(Self::PermissionDenied(describe("ERROR_ACCESS_TOKEN")))
            }
            Ok(Status::ErrorUnsupported) => {
                Err(Self::NotImplemented(describe("ERROR_UNSUPPORTED")))
            }
            Ok(
                Status::OobRestart
                | Status::OobReserved1
                | Status::OobReserved2
                | Status::OobReserved3
                | Status::InProgress
                | Status::ErrorBlockPinned,
            )
            | Err(_) => Err(Self::NotSupported(describe(&format!("status {status}")))),
        }
    }
}

/// Human-readable text for a failed namenode response.
fn server_message(header: &RpcResponseHeaderProto) -> String {
    let status = RpcStatusProto::try_from(header.status)
        .map_or_else(|_| format!("status {}", header.status), |s| format!("{s:?}"));
    match (header.exception_class_name.as_deref(), header.error_msg.as_deref()) {
        (Some(class), Some(msg)) => format!("{status}: {class}: {msg}"),
        (Some(class), None) => format!("{status}: {class}"),
        (None, Some(msg)) => format!("{status}: {msg}"),
        (None, None) => status,
    }
}
