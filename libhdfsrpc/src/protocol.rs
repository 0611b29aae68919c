//! Fixed wire constants of the two HDFS protocols.
//!
//! Namenode connections open with a 7-byte connection header:
//! ```text
//! [4 bytes] magic "hrpc"
//! [1 byte]  RPC version (9)
//! [1 byte]  service class (0 = default)
//! [1 byte]  auth protocol (0 = none, i.e. "simple" identity)
//! ```
//!
//! Datanode requests open with a 3-byte block-op header:
//! ```text
//! [2 bytes] data transfer version (big-endian u16, 28 = 0x001c)
//! [1 byte]  opcode, see `Op`
//! ```

use libhdfsproto::hdfs::{
    GetBlockLocationsRequestProto, GetBlockLocationsResponseProto, RenewLeaseRequestProto,
    RenewLeaseResponseProto,
};
use prost::Message;

use crate::error::RpcError;

/// Magic bytes opening every namenode connection.
pub const RPC_MAGIC: [u8; 4] = *b"hrpc";

/// IPC protocol version spoken by this client.
pub const RPC_VERSION: u8 = 9;

/// Service class used for all calls.
pub const RPC_SERVICE_CLASS_DEFAULT: u8 = 0;

/// Call id of the connection-context frame sent during the handshake.
/// Ordinary calls never use it.
pub const CONNECTION_CONTEXT_CALL_ID: i32 = -3;

/// Data transfer protocol version.
pub const DATA_TRANSFER_VERSION: u16 = 28;

/// Authentication protocol announced in the connection header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthProtocol {
    /// No authentication; the connection context names the user.
    None = 0,
    /// SASL negotiation follows the header.
    Sasl = 0xdf,
}

impl AuthProtocol {
    /// Decode from raw byte. Returns `None` for unknown values.
    #[inline]
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            0xdf => Some(Self::Sasl),
            _ => None,
        }
    }
}

/// The 7-byte header a client sends right after connecting to a namenode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionHeader {
    /// Service class, `0` unless the server partitions callers.
    pub service_class: u8,
    /// Authentication protocol that follows.
    pub auth: AuthProtocol,
}

impl ConnectionHeader {
    /// Encoded length.
    pub const LEN: usize = 7;

    /// Header for an unauthenticated, "simple" identity connection.
    #[must_use]
    pub const fn simple() -> Self {
        Self {
            service_class: RPC_SERVICE_CLASS_DEFAULT,
            auth: AuthProtocol::None,
        }
    }

    /// Encode to the wire layout.
    #[must_use]
    pub const fn encode(&self) -> [u8; Self::LEN] {
        [
            RPC_MAGIC[0],
            RPC_MAGIC[1],
            RPC_MAGIC[2],
            RPC_MAGIC[3],
            RPC_VERSION,
            self.service_class,
            self.auth as u8,
        ]
    }

    /// Decode and validate a received header.
    pub fn decode(bytes: &[u8; Self::LEN]) -> Result<Self, RpcError> {
        let [m0, m1, m2, m3, version, service_class, auth] = *bytes;
        if [m0, m1, m2, m3] != RPC_MAGIC {
            return Err(RpcError::Malformed(format!(
                "bad connection magic {:02x?}",
                [m0, m1, m2, m3]
            )));
        }
        if version != RPC_VERSION {
            return Err(RpcError::RpcVersionMismatch(format!(
                "client speaks version {version}, expected {RPC_VERSION}"
            )));
        }
        let auth = AuthProtocol::from_u8(auth).ok_or_else(|| {
            RpcError::Malformed(format!("unknown auth protocol 0x{auth:02X}"))
        })?;
        Ok(Self {
            service_class,
            auth,
        })
    }
}

// ============================================================================
// Op — datanode opcodes
// ============================================================================

macro_rules! define_ops {
    ( $( $(#[$meta:meta])* $variant:ident = $code:literal, $display:expr; )* ) => {
        /// Data transfer operation code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum Op {
            $( $(#[$meta])* $variant = $code, )*
        }

        impl Op {
            /// Decode from raw byte. Returns `None` for unknown opcodes.
            #[inline]
            pub fn from_u8(code: u8) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )*
                    _ => None,
                }
            }

            /// Encode to byte.
            #[inline]
            pub fn as_u8(self) -> u8 {
                self as u8
            }

            /// Upstream name for logging.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $display, )*
                }
            }
        }
    };
}

define_ops! {
    WriteBlock             = 80, "WRITE_BLOCK";
    ReadBlock              = 81, "READ_BLOCK";
    ReadMetadata           = 82, "READ_METADATA";
    ReplaceBlock           = 83, "REPLACE_BLOCK";
    CopyBlock              = 84, "COPY_BLOCK";
    BlockChecksum          = 85, "BLOCK_CHECKSUM";
    TransferBlock          = 86, "TRANSFER_BLOCK";
    RequestShortCircuitFds = 87, "REQUEST_SHORT_CIRCUIT_FDS";
    ReleaseShortCircuitFds = 88, "RELEASE_SHORT_CIRCUIT_FDS";
    RequestShortCircuitShm = 89, "REQUEST_SHORT_CIRCUIT_SHM";
    BlockGroupChecksum     = 90, "BLOCK_GROUP_CHECKSUM";
    /// Reserved for user-defined operations.
    Custom                 = 127, "CUSTOM";
}

/// Encode the fixed block-op header for `op`.
#[must_use]
pub fn block_op_header(op: Op) -> [u8; 3] {
    let [hi, lo] = DATA_TRANSFER_VERSION.to_be_bytes();
    [hi, lo, op.as_u8()]
}

/// Decode and validate a block-op header.
pub fn decode_block_op_header(bytes: [u8; 3]) -> Result<Op, RpcError> {
    let [hi, lo, code] = bytes;
    let version = u16::from_be_bytes([hi, lo]);
    if version != DATA_TRANSFER_VERSION {
        return Err(RpcError::RpcVersionMismatch(format!(
            "data transfer version {version}, expected {DATA_TRANSFER_VERSION}"
        )));
    }
    Op::from_u8(code).ok_or_else(|| RpcError::Malformed(format!("unknown opcode {code}")))
}

// ============================================================================
// Namenode protocols and methods
// ============================================================================

/// Names an RPC protocol and the version the client declares for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolDescriptor {
    /// Fully-qualified protocol name sent in every request header.
    pub name: &'static str,
    /// Client protocol version.
    pub version: u64,
}

/// The namenode's client-facing protocol.
pub const CLIENT_PROTOCOL: ProtocolDescriptor = ProtocolDescriptor {
    name: "org.apache.hadoop.hdfs.protocol.ClientProtocol",
    version: 1,
};

/// A remote method with statically known request and response messages.
pub trait NamenodeMethod {
    /// Method name as sent in the request header.
    const NAME: &'static str;
    /// Protocol declaring the method.
    const PROTOCOL: ProtocolDescriptor = CLIENT_PROTOCOL;
    /// Request message.
    type Request: Message + Send + Sync;
    /// Response message.
    type Response: Message + Default + Send;
}

macro_rules! define_namenode_methods {
    ( $( $(#[$meta:meta])* $method:ident = $name:expr, $req:ty => $resp:ty; )* ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $method;

            impl NamenodeMethod for $method {
                const NAME: &'static str = $name;
                type Request = $req;
                type Response = $resp;
            }
        )*
    };
}

define_namenode_methods! {
    /// Keep the client's leases alive.
    RenewLease = "renewLease", RenewLeaseRequestProto => RenewLeaseResponseProto;
    /// Locate the blocks of a file range.
    GetBlockLocations = "getBlockLocations",
        GetBlockLocationsRequestProto => GetBlockLocationsResponseProto;
}
