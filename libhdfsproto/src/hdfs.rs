//! `hadoop.hdfs` messages: block identities, `ClientProtocol` requests and
//! the data-transfer protocol.

use crate::common::TokenProto;

// ---------------------------------------------------------------------------
// hdfs.proto
// ---------------------------------------------------------------------------

/// Extended block identifies a block.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ExtendedBlockProto {
    /// Block pool id - globally unique across clusters.
    #[prost(string, required, tag = "1")]
    pub pool_id: ::prost::alloc::string::String,
    /// The local id within a pool.
    #[prost(uint64, required, tag = "2")]
    pub block_id: u64,
    #[prost(uint64, required, tag = "3")]
    pub generation_stamp: u64,
    /// Len does not belong in ebid here for historical reasons.
    #[prost(uint64, optional, tag = "4", default = "0")]
    pub num_bytes: ::core::option::Option<u64>,
}

/// Identifies a datanode.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatanodeIdProto {
    /// IP address.
    #[prost(string, required, tag = "1")]
    pub ip_addr: ::prost::alloc::string::String,
    /// Hostname.
    #[prost(string, required, tag = "2")]
    pub host_name: ::prost::alloc::string::String,
    /// UUID assigned to the datanode.
    #[prost(string, required, tag = "3")]
    pub datanode_uuid: ::prost::alloc::string::String,
    /// Data streaming port.
    #[prost(uint32, required, tag = "4")]
    pub xfer_port: u32,
    /// Datanode http port.
    #[prost(uint32, required, tag = "5")]
    pub info_port: u32,
    /// IPC server port.
    #[prost(uint32, required, tag = "6")]
    pub ipc_port: u32,
}

/// The status of a datanode. Only the identity is decoded here.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatanodeInfoProto {
    #[prost(message, optional, tag = "1")]
    pub id: ::core::option::Option<DatanodeIdProto>,
}

/// A block together with the datanodes holding replicas of it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LocatedBlockProto {
    #[prost(message, optional, tag = "1")]
    pub b: ::core::option::Option<ExtendedBlockProto>,
    /// Offset of first byte of block in the file.
    #[prost(uint64, required, tag = "2")]
    pub offset: u64,
    /// Locations ordered by proximity to client ip.
    #[prost(message, repeated, tag = "3")]
    pub locs: ::prost::alloc::vec::Vec<DatanodeInfoProto>,
    /// True if all replicas of a block are corrupt, else false.
    #[prost(bool, required, tag = "4")]
    pub corrupt: bool,
    #[prost(message, optional, tag = "5")]
    pub block_token: ::core::option::Option<TokenProto>,
}

/// A set of file blocks and their locations.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LocatedBlocksProto {
    #[prost(uint64, required, tag = "1")]
    pub file_length: u64,
    #[prost(message, repeated, tag = "2")]
    pub blocks: ::prost::alloc::vec::Vec<LocatedBlockProto>,
    #[prost(bool, required, tag = "3")]
    pub under_construction: bool,
    #[prost(message, optional, tag = "4")]
    pub last_block: ::core::option::Option<LocatedBlockProto>,
    #[prost(bool, required, tag = "5")]
    pub is_last_block_complete: bool,
}

/// Types of recognized checksums.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ChecksumTypeProto {
    ChecksumNull = 0,
    ChecksumCrc32 = 1,
    ChecksumCrc32c = 2,
}

// ---------------------------------------------------------------------------
// ClientNamenodeProtocol.proto
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockLocationsRequestProto {
    /// File name.
    #[prost(string, required, tag = "1")]
    pub src: ::prost::alloc::string::String,
    /// Range start offset.
    #[prost(uint64, required, tag = "2")]
    pub offset: u64,
    /// Range length.
    #[prost(uint64, required, tag = "3")]
    pub length: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockLocationsResponseProto {
    #[prost(message, optional, tag = "1")]
    pub locations: ::core::option::Option<LocatedBlocksProto>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RenewLeaseRequestProto {
    #[prost(string, required, tag = "1")]
    pub client_name: ::prost::alloc::string::String,
}

/// void response
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct RenewLeaseResponseProto {}

// ---------------------------------------------------------------------------
// datatransfer.proto
// ---------------------------------------------------------------------------

/// Status code returned by datanodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Status {
    Success = 0,
    Error = 1,
    ErrorChecksum = 2,
    ErrorInvalid = 3,
    ErrorExists = 4,
    ErrorAccessToken = 5,
    ChecksumOk = 6,
    ErrorUnsupported = 7,
    /// Quick restart
    OobRestart = 8,
    /// Reserved
    OobReserved1 = 9,
    /// Reserved
    OobReserved2 = 10,
    /// Reserved
    OobReserved3 = 11,
    InProgress = 12,
    ErrorBlockPinned = 13,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BaseHeaderProto {
    #[prost(message, optional, tag = "1")]
    pub block: ::core::option::Option<ExtendedBlockProto>,
    #[prost(message, optional, tag = "2")]
    pub token: ::core::option::Option<TokenProto>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClientOperationHeaderProto {
    #[prost(message, optional, tag = "1")]
    pub base_header: ::core::option::Option<BaseHeaderProto>,
    #[prost(string, required, tag = "2")]
    pub client_name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpReadBlockProto {
    #[prost(message, optional, tag = "1")]
    pub header: ::core::option::Option<ClientOperationHeaderProto>,
    #[prost(uint64, required, tag = "2")]
    pub offset: u64,
    #[prost(uint64, required, tag = "3")]
    pub len: u64,
    #[prost(bool, optional, tag = "4", default = "true")]
    pub send_checksums: ::core::option::Option<bool>,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct ChecksumProto {
    #[prost(enumeration = "ChecksumTypeProto", required, tag = "1")]
    pub r#type: i32,
    #[prost(uint32, required, tag = "2")]
    pub bytes_per_checksum: u32,
}

/// Sent as part of the BlockOpResponseProto for READ_BLOCK and
/// COPY_BLOCK operations.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct ReadOpChecksumInfoProto {
    #[prost(message, optional, tag = "1")]
    pub checksum: ::core::option::Option<ChecksumProto>,
    /// The offset into the block at which the first packet will start.
    #[prost(uint64, required, tag = "2")]
    pub chunk_offset: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockOpResponseProto {
    #[prost(enumeration = "Status", required, tag = "1")]
    pub status: i32,
    #[prost(string, optional, tag = "2")]
    pub first_bad_link: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "4")]
    pub read_op_checksum_info: ::core::option::Option<ReadOpChecksumInfoProto>,
    /// Explanatory text which may be useful to log on the client side.
    #[prost(string, optional, tag = "5")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
}

/// Header of each data packet streamed by a datanode.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct PacketHeaderProto {
    /// All fields must be fixed-length!
    #[prost(sfixed64, required, tag = "1")]
    pub offset_in_block: i64,
    #[prost(sfixed64, required, tag = "2")]
    pub seqno: i64,
    #[prost(bool, required, tag = "3")]
    pub last_packet_in_block: bool,
    #[prost(sfixed32, required, tag = "4")]
    pub data_len: i32,
    #[prost(bool, optional, tag = "5", default = "false")]
    pub sync_block: ::core::option::Option<bool>,
}

/// Message sent from the client to the DN after reading the entire
/// read request.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct ClientReadStatusProto {
    #[prost(enumeration = "Status", required, tag = "1")]
    pub status: i32,
}
