//! `hadoop.common` messages: RPC headers, the connection context and tokens.

// ---------------------------------------------------------------------------
// RpcHeader.proto
// ---------------------------------------------------------------------------

/// RPC serialization kind of the request payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RpcKindProto {
    /// Used for built-in calls by tests.
    RpcBuiltin = 0,
    /// Use WritableRpcEngine.
    RpcWritable = 1,
    /// Use ProtobufRpcEngine.
    RpcProtocolBuffer = 2,
}

/// Header that precedes every RPC request.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcRequestHeaderProto {
    #[prost(enumeration = "RpcKindProto", optional, tag = "1")]
    pub rpc_kind: ::core::option::Option<i32>,
    #[prost(
        enumeration = "rpc_request_header_proto::OperationProto",
        optional,
        tag = "2"
    )]
    pub rpc_op: ::core::option::Option<i32>,
    /// A sequence number sent back in the response.
    #[prost(sint32, required, tag = "3")]
    pub call_id: i32,
    /// Globally unique client id, 16 bytes.
    #[prost(bytes = "vec", required, tag = "4")]
    pub client_id: ::prost::alloc::vec::Vec<u8>,
    /// Retry count, -1 means operations are not retried.
    #[prost(sint32, optional, tag = "5", default = "-1")]
    pub retry_count: ::core::option::Option<i32>,
}

/// Nested types of [`RpcRequestHeaderProto`].
pub mod rpc_request_header_proto {
    /// Framing of a request on the stream.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum OperationProto {
        /// The final RPC packet.
        RpcFinalPacket = 0,
        /// Not implemented yet upstream.
        RpcContinuationPacket = 1,
        /// Close the RPC connection.
        RpcCloseConnection = 2,
    }
}

/// Header that precedes every RPC response.
///
/// On `SUCCESS` it is followed by the method's response message; otherwise
/// the error fields describe the failure.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcResponseHeaderProto {
    /// Call id of the request this responds to.
    #[prost(uint32, required, tag = "1")]
    pub call_id: u32,
    #[prost(
        enumeration = "rpc_response_header_proto::RpcStatusProto",
        required,
        tag = "2"
    )]
    pub status: i32,
    /// Sent only if success.
    #[prost(uint32, optional, tag = "3")]
    pub server_ipc_version_num: ::core::option::Option<u32>,
    /// If request fails.
    #[prost(string, optional, tag = "4")]
    pub exception_class_name: ::core::option::Option<::prost::alloc::string::String>,
    /// If request fails, often contains the stack trace.
    #[prost(string, optional, tag = "5")]
    pub error_msg: ::core::option::Option<::prost::alloc::string::String>,
    /// In case of error.
    #[prost(
        enumeration = "rpc_response_header_proto::RpcErrorCodeProto",
        optional,
        tag = "6"
    )]
    pub error_detail: ::core::option::Option<i32>,
    /// Globally unique client id.
    #[prost(bytes = "vec", optional, tag = "7")]
    pub client_id: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(sint32, optional, tag = "8", default = "-1")]
    pub retry_count: ::core::option::Option<i32>,
}

/// Nested types of [`RpcResponseHeaderProto`].
pub mod rpc_response_header_proto {
    /// Outcome of an RPC call.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum RpcStatusProto {
        /// RPC succeeded.
        Success = 0,
        /// RPC or error - connection left open for future calls.
        Error = 1,
        /// Fatal error - connection closed.
        Fatal = 2,
    }

    /// Detailed cause of a non-success status.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum RpcErrorCodeProto {
        /// RPC failed, the method threw an exception.
        ErrorApplication = 1,
        /// RPC error - no such method.
        ErrorNoSuchMethod = 2,
        /// RPC error - no such protocol.
        ErrorNoSuchProtocol = 3,
        /// RPC error on server side.
        ErrorRpcServer = 4,
        /// Error serializing the response.
        ErrorSerializingResponse = 5,
        /// RPC protocol version mismatch.
        ErrorRpcVersionMismatch = 6,
        /// Unknown fatal error.
        FatalUnknown = 10,
        /// IPC layer serialization type invalid.
        FatalUnsupportedSerialization = 11,
        /// Fields of the RPC header are invalid.
        FatalInvalidRpcHeader = 12,
        /// Could not deserialize the RPC request.
        FatalDeserializingRequest = 13,
        /// IPC layer version mismatch.
        FatalVersionMismatch = 14,
        /// Auth failed.
        FatalUnauthorized = 15,
    }
}

// ---------------------------------------------------------------------------
// ProtobufRpcEngine.proto
// ---------------------------------------------------------------------------

/// Identifies the method invoked by a protobuf RPC request.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RequestHeaderProto {
    /// Name of the RPC method.
    #[prost(string, required, tag = "1")]
    pub method_name: ::prost::alloc::string::String,
    /// Protocol the method belongs to.
    #[prost(string, required, tag = "2")]
    pub declaring_class_protocol_name: ::prost::alloc::string::String,
    /// Protocol version of the client.
    #[prost(uint64, required, tag = "3")]
    pub client_protocol_version: u64,
}

// ---------------------------------------------------------------------------
// IpcConnectionContext.proto
// ---------------------------------------------------------------------------

/// User identity carried in the connection context.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserInformationProto {
    #[prost(string, optional, tag = "1")]
    pub effective_user: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "2")]
    pub real_user: ::core::option::Option<::prost::alloc::string::String>,
}

/// Sent once, right after the connection header.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpcConnectionContextProto {
    /// UserInfo beyond what is determined as part of security handshake.
    #[prost(message, optional, tag = "2")]
    pub user_info: ::core::option::Option<UserInformationProto>,
    /// Protocol name for the next RPC layer.
    #[prost(string, optional, tag = "3")]
    pub protocol: ::core::option::Option<::prost::alloc::string::String>,
}

// ---------------------------------------------------------------------------
// Security.proto
// ---------------------------------------------------------------------------

/// Security token identifier.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct TokenProto {
    #[prost(bytes = "vec", required, tag = "1")]
    pub identifier: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", required, tag = "2")]
    pub password: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, required, tag = "3")]
    pub kind: ::prost::alloc::string::String,
    #[prost(string, required, tag = "4")]
    pub service: ::prost::alloc::string::String,
}
