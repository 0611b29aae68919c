//! # libhdfsrpc — HDFS client wire protocols
//!
//! `libhdfsrpc` speaks the two protocols an HDFS client needs: Hadoop IPC to
//! the namenode, and data transfer to datanodes. It follows the RK8s
//! conventions (Tokio async runtime, `tracing` for observability, `thiserror`
//! for structured errors) and uses the [`libhdfsproto`] message types.
//!
//! Only the unauthenticated "simple" identity is supported.
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`varint`] | Unsigned LEB128 length prefixes. |
//! | [`envelope`] | `[varint][message]` packing and the namenode total-length wrapper. |
//! | [`frame`] | [`FrameStream`]: buffered reads that keep bytes read ahead. |
//! | [`protocol`] | Connection header, opcodes, method bindings. |
//! | [`error`] | [`RpcError`], [`ErrorKind`] and server status mapping. |
//! | [`config`] | [`NamenodeConfig`], [`DatanodeConfig`]. |
//! | [`namenode`] | [`NamenodeClient`]: handshake, calls, lease renewal. |
//! | [`datanode`] | [`DatanodeClient`]: block ops and packet reassembly. |
//!
//! ```no_run
//! use libhdfsrpc::{NamenodeClient, protocol::GetBlockLocations};
//! use libhdfsproto::hdfs::GetBlockLocationsRequestProto;
//!
//! # async fn demo() -> Result<(), libhdfsrpc::RpcError> {
//! let namenode = NamenodeClient::connect("namenode", 8020).await?;
//! let located = namenode
//!     .invoke::<GetBlockLocations>(&GetBlockLocationsRequestProto {
//!         src: "/data/part-00000".to_owned(),
//!         offset: 0,
//!         length: 1 << 20,
//!     })
//!     .await?;
//! println!("{:?}", located.locations);
//! namenode.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod datanode;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod namenode;
pub mod protocol;
pub mod varint;

pub use config::{DatanodeConfig, NamenodeConfig};
pub use datanode::{BlockOpReply, DatanodeClient};
pub use error::{ErrorKind, RpcError};
pub use frame::FrameStream;
pub use namenode::{LeaseStats, NamenodeClient};
pub use protocol::Op;
