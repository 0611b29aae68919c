//! # libhdfsproto — Hadoop message schemas used by the HDFS wire engine
//!
//! Hand-maintained [`prost`] bindings for the subset of Hadoop's protobuf
//! schemas that `libhdfsrpc` frames and sequences. Field numbers, labels and
//! enum values follow the upstream `.proto` files; fields the engine never
//! reads are omitted; protobuf decoding skips unknown fields, so the partial
//! schemas stay wire compatible with real namenodes and datanodes.
//!
//! | Module | Upstream package / files |
//! |---|---|
//! | [`common`] | `hadoop.common`: `RpcHeader.proto`, `ProtobufRpcEngine.proto`, `IpcConnectionContext.proto`, `Security.proto` |
//! | [`hdfs`] | `hadoop.hdfs`: `hdfs.proto`, `ClientNamenodeProtocol.proto`, `datatransfer.proto` |

pub mod common;
pub mod hdfs;
