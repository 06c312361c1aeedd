//! Core JSON-RPC 2.0 types and codec for rpcline
//!
//! This crate holds everything that does not depend on a live connection:
//!
//! - **Types**: requests, notifications, responses and the classified
//!   [`Inbound`] message
//! - **Codec**: encoding of outbound messages and classification of inbound
//!   frames
//! - **Error handling**: the crate-wide [`Error`] and the wire-level
//!   [`JsonRpcErrorData`]
//! - **Observability**: one-call tracing and OpenTelemetry setup
//!
//! The `rpcline-client` crate builds the connection engine on top of it.
//!
//! # Example
//!
//! ```rust
//! use rpcline_core::{codec, Id, Inbound, JsonRpcRequest};
//!
//! let request = JsonRpcRequest::new("add", Some(serde_json::json!([5, 3])), Id::Number(1));
//! let json = codec::encode_request(&request).unwrap();
//!
//! // the same frame seen from the other side is an inbound request
//! let decoded = codec::decode(&json).unwrap();
//! assert!(matches!(decoded[0], Ok(Inbound::Request(_))));
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use error::{Error, JsonRpcErrorData, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{
    Id, Inbound, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Reply, ReplyOutcome,
};
