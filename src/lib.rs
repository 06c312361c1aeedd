//! rpcline - JSON-RPC 2.0 client engine with pub/sub
//!
//! This is the convenience crate that re-exports the rpcline sub-crates.
//!
//! # Architecture
//!
//! - **rpcline-core**: message types, codec, error type, observability setup
//! - **rpcline-client**: the callback-driven client engine and its transports
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rpcline::ClientBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::websocket("ws://localhost:8080").connect().await?;
//!
//!     let result = client.request("add", serde_json::json!([5, 3])).await?;
//!     println!("Result: {}", result);
//!
//!     client.subscribe("news", |msg| println!("news: {}", msg)).await?;
//!     Ok(())
//! }
//! ```

pub use rpcline_client as client;
pub use rpcline_core as core;

pub use rpcline_client::{ClientBuilder, RpcClient};
pub use rpcline_core::{Error, Result};
