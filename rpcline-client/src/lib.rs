//! Callback-driven JSON-RPC 2.0 client engine
//!
//! One [`RpcClient`] multiplexes three message flows over a single ordered
//! text channel:
//!
//! - **Outbound calls**: `call` sends a request and later runs the success or
//!   error handler when the reply with the same id arrives
//! - **Inbound requests**: the server calls methods registered in the
//!   client's [`MethodRegistry`] and gets the result back as a reply
//! - **Topic notifications**: after a confirmed `subscribe`, notifications
//!   whose method is the topic are routed to the topic's handler
//!
//! The channel itself sits behind the [`Transport`] trait. [`WsTransport`]
//! speaks WebSocket through tokio-tungstenite; [`MemoryTransport`] keeps both
//! ends in process and hands the far end to a [`MemoryPeer`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rpcline_client::ClientBuilder;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> rpcline_core::Result<()> {
//!     let client = ClientBuilder::websocket("ws://localhost:8080/rpc")
//!         .debug(true)
//!         .build()?;
//!
//!     // answer the server's `ping` requests
//!     client.methods().register("ping", |_params| json!("pong"));
//!
//!     client.on("open", |_client| println!("connected"))?;
//!     client.connect().await?;
//!
//!     // fire a call and handle the reply in callbacks
//!     client.call(
//!         "add",
//!         json!([1, 2]),
//!         |sum| println!("sum = {}", sum),
//!         |err| eprintln!("add failed: {}", err),
//!     )?;
//!
//!     // or wait for it
//!     let topics = client.subscribe("news", |msg| println!("news: {}", msg)).await?;
//!     println!("subscribed to {:?}", topics);
//!
//!     Ok(())
//! }
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

mod client;
mod client_builder;
mod config;
mod lifecycle;
mod memory;
mod methods;
mod metrics;
mod pending;
mod topics;
mod transport;

pub use client::RpcClient;
pub use client_builder::ClientBuilder;
pub use config::{CallOptions, ClientConfig, DefaultHandlers, ErrorHandler, SuccessHandler, UnknownMethodPolicy};
pub use lifecycle::{LifecycleEvent, LifecycleHandler};
pub use memory::{MemoryPeer, MemoryTransport};
pub use methods::{MethodHandler, MethodRegistry, MethodResult};
pub use metrics::ClientMetrics;
pub use topics::TopicHandler;
pub use transport::{FrameSink, FrameStream, Transport, WsTransport};

/// Lock a table mutex, recovering the data if a handler panicked while it was held
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
