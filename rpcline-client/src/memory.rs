//! In-process transport
//!
//! [`MemoryTransport::pair`] returns a transport for the client and a
//! [`MemoryPeer`] that plays the server: it reads what the client sends and
//! pushes frames back. Tests and demos use it to drive the engine without a
//! socket.
//!
//! ```rust
//! use rpcline_client::{MemoryTransport, RpcClient};
//!
//! # async fn example() -> rpcline_core::Result<()> {
//! let (transport, mut peer) = MemoryTransport::pair();
//! let client = RpcClient::new(transport);
//! client.connect().await?;
//!
//! client.notify("hello", serde_json::json!({"from": "client"}))?;
//! let frame = peer.recv_json().await.unwrap();
//! assert_eq!(frame["method"], "hello");
//! # Ok(())
//! # }
//! ```

use crate::lock;
use crate::transport::{FrameSink, FrameStream, Transport};
use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::{SinkExt, StreamExt};
use rpcline_core::{Error, Result};
use serde_json::Value;
use std::sync::Mutex;

type Ends = (UnboundedSender<String>, UnboundedReceiver<String>);

/// Client side of an in-process channel pair
///
/// Can be opened once; a second `open` fails.
pub struct MemoryTransport {
    ends: Mutex<Option<Ends>>,
}

impl MemoryTransport {
    /// Create a connected transport/peer pair
    pub fn pair() -> (MemoryTransport, MemoryPeer) {
        let (to_peer, from_client) = unbounded();
        let (to_client, from_peer) = unbounded();

        let transport = MemoryTransport {
            ends: Mutex::new(Some((to_peer, from_peer))),
        };
        let peer = MemoryPeer {
            outbound: to_client,
            inbound: from_client,
        };

        (transport, peer)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self) -> Result<(FrameSink, FrameStream)> {
        let (to_peer, from_peer) = lock(&self.ends)
            .take()
            .ok_or_else(|| Error::Internal("memory transport already opened".to_string()))?;

        let sink = to_peer.sink_map_err(|_| Error::ConnectionClosed);
        let stream = from_peer.map(Ok::<String, Error>);

        Ok((Box::pin(sink), Box::pin(stream)))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Server side of an in-process channel pair
pub struct MemoryPeer {
    outbound: UnboundedSender<String>,
    inbound: UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Push a raw text frame to the client
    pub fn send(&self, frame: impl Into<String>) -> Result<()> {
        self.outbound
            .unbounded_send(frame.into())
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Push a JSON value to the client as one frame
    pub fn send_json(&self, value: &Value) -> Result<()> {
        self.send(serde_json::to_string(value)?)
    }

    /// Next frame the client sent; `None` once the client closed
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.next().await
    }

    /// Next frame the client sent, parsed as JSON
    ///
    /// Frames that are not JSON come back as `Value::String`.
    pub async fn recv_json(&mut self) -> Option<Value> {
        let frame = self.recv().await?;
        Some(serde_json::from_str(&frame).unwrap_or(Value::String(frame)))
    }

    /// A frame the client already sent, without waiting
    pub fn try_recv(&mut self) -> Option<String> {
        self.inbound.try_next().ok().flatten()
    }

    /// Close the connection from the server side
    ///
    /// The client sees its inbound stream end and runs its close handlers.
    pub fn close(&self) {
        self.outbound.close_channel();
    }
}
