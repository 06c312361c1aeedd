//! The channel underneath the client
//!
//! The engine needs four things from a transport: open a connection, send a
//! text frame, close, and a stream of inbound text frames whose end signals
//! that the connection is gone. [`Transport::open`] returns exactly that as a
//! [`FrameSink`] and a [`FrameStream`].
//!
//! Framing, TLS and reconnection are the transport's business, not the
//! engine's.

use async_trait::async_trait;
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use rpcline_core::{Error, Result};
use std::pin::Pin;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Outbound half of an open connection: one text frame per item
///
/// Closing the sink closes the connection.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = Error> + Send>>;

/// Inbound half of an open connection
///
/// Yields text frames in arrival order. The stream ending means the peer
/// closed; an `Err` item means the transport failed.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Something that can open a bidirectional text-frame channel
///
/// A transport may be opened again after the previous connection closed;
/// whether that works is up to the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new connection
    async fn open(&self) -> Result<(FrameSink, FrameStream)>;

    /// Human-readable description for logs, usually the peer address
    fn describe(&self) -> String;
}

/// WebSocket transport backed by tokio-tungstenite
///
/// Every JSON-RPC message travels as one text frame. Binary, ping and pong
/// frames are not surfaced; a close frame ends the inbound stream.
#[derive(Debug, Clone)]
pub struct WsTransport {
    url: String,
}

impl WsTransport {
    /// Create a transport for a `ws://` or `wss://` URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// The URL this transport connects to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self) -> Result<(FrameSink, FrameStream)> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(|e| Error::WebSocket(e.to_string()))
            .with(|text: String| future::ready(Ok::<_, Error>(Message::Text(text))));

        let stream = read
            .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(Error::WebSocket(e.to_string()))),
                })
            });

        Ok((Box::pin(sink), Box::pin(stream)))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
