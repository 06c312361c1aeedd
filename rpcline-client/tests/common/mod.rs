//! Common test utilities for rpcline-client integration tests
//!
//! Most tests drive the client through a [`MemoryPeer`] that plays the
//! server. [`MockWsServer`] covers the WebSocket transport.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use rpcline_client::{ClientBuilder, MemoryPeer, MemoryTransport, RpcClient};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// How long a test waits for a frame before giving up
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// A connected client with default options and its peer
pub async fn connected() -> (RpcClient, MemoryPeer) {
    connected_with(|builder| builder).await
}

/// A connected client configured by `configure`, and its peer
pub async fn connected_with<F>(configure: F) -> (RpcClient, MemoryPeer)
where
    F: FnOnce(ClientBuilder) -> ClientBuilder,
{
    let (transport, peer) = MemoryTransport::pair();
    let client = configure(ClientBuilder::new(transport))
        .connect()
        .await
        .unwrap();
    (client, peer)
}

/// Next frame the client sent, parsed
///
/// Panics if nothing arrives within [`FRAME_TIMEOUT`].
pub async fn recv(peer: &mut MemoryPeer) -> Value {
    tokio::time::timeout(FRAME_TIMEOUT, peer.recv_json())
        .await
        .expect("timed out waiting for a client frame")
        .expect("client closed the channel")
}

/// Wait until every frame the peer sent so far has been dispatched
///
/// Issues a `ping` call through the client and answers it. Frames are
/// dispatched in order, so once the ping settles everything sent before it
/// has been handled. Returns the client frames that arrived ahead of the ping.
pub async fn barrier(client: &RpcClient, peer: &mut MemoryPeer) -> Vec<Value> {
    let caller = client.clone();
    let ping = tokio::spawn(async move { caller.request("ping", Value::Null).await });

    let mut skipped = Vec::new();
    loop {
        let frame = recv(peer).await;
        if frame["method"] == "ping" && frame.get("id").is_some() {
            peer.send(reply(frame["id"].as_i64().unwrap(), json!("pong")))
                .unwrap();
            break;
        }
        skipped.push(frame);
    }

    let result = tokio::time::timeout(FRAME_TIMEOUT, ping)
        .await
        .expect("barrier ping never settled")
        .unwrap();
    assert_eq!(result.unwrap(), json!("pong"));
    skipped
}

/// Poll `condition` until it holds or [`FRAME_TIMEOUT`] passes
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + FRAME_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// A success reply
pub fn reply(id: i64, result: Value) -> String {
    json!({"jsonrpc": "2.0", "result": result, "id": id}).to_string()
}

/// An error reply
pub fn error_reply(id: i64, code: i32, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "error": {"code": code, "message": message},
        "id": id
    })
    .to_string()
}

/// A notification, as the server publishes to a topic
pub fn notification(method: &str, params: Value) -> String {
    json!({"jsonrpc": "2.0", "method": method, "params": params}).to_string()
}

/// A request from the server to the client
pub fn request(id: Value, method: &str, params: Value) -> String {
    json!({"jsonrpc": "2.0", "method": method, "params": params, "id": id}).to_string()
}

/// Mock WebSocket server for client testing
///
/// Accepts connections, forwards every text frame to the test, and sends
/// back whatever the handler returns.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    message_rx: mpsc::Receiver<String>,
}

impl MockWsServer {
    /// Start a server that never answers
    pub async fn new() -> Self {
        Self::with_handler(|_| async { None }).await
    }

    /// Start a server that answers each frame with `handler`'s output
    pub async fn with_handler<F, Fut>(handler: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (msg_tx, msg_rx) = mpsc::channel::<String>(100);
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let msg_tx = msg_tx.clone();
                        let handler = handler.clone();

                        tokio::spawn(async move {
                            let Ok(ws_stream) = accept_async(stream).await else { return };
                            let (mut write, mut read) = ws_stream.split();

                            while let Some(Ok(msg)) = read.next().await {
                                if let Message::Text(text) = msg {
                                    let _ = msg_tx.send(text.clone()).await;
                                    if let Some(response) = handler(text).await {
                                        let _ = write.send(Message::Text(response)).await;
                                    }
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            message_rx: msg_rx,
        }
    }

    /// WebSocket URL of this server
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Next frame the server received, or None after [`FRAME_TIMEOUT`]
    pub async fn wait_for_message(&mut self) -> Option<String> {
        tokio::time::timeout(FRAME_TIMEOUT, self.message_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Stop accepting connections
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Pull the method and numeric id out of a client request
pub fn method_and_id(frame: &str) -> Option<(String, i64)> {
    let value: Value = serde_json::from_str(frame).ok()?;
    Some((value["method"].as_str()?.to_string(), value["id"].as_i64()?))
}
