//! Bidirectional communication example
//!
//! The client calls the server and the server calls methods the client
//! registered, all over one channel. The server side is simulated with a
//! memory transport peer.
//!
//! Run with: cargo run --example bidirectional

use rpcline_client::{CallOptions, ClientBuilder, MemoryPeer, MemoryTransport, UnknownMethodPolicy};
use rpcline_core::JsonRpcErrorData;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct AddParams {
    a: i64,
    b: i64,
}

/// Server side: answer `log`, then call back into the client
async fn serve(mut peer: MemoryPeer) {
    let mut next_id = 100;

    while let Some(frame) = peer.recv_json().await {
        if frame.get("method").is_none() {
            // a reply to one of our own requests
            println!("[SERVER] Client replied: {}", frame);
            continue;
        }

        println!("[SERVER] Received {}", frame["method"]);
        if let Some(id) = frame.get("id") {
            let _ = peer.send_json(&json!({"jsonrpc": "2.0", "id": id, "result": {"received": true}}));
        }

        if frame["method"] == "log" {
            for (method, params) in [
                ("add", json!({"a": 2, "b": 40})),
                ("add", json!({"a": "two"})),
                ("version", Value::Null),
                ("shutdown", Value::Null),
            ] {
                next_id += 1;
                let _ = peer.send_json(&json!({
                    "jsonrpc": "2.0",
                    "id": next_id,
                    "method": method,
                    "params": params
                }));
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (transport, peer) = MemoryTransport::pair();
    let server = tokio::spawn(serve(peer));

    let client = ClientBuilder::new(transport)
        .unknown_method(UnknownMethodPolicy::ReplyMethodNotFound)
        .call_timeout(Duration::from_secs(5))
        .build()?;

    client
        .methods()
        .register_typed("add", |p: AddParams| Ok::<_, JsonRpcErrorData>(p.a + p.b));
    client.methods().register("version", |_| json!(env!("CARGO_PKG_VERSION")));

    client.connect().await?;

    client.call_with(
        "log",
        json!({"level": "info", "message": "hello from the client"}),
        CallOptions::new()
            .on_success(|result| println!("[CLIENT] log acknowledged: {}", result))
            .on_error(|e| println!("[CLIENT] log failed: {}", e)),
    )?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    client.disconnect().await;
    server.await?;
    Ok(())
}
