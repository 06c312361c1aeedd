//! Pub/sub client example
//!
//! A small in-process server plays the other end of a memory transport:
//! it acknowledges subscriptions and publishes to whatever the client
//! subscribed to.
//!
//! Run with: cargo run --example pubsub_client

use rpcline_client::{ClientBuilder, MemoryPeer, MemoryTransport};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Answer the client's calls until it disconnects
async fn serve(mut peer: MemoryPeer) {
    let topics = ["news", "weather"];
    let mut subscriptions = BTreeSet::new();

    while let Some(frame) = peer.recv_json().await {
        let Some(id) = frame.get("id").cloned() else {
            continue;
        };
        let topic = frame["params"].as_str().unwrap_or_default().to_string();

        let result = match frame["method"].as_str() {
            Some("get_topics") => json!(topics),
            Some("subscribe") => {
                if topics.contains(&topic.as_str()) {
                    subscriptions.insert(topic.clone());
                }
                json!(subscriptions)
            }
            Some("unsubscribe") => {
                subscriptions.remove(&topic);
                json!(subscriptions)
            }
            _ => Value::Null,
        };
        let _ = peer.send_json(&json!({"jsonrpc": "2.0", "id": id, "result": result}));

        if frame["method"] == "subscribe" && subscriptions.contains(&topic) {
            for n in 1..=3 {
                let _ = peer.send_json(&json!({
                    "jsonrpc": "2.0",
                    "method": topic,
                    "params": {"seq": n, "text": format!("{} update {}", topic, n)}
                }));
            }
        }
    }

    println!("[SERVER] Client went away");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (transport, peer) = MemoryTransport::pair();
    let server = tokio::spawn(serve(peer));

    let client = ClientBuilder::new(transport).debug(true).build()?;
    client.on("open", |_| println!("[CLIENT] Connected"))?;
    client.on("close", |_| println!("[CLIENT] Disconnected"))?;
    client.connect().await?;

    println!("[CLIENT] Topics: {:?}", client.get_topics().await?);

    let subscribed = client
        .subscribe("news", |msg| println!("[CLIENT] news: {}", msg["text"]))
        .await?;
    println!("[CLIENT] Subscribed to {:?}", subscribed);

    match client.subscribe("sports", |_| {}).await {
        Ok(_) => println!("[CLIENT] Unexpectedly subscribed to sports"),
        Err(e) => println!("[CLIENT] sports: {}", e),
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    let remaining = client.unsubscribe("news").await?;
    println!("[CLIENT] Still subscribed to {:?}", remaining);

    client.disconnect().await;
    server.await?;
    Ok(())
}
