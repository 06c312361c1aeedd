//! Subscription functionality integration tests

mod common;

use common::{barrier, connected, error_reply, notification, recv, reply};
use rpcline_core::Error;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Received = Arc<Mutex<Vec<Value>>>;

fn collector() -> (Received, impl Fn(Value) + Send + Sync + 'static) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    (received, move |msg| sink.lock().unwrap().push(msg))
}

#[tokio::test]
async fn test_subscribe_sends_topic_as_params() {
    let (client, mut peer) = connected().await;

    client.subscribe_with("news", |_| {}, |_| {}).unwrap();

    let frame = recv(&mut peer).await;
    assert_eq!(frame["method"], "subscribe");
    assert_eq!(frame["params"], "news");
    assert!(frame["id"].is_i64());
}

#[tokio::test]
async fn test_confirmed_subscription_routes_notifications() {
    let (client, mut peer) = connected().await;
    let (received, handler) = collector();

    let caller = client.clone();
    let subscribed = tokio::spawn(async move { caller.subscribe("news", handler).await });

    let frame = recv(&mut peer).await;
    peer.send(reply(frame["id"].as_i64().unwrap(), json!(["news"])))
        .unwrap();
    assert_eq!(subscribed.await.unwrap().unwrap(), vec!["news"]);
    assert_eq!(client.subscribed_topics(), vec!["news"]);

    peer.send(notification("news", json!({"headline": "hi"}))).unwrap();
    peer.send(notification("weather", json!({"temp": 20}))).unwrap();
    barrier(&client, &mut peer).await;

    assert_eq!(*received.lock().unwrap(), vec![json!({"headline": "hi"})]);
}

#[tokio::test]
async fn test_notification_before_ack_is_dropped() {
    let (client, mut peer) = connected().await;
    let (received, handler) = collector();

    let (tx, rx) = tokio::sync::oneshot::channel();
    client
        .subscribe_with("news", handler, move |result| {
            let _ = tx.send(result);
        })
        .unwrap();
    let frame = recv(&mut peer).await;

    // topic state pushed ahead of the acknowledgement
    peer.send(notification("news", json!("early"))).unwrap();
    peer.send(reply(frame["id"].as_i64().unwrap(), json!(["news"])))
        .unwrap();
    peer.send(notification("news", json!("late"))).unwrap();

    rx.await.unwrap().unwrap();
    barrier(&client, &mut peer).await;

    assert_eq!(*received.lock().unwrap(), vec![json!("late")]);
}

#[tokio::test]
async fn test_ack_without_topic_fails_with_unknown_topic() {
    let (client, mut peer) = connected().await;
    let (received, handler) = collector();

    let caller = client.clone();
    let subscribed = tokio::spawn(async move { caller.subscribe("nope", handler).await });

    let frame = recv(&mut peer).await;
    peer.send(reply(frame["id"].as_i64().unwrap(), json!(["news"])))
        .unwrap();

    match subscribed.await.unwrap() {
        Err(Error::UnknownTopic(topic)) => assert_eq!(topic, "nope"),
        other => panic!("Expected UnknownTopic, got {:?}", other),
    }
    assert!(client.subscribed_topics().is_empty());

    peer.send(notification("nope", json!(1))).unwrap();
    barrier(&client, &mut peer).await;
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_subscribe_error_reply() {
    let (client, mut peer) = connected().await;

    let caller = client.clone();
    let subscribed = tokio::spawn(async move { caller.subscribe("news", |_| {}).await });

    let frame = recv(&mut peer).await;
    peer.send(error_reply(frame["id"].as_i64().unwrap(), -32000, "denied"))
        .unwrap();

    assert!(matches!(subscribed.await.unwrap(), Err(Error::Remote(_))));
    assert!(client.subscribed_topics().is_empty());
}

#[tokio::test]
async fn test_unsubscribe_removes_handler_first() {
    let (client, mut peer) = connected().await;
    let (received, handler) = collector();

    let caller = client.clone();
    let subscribed = tokio::spawn(async move { caller.subscribe("news", handler).await });
    let frame = recv(&mut peer).await;
    peer.send(reply(frame["id"].as_i64().unwrap(), json!(["news"])))
        .unwrap();
    subscribed.await.unwrap().unwrap();

    let caller = client.clone();
    let unsubscribed = tokio::spawn(async move { caller.unsubscribe("news").await });

    let frame = recv(&mut peer).await;
    assert_eq!(frame["method"], "unsubscribe");
    assert_eq!(frame["params"], "news");
    assert!(client.subscribed_topics().is_empty());

    // published while the unsubscribe is in flight
    peer.send(notification("news", json!("after"))).unwrap();
    peer.send(reply(frame["id"].as_i64().unwrap(), json!([]))).unwrap();

    assert!(unsubscribed.await.unwrap().unwrap().is_empty());
    barrier(&client, &mut peer).await;
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_resubscribe_replaces_handler() {
    let (client, mut peer) = connected().await;
    let (first, first_handler) = collector();
    let (second, second_handler) = collector();

    for handler in [
        Box::new(first_handler) as Box<dyn Fn(Value) + Send + Sync>,
        Box::new(second_handler),
    ] {
        let caller = client.clone();
        let subscribed = tokio::spawn(async move { caller.subscribe("news", handler).await });
        let frame = recv(&mut peer).await;
        peer.send(reply(frame["id"].as_i64().unwrap(), json!(["news"])))
            .unwrap();
        subscribed.await.unwrap().unwrap();
    }

    peer.send(notification("news", json!(1))).unwrap();
    barrier(&client, &mut peer).await;

    assert!(first.lock().unwrap().is_empty());
    assert_eq!(*second.lock().unwrap(), vec![json!(1)]);
}

#[tokio::test]
async fn test_notification_without_params_delivers_null() {
    let (client, mut peer) = connected().await;
    let (received, handler) = collector();

    let caller = client.clone();
    let subscribed = tokio::spawn(async move { caller.subscribe("tick", handler).await });
    let frame = recv(&mut peer).await;
    peer.send(reply(frame["id"].as_i64().unwrap(), json!(["tick"])))
        .unwrap();
    subscribed.await.unwrap().unwrap();

    peer.send_json(&json!({"jsonrpc": "2.0", "method": "tick"})).unwrap();
    barrier(&client, &mut peer).await;

    assert_eq!(*received.lock().unwrap(), vec![Value::Null]);
}

#[tokio::test]
async fn test_subscribe_before_connect_fails() {
    let (transport, _peer) = rpcline_client::MemoryTransport::pair();
    let client = rpcline_client::RpcClient::new(transport);

    let result = client.subscribe_with("news", |_| {}, |_| {});
    assert!(matches!(result, Err(Error::NotConnected)));
    assert_eq!(client.pending_count(), 0);
}
