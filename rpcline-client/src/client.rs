//! The RPC client engine
//!
//! `RpcClient` owns one connection at a time and the three tables that give
//! the traffic meaning: pending calls, local methods and topic handlers.
//!
//! # Tasks
//!
//! `connect` spawns two tasks per connection:
//!
//! - a **writer** that owns the transport sink and sends queued frames in
//!   order, so `call`, `notify` and replies never block;
//! - a **receiver** that classifies inbound frames and dispatches them one at
//!   a time. Application handlers run synchronously on this task.
//!
//! Table locks are never held while a handler runs, so handlers may call
//! back into the client (issue calls, subscribe, edit the method registry).
//!
//! # Cloning
//!
//! `RpcClient` is cheap to clone; all clones share the connection and the
//! tables. Lifecycle handlers receive a `&RpcClient` for the same reason.

use crate::config::{CallOptions, ClientConfig, UnknownMethodPolicy};
use crate::lifecycle::{LifecycleEvent, LifecycleHooks};
use crate::lock;
use crate::methods::MethodRegistry;
use crate::metrics::{state, ClientMetrics};
use crate::pending::{Completion, PendingCall, PendingCalls};
use crate::topics::{TopicHandler, TopicHandlers};
use crate::transport::{FrameSink, FrameStream, Transport, WsTransport};
use futures::{SinkExt, StreamExt};
use rpcline_core::{
    codec, Error, Id, Inbound, JsonRpcErrorData, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, Reply, ReplyOutcome, Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;

/// Work item for the writer task
enum Outbound {
    Frame(String),
    Close(oneshot::Sender<()>),
}

/// A live connection
struct Connection {
    outbound: mpsc::UnboundedSender<Outbound>,
    shutdown: Arc<Notify>,
    receiver: JoinHandle<()>,
}

/// Callback-driven JSON-RPC 2.0 client
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    pending: PendingCalls,
    methods: MethodRegistry,
    topics: TopicHandlers,
    hooks: LifecycleHooks,
    metrics: Option<Arc<ClientMetrics>>,
    connection: Arc<Mutex<Option<Connection>>>,
}

impl RpcClient {
    /// Create a client over `transport` with the default configuration
    ///
    /// Nothing is opened until [`connect`](Self::connect).
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Create a client for a WebSocket URL
    pub fn websocket(url: impl Into<String>) -> Self {
        Self::new(WsTransport::new(url))
    }

    /// Create a client with an explicit configuration
    pub fn with_config(transport: impl Transport + 'static, config: ClientConfig) -> Self {
        Self::from_parts(Arc::new(transport), config, None)
    }

    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        config: ClientConfig,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Self {
        Self {
            transport,
            config: Arc::new(config),
            pending: PendingCalls::new(),
            methods: MethodRegistry::new(),
            topics: TopicHandlers::new(),
            hooks: LifecycleHooks::new(),
            metrics,
            connection: Arc::new(Mutex::new(None)),
        }
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Methods exposed to the server
    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Whether the client currently holds a live connection
    pub fn is_connected(&self) -> bool {
        lock(&self.connection).is_some()
    }

    /// Number of calls still waiting for a reply
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Topics with an installed handler, sorted
    pub fn subscribed_topics(&self) -> Vec<String> {
        self.topics.topics()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Register a lifecycle handler by event name
    ///
    /// `event` must be `"open"` or `"close"`; any other name fails with
    /// [`Error::UnknownEvent`] and registers nothing.
    pub fn on<F>(&self, event: &str, handler: F) -> Result<()>
    where
        F: Fn(&RpcClient) + Send + Sync + 'static,
    {
        let event: LifecycleEvent = event.parse()?;
        self.on_event(event, handler);
        Ok(())
    }

    /// Register a lifecycle handler for a typed event
    pub fn on_event<F>(&self, event: LifecycleEvent, handler: F)
    where
        F: Fn(&RpcClient) + Send + Sync + 'static,
    {
        self.hooks.push(event, Arc::new(handler));
    }

    /// Run `handler` every time a connection opens
    pub fn on_open<F>(&self, handler: F)
    where
        F: Fn(&RpcClient) + Send + Sync + 'static,
    {
        self.on_event(LifecycleEvent::Open, handler);
    }

    /// Run `handler` every time a connection closes
    pub fn on_close<F>(&self, handler: F)
    where
        F: Fn(&RpcClient) + Send + Sync + 'static,
    {
        self.on_event(LifecycleEvent::Close, handler);
    }

    fn fire(&self, event: LifecycleEvent) {
        for handler in self.hooks.snapshot(event) {
            self.guarded(event.as_str(), || handler(self));
        }
    }

    /// Open the transport and start dispatching
    ///
    /// Open handlers have run by the time this returns, and before the first
    /// inbound frame is dispatched.
    ///
    /// # Errors
    ///
    /// `AlreadyConnected` if a connection is live; otherwise whatever the
    /// transport reports when opening fails.
    #[tracing::instrument(skip(self), fields(transport = %self.transport.describe()))]
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        tracing::info!("Connecting");
        self.set_state(state::CONNECTING);

        let (sink, stream) = match self.transport.open().await {
            Ok(halves) => halves,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open transport");
                self.record_error("connect");
                self.set_state(state::DISCONNECTED);
                return Err(e);
            }
        };

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());
        let (ready_tx, ready_rx) = oneshot::channel();

        {
            let mut slot = lock(&self.connection);
            if slot.is_some() {
                // lost a race with a concurrent connect; dropping the halves closes them
                return Err(Error::AlreadyConnected);
            }
            // the receiver is parked on `ready` until the open handlers have run
            let receiver = tokio::spawn(self.clone().receive_loop(
                stream,
                ready_rx,
                outbound.clone(),
                shutdown.clone(),
            ));
            *slot = Some(Connection {
                outbound,
                shutdown,
                receiver,
            });
        }

        tokio::spawn(write_loop(sink, outbound_rx));

        self.set_state(state::CONNECTED);
        tracing::info!("Connected");
        self.fire(LifecycleEvent::Open);
        let _ = ready_tx.send(());

        Ok(())
    }

    /// Close the connection
    ///
    /// Frames already queued are sent first. When this returns the close
    /// handlers have run. Pending calls stay pending unless the client was
    /// built with `fail_pending_on_close`. Does nothing when not connected.
    #[tracing::instrument(skip(self))]
    pub async fn disconnect(&self) {
        let Some(connection) = lock(&self.connection).take() else {
            tracing::debug!("Not connected");
            return;
        };

        let Connection {
            outbound,
            shutdown,
            receiver,
        } = connection;

        let (ack_tx, ack_rx) = oneshot::channel();
        let _ = outbound.send(Outbound::Close(ack_tx));
        drop(outbound);
        shutdown.notify_one();

        let _ = ack_rx.await;
        let _ = receiver.await;

        tracing::info!("Disconnected");
    }

    async fn receive_loop(
        self,
        mut stream: FrameStream,
        ready: oneshot::Receiver<()>,
        outbound: mpsc::UnboundedSender<Outbound>,
        shutdown: Arc<Notify>,
    ) {
        // a disconnect issued meanwhile leaves a permit in `shutdown`
        let _ = ready.await;

        loop {
            let frame = tokio::select! {
                biased;
                _ = shutdown.notified() => {
                    tracing::debug!("Receive loop stopped");
                    break;
                }
                frame = stream.next() => frame,
            };

            match frame {
                Some(Ok(text)) => self.dispatch_frame(&text),
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Transport error");
                    self.record_error("transport");
                    break;
                }
                None => {
                    tracing::info!("Connection closed by peer");
                    break;
                }
            }
        }

        drop(stream);
        self.connection_closed(&outbound);
    }

    fn connection_closed(&self, outbound: &mpsc::UnboundedSender<Outbound>) {
        {
            let mut slot = lock(&self.connection);
            let current = slot
                .as_ref()
                .is_some_and(|connection| connection.outbound.same_channel(outbound));
            if current {
                *slot = None;
            }
        }

        if self.config.fail_pending_on_close {
            let calls = self.pending.drain();
            if !calls.is_empty() {
                tracing::debug!(count = calls.len(), "Failing pending calls");
            }
            for call in calls {
                if let Some(ref m) = self.metrics {
                    m.record_reply(&call.method, "closed", call.started.elapsed());
                }
                let method = call.method.clone();
                self.guarded(&method, || call.settle(Err(Error::ConnectionClosed)));
            }
        }

        self.set_state(state::DISCONNECTED);
        self.fire(LifecycleEvent::Close);
    }

    // ---------------------------------------------------------------------
    // Outbound
    // ---------------------------------------------------------------------

    /// Send a call and handle its reply in callbacks
    ///
    /// Returns as soon as the request is queued. Exactly one of the handlers
    /// runs later, on the receive task, unless the call never gets a reply.
    ///
    /// ```rust,no_run
    /// # fn example(client: &rpcline_client::RpcClient) -> rpcline_core::Result<()> {
    /// client.call(
    ///     "add",
    ///     serde_json::json!([1, 2]),
    ///     |sum| println!("sum = {}", sum),
    ///     |err| eprintln!("failed: {}", err),
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn call<P, S, E>(
        &self,
        method: impl Into<String>,
        params: P,
        on_success: S,
        on_error: E,
    ) -> Result<Id>
    where
        P: Serialize,
        S: FnOnce(Value) + Send + 'static,
        E: FnOnce(Error) + Send + 'static,
    {
        self.call_with(
            method,
            params,
            CallOptions::new().on_success(on_success).on_error(on_error),
        )
    }

    /// Send a call with explicit options
    ///
    /// Handlers missing from `options` are replaced by the configured
    /// default handlers. A timeout in `options` overrides the client's
    /// default deadline.
    ///
    /// # Errors
    ///
    /// `NotConnected` before `connect` (nothing is registered), and
    /// `Serialization` if `params` cannot be converted to JSON.
    pub fn call_with<P: Serialize>(
        &self,
        method: impl Into<String>,
        params: P,
        options: CallOptions,
    ) -> Result<Id> {
        let method = method.into();
        let params = serde_json::to_value(params)?;
        self.ensure_connected()?;

        let id = self.pending.next_id();
        let (complete, timeout) = options.into_completion(id, &method, self.config.default_handlers);
        self.start_call(id, method, params, complete, timeout)
    }

    /// Send a call and wait for its result
    ///
    /// A server error comes back as [`Error::Remote`]. Without a deadline
    /// this waits as long as the call stays pending.
    pub async fn request<P>(&self, method: impl Into<String>, params: P) -> Result<Value>
    where
        P: Serialize,
    {
        self.deferred(method.into(), params, None).await
    }

    /// Send a call and wait for its result, giving up after `timeout`
    pub async fn request_timeout<P>(
        &self,
        method: impl Into<String>,
        params: P,
        timeout: Duration,
    ) -> Result<Value>
    where
        P: Serialize,
    {
        self.deferred(method.into(), params, Some(timeout)).await
    }

    /// Send a call and deserialize its result
    ///
    /// ```rust,no_run
    /// # async fn example(client: &rpcline_client::RpcClient) -> rpcline_core::Result<()> {
    /// let sum: i64 = client.request_as("add", [1, 2]).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn request_as<P, R>(&self, method: impl Into<String>, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let value = self.deferred(method.into(), params, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn deferred<P: Serialize>(
        &self,
        method: String,
        params: P,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let params = serde_json::to_value(params)?;
        self.ensure_connected()?;

        let id = self.pending.next_id();
        let (tx, rx) = oneshot::channel();
        let complete: Completion = Box::new(move |outcome| {
            let _ = tx.send(outcome);
        });
        self.start_call(id, method, params, complete, timeout)?;

        rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Send a notification; no reply is expected
    pub fn notify<P: Serialize>(&self, method: impl Into<String>, params: P) -> Result<()> {
        let notification = JsonRpcNotification::new(method, Some(serde_json::to_value(params)?));
        self.send_frame(codec::encode_notification(&notification)?)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    /// Register the pending entry, queue the request and arm the deadline
    fn start_call(
        &self,
        id: i64,
        method: String,
        params: Value,
        complete: Completion,
        timeout: Option<Duration>,
    ) -> Result<Id> {
        let deadline = match timeout.or(self.config.call_timeout) {
            Some(timeout) => {
                let runtime = Handle::try_current().map_err(|_| {
                    Error::Internal("call deadlines need a tokio runtime".to_string())
                })?;
                Some((timeout, runtime))
            }
            None => None,
        };

        let request = JsonRpcRequest::new(method.clone(), Some(params), Id::Number(id));
        let frame = codec::encode_request(&request)?;

        // registered before sending so a fast reply always finds its entry
        self.pending.insert(id, PendingCall::new(method.clone(), complete));
        if let Err(e) = self.send_frame(frame) {
            self.pending.expire(id);
            return Err(e);
        }

        if let Some((timeout, runtime)) = deadline {
            self.arm_deadline(&runtime, id, timeout);
        }

        if let Some(ref m) = self.metrics {
            m.record_call(&method);
        }
        tracing::debug!(id, method = %method, "Call sent");

        Ok(Id::Number(id))
    }

    fn arm_deadline(&self, runtime: &Handle, id: i64, timeout: Duration) {
        let pending = self.pending.clone();
        let metrics = self.metrics.clone();

        let timer = runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(call) = pending.expire(id) {
                tracing::warn!(id, method = %call.method, timeout_ms = timeout.as_millis() as u64, "Call timed out");
                if let Some(ref m) = metrics {
                    m.record_reply(&call.method, "timeout", call.started.elapsed());
                }
                call.settle(Err(Error::Timeout));
            }
        });

        self.pending.attach_deadline(id, timer);
    }

    fn send_frame(&self, frame: String) -> Result<()> {
        let outbound = lock(&self.connection)
            .as_ref()
            .map(|connection| connection.outbound.clone())
            .ok_or(Error::NotConnected)?;

        if self.config.debug_frames {
            tracing::debug!(target: "rpcline::frames", direction = ">>", frame = %frame, "frame");
        }

        outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| Error::NotConnected)
    }

    // ---------------------------------------------------------------------
    // Pub/sub
    // ---------------------------------------------------------------------

    /// Subscribe to a topic, reporting the outcome to `on_complete`
    ///
    /// Sends `subscribe` with the topic name as params. The server answers
    /// with the list of topics the client is now subscribed to. If that list
    /// contains `topic`, `handler` is installed before the next inbound
    /// message is dispatched and `on_complete` receives the list; otherwise
    /// nothing is installed and `on_complete` receives
    /// [`Error::UnknownTopic`].
    pub fn subscribe_with<F, C>(&self, topic: impl Into<String>, handler: F, on_complete: C) -> Result<Id>
    where
        F: Fn(Value) + Send + Sync + 'static,
        C: FnOnce(Result<Vec<String>>) + Send + 'static,
    {
        let topic = topic.into();
        self.ensure_connected()?;

        let id = self.pending.next_id();
        let params = Value::String(topic.clone());
        let topics = self.topics.clone();
        let handler: TopicHandler = Arc::new(handler);

        let complete: Completion = Box::new(move |outcome| {
            let confirmed = outcome.and_then(|ack| confirm_subscription(&topic, ack));
            match confirmed {
                Ok(_) => {
                    topics.install(topic.clone(), handler);
                    tracing::info!(topic = %topic, "Subscribed");
                }
                Err(ref e) => tracing::warn!(topic = %topic, error = %e, "Subscription failed"),
            }
            on_complete(confirmed);
        });

        self.start_call(id, "subscribe".to_string(), params, complete, None)
    }

    /// Subscribe to a topic and wait for the server's confirmation
    ///
    /// Returns the topics the server reports as subscribed.
    ///
    /// ```rust,no_run
    /// # async fn example(client: &rpcline_client::RpcClient) -> rpcline_core::Result<()> {
    /// client.subscribe("news", |msg| println!("news: {}", msg)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> Result<Vec<String>>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.subscribe_with(topic, handler, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Remove the topic's handler and tell the server
    ///
    /// The handler is removed before the request is sent, so no further
    /// messages for the topic reach it. Returns the server's list of
    /// remaining subscriptions.
    pub async fn unsubscribe(&self, topic: impl Into<String>) -> Result<Vec<String>> {
        let topic = topic.into();
        if self.topics.remove(&topic) {
            tracing::info!(topic = %topic, "Unsubscribed");
        }
        self.request_as("unsubscribe", topic).await
    }

    /// Methods the server exposes
    pub async fn get_methods(&self) -> Result<Vec<String>> {
        self.request_as("get_methods", Value::Null).await
    }

    /// Topics the server publishes
    pub async fn get_topics(&self) -> Result<Vec<String>> {
        self.request_as("get_topics", Value::Null).await
    }

    /// Topics the server considers this client subscribed to
    pub async fn get_subscriptions(&self) -> Result<Vec<String>> {
        self.request_as("get_subscriptions", Value::Null).await
    }

    // ---------------------------------------------------------------------
    // Inbound
    // ---------------------------------------------------------------------

    fn dispatch_frame(&self, text: &str) {
        if self.config.debug_frames {
            tracing::debug!(target: "rpcline::frames", direction = "<<", frame = %text, "frame");
        }

        let messages = match codec::decode(text) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping inbound frame");
                self.record_error("protocol_violation");
                return;
            }
        };

        for message in messages {
            match message {
                Ok(inbound) => {
                    let context = match &inbound {
                        Inbound::Request(request) => request.method.clone(),
                        Inbound::Notification(notification) => notification.method.clone(),
                        Inbound::Reply(_) => "reply".to_string(),
                    };
                    self.guarded(&context, || self.dispatch(inbound));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping inbound message");
                    self.record_error("protocol_violation");
                }
            }
        }
    }

    fn dispatch(&self, message: Inbound) {
        match message {
            Inbound::Request(request) => self.handle_request(request),
            Inbound::Notification(notification) => self.handle_notification(notification),
            Inbound::Reply(reply) => self.handle_reply(reply),
        }
    }

    fn handle_request(&self, request: JsonRpcRequest) {
        let JsonRpcRequest {
            method, params, id, ..
        } = request;

        let Some(handler) = self.methods.get(&method) else {
            self.handle_unknown_method(method, id);
            return;
        };

        tracing::debug!(id = %id, method = %method, "Handling inbound request");
        let params = params.unwrap_or(Value::Null);
        let (response, status) = match panic::catch_unwind(AssertUnwindSafe(|| handler(params))) {
            Ok(Ok(result)) => (JsonRpcResponse::success(result, id), "success"),
            Ok(Err(error)) => {
                tracing::debug!(method = %method, error = %error, "Local method returned an error");
                (JsonRpcResponse::error(error, id), "error")
            }
            Err(payload) => {
                tracing::error!(method = %method, panic = %panic_message(&*payload), "Local method panicked");
                self.record_error("handler_panic");
                let error = JsonRpcErrorData::internal_error(format!("Method {} failed", method));
                (JsonRpcResponse::error(error, id), "panic")
            }
        };

        if let Some(ref m) = self.metrics {
            m.record_inbound_request(&method, status);
        }
        self.send_response(&response);
    }

    fn handle_unknown_method(&self, method: String, id: Id) {
        if let Some(ref m) = self.metrics {
            m.record_inbound_request(&method, "unknown_method");
        }

        let error = Error::UnknownMethod(method.clone());
        match self.config.unknown_method {
            UnknownMethodPolicy::Ignore => {
                tracing::debug!(id = %id, error = %error, "Ignoring inbound request");
            }
            UnknownMethodPolicy::ReplyMethodNotFound => {
                tracing::debug!(id = %id, error = %error, "Rejecting inbound request");
                self.send_response(&JsonRpcResponse::error(
                    JsonRpcErrorData::method_not_found(method),
                    id,
                ));
            }
        }
    }

    fn send_response(&self, response: &JsonRpcResponse) {
        let sent = codec::encode_response(response).and_then(|frame| self.send_frame(frame));
        if let Err(e) = sent {
            tracing::warn!(id = %response.id, error = %e, "Failed to send reply");
            self.record_error("reply");
        }
    }

    fn handle_notification(&self, notification: JsonRpcNotification) {
        let JsonRpcNotification { method: topic, params, .. } = notification;

        if let Some(ref m) = self.metrics {
            m.record_notification(&topic);
        }

        if !self.topics.handle(&topic, params) {
            tracing::trace!(topic = %topic, "No handler for notification");
        }
    }

    fn handle_reply(&self, reply: Reply) {
        let Some(id) = reply.id else {
            tracing::warn!("Dropping reply without a usable id");
            self.record_error("protocol_violation");
            return;
        };

        let (outcome, status) = match reply.outcome {
            ReplyOutcome::Success(result) => (Ok(result), "success"),
            ReplyOutcome::Failure(error) => (Err(Error::Remote(error)), "error"),
            ReplyOutcome::Malformed => {
                // entry stays pending
                tracing::warn!(id = %id, "Reply carries neither result nor error");
                self.record_error("protocol_violation");
                return;
            }
        };

        let Some(call) = self.pending.take(&id) else {
            tracing::debug!(id = %id, "Dropping reply for unknown call");
            return;
        };

        tracing::debug!(id = %id, method = %call.method, status, "Reply received");
        if let Some(ref m) = self.metrics {
            m.record_reply(&call.method, status, call.started.elapsed());
        }
        call.settle(outcome);
    }

    fn set_state(&self, value: i64) {
        if let Some(ref m) = self.metrics {
            m.update_connection_state(value);
        }
    }

    fn record_error(&self, kind: &str) {
        if let Some(ref m) = self.metrics {
            m.record_error(kind);
        }
    }

    /// Run application code, containing any panic to this one invocation
    ///
    /// A handler that panics must not take the receive task down with it:
    /// later frames still dispatch and the close handlers still run.
    fn guarded(&self, context: &str, f: impl FnOnce()) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
            tracing::error!(context, panic = %panic_message(&*payload), "Handler panicked");
            self.record_error("handler_panic");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Check a subscribe acknowledgement for `topic`
fn confirm_subscription(topic: &str, ack: Value) -> Result<Vec<String>> {
    let Value::Array(items) = ack else {
        return Err(Error::UnknownTopic(topic.to_string()));
    };

    let topics: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name),
            _ => None,
        })
        .collect();

    if topics.iter().any(|name| name == topic) {
        Ok(topics)
    } else {
        Err(Error::UnknownTopic(topic.to_string()))
    }
}

async fn write_loop(mut sink: FrameSink, mut outbound: mpsc::UnboundedReceiver<Outbound>) {
    while let Some(item) = outbound.recv().await {
        match item {
            Outbound::Frame(frame) => {
                if let Err(e) = sink.send(frame).await {
                    tracing::error!(error = %e, "Failed to send frame");
                    return;
                }
            }
            Outbound::Close(ack) => {
                if let Err(e) = sink.close().await {
                    tracing::debug!(error = %e, "Error while closing transport");
                }
                let _ = ack.send(());
                return;
            }
        }
    }

    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryTransport;
    use serde_json::json;

    #[test]
    fn test_confirm_subscription() {
        assert_eq!(
            confirm_subscription("news", json!(["news", "weather"])).unwrap(),
            vec!["news".to_string(), "weather".to_string()]
        );
        assert!(matches!(
            confirm_subscription("news", json!(["other"])),
            Err(Error::UnknownTopic(t)) if t == "news"
        ));
        assert!(matches!(
            confirm_subscription("news", json!({"subscribed": true})),
            Err(Error::UnknownTopic(_))
        ));
        assert!(matches!(
            confirm_subscription("news", json!([])),
            Err(Error::UnknownTopic(_))
        ));
    }

    #[test]
    fn test_call_before_connect_registers_nothing() {
        let (transport, _peer) = MemoryTransport::pair();
        let client = RpcClient::new(transport);

        let result = client.call("add", json!([1, 2]), |_| {}, |_| {});
        assert!(matches!(result, Err(Error::NotConnected)));
        assert_eq!(client.pending_count(), 0);
        assert!(matches!(client.notify("hello", json!(null)), Err(Error::NotConnected)));
    }

    #[test]
    fn test_unknown_event_leaves_hooks_untouched() {
        let (transport, _peer) = MemoryTransport::pair();
        let client = RpcClient::new(transport);

        client.on("open", |_| {}).unwrap();
        match client.on("bogus", |_| {}) {
            Err(Error::UnknownEvent(name)) => assert_eq!(name, "bogus"),
            other => panic!("Expected UnknownEvent, got {:?}", other),
        }

        assert_eq!(client.hooks.count(LifecycleEvent::Open), 1);
        assert_eq!(client.hooks.count(LifecycleEvent::Close), 0);
    }

    #[tokio::test]
    async fn test_connect_twice_fails() {
        let (transport, _peer) = MemoryTransport::pair();
        let client = RpcClient::new(transport);

        client.connect().await.unwrap();
        assert!(matches!(client.connect().await, Err(Error::AlreadyConnected)));
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected_is_noop() {
        let (transport, _peer) = MemoryTransport::pair();
        let client = RpcClient::new(transport);
        client.disconnect().await;
        assert!(!client.is_connected());
    }
}
