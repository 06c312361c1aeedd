//! Client builder
//!
//! The `ClientBuilder` provides a fluent API for configuring a client before
//! connecting. It allows you to:
//! - Pick the transport (WebSocket URL or any [`Transport`])
//! - Turn on frame logging and logging default handlers
//! - Set call deadlines and how unknown inbound methods are treated
//! - Configure observability (OpenTelemetry)
//!
//! # Examples
//!
//! ```rust,no_run
//! use rpcline_client::{ClientBuilder, UnknownMethodPolicy};
//! use std::time::Duration;
//!
//! # async fn example() -> rpcline_core::Result<()> {
//! // Debug mode: frames and unhandled outcomes are logged
//! let client = ClientBuilder::websocket("ws://localhost:8080")
//!     .debug(true)
//!     .connect()
//!     .await?;
//!
//! // Deadlines and strict method handling
//! let client2 = ClientBuilder::websocket("ws://localhost:8080")
//!     .call_timeout(Duration::from_secs(10))
//!     .unknown_method(UnknownMethodPolicy::ReplyMethodNotFound)
//!     .fail_pending_on_close(true)
//!     .connect()
//!     .await?;
//!
//! // With observability
//! let client3 = ClientBuilder::websocket("ws://localhost:8080")
//!     .with_default_observability()
//!     .service_name("my-client")
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{ClientConfig, DefaultHandlers, UnknownMethodPolicy};
use crate::transport::{Transport, WsTransport};
use crate::{ClientMetrics, RpcClient};
use rpcline_core::{Error, ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating an [`RpcClient`]
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    observability_config: Option<ObservabilityConfig>,
    metrics_enabled: bool,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a builder over any transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            config: ClientConfig::default(),
            observability_config: None,
            metrics_enabled: false,
            service_name: None,
        }
    }

    /// Create a builder for a WebSocket URL
    pub fn websocket(url: impl Into<String>) -> Self {
        Self::new(WsTransport::new(url))
    }

    /// Debug mode
    ///
    /// On: log every frame and use logging default handlers. Off: no frame
    /// logging and silent default handlers.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug_frames = enabled;
        self.config.default_handlers = if enabled {
            DefaultHandlers::Log
        } else {
            DefaultHandlers::Silent
        };
        self
    }

    /// Log frames without changing the default handlers
    pub fn debug_frames(mut self, enabled: bool) -> Self {
        self.config.debug_frames = enabled;
        self
    }

    /// Handlers substituted when a call omits its own
    pub fn default_handlers(mut self, handlers: DefaultHandlers) -> Self {
        self.config.default_handlers = handlers;
        self
    }

    /// What to do with inbound requests for unregistered methods
    pub fn unknown_method(mut self, policy: UnknownMethodPolicy) -> Self {
        self.config.unknown_method = policy;
        self
    }

    /// Deadline for calls that do not set their own
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = Some(timeout);
        self
    }

    /// Fail pending calls with `ConnectionClosed` when the connection closes
    pub fn fail_pending_on_close(mut self, enabled: bool) -> Self {
        self.config.fail_pending_on_close = enabled;
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Record client metrics on the global meter provider
    ///
    /// Implied by `with_observability`. Use this when the application sets
    /// up OpenTelemetry itself.
    pub fn with_metrics(mut self) -> Self {
        self.metrics_enabled = true;
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the client without connecting
    pub fn build(self) -> Result<RpcClient> {
        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            rpcline_core::init_observability(config.clone())
                .map_err(|e| Error::Internal(format!("Failed to initialize observability: {}", e)))?;

            Some(Arc::new(ClientMetrics::new(config.service_name)))
        } else if self.metrics_enabled {
            let name = self.service_name.unwrap_or_else(|| "rpcline".to_string());
            Some(Arc::new(ClientMetrics::new(name)))
        } else {
            None
        };

        Ok(RpcClient::from_parts(self.transport, self.config, metrics))
    }

    /// Build and connect the client
    pub async fn connect(self) -> Result<RpcClient> {
        let client = self.build()?;
        client.connect().await?;
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryTransport;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::websocket("ws://localhost:8080");

        assert!(!builder.config.debug_frames);
        assert_eq!(builder.config.default_handlers, DefaultHandlers::Silent);
        assert_eq!(builder.config.unknown_method, UnknownMethodPolicy::Ignore);
        assert!(builder.config.call_timeout.is_none());
        assert!(!builder.config.fail_pending_on_close);
        assert!(builder.observability_config.is_none());
        assert!(!builder.metrics_enabled);
        assert!(builder.service_name.is_none());
    }

    #[test]
    fn test_builder_url_storage() {
        let url = "ws://example.com:9000/path";
        let builder = ClientBuilder::websocket(url);

        assert_eq!(builder.transport.describe(), url);
    }

    #[test]
    fn test_debug_toggles_frames_and_handlers() {
        let builder = ClientBuilder::websocket("ws://localhost:8080").debug(true);
        assert!(builder.config.debug_frames);
        assert_eq!(builder.config.default_handlers, DefaultHandlers::Log);

        let builder = builder.debug(false);
        assert!(!builder.config.debug_frames);
        assert_eq!(builder.config.default_handlers, DefaultHandlers::Silent);
    }

    #[test]
    fn test_builder_chaining() {
        let builder = ClientBuilder::websocket("ws://localhost:8080")
            .debug_frames(true)
            .default_handlers(DefaultHandlers::Log)
            .unknown_method(UnknownMethodPolicy::ReplyMethodNotFound)
            .call_timeout(Duration::from_millis(250))
            .fail_pending_on_close(true)
            .service_name("test-service")
            .with_default_observability();

        assert!(builder.config.debug_frames);
        assert_eq!(builder.config.default_handlers, DefaultHandlers::Log);
        assert_eq!(
            builder.config.unknown_method,
            UnknownMethodPolicy::ReplyMethodNotFound
        );
        assert_eq!(builder.config.call_timeout, Some(Duration::from_millis(250)));
        assert!(builder.config.fail_pending_on_close);
        assert!(builder.observability_config.is_some());
        assert_eq!(builder.service_name, Some("test-service".to_string()));
    }

    #[test]
    fn test_builder_observability_config() {
        let config = ObservabilityConfig::new("test-client")
            .with_endpoint("http://localhost:4317")
            .with_log_level("debug");

        let builder = ClientBuilder::websocket("ws://localhost:8080").with_observability(config);

        let obs_config = builder.observability_config.unwrap();
        assert_eq!(obs_config.service_name, "test-client");
        assert_eq!(obs_config.log_level, "debug");
    }

    #[test]
    fn test_builder_default_observability() {
        let builder = ClientBuilder::websocket("ws://localhost:8080").with_default_observability();

        let obs_config = builder.observability_config.unwrap();
        assert_eq!(obs_config.service_name, "rpcline");
    }

    #[test]
    fn test_build_carries_config() {
        let (transport, _peer) = MemoryTransport::pair();
        let client = ClientBuilder::new(transport)
            .call_timeout(Duration::from_secs(3))
            .with_metrics()
            .build()
            .unwrap();

        assert_eq!(client.config().call_timeout, Some(Duration::from_secs(3)));
        assert!(!client.is_connected());
    }
}
