//! Client metrics
//!
//! OpenTelemetry instruments for the engine. Recorded only when the client is
//! built with `ClientBuilder::with_observability` or `with_metrics`; exported
//! by whatever meter provider is installed globally.
//!
//! # Metrics Collected
//!
//! - **rpcline.client.connection.state**: 0 = disconnected, 1 = connecting, 2 = connected
//! - **rpcline.client.calls.total**: outbound calls sent, by method
//! - **rpcline.client.replies.total**: settled calls, by method and status
//! - **rpcline.client.call.duration**: seconds from send to settlement
//! - **rpcline.client.inbound_requests.total**: inbound requests, by method and status
//! - **rpcline.client.notifications.received**: inbound notifications, by topic
//! - **rpcline.client.errors.total**: dropped or failed traffic, by kind

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};
use std::time::Duration;

/// Numeric values of the connection-state gauge
pub(crate) mod state {
    pub const DISCONNECTED: i64 = 0;
    pub const CONNECTING: i64 = 1;
    pub const CONNECTED: i64 = 2;
}

/// Instruments recorded by the client
pub struct ClientMetrics {
    /// Connection state gauge
    pub connection_state: Gauge<i64>,
    /// Outbound calls sent
    pub calls_total: Counter<u64>,
    /// Settled calls
    pub replies_total: Counter<u64>,
    /// Call latency in seconds
    pub call_duration: Histogram<f64>,
    /// Inbound requests handled or dropped
    pub inbound_requests: Counter<u64>,
    /// Inbound notifications
    pub notifications_received: Counter<u64>,
    /// Errors by kind
    pub errors_total: Counter<u64>,
}

impl ClientMetrics {
    /// Create instruments on the global meter named after the service
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create instruments on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("rpcline.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=connecting, 2=connected)")
                .build(),
            calls_total: meter
                .u64_counter("rpcline.client.calls.total")
                .with_description("Total number of outbound calls sent")
                .build(),
            replies_total: meter
                .u64_counter("rpcline.client.replies.total")
                .with_description("Total number of settled outbound calls")
                .build(),
            call_duration: meter
                .f64_histogram("rpcline.client.call.duration")
                .with_description("Time from sending a call to its settlement, in seconds")
                .build(),
            inbound_requests: meter
                .u64_counter("rpcline.client.inbound_requests.total")
                .with_description("Total number of inbound requests")
                .build(),
            notifications_received: meter
                .u64_counter("rpcline.client.notifications.received")
                .with_description("Total number of notifications received")
                .build(),
            errors_total: meter
                .u64_counter("rpcline.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
        }
    }

    /// Update connection state
    pub fn update_connection_state(&self, state: i64) {
        self.connection_state.record(state, &[]);
    }

    /// Record an outbound call
    pub fn record_call(&self, method: &str) {
        self.calls_total
            .add(1, &[KeyValue::new("method", method.to_string())]);
    }

    /// Record the settlement of an outbound call
    ///
    /// `status` is one of "success", "error", "timeout" or "closed".
    pub fn record_reply(&self, method: &str, status: &str, elapsed: Duration) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.replies_total.add(1, attributes);
        self.call_duration.record(elapsed.as_secs_f64(), attributes);
    }

    /// Record an inbound request; `status` is "success", "error" or "unknown_method"
    pub fn record_inbound_request(&self, method: &str, status: &str) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.inbound_requests.add(1, attributes);
    }

    /// Record a notification received
    pub fn record_notification(&self, topic: &str) {
        self.notifications_received
            .add(1, &[KeyValue::new("topic", topic.to_string())]);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        self.errors_total
            .add(1, &[KeyValue::new("error_type", error_type.to_string())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::new("test-client");

        // no provider installed: every recorder is a no-op and must not panic
        metrics.update_connection_state(state::CONNECTED);
        metrics.record_call("add");
        metrics.record_reply("add", "success", Duration::from_millis(5));
        metrics.record_inbound_request("ping", "success");
        metrics.record_notification("news");
        metrics.record_error("protocol_violation");
    }

    #[test]
    fn test_connection_states() {
        let metrics = ClientMetrics::new("test-client-state");
        for value in [state::DISCONNECTED, state::CONNECTING, state::CONNECTED] {
            metrics.update_connection_state(value);
        }
    }

    #[test]
    fn test_with_sdk_meter() {
        use opentelemetry::metrics::MeterProvider as _;

        let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder().build();
        let metrics = ClientMetrics::new_with_meter(&provider.meter("rpcline-test"));

        metrics.record_reply("subscribe", "timeout", Duration::from_secs(1));
        metrics.record_inbound_request("missing", "unknown_method");
    }
}
