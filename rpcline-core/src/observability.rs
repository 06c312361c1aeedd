//! Logging and OpenTelemetry setup
//!
//! The engine itself only emits `tracing` events and, when enabled, records
//! OpenTelemetry metrics through the global meter provider. This module is the
//! optional one-call setup that installs a subscriber and exporters for an
//! application that has none of its own.
//!
//! Two log targets are worth knowing:
//!
//! - `rpcline_client`: connection lifecycle, dropped messages, handler failures
//! - `rpcline::frames`: every raw frame sent and received, at debug level
//!
//! ```rust,no_run
//! use rpcline_core::ObservabilityConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("ticker-dashboard")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("rpcline::frames=debug,info");
//!
//!     rpcline_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... connect clients ...
//!
//!     rpcline_core::shutdown_observability();
//! }
//! ```
//!
//! `OTEL_EXPORTER_OTLP_ENDPOINT` and `RUST_LOG` override the defaults.

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Providers installed by [`init_observability`], kept for shutdown
static PROVIDERS: Mutex<Providers> = Mutex::new(Providers {
    tracer: None,
    meter: None,
});

struct Providers {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
}

fn providers() -> std::sync::MutexGuard<'static, Providers> {
    PROVIDERS.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Observability configuration
///
/// # Defaults
///
/// - Service name: "rpcline"
/// - Service version: the crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT` or "http://localhost:4317"
/// - Traces and metrics enabled
/// - Log level: `$RUST_LOG` or "info"
///
/// ```rust
/// use rpcline_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("chat-client")
///     .with_endpoint("http://collector:4317")
///     .with_version("0.3.1")
///     .with_metrics(false);
/// assert!(!config.enable_metrics);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to every span and metric
    pub service_name: String,

    /// Service version attached to every span and metric
    pub service_version: String,

    /// gRPC endpoint of the OTLP collector
    pub otlp_endpoint: String,

    /// Export spans to the collector
    pub enable_traces: bool,

    /// Export metrics to the collector
    pub enable_metrics: bool,

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "rpcline".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: true,
            enable_metrics: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration with a custom service name and defaults otherwise
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the log filter directive
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the global tracing subscriber and OpenTelemetry providers
///
/// Logs are written to stdout as JSON. When traces are enabled, spans are
/// additionally exported over OTLP; when metrics are enabled a periodic reader
/// exports every 30 seconds.
///
/// # Errors
///
/// Fails if an exporter cannot be built, if the log directive does not parse,
/// or if a global subscriber is already installed.
pub fn init_observability(config: ObservabilityConfig) -> Result<(), BoxError> {
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        "Observability initialized"
    );

    Ok(())
}

fn init_tracer(config: &ObservabilityConfig) -> Result<opentelemetry_sdk::trace::Tracer, BoxError> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    // the subscriber layer needs a tracer before the provider moves into the global slot
    let tracer = provider.tracer(config.service_name.clone());
    providers().tracer = Some(provider.clone());
    global::set_tracer_provider(provider);

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> Result<(), BoxError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(30))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    providers().meter = Some(provider.clone());
    global::set_meter_provider(provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), BoxError> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .json();

    // Option<Layer> is itself a layer, so a disabled exporter just drops out
    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Flush and stop telemetry export
///
/// Exports the spans and metrics still buffered by the providers that
/// [`init_observability`] installed, then shuts them down. Later calls, and
/// calls when no exporter was installed, do nothing beyond logging.
pub fn shutdown_observability() {
    tracing::info!("Shutting down observability");

    let (tracer, meter) = {
        let mut installed = providers();
        (installed.tracer.take(), installed.meter.take())
    };

    if let Some(provider) = tracer {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }
    }
    if let Some(provider) = meter {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Meter provider shutdown failed");
        }
    }
}
