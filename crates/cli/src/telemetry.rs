//! Tracing subscriber and OpenTelemetry wiring.
//!
//! Logs go to stderr so stdout carries only emitted frames.

use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::{LogFormat, TelemetryConfig};

const DEFAULT_FILTER: &str = "info";

/// Installed telemetry. Call [`Telemetry::shutdown`] before exit to flush
/// pending spans.
#[derive(Debug)]
pub struct Telemetry {
    otel_enabled: bool,
}

/// Installs the global subscriber: `RUST_LOG` filter (default `info`), a
/// JSON or pretty formatter, and an OTLP layer when an endpoint is set.
pub fn init(format: LogFormat, config: &TelemetryConfig) -> Telemetry {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    let otel = config
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| init_otel(endpoint, &config.service_name).map_err(|e| (endpoint, e)));

    let (provider, otel_error) = match otel {
        Some(Ok(provider)) => (Some(provider), None),
        Some(Err((endpoint, e))) => (None, Some((endpoint, e))),
        None => (None, None),
    };

    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(otel_layer)
        .with(filter)
        .init();

    match (&provider, otel_error) {
        (Some(_), _) => {
            tracing::info!(endpoint = ?config.otlp_endpoint, "tracing initialized with OpenTelemetry export");
        }
        (None, Some((endpoint, e))) => {
            tracing::warn!(endpoint, error = %e, "failed to initialize OpenTelemetry; export disabled");
        }
        (None, None) => tracing::debug!("tracing initialized (OpenTelemetry disabled)"),
    }

    let otel_enabled = match provider {
        Some(provider) => {
            opentelemetry::global::set_tracer_provider(provider);
            true
        }
        None => false,
    };

    Telemetry { otel_enabled }
}

impl Telemetry {
    /// Flushes and shuts down the exporter, if one was installed.
    pub fn shutdown(self) {
        if self.otel_enabled {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

fn init_otel(
    endpoint: &str,
    service_name: &str,
) -> Result<TracerProvider, opentelemetry::trace::TraceError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .with_batch_exporter(exporter, runtime::Tokio)
        .build();

    Ok(provider)
}
