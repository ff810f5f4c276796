//! Telemetry setup for OpenTelemetry integration

use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// OpenTelemetry layer, if enabled
///
/// # Environment Variables
///
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
/// - `OTEL_SERVICE_NAME`: Service name (default: cadence-daemon)
///
/// # Example
///
/// ```text
/// OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
/// OTEL_SERVICE_NAME=cadence-dev \
///     ./cadence-daemon
/// ```
///
/// Runs before the subscriber exists, so problems are returned as messages
/// for the caller to log once logging is up.
pub fn otel_layer<S>() -> (Option<Box<dyn Layer<S> + Send + Sync>>, Option<String>)
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return (None, None);
    };

    #[cfg(feature = "telemetry")]
    {
        match init_telemetry_impl(&endpoint) {
            Ok(layer) => (Some(layer), None),
            Err(e) => (
                None,
                Some(format!(
                    "Failed to initialize OpenTelemetry (continuing without it): {}",
                    e
                )),
            ),
        }
    }

    #[cfg(not(feature = "telemetry"))]
    {
        (
            None,
            Some(format!(
                "OpenTelemetry endpoint {} set but feature 'telemetry' not enabled",
                endpoint
            )),
        )
    }
}

#[cfg(feature = "telemetry")]
fn init_telemetry_impl<S>(endpoint: &str) -> anyhow::Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::Resource;

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "cadence-daemon".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();

    let tracer = provider.tracer(service_name);
    opentelemetry::global::set_tracer_provider(provider);

    Ok(tracing_opentelemetry::layer().with_tracer(tracer).boxed())
}
