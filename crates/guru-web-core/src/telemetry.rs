use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry_prometheus::PrometheusExporter;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use tracing_subscriber::{EnvFilter, fmt};

static LOGGING: OnceLock<()> = OnceLock::new();
static TELEMETRY: OnceCell<TelemetryState> = OnceCell::new();
static METRICS: OnceCell<MetricsHandles> = OnceCell::new();

struct TelemetryState {
    _provider: SdkMeterProvider,
    registry: Registry,
}

struct MetricsHandles {
    queries: Counter<u64>,
    query_failures: Counter<u64>,
    scope_violations: Counter<u64>,
    query_latency: Histogram<f64>,
}

/// Initialize tracing and metrics exporters. Safe to call multiple times.
pub fn init() -> Result<()> {
    configure_logging();
    configure_metrics()?;
    Ok(())
}

fn configure_logging() {
    LOGGING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

fn configure_metrics() -> Result<&'static TelemetryState> {
    TELEMETRY.get_or_try_init(|| {
        let registry = Registry::new();
        let exporter = build_exporter(&registry)?;

        let provider = SdkMeterProvider::builder()
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                "guru-web",
            )]))
            .with_reader(exporter)
            .build();

        global::set_meter_provider(provider.clone());

        let meter = global::meter("guru-web");
        let queries = meter
            .u64_counter("guruweb_queries_total")
            .with_description("Queries forwarded to the analysis engine")
            .init();
        let query_failures = meter
            .u64_counter("guruweb_query_failures_total")
            .with_description("Queries that failed in the engine or while rendering")
            .init();
        let scope_violations = meter
            .u64_counter("guruweb_scope_violations_total")
            .with_description("Requests rejected for naming a file outside the scope")
            .init();
        let query_latency = meter
            .f64_histogram("guruweb_query_latency_ms")
            .with_description("Engine latency per query in milliseconds, including lock wait")
            .init();

        METRICS
            .set(MetricsHandles {
                queries,
                query_failures,
                scope_violations,
                query_latency,
            })
            .map_err(|_| anyhow!("metrics handles already initialized"))?;

        Ok(TelemetryState {
            _provider: provider,
            registry,
        })
    })
}

fn build_exporter(registry: &Registry) -> Result<PrometheusExporter> {
    opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()
        .context("failed to build Prometheus exporter")
}

fn metrics() -> Option<&'static MetricsHandles> {
    METRICS.get()
}

fn state() -> Option<&'static TelemetryState> {
    TELEMETRY.get()
}

pub fn record_query(mode: &str) {
    if let Some(metrics) = metrics() {
        metrics
            .queries
            .add(1, &[KeyValue::new("mode", mode.to_string())]);
    }
}

/// `kind` is an engine failure kind or `format`.
pub fn record_query_failure(kind: &'static str) {
    if let Some(metrics) = metrics() {
        metrics
            .query_failures
            .add(1, &[KeyValue::new("kind", kind)]);
    }
}

pub fn record_scope_violation(surface: &'static str) {
    if let Some(metrics) = metrics() {
        metrics
            .scope_violations
            .add(1, &[KeyValue::new("surface", surface)]);
    }
}

pub fn record_query_latency(latency_ms: u64) {
    if let Some(metrics) = metrics() {
        metrics.query_latency.record(latency_ms as f64, &[]);
    }
}

/// Render all currently collected metrics in Prometheus text format.
pub fn export_prometheus() -> Result<String> {
    let state = state().ok_or_else(|| anyhow!("telemetry not initialized"))?;
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("failed to encode metrics")?;
    String::from_utf8(buffer).context("metrics buffer is not valid UTF-8")
}
