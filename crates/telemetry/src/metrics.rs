//! Prometheus metrics for the enrichment service.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};

/// Metrics collector for an enrichment run.
///
/// Counters live in a per-instance registry so that independent runs (and
/// tests) can each build their own collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    addresses_processed: IntCounter,
    metrics_missing: IntCounter,
    fetch_errors: IntCounter,
    fetch_latency: HistogramVec,
}

impl Metrics {
    /// Create a new metrics instance.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let addresses_processed = IntCounter::with_opts(Opts::new(
            "addrstats_addresses_processed_total",
            "Total number of addresses fully processed",
        ))?;
        registry.register(Box::new(addresses_processed.clone()))?;

        let metrics_missing = IntCounter::with_opts(Opts::new(
            "addrstats_metrics_missing_total",
            "Total number of metric values substituted with the missing-data sentinel",
        ))?;
        registry.register(Box::new(metrics_missing.clone()))?;

        let fetch_errors = IntCounter::with_opts(Opts::new(
            "addrstats_fetch_errors_total",
            "Total number of failed explorer fetches",
        ))?;
        registry.register(Box::new(fetch_errors.clone()))?;

        let fetch_latency = HistogramVec::new(
            HistogramOpts::new(
                "addrstats_fetch_latency_seconds",
                "Explorer fetch latency in seconds",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(fetch_latency.clone()))?;

        Ok(Self {
            registry,
            addresses_processed,
            metrics_missing,
            fetch_errors,
            fetch_latency,
        })
    }

    /// Increment the processed-addresses counter.
    pub fn inc_addresses_processed(&self) {
        self.addresses_processed.inc();
    }

    /// Increment the missing-metrics counter.
    pub fn inc_metrics_missing(&self, count: u64) {
        self.metrics_missing.inc_by(count);
    }

    /// Increment the fetch-errors counter.
    pub fn inc_fetch_errors(&self) {
        self.fetch_errors.inc();
    }

    /// Record the latency of one explorer fetch.
    pub fn observe_fetch_latency(&self, operation: &str, duration_secs: f64) {
        self.fetch_latency
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Render the metrics in the Prometheus text exposition format.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
