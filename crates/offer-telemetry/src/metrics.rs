//! Prometheus metrics for the signer.
//!
//! All metrics follow the naming convention: `offer_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Signatures converted to the fixed-width form, by input form
    pub static ref SIGNATURES_CONVERTED: CounterVec = CounterVec::new(
        Opts::new("offer_signatures_converted_total", "Signatures converted to r||s"),
        &["form"]  // form: der/canonical
    ).expect("metric creation failed");

    /// Signatures whose s value was flipped to the low half
    pub static ref SIGNATURES_NORMALIZED: Counter = Counter::new(
        "offer_signatures_normalized_total",
        "Signatures whose s value was replaced by n - s"
    ).expect("metric creation failed");

    /// Failed signing or key generation attempts, by error kind
    pub static ref SIGNING_FAILURES: CounterVec = CounterVec::new(
        Opts::new("offer_signing_failures_total", "Failed signing operations"),
        &["kind"]
    ).expect("metric creation failed");

    /// End-to-end signing duration, KMS round trip included
    pub static ref SIGNING_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "offer_signing_duration_seconds",
            "Time spent producing a chain signature"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SIGNATURES_CONVERTED.clone()),
        Box::new(SIGNATURES_NORMALIZED.clone()),
        Box::new(SIGNING_FAILURES.clone()),
        Box::new(SIGNING_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
