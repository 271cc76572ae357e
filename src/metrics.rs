//! Prometheus metrics collection for smsroute.
//!
//! - `smsroute_messages_total{kind}` - Messages dispatched by kind
//! - `smsroute_dispatch_duration_seconds{kind}` - Dispatch latency histogram
//! - `smsroute_dispatch_failures_total{stage}` - Rolled-back dispatches by failing stage
//! - `smsroute_parse_total{outcome}` - Front end outcomes (matched, rejected, not_understood)
//! - `smsroute_deliveries_total{status}` - Outbound queue results (queued, full, closed)

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Messages dispatched, by kind.
pub static MESSAGES: OnceLock<IntCounterVec> = OnceLock::new();

/// Dispatch latency, by kind.
pub static DISPATCH_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Dispatches rolled back, by the stage that failed.
pub static DISPATCH_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

pub static PARSE_OUTCOMES: OnceLock<IntCounterVec> = OnceLock::new();

/// Deliveries offered to the outbound queue, by result.
pub static DELIVERIES: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before any metrics are recorded. Recording before
/// `init` is a no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(MESSAGES, IntCounterVec::new(Opts::new("smsroute_messages_total", "Messages dispatched by kind"), &["kind"]));
    register!(DISPATCH_LATENCY, HistogramVec::new(
        HistogramOpts::new("smsroute_dispatch_duration_seconds", "Dispatch latency by kind")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["kind"]));
    register!(DISPATCH_FAILURES, IntCounterVec::new(Opts::new("smsroute_dispatch_failures_total", "Rolled-back dispatches by failing stage"), &["stage"]));
    register!(PARSE_OUTCOMES, IntCounterVec::new(Opts::new("smsroute_parse_total", "Front end outcomes"), &["outcome"]));
    register!(DELIVERIES, IntCounterVec::new(Opts::new("smsroute_deliveries_total", "Outbound deliveries by result"), &["status"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

fn get_counter_vec(metric: &OnceLock<IntCounterVec>) -> Option<&IntCounterVec> {
    metric.get()
}

fn get_histogram_vec(metric: &OnceLock<HistogramVec>) -> Option<&HistogramVec> {
    metric.get()
}

/// Record a dispatched message with latency.
#[inline]
pub fn record_dispatch(kind: &str, duration_secs: f64) {
    if let Some(c) = get_counter_vec(&MESSAGES) {
        c.with_label_values(&[kind]).inc();
    }
    if let Some(h) = get_histogram_vec(&DISPATCH_LATENCY) {
        h.with_label_values(&[kind]).observe(duration_secs);
    }
}

#[inline]
pub fn record_dispatch_failure(stage: &str) {
    if let Some(c) = get_counter_vec(&DISPATCH_FAILURES) {
        c.with_label_values(&[stage]).inc();
    }
}

#[inline]
pub fn record_parse(outcome: &str) {
    if let Some(c) = get_counter_vec(&PARSE_OUTCOMES) {
        c.with_label_values(&[outcome]).inc();
    }
}

#[inline]
pub fn record_delivery(status: &str) {
    if let Some(c) = get_counter_vec(&DELIVERIES) {
        c.with_label_values(&[status]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_dispatch("registration", 0.001);
        record_dispatch_failure("commit");
        record_parse("matched");
        record_delivery("queued");

        let output = gather_metrics();
        assert!(output.contains("smsroute_messages_total"));
        assert!(output.contains("smsroute_dispatch_failures_total"));
        assert!(output.contains("smsroute_deliveries_total"));
    }
}
