/*!
 * # Metrics Module
 *
 * In-process counters, gauges and histograms for the dashboard backend.
 *
 * Metrics are exposed in the following formats:
 * - Prometheus text format at `/metrics`
 * - JSON format at `/metrics/json`
 */

use axum::{extract::Request, middleware::Next, response::Response};
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Gauge holding an `f64` as its bit pattern.
#[derive(Debug, Clone, Default)]
pub struct Gauge {
    bits: Arc<AtomicU64>,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Count and sum only. The sum is stored in whole microseconds.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    sum_micros: Arc<AtomicU64>,
    count: Arc<AtomicU64>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, seconds: f64) {
        let micros = (seconds.max(0.0) * 1_000_000.0) as u64;
        self.sum_micros.fetch_add(micros, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn get_sum(&self) -> f64 {
        self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: DashMap<String, Counter>,
    gauges: DashMap<String, Gauge>,
    histograms: DashMap<String, Histogram>,
}

fn sorted<V: Clone>(map: &DashMap<String, V>) -> Vec<(String, V)> {
    let mut entries: Vec<_> = map
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_counter(&self, name: &str) -> Counter {
        self.counters
            .entry(name.to_string())
            .or_insert_with(Counter::new)
            .clone()
    }

    pub fn get_or_create_gauge(&self, name: &str) -> Gauge {
        self.gauges
            .entry(name.to_string())
            .or_insert_with(Gauge::new)
            .clone()
    }

    pub fn get_or_create_histogram(&self, name: &str) -> Histogram {
        self.histograms
            .entry(name.to_string())
            .or_insert_with(Histogram::new)
            .clone()
    }

    /// Prometheus text exposition, names in lexical order.
    pub fn export_metrics(&self) -> String {
        let mut output = String::new();

        for (name, counter) in sorted(&self.counters) {
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, counter.get()));
        }

        for (name, gauge) in sorted(&self.gauges) {
            output.push_str(&format!("# TYPE {} gauge\n", name));
            output.push_str(&format!("{} {}\n", name, gauge.get()));
        }

        for (name, histogram) in sorted(&self.histograms) {
            output.push_str(&format!("# TYPE {} summary\n", name));
            output.push_str(&format!("{}_count {}\n", name, histogram.get_count()));
            output.push_str(&format!("{}_sum {}\n", name, histogram.get_sum()));
        }

        output
    }

    pub fn export_metrics_json(&self) -> serde_json::Value {
        let mut counters = serde_json::Map::new();
        for (name, counter) in sorted(&self.counters) {
            counters.insert(name, json!(counter.get()));
        }

        let mut gauges = serde_json::Map::new();
        for (name, gauge) in sorted(&self.gauges) {
            gauges.insert(name, json!(gauge.get()));
        }

        let mut histograms = serde_json::Map::new();
        for (name, histogram) in sorted(&self.histograms) {
            histograms.insert(
                name,
                json!({
                    "count": histogram.get_count(),
                    "sum": histogram.get_sum(),
                }),
            );
        }

        json!({
            "counters": counters,
            "gauges": gauges,
            "histograms": histograms,
        })
    }
}

// Global metrics registry
lazy_static::lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}

pub fn increment_counter(name: &str) {
    METRICS.get_or_create_counter(name).inc();
}

pub fn set_gauge(name: &str, value: f64) {
    METRICS.get_or_create_gauge(name).set(value);
}

pub fn observe_histogram(name: &str, value: f64) {
    METRICS.get_or_create_histogram(name).observe(value);
}

/// Counters for the consumption workflow.
pub struct BusinessMetrics {
    pub consumptions_recorded: Counter,
    pub consumptions_rejected: Counter,
    pub consumption_effects_skipped: Counter,
    pub alerts_raised: Counter,
    pub alerts_resolved: Counter,
}

impl BusinessMetrics {
    pub fn new() -> Self {
        Self {
            consumptions_recorded: METRICS.get_or_create_counter("consumptions_recorded_total"),
            consumptions_rejected: METRICS.get_or_create_counter("consumptions_rejected_total"),
            consumption_effects_skipped: METRICS
                .get_or_create_counter("consumption_effects_skipped_total"),
            alerts_raised: METRICS.get_or_create_counter("alerts_raised_total"),
            alerts_resolved: METRICS.get_or_create_counter("alerts_resolved_total"),
        }
    }
}

impl Default for BusinessMetrics {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EndpointMetrics {
    pub requests_total: Counter,
    pub latency: Histogram,
    pub status_2xx: Counter,
    pub status_4xx: Counter,
    pub status_5xx: Counter,
}

impl EndpointMetrics {
    pub fn new() -> Self {
        Self {
            requests_total: METRICS.get_or_create_counter("http_requests_total"),
            latency: METRICS.get_or_create_histogram("http_request_duration_seconds"),
            status_2xx: METRICS.get_or_create_counter("http_status_2xx_total"),
            status_4xx: METRICS.get_or_create_counter("http_status_4xx_total"),
            status_5xx: METRICS.get_or_create_counter("http_status_5xx_total"),
        }
    }

    pub fn record_request(&self, seconds: f64, status_code: u16) {
        self.requests_total.inc();
        self.latency.observe(seconds);

        match status_code {
            200..=299 => self.status_2xx.inc(),
            400..=499 => self.status_4xx.inc(),
            500..=599 => self.status_5xx.inc(),
            _ => {}
        }
    }
}

impl Default for EndpointMetrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    pub static ref BUSINESS_METRICS: BusinessMetrics = BusinessMetrics::new();
    pub static ref ENDPOINT_METRICS: EndpointMetrics = EndpointMetrics::new();
}

/// Records count, latency and status class of every request.
pub async fn track_http_metrics(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let response = next.run(request).await;
    ENDPOINT_METRICS.record_request(
        started.elapsed().as_secs_f64(),
        response.status().as_u16(),
    );
    response
}

pub async fn metrics_handler() -> String {
    METRICS.export_metrics()
}

pub async fn metrics_json_handler() -> axum::Json<serde_json::Value> {
    axum::Json(METRICS.export_metrics_json())
}
