//! Prometheus metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `pvz_count_total` | Counter | |
//! | `reception_count_total` | Counter | |
//! | `products_count_total` | Counter | |
//! | `http_request_total` | Counter | `path`, `code` |
//! | `http_request_duration_seconds` | Histogram | `path` |

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use thiserror::Error;

pub const HTTP_DURATION_BUCKETS: &[f64] = &[0.1, 0.2, 0.25, 0.5, 1.0];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    RegistrationFailed(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// Kind of entity whose creation is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    PickupPoint,
    Reception,
    Product,
}

/// Sink for "entity created" events, fed by the application services after
/// a successful commit.
pub trait EntitySink: Send + Sync {
    fn entity_created(&self, kind: EntityKind);
}

/// Process metrics backed by a private Prometheus registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pickup_points_total: IntCounter,
    receptions_total: IntCounter,
    products_total: IntCounter,
    http_requests_total: CounterVec,
    http_request_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();

        let pickup_points_total = IntCounter::new("pvz_count_total", "Total pickup-points created")?;
        registry.register(Box::new(pickup_points_total.clone()))?;

        let receptions_total = IntCounter::new("reception_count_total", "Total receptions opened")?;
        registry.register(Box::new(receptions_total.clone()))?;

        let products_total = IntCounter::new("products_count_total", "Total products added")?;
        registry.register(Box::new(products_total.clone()))?;

        let http_requests_total = CounterVec::new(
            Opts::new("http_request_total", "Total HTTP requests by path and status code"),
            &["path", "code"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency")
                .buckets(HTTP_DURATION_BUCKETS.to_vec()),
            &["path"],
        )?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            registry,
            pickup_points_total,
            receptions_total,
            products_total,
            http_requests_total,
            http_request_duration,
        })
    }

    pub fn observe_http(&self, path: &str, code: u16, seconds: f64) {
        self.http_requests_total
            .with_label_values(&[path, &code.to_string()])
            .inc();
        self.http_request_duration
            .with_label_values(&[path])
            .observe(seconds);
    }

    pub fn created_count(&self, kind: EntityKind) -> u64 {
        self.counter(kind).get()
    }

    pub fn http_request_count(&self, path: &str, code: u16) -> f64 {
        self.http_requests_total
            .with_label_values(&[path, &code.to_string()])
            .get()
    }

    /// Encode all metrics in the Prometheus text exposition format.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingFailed(e.to_string()))
    }

    fn counter(&self, kind: EntityKind) -> &IntCounter {
        match kind {
            EntityKind::PickupPoint => &self.pickup_points_total,
            EntityKind::Reception => &self.receptions_total,
            EntityKind::Product => &self.products_total,
        }
    }
}

impl EntitySink for Metrics {
    fn entity_created(&self, kind: EntityKind) {
        self.counter(kind).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_counters_are_independent() {
        let metrics = Metrics::new().unwrap();
        metrics.entity_created(EntityKind::Reception);
        metrics.entity_created(EntityKind::Product);
        metrics.entity_created(EntityKind::Product);

        assert_eq!(metrics.created_count(EntityKind::PickupPoint), 0);
        assert_eq!(metrics.created_count(EntityKind::Reception), 1);
        assert_eq!(metrics.created_count(EntityKind::Product), 2);
    }

    #[test]
    fn text_export_contains_all_families() {
        let metrics = Metrics::new().unwrap();
        metrics.entity_created(EntityKind::PickupPoint);
        metrics.observe_http("/pvz", 201, 0.01);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("pvz_count_total 1"));
        assert!(text.contains("http_request_total{"));
        assert!(text.contains("path=\"/pvz\""));
        assert_eq!(metrics.http_request_count("/pvz", 201), 1.0);
        assert!(text.contains("http_request_duration_seconds_bucket"));
    }

    #[test]
    fn two_instances_do_not_collide() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.entity_created(EntityKind::Product);
        assert_eq!(b.created_count(EntityKind::Product), 0);
    }
}
