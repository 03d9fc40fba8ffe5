//! Prometheus metrics for the order notifier.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and share it
//! between the polling task and the `/metrics` handler.

use chrono::{DateTime, Utc};
use prometheus::{Counter, Gauge, Opts, Registry};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Poll cycles run (success + failure).
    pub polls_total: Counter,
    /// Poll cycles whose store query failed.
    pub poll_errors_total: Counter,
    /// Order notifications accepted by Telegram.
    pub notifications_sent_total: Counter,
    /// Order notifications that could not be delivered.
    pub notifications_failed_total: Counter,
    /// Current watermark as a Unix timestamp.
    pub watermark_timestamp: Gauge,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let polls_total = Counter::with_opts(Opts::new(
            "order_notifier_polls_total",
            "Total order poll cycles",
        ))?;

        let poll_errors_total = Counter::with_opts(Opts::new(
            "order_notifier_poll_errors_total",
            "Poll cycles whose store query failed",
        ))?;

        let notifications_sent_total = Counter::with_opts(Opts::new(
            "order_notifier_notifications_sent_total",
            "Order notifications delivered",
        ))?;

        let notifications_failed_total = Counter::with_opts(Opts::new(
            "order_notifier_notifications_failed_total",
            "Order notifications that failed to deliver",
        ))?;

        let watermark_timestamp = Gauge::with_opts(Opts::new(
            "order_notifier_watermark_timestamp_seconds",
            "Current order watermark as a Unix timestamp",
        ))?;

        registry.register(Box::new(polls_total.clone()))?;
        registry.register(Box::new(poll_errors_total.clone()))?;
        registry.register(Box::new(notifications_sent_total.clone()))?;
        registry.register(Box::new(notifications_failed_total.clone()))?;
        registry.register(Box::new(watermark_timestamp.clone()))?;

        Ok(Self {
            polls_total,
            poll_errors_total,
            notifications_sent_total,
            notifications_failed_total,
            watermark_timestamp,
            registry,
        })
    }

    pub fn set_watermark(&self, watermark: DateTime<Utc>) {
        self.watermark_timestamp
            .set(watermark.timestamp_millis() as f64 / 1000.0);
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
