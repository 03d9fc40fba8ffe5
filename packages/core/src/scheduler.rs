//! Order polling scheduler.
//!
//! Drives the main polling loop: each cycle queries the order source for
//! documents created after the watermark, renders and delivers each one,
//! and reports the next watermark. The loop writes that value back and
//! sleeps for the poll interval before the next cycle.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::task::{JoinError, JoinHandle};
use tokio::time;

use crate::alerts::Notifier;
use crate::clock::{Clock, SystemClock};
use crate::metrics::AppMetrics;
use crate::orders::{format_order, OrderRecord, OrderSource, StoreError};
use crate::watermark::Watermark;

/// What happens to orders whose notification failed.
///
/// `Drop` always advances the watermark, so a failed order is never
/// retried. `Retry` keeps the watermark where it was when anything failed,
/// so the whole window is queried again next cycle. Orders already
/// delivered from a held window are not sent again, and the watermark is
/// held for at most [`DEFAULT_MAX_HOLD_CYCLES`] consecutive cycles before it
/// advances anyway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedeliveryPolicy {
    #[default]
    Drop,
    Retry,
}

/// Consecutive cycles the watermark may be held under `Retry`.
pub const DEFAULT_MAX_HOLD_CYCLES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    /// The result stream ended normally (possibly with zero orders).
    Completed,
    /// The query could not start, or broke off after `records_seen` results.
    Failed {
        error: StoreError,
        records_seen: usize,
    },
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub started_at: DateTime<Utc>,
    /// Watermark the next cycle should use.
    pub watermark: DateTime<Utc>,
    pub status: QueryStatus,
    pub delivered: usize,
    pub failed: usize,
    /// Results at or before the watermark that the store returned anyway,
    /// plus orders already delivered from a held window.
    pub skipped: usize,
}

impl PollReport {
    pub fn query_failed(&self) -> bool {
        matches!(self.status, QueryStatus::Failed { .. })
    }
}

pub struct OrderPoller {
    source: Arc<dyn OrderSource + Send + Sync>,
    notifier: Arc<dyn Notifier + Send + Sync>,
    clock: Arc<dyn Clock>,
    policy: RedeliveryPolicy,
    max_hold_cycles: u32,
    held: Mutex<HeldWindow>,
    metrics: Option<Arc<AppMetrics>>,
}

/// Orders delivered while the watermark is held at `since`.
#[derive(Debug, Default)]
struct HeldWindow {
    since: Option<DateTime<Utc>>,
    delivered: HashSet<String>,
    holds: u32,
}

impl OrderPoller {
    pub fn new(
        source: Arc<dyn OrderSource + Send + Sync>,
        notifier: Arc<dyn Notifier + Send + Sync>,
    ) -> Self {
        Self {
            source,
            notifier,
            clock: Arc::new(SystemClock),
            policy: RedeliveryPolicy::default(),
            max_hold_cycles: DEFAULT_MAX_HOLD_CYCLES,
            held: Mutex::new(HeldWindow::default()),
            metrics: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: RedeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_hold_cycles(mut self, max_hold_cycles: u32) -> Self {
        self.max_hold_cycles = max_hold_cycles;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Execute a single poll cycle against watermark `since`.
    ///
    /// Never fails: query and delivery errors are logged and reported in
    /// the returned [`PollReport`]. The reported watermark is the wall-clock
    /// time at the end of the cycle, except under [`RedeliveryPolicy::Retry`]
    /// when something failed.
    pub async fn poll_once(&self, since: DateTime<Utc>) -> PollReport {
        let started_at = self.clock.now();
        let already_delivered = self.delivered_in_window(since);
        let mut delivered_keys = Vec::new();
        let mut delivered = 0;
        let mut failed = 0;
        let mut skipped = 0;

        let status = match self.source.orders_created_after(since).await {
            Err(error) => QueryStatus::Failed {
                error,
                records_seen: 0,
            },
            Ok(mut orders) => {
                let mut seen = 0;
                let mut status = QueryStatus::Completed;

                while let Some(item) = orders.next().await {
                    let order = match item {
                        Ok(order) => order,
                        Err(error) => {
                            status = QueryStatus::Failed {
                                error,
                                records_seen: seen,
                            };
                            break;
                        }
                    };
                    seen += 1;

                    if let Some(created_at) = order.created_at_timestamp() {
                        if created_at <= since {
                            tracing::debug!(
                                order_id = order.log_id(),
                                %created_at,
                                "Skipping order at or before watermark"
                            );
                            skipped += 1;
                            continue;
                        }
                    }

                    let key = delivery_key(&order);
                    if key.as_ref().is_some_and(|key| already_delivered.contains(key)) {
                        tracing::debug!(
                            order_id = order.log_id(),
                            "Order already delivered from held window"
                        );
                        skipped += 1;
                        continue;
                    }

                    let message = format_order(&order);
                    if self.notifier.send(&message).await {
                        tracing::info!("Notification sent for order {}", order.log_id());
                        delivered += 1;
                        delivered_keys.extend(key);
                    } else {
                        tracing::warn!("Notification failed for order {}", order.log_id());
                        failed += 1;
                    }
                }

                status
            }
        };

        if let QueryStatus::Failed {
            error,
            records_seen,
        } = &status
        {
            tracing::error!(
                source = self.source.source_name(),
                records_seen,
                "Order query failed: {}",
                error
            );
        }

        if delivered > 0 {
            tracing::info!("Notifications sent this cycle: {}", delivered);
        }

        let now = self.clock.now();
        let anything_failed = failed > 0 || matches!(status, QueryStatus::Failed { .. });
        let hold = self.policy == RedeliveryPolicy::Retry
            && anything_failed
            && self.record_hold(since, delivered_keys);
        let watermark = if hold { since } else { now };
        if !hold {
            self.clear_held_window();
        }

        let report = PollReport {
            started_at,
            watermark,
            status,
            delivered,
            failed,
            skipped,
        };
        self.record_metrics(&report);
        report
    }

    fn delivered_in_window(&self, since: DateTime<Utc>) -> HashSet<String> {
        let held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if held.since == Some(since) {
            held.delivered.clone()
        } else {
            HashSet::new()
        }
    }

    /// Remember this cycle's deliveries and decide whether the watermark
    /// may stay at `since` for another cycle.
    fn record_hold(&self, since: DateTime<Utc>, delivered: Vec<String>) -> bool {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if held.since != Some(since) {
            *held = HeldWindow {
                since: Some(since),
                ..HeldWindow::default()
            };
        }

        if held.holds >= self.max_hold_cycles {
            tracing::warn!(
                holds = held.holds,
                "Giving up redelivery, advancing watermark past {}",
                since
            );
            return false;
        }

        held.holds += 1;
        held.delivered.extend(delivered);
        tracing::warn!(
            hold = held.holds,
            max = self.max_hold_cycles,
            "Holding watermark at {} for redelivery",
            since
        );
        true
    }

    fn clear_held_window(&self) {
        *self.held.lock().unwrap_or_else(PoisonError::into_inner) = HeldWindow::default();
    }

    fn record_metrics(&self, report: &PollReport) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        metrics.polls_total.inc();
        if report.query_failed() {
            metrics.poll_errors_total.inc();
        }
        metrics.notifications_sent_total.inc_by(report.delivered as f64);
        metrics.notifications_failed_total.inc_by(report.failed as f64);
    }

    /// Run poll cycles forever, `interval` apart.
    ///
    /// Each cycle runs to completion before the sleep starts, so at most one
    /// cycle is in flight. There is no stop condition; the loop ends with
    /// the process (or the runtime) that hosts it.
    pub async fn run(self, mut watermark: Watermark, interval: Duration) {
        tracing::info!(
            "Order polling started (interval: {}s, watermark: {})",
            interval.as_secs(),
            watermark.get()
        );

        loop {
            let report = self.poll_once(watermark.get()).await;
            watermark.set(report.watermark);

            if let Some(metrics) = &self.metrics {
                metrics.set_watermark(watermark.get());
            }

            time::sleep(interval).await;
        }
    }
}

/// Identity used to recognise an order across re-queries of a held window.
fn delivery_key(order: &OrderRecord) -> Option<String> {
    order
        .id
        .clone()
        .or_else(|| order.created_at.as_ref().map(|ts| format!("createdAt:{}", ts)))
}

/// Handle to the background polling loop.
pub struct PollingTask {
    handle: JoinHandle<()>,
}

impl PollingTask {
    pub fn spawn(poller: OrderPoller, watermark: Watermark, interval: Duration) -> Self {
        Self {
            handle: tokio::spawn(poller.run(watermark, interval)),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the loop to end and log how it ended. The loop never
    /// returns on its own, so any completion is reported as an error.
    pub async fn supervise(self) -> Result<(), JoinError> {
        match self.handle.await {
            Ok(()) => {
                tracing::error!("Order polling loop exited unexpectedly");
                Ok(())
            }
            Err(err) if err.is_panic() => {
                tracing::error!("Order polling task panicked: {}", err);
                Err(err)
            }
            Err(err) => {
                tracing::warn!("Order polling task was cancelled");
                Err(err)
            }
        }
    }
}
