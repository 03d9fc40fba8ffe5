//! Startup wiring for the polling loop.
//!
//! Polling only starts when the configuration is complete and the store
//! credentials are usable. Either failure is logged and leaves the health
//! server running on its own.

use std::sync::Arc;

use crate::alerts::TelegramNotifier;
use crate::config::{Config, ConfigError};
use crate::metrics::AppMetrics;
use crate::scheduler::{OrderPoller, PollingTask};
use crate::services::FirestoreOrderSource;
use crate::watermark::Watermark;

pub fn start_polling(
    config: Result<Config, ConfigError>,
    app_metrics: Arc<AppMetrics>,
) -> Option<PollingTask> {
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Order polling disabled: {}", err);
            return None;
        }
    };

    let source = match FirestoreOrderSource::new(&config) {
        Ok(source) => source,
        Err(err) => {
            tracing::error!("Firestore connection failed, order polling disabled: {}", err);
            return None;
        }
    };
    tracing::info!(
        project = %config.service_account.project_id,
        collection = %config.orders_collection,
        "Firestore client ready"
    );

    let notifier = match TelegramNotifier::new(&config.telegram) {
        Ok(notifier) => notifier,
        Err(err) => {
            tracing::error!("Telegram client could not be built, order polling disabled: {}", err);
            return None;
        }
    };

    let poller = OrderPoller::new(Arc::new(source), Arc::new(notifier))
        .with_policy(config.redelivery)
        .with_metrics(app_metrics);

    tracing::info!(policy = ?config.redelivery, "Waiting for new orders");
    Some(PollingTask::spawn(
        poller,
        Watermark::starting_now(),
        config.poll_interval(),
    ))
}
