use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;

use order_notifier::api;
use order_notifier::app::start_polling;
use order_notifier::cli::Cli;
use order_notifier::config::{listen_port, Config, DEFAULT_PORT};
use order_notifier::error::AppError;
use order_notifier::logging::{init_logging, LogFormat};
use order_notifier::metrics::AppMetrics;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_format.unwrap_or_else(LogFormat::from_env));

    let port = match cli.port {
        Some(port) => port,
        None => listen_port().unwrap_or_else(|err| {
            tracing::error!("{}; falling back to port {}", err, DEFAULT_PORT);
            DEFAULT_PORT
        }),
    };

    let app_metrics = Arc::new(AppMetrics::new()?);

    let config = Config::from_env().map(|mut config| {
        if let Some(secs) = cli.poll_interval {
            config.poll_interval_seconds = secs;
        }
        config
    });

    // Spawned before the listener so the first poll is not delayed by it.
    let polling = start_polling(config, app_metrics.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Health server listening on {}", addr);

    let server = axum::serve(listener, api::create_router(app_metrics))
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    // Reports a dead polling loop, then keeps the health server up.
    let supervisor = async move {
        if let Some(task) = polling {
            let _ = task.supervise().await;
        }
        std::future::pending::<()>().await
    };

    tokio::select! {
        result = server => result?,
        _ = supervisor => {}
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
