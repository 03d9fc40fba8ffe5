use clap::Parser;

use crate::logging::LogFormat;

/// Order notifier CLI arguments. Each flag overrides its environment
/// variable.
#[derive(Debug, Parser)]
#[command(
    name = "order-notifier",
    version,
    about = "Forwards new shop orders from Firestore to a Telegram chat"
)]
pub struct Cli {
    /// Port for the health-check server (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Order polling interval in seconds (overrides POLL_INTERVAL_SECONDS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: Option<u64>,

    /// Log output format (overrides LOG_FORMAT)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}
