// Library root: exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod alerts;
pub mod api;
pub mod app;
pub mod clock;
pub mod error;
pub mod metrics;
pub mod orders;
pub mod scheduler;
pub mod services;
pub mod watermark;

pub mod cli;
pub mod config;
pub mod logging;
