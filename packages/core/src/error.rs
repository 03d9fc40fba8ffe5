use thiserror::Error;

use crate::config::ConfigError;
use crate::orders::StoreError;

/// Unified application error.
///
/// Only startup failures surface here. Per-cycle query and delivery
/// failures are logged and reported by the scheduler instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_is_prefixed() {
        let err = AppError::from(ConfigError::Missing(vec!["PORT".into()]));
        assert_eq!(
            err.to_string(),
            "Config error: missing environment variables: PORT"
        );
    }

    #[test]
    fn store_error_converts_into_app_error() {
        let err: AppError = StoreError::Auth {
            message: "bad key".into(),
        }
        .into();
        assert!(matches!(err, AppError::Store(_)));
    }
}
