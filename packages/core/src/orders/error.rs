//! Error types for the order store.

use thiserror::Error;

/// Errors from the document store, during setup or while querying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Data format error: {message}")]
    Format { message: String },

    #[error("Query error: {message}")]
    Query { message: String },
}

impl StoreError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth { message: message.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format { message: message.into() }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query { message: message.into() }
    }
}
