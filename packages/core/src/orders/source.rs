//! Order source interface.
//!
//! Abstracts the document store so the poll cycle can run against Firestore
//! in production and a scripted source in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::orders::{error::StoreError, types::OrderRecord};

/// Query results. An `Err` item ends the sweep early; items before it are
/// still valid.
pub type OrderStream = BoxStream<'static, Result<OrderRecord, StoreError>>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait OrderSource {
    /// Start a query for every order whose `createdAt` is strictly after
    /// `after`. No ordering is guaranteed.
    async fn orders_created_after(&self, after: DateTime<Utc>) -> StoreResult<OrderStream>;

    /// Name of this source for logging.
    fn source_name(&self) -> &str;
}
