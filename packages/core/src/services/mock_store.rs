//! Scripted order source for tests.
//!
//! Behaves like the Firestore query (strict `createdAt > after` filter)
//! unless told otherwise, and can fail outright or part-way through the
//! result stream.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::orders::{OrderRecord, OrderSource, OrderStream, StoreError, StoreResult};

#[derive(Default)]
pub struct MockOrderSource {
    orders: Vec<OrderRecord>,
    query_error: Option<StoreError>,
    fail_after: Option<(usize, StoreError)>,
    unfiltered: bool,
    queries: Mutex<Vec<DateTime<Utc>>>,
}

impl MockOrderSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(mut self, orders: Vec<OrderRecord>) -> Self {
        self.orders = orders;
        self
    }

    /// Fail the query before any result is produced.
    pub fn with_error(mut self, error: StoreError) -> Self {
        self.query_error = Some(error);
        self
    }

    /// Yield `count` results, then `error`.
    pub fn with_failure_after(mut self, count: usize, error: StoreError) -> Self {
        self.fail_after = Some((count, error));
        self
    }

    /// Return every order regardless of the watermark.
    pub fn unfiltered(mut self) -> Self {
        self.unfiltered = true;
        self
    }

    /// Watermarks this source was queried with, in call order.
    pub fn queries(&self) -> Vec<DateTime<Utc>> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn matches(&self, order: &OrderRecord, after: DateTime<Utc>) -> bool {
        self.unfiltered
            || order
                .created_at_timestamp()
                .map(|created| created > after)
                .unwrap_or(false)
    }
}

#[async_trait]
impl OrderSource for MockOrderSource {
    async fn orders_created_after(&self, after: DateTime<Utc>) -> StoreResult<OrderStream> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(after);

        if let Some(error) = &self.query_error {
            return Err(error.clone());
        }

        let mut results: Vec<StoreResult<OrderRecord>> = self
            .orders
            .iter()
            .filter(|order| self.matches(order, after))
            .cloned()
            .map(Ok)
            .collect();

        if let Some((count, error)) = &self.fail_after {
            results.truncate(*count);
            results.push(Err(error.clone()));
        }

        Ok(stream::iter(results).boxed())
    }

    fn source_name(&self) -> &str {
        "Mock"
    }
}
