//! Order records, their rendering, and the store they are read from.

pub mod error;
pub mod formatter;
pub mod source;
pub mod types;

pub use error::StoreError;
pub use formatter::{format_order, format_order_at};
pub use source::{OrderSource, OrderStream, StoreResult};
pub use types::OrderRecord;
