//! Database access layer for shelf-catalog
//!
//! `books` holds the `CatalogStore`. `reviews` and `ratings` are the
//! engagement row operations; they take a connection so the aggregator can
//! run them inside one transaction.

pub mod books;
pub mod ratings;
pub mod reviews;

pub use books::CatalogStore;

use shelf_common::{Error, Result};
use uuid::Uuid;

/// Decode a stored guid column
pub(crate) fn parse_guid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("corrupt guid {:?}: {}", raw, e)))
}
