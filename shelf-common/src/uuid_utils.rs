//! UUID utilities

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> std::result::Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Parse a record identifier supplied by a caller
///
/// Malformed ids are rejected here, before any query reaches the store.
/// `kind` names the record in the error message ("book", "review").
pub fn parse_record_id(s: &str, kind: &str) -> Result<Uuid> {
    parse(s.trim()).map_err(|_| Error::InvalidInput(format!("invalid {} id: {}", kind, s)))
}
