//! Common error types for shelf

use thiserror::Error;

/// Common result type for shelf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the shelf services
///
/// The first five variants form the domain taxonomy surfaced to callers.
/// The rest are infrastructure failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed identifier or missing/invalid request field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique key already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller is neither the owner nor an admin
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Retailer page could not be fetched or parsed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors the caller caused and can fix (4xx family)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::NotFound(_) | Error::Conflict(_) | Error::Forbidden(_)
        )
    }
}

impl From<sqlx::Error> for Error {
    /// Unique-index violations become `Conflict`; the store's unique keys are
    /// the race guard for every one-per-user invariant. A foreign-key
    /// violation means the parent row vanished between check and write.
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Error::NotFound("referenced record no longer exists".to_string())
            }
            _ => Error::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(Error::InvalidInput("id".into()).is_client_error());
        assert!(Error::NotFound("book".into()).is_client_error());
        assert!(Error::Conflict("dup".into()).is_client_error());
        assert!(Error::Forbidden("owner".into()).is_client_error());
        assert!(!Error::Upstream("fetch".into()).is_client_error());
        assert!(!Error::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Database(_)));
    }
}
