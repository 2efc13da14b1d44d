//! Error types for the PostgreSQL executor.

use std::borrow::Cow;

use diesel::result::{ConnectionError, DatabaseErrorKind, Error as DieselError};

/// Type-erased error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for configuration, connection and statement failures.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// Invalid configuration parameters.
    #[error("Configuration error: {0}")]
    Config(Cow<'static, str>),

    /// Failed to establish or maintain a database connection.
    #[error("Database connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A statement, commit or rollback failed.
    #[error("Database query error: {0}")]
    Query(#[from] DieselError),
}

impl PgError {
    /// Returns whether this error might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PgError::Connection(ConnectionError::BadConnection(_))
                | PgError::Query(DieselError::DatabaseError(
                    DatabaseErrorKind::SerializationFailure,
                    _
                ))
        )
    }

    /// Returns the violated constraint name, if any.
    pub fn constraint(&self) -> Option<&str> {
        let PgError::Query(DieselError::DatabaseError(_, info)) = self else {
            return None;
        };
        info.constraint_name()
    }
}

impl From<PgError> for rowset_core::Error {
    fn from(err: PgError) -> Self {
        rowset_core::Error::backend(err)
    }
}

/// Specialized [`Result`] type for database operations.
pub type PgResult<T, E = PgError> = Result<T, E>;
