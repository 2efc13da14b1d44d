//! Error types shared by pagination, timestamp decoding and transactions.

use std::borrow::Cow;

use crate::query::SqlStatement;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Executor errors are stored behind this alias so the core never depends on
/// a concrete database driver.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Specialized [`Result`] type for data-access operations.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for every operation in this crate.
#[derive(Debug, thiserror::Error)]
#[must_use = "data access errors should be handled appropriately"]
pub enum Error {
    /// The page descriptor violates its offset, size or order constraints.
    ///
    /// Always recoverable: fix the request parameters and retry.
    #[error("Invalid pagination: {0}")]
    InvalidPagination(Cow<'static, str>),

    /// Wire text matched neither the fixed layout nor RFC 3339.
    #[error("Malformed timestamp {input:?}: {source}")]
    MalformedTimestamp {
        /// The rejected wire text.
        input: String,
        /// The error reported by the RFC 3339 fallback.
        #[source]
        source: jiff::Error,
    },

    /// A query could not be rendered into a statement.
    #[error("Invalid query: {0}")]
    QueryBuild(Cow<'static, str>),

    /// The count or fetch statement failed against the executor.
    #[error("Query execution failed: {source}")]
    Query {
        /// The statement that failed, kept for diagnostics.
        statement: Option<SqlStatement>,
        /// The executor error.
        #[source]
        source: BoxedError,
    },

    /// The unit of work succeeded but the commit failed.
    #[error("Transaction commit failed: {0}")]
    Commit(#[source] BoxedError),

    /// The unit of work failed and so did the rollback.
    ///
    /// The rollback failure is the reported cause; the unit-of-work error is
    /// kept in `original` so it is not lost.
    #[error("Transaction rollback failed: {source} (unit of work failed with: {original})")]
    Rollback {
        /// The rollback error.
        #[source]
        source: BoxedError,
        /// The error returned by the unit of work.
        original: Box<Error>,
    },

    /// An executor error raised inside a unit of work.
    #[error("Backend error: {0}")]
    Backend(#[source] BoxedError),
}

impl Error {
    /// Creates an invalid pagination error.
    pub fn invalid_pagination(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidPagination(message.into())
    }

    /// Creates a query execution error for the given statement.
    pub fn query(
        statement: SqlStatement,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Query {
            statement: Some(statement),
            source: Box::new(source),
        }
    }

    /// Wraps an executor error raised outside of the pager.
    pub fn backend(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(source))
    }

    /// Returns the statement attached to a query execution error.
    pub fn statement(&self) -> Option<&SqlStatement> {
        match self {
            Self::Query { statement, .. } => statement.as_ref(),
            _ => None,
        }
    }

    /// Returns the unit-of-work error hidden behind a rollback failure.
    pub fn original(&self) -> Option<&Error> {
        match self {
            Self::Rollback { original, .. } => Some(original),
            _ => None,
        }
    }

    /// Returns whether the caller can fix the input and retry.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPagination(_) | Self::MalformedTimestamp { .. }
        )
    }
}
