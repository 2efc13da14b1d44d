//! Traits implemented by transactional executors.
//!
//! Executors own the connection (or the open transaction) and run rendered
//! [`SqlStatement`]s. They report their own error type; the pager and the
//! transaction handler wrap it into [`Error`].
//!
//! [`Error`]: crate::Error

use std::future::Future;

use crate::query::SqlStatement;

/// Runs scalar statements.
pub trait SqlExecutor: Send {
    /// Error reported by the underlying driver.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a statement returning a single integer, such as `COUNT(*)`.
    fn select_int(
        &mut self,
        statement: &SqlStatement,
    ) -> impl Future<Output = Result<i64, Self::Error>> + Send;
}

/// Runs statements returning rows of type `T`.
pub trait FetchAll<T>: SqlExecutor {
    /// Runs a statement and collects every returned row.
    fn select_all(
        &mut self,
        statement: &SqlStatement,
    ) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send;
}

/// An open transaction that can be finished exactly once.
pub trait Transaction: SqlExecutor {
    /// Commits the transaction.
    fn commit(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Rolls the transaction back.
    fn rollback(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
