//! Commit-or-rollback wrapper around a unit of work.

use std::fmt;

use diesel_async::scoped_futures::ScopedBoxFuture;

use crate::executor::Transaction;
use crate::{Error, Result, TRACING_TARGET_TRANSACTION};

/// A boxed unit of work borrowing the open transaction.
///
/// Build one from a closure returning a scoped future:
///
/// ```ignore
/// use diesel_async::scoped_futures::ScopedFutureExt;
///
/// let handler = TxHandler::new(|tx| async move {
///     let total = query.count(tx).await?;
///     Ok(())
/// }.scope_boxed());
/// ```
pub type UnitOfWork<'a, T> =
    Box<dyn for<'r> FnOnce(&'r mut T) -> ScopedBoxFuture<'a, 'r, Result<()>> + Send + 'a>;

/// Runs a unit of work inside an open transaction and finishes it.
///
/// Exactly one terminal action is taken per run: commit when the unit of
/// work succeeds, rollback when it fails. A handler without a unit of work
/// succeeds without touching the transaction.
pub struct TxHandler<'a, T> {
    work: Option<UnitOfWork<'a, T>>,
}

impl<'a, T> TxHandler<'a, T>
where
    T: Transaction,
{
    /// Creates a handler running `work`.
    pub fn new<F>(work: F) -> Self
    where
        F: for<'r> FnOnce(&'r mut T) -> ScopedBoxFuture<'a, 'r, Result<()>> + Send + 'a,
    {
        Self {
            work: Some(Box::new(work)),
        }
    }

    /// Creates a handler without a unit of work.
    pub fn noop() -> Self {
        Self { work: None }
    }

    /// Returns whether the handler has no unit of work.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.work.is_none()
    }

    /// Runs the unit of work against `tx`, then commits or rolls back.
    ///
    /// # Errors
    ///
    /// - the unit-of-work error when it fails and the rollback succeeds;
    /// - [`Error::Rollback`] when both the unit of work and the rollback fail
    ///   (the unit-of-work error is kept inside);
    /// - [`Error::Commit`] when the commit fails.
    pub async fn run(self, tx: &mut T) -> Result<()> {
        let Some(work) = self.work else {
            tracing::trace!(target: TRACING_TARGET_TRANSACTION, "No unit of work, skipping");
            return Ok(());
        };

        if let Err(err) = work(tx).await {
            tracing::debug!(
                target: TRACING_TARGET_TRANSACTION,
                error = %err,
                "Unit of work failed, rolling back"
            );

            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(
                    target: TRACING_TARGET_TRANSACTION,
                    error = %rollback_err,
                    original = %err,
                    "Transaction rollback failed"
                );
                return Err(Error::Rollback {
                    source: Box::new(rollback_err),
                    original: Box::new(err),
                });
            }

            return Err(err);
        }

        if let Err(commit_err) = tx.commit().await {
            tracing::error!(
                target: TRACING_TARGET_TRANSACTION,
                error = %commit_err,
                "Transaction commit failed"
            );
            return Err(Error::Commit(Box::new(commit_err)));
        }

        tracing::trace!(target: TRACING_TARGET_TRANSACTION, "Transaction committed");
        Ok(())
    }
}

impl<T> fmt::Debug for TxHandler<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxHandler")
            .field("noop", &self.work.is_none())
            .finish()
    }
}
