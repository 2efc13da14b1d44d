//! In-memory executor for testing code built on the pager and [`TxHandler`].
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! rowset-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! The mock answers every scalar statement with a scripted count and every
//! fetch with scripted JSON rows deserialized into the requested type. It
//! records each statement it receives and counts commits and rollbacks.
//!
//! [`TxHandler`]: crate::TxHandler

use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::Error;
use crate::executor::{FetchAll, SqlExecutor, Transaction};
use crate::query::SqlStatement;

/// Executor operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockFailure {
    /// Scalar statements.
    Count,
    /// Row fetches.
    Fetch,
    /// Commits.
    Commit,
    /// Rollbacks.
    Rollback,
}

/// Error returned by a scripted failure or an undecodable row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    /// The operation was scripted to fail.
    #[error("mock {0:?} failure")]
    Scripted(MockFailure),
    /// The scripted rows do not match the requested row type.
    #[error("mock rows do not decode: {0}")]
    Decode(String),
}

impl From<MockError> for Error {
    fn from(err: MockError) -> Self {
        Error::backend(err)
    }
}

/// Scripted executor and transaction.
#[derive(Debug, Default)]
pub struct MockExecutor {
    count: i64,
    rows: Vec<serde_json::Value>,
    failures: HashSet<MockFailure>,
    statements: Vec<SqlStatement>,
    commits: usize,
    rollbacks: usize,
}

impl MockExecutor {
    /// Creates an executor returning a zero count and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value returned by scalar statements.
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = count;
        self
    }

    /// Sets the rows returned by fetches.
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = serde_json::Value>) -> Self {
        self.rows = rows.into_iter().collect();
        self
    }

    /// Makes `operation` fail from now on.
    pub fn failing(mut self, operation: MockFailure) -> Self {
        self.failures.insert(operation);
        self
    }

    /// Returns every statement received, in order.
    pub fn statements(&self) -> &[SqlStatement] {
        &self.statements
    }

    /// Returns the number of commits attempted.
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Returns the number of rollbacks attempted.
    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    fn check(&self, operation: MockFailure) -> Result<(), MockError> {
        if self.failures.contains(&operation) {
            return Err(MockError::Scripted(operation));
        }
        Ok(())
    }
}

impl SqlExecutor for MockExecutor {
    type Error = MockError;

    async fn select_int(&mut self, statement: &SqlStatement) -> Result<i64, MockError> {
        self.statements.push(statement.clone());
        self.check(MockFailure::Count)?;
        Ok(self.count)
    }
}

impl<T> FetchAll<T> for MockExecutor
where
    T: DeserializeOwned + Send,
{
    async fn select_all(&mut self, statement: &SqlStatement) -> Result<Vec<T>, MockError> {
        self.statements.push(statement.clone());
        self.check(MockFailure::Fetch)?;
        let rows = serde_json::Value::Array(self.rows.clone());
        serde_json::from_value(rows).map_err(|err| MockError::Decode(err.to_string()))
    }
}

impl Transaction for MockExecutor {
    async fn commit(&mut self) -> Result<(), MockError> {
        self.commits += 1;
        self.check(MockFailure::Commit)
    }

    async fn rollback(&mut self) -> Result<(), MockError> {
        self.rollbacks += 1;
        self.check(MockFailure::Rollback)
    }
}
