//! Query abstraction consumed by the pager.
//!
//! The pager only needs to reorder, offset and limit a query and to render it
//! into a [`SqlStatement`]; everything else about how the query was built is
//! left to the implementor. [`SelectQuery`] is the bundled implementation.

mod bind;
mod select;

use std::fmt;
use std::future::Future;

use serde::Serialize;

pub use self::bind::Bind;
pub use self::select::SelectQuery;
use crate::executor::{FetchAll, SqlExecutor};
use crate::page::SortOrder;
use crate::{Error, Result};

/// Rendered SQL text together with its bound values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlStatement {
    sql: String,
    binds: Vec<Bind>,
}

impl SqlStatement {
    /// Creates a statement from SQL text and its bound values.
    pub fn new(sql: impl Into<String>, binds: Vec<Bind>) -> Self {
        Self {
            sql: sql.into(),
            binds,
        }
    }

    /// Creates a statement without bound values.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Returns the SQL text.
    #[inline]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the bound values in placeholder order.
    #[inline]
    pub fn binds(&self) -> &[Bind] {
        &self.binds
    }

    /// Splits the statement into its SQL text and bound values.
    pub fn into_parts(self) -> (String, Vec<Bind>) {
        (self.sql, self.binds)
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if !self.binds.is_empty() {
            write!(f, " -- binds: {:?}", self.binds)?;
        }
        Ok(())
    }
}

/// A mutable, chainable query that the pager can shape and execute.
///
/// Implementors render two statements: the fetch statement with the current
/// ordering, offset and limit, and the counting statement that counts every
/// matching row regardless of paging.
pub trait PageableQuery {
    /// Removes any ordering applied so far.
    fn clear_order_by(&mut self) -> &mut Self;

    /// Appends an ordering on `column` in the given direction.
    fn order_by(&mut self, column: &str, order: SortOrder) -> &mut Self;

    /// Sets the number of rows to skip.
    fn offset(&mut self, offset: i64) -> &mut Self;

    /// Sets the maximum number of rows to return.
    fn limit(&mut self, limit: i64) -> &mut Self;

    /// Renders the fetch statement.
    fn to_statement(&self) -> Result<SqlStatement>;

    /// Renders the statement counting all matching rows.
    fn to_count_statement(&self) -> Result<SqlStatement>;

    /// Runs the counting statement and returns the number of matching rows.
    fn count<E>(&self, executor: &mut E) -> impl Future<Output = Result<i64>> + Send
    where
        E: SqlExecutor,
    {
        let statement = self.to_count_statement();
        async move {
            let statement = statement?;
            let result = executor.select_int(&statement).await;
            result.map_err(|err| Error::query(statement, err))
        }
    }

    /// Runs the fetch statement and returns the rows.
    fn fetch_all<T, E>(&self, executor: &mut E) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        E: FetchAll<T>,
        T: Send,
    {
        let statement = self.to_statement();
        async move {
            let statement = statement?;
            let result = executor.select_all(&statement).await;
            result.map_err(|err| Error::query(statement, err))
        }
    }
}
