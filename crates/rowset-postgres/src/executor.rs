//! Executor and transaction implementations over [`AsyncPgConnection`].
//!
//! Statements rendered by the core arrive as SQL text with `$n` placeholders
//! and a list of [`Bind`]s; they run as raw `sql_query`s with every bind
//! attached in order.

use diesel::QueryableByName;
use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Bool, Double, Nullable, Text};
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use rowset_core::{Bind, FetchAll, SqlExecutor, SqlStatement, Transaction, TxHandler};

use crate::{PgConn, PgError, PgResult, TRACING_TARGET_QUERY};

/// Single-column row produced by [`scalar_sql`].
#[derive(QueryableByName)]
struct ScalarRow {
    #[diesel(sql_type = BigInt)]
    value: i64,
}

/// Wraps a single-value query so any integer type decodes as `BIGINT`.
fn scalar_sql(sql: &str) -> String {
    format!("SELECT CAST(({sql}) AS BIGINT) AS value")
}

fn prepare(sql: String, binds: &[Bind]) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
    binds
        .iter()
        .fold(diesel::sql_query(sql).into_boxed(), |query, bind| match bind {
            Bind::Null => query.bind::<Nullable<Text>, _>(None::<String>),
            Bind::Bool(value) => query.bind::<Bool, _>(*value),
            Bind::Int(value) => query.bind::<BigInt, _>(*value),
            Bind::Float(value) => query.bind::<Double, _>(*value),
            Bind::Text(value) => query.bind::<Text, _>(value.clone()),
        })
}

async fn select_int(conn: &mut AsyncPgConnection, statement: &SqlStatement) -> PgResult<i64> {
    tracing::debug!(target: TRACING_TARGET_QUERY, sql = statement.sql(), "Running scalar statement");
    let row: ScalarRow = prepare(scalar_sql(statement.sql()), statement.binds())
        .get_result(conn)
        .await?;
    Ok(row.value)
}

async fn select_all<T>(conn: &mut AsyncPgConnection, statement: &SqlStatement) -> PgResult<Vec<T>>
where
    T: QueryableByName<Pg> + Send + 'static,
{
    tracing::debug!(target: TRACING_TARGET_QUERY, sql = statement.sql(), "Running fetch statement");
    let rows: Vec<T> = prepare(statement.sql().to_owned(), statement.binds())
        .load(conn)
        .await?;
    Ok(rows)
}

impl SqlExecutor for PgConn<'_> {
    type Error = PgError;

    async fn select_int(&mut self, statement: &SqlStatement) -> PgResult<i64> {
        select_int(self.connection(), statement).await
    }
}

impl<T> FetchAll<T> for PgConn<'_>
where
    T: QueryableByName<Pg> + Send + 'static,
{
    async fn select_all(&mut self, statement: &SqlStatement) -> PgResult<Vec<T>> {
        select_all(self.connection(), statement).await
    }
}

impl PgConn<'_> {
    /// Opens a transaction on this connection.
    ///
    /// The returned handle must be finished with [`Transaction::commit`] or
    /// [`Transaction::rollback`], usually through a [`TxHandler`].
    pub async fn begin(&mut self) -> PgResult<PgTransaction<'_>> {
        let conn = self.connection();
        AnsiTransactionManager::begin_transaction(&mut *conn).await?;
        tracing::trace!(target: TRACING_TARGET_QUERY, "Transaction started");
        Ok(PgTransaction { conn, open: true })
    }

    /// Opens a transaction and runs `handler` in it.
    ///
    /// # Errors
    ///
    /// Returns the handler's error, or a backend error when the transaction
    /// cannot be opened.
    pub async fn run_in_transaction<'a, 't>(
        &'t mut self,
        handler: TxHandler<'a, PgTransaction<'t>>,
    ) -> rowset_core::Result<()> {
        let mut tx = self.begin().await?;
        handler.run(&mut tx).await
    }
}

/// An open transaction borrowing the caller's connection.
///
/// Dropping it unfinished leaves the connection inside the transaction until
/// the caller rolls back or closes it.
pub struct PgTransaction<'c> {
    conn: &'c mut AsyncPgConnection,
    open: bool,
}

impl PgTransaction<'_> {
    /// Returns whether neither commit nor rollback has been attempted.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl SqlExecutor for PgTransaction<'_> {
    type Error = PgError;

    async fn select_int(&mut self, statement: &SqlStatement) -> PgResult<i64> {
        select_int(&mut *self.conn, statement).await
    }
}

impl<T> FetchAll<T> for PgTransaction<'_>
where
    T: QueryableByName<Pg> + Send + 'static,
{
    async fn select_all(&mut self, statement: &SqlStatement) -> PgResult<Vec<T>> {
        select_all(&mut *self.conn, statement).await
    }
}

impl Transaction for PgTransaction<'_> {
    async fn commit(&mut self) -> PgResult<()> {
        self.open = false;
        AnsiTransactionManager::commit_transaction(&mut *self.conn).await?;
        tracing::trace!(target: TRACING_TARGET_QUERY, "Transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> PgResult<()> {
        self.open = false;
        AnsiTransactionManager::rollback_transaction(&mut *self.conn).await?;
        tracing::trace!(target: TRACING_TARGET_QUERY, "Transaction rolled back");
        Ok(())
    }
}

impl Drop for PgTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            tracing::warn!(
                target: TRACING_TARGET_QUERY,
                "Transaction dropped without commit or rollback"
            );
        }
    }
}

impl std::fmt::Debug for PgTransaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTransaction")
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use diesel::debug_query;
    use rowset_core::{PageableQuery, SelectQuery};

    use super::*;

    #[derive(QueryableByName)]
    #[allow(dead_code)]
    struct ItemRow {
        #[diesel(sql_type = BigInt)]
        id: i64,
    }

    fn assert_executor<E: SqlExecutor<Error = PgError> + FetchAll<ItemRow>>() {}

    fn assert_transaction<T: Transaction + FetchAll<ItemRow>>() {}

    #[test]
    fn borrowed_connections_run_statements() {
        assert_executor::<PgConn<'static>>();
        assert_executor::<PgTransaction<'static>>();
        assert_transaction::<PgTransaction<'static>>();
    }

    #[test]
    fn wraps_scalar_queries() {
        assert_eq!(
            scalar_sql("SELECT COUNT(*) FROM items"),
            "SELECT CAST((SELECT COUNT(*) FROM items) AS BIGINT) AS value"
        );
    }

    #[test]
    fn attaches_binds_in_order() {
        let statement = SelectQuery::table("items")
            .filter("kind = ? AND score > ?", [Bind::from("a"), Bind::from(1.5)])
            .filter("owner_id = ?", [Bind::from(7)])
            .to_count_statement()
            .unwrap();

        let query = prepare(scalar_sql(statement.sql()), statement.binds());
        let rendered = debug_query::<Pg, _>(&query).to_string();

        assert!(rendered.starts_with(
            "SELECT CAST((SELECT COUNT(*) FROM items WHERE (kind = $1 AND score > $2) AND (owner_id = $3)) AS BIGINT) AS value"
        ));
        assert!(rendered.contains(r#""a""#));
        assert!(rendered.contains("1.5"));
        assert!(rendered.contains('7'));
    }
}
