//! Count-then-fetch orchestration of paged queries.
//!
//! Every function here issues independent statements against the same
//! executor: the count first, then the fetch. A failure in either step is
//! returned immediately; nothing is retried.

use crate::executor::FetchAll;
use crate::page::{Page, PageResponse};
use crate::query::PageableQuery;
use crate::{Error, Result, TRACING_TARGET_QUERY};

/// Validates `page` and applies its ordering, offset and limit to `query`.
///
/// The query's previous ordering is only replaced when the page names a sort
/// field; an empty order is normalized to `DESC` in that case.
fn apply_page<Q>(query: &mut Q, page: &mut Page) -> Result<()>
where
    Q: PageableQuery,
{
    page.validate()?;

    if !page.sort.is_empty() {
        page.normalize_order();
        let order = page.sort_order().unwrap_or_default();
        query.clear_order_by().order_by(&page.sort, order);
    }

    query.offset(page.page_start).limit(page.page_size);
    Ok(())
}

/// Applies the optional page to `query` and fetches the rows without counting.
///
/// # Errors
///
/// Returns [`Error::InvalidPagination`] for an invalid page and
/// [`Error::Query`] when the fetch fails.
pub async fn fetch_page<E, Q, T>(
    executor: &mut E,
    query: &mut Q,
    page: Option<&mut Page>,
) -> Result<Vec<T>>
where
    E: FetchAll<T>,
    Q: PageableQuery,
    T: Send,
{
    if let Some(page) = page {
        apply_page(query, page)?;
    }

    let rows = query.fetch_all(executor).await.inspect_err(|err| {
        tracing::debug!(target: TRACING_TARGET_QUERY, error = %err, "Fetch statement failed");
    })?;

    tracing::trace!(target: TRACING_TARGET_QUERY, rows = rows.len(), "Fetched page rows");
    Ok(rows)
}

/// Counts the matching rows, then fills `holder` with the requested page.
///
/// The count runs `count_query`'s counting form when given, otherwise the
/// counting form of `query`. Returns the total number of matching rows.
///
/// # Errors
///
/// Returns [`Error::Query`] when the count or the fetch fails and
/// [`Error::InvalidPagination`] for an invalid page. A failed count aborts
/// before the page is validated or the rows are fetched.
pub async fn load_page<E, Q, T>(
    executor: &mut E,
    query: &mut Q,
    page: Option<&mut Page>,
    holder: &mut Vec<T>,
    count_query: Option<&Q>,
) -> Result<i64>
where
    E: FetchAll<T>,
    Q: PageableQuery,
    T: Send,
{
    let total = match count_query {
        Some(count_query) => count_query.count(executor).await,
        None => query.count(executor).await,
    }
    .inspect_err(|err| {
        tracing::debug!(target: TRACING_TARGET_QUERY, error = %err, "Count statement failed");
    })?;

    let rows = fetch_page(executor, query, page).await?;
    holder.clear();
    holder.extend(rows);

    tracing::debug!(
        target: TRACING_TARGET_QUERY,
        total,
        rows = holder.len(),
        "Loaded page"
    );
    Ok(total)
}

/// Runs [`load_page`] and packages the outcome into a [`PageResponse`].
pub async fn load_page_response<E, Q, T>(
    executor: &mut E,
    query: &mut Q,
    mut page: Option<Page>,
    count_query: Option<&Q>,
) -> Result<PageResponse<Vec<T>>>
where
    E: FetchAll<T>,
    Q: PageableQuery,
    T: Send,
{
    let mut data = Vec::new();
    let total = load_page(executor, query, page.as_mut(), &mut data, count_query).await?;
    Ok(PageResponse::new(page, total, data))
}

/// Like [`load_page_response`], but runs a pre-built count query as-is.
///
/// `count_query` is rendered with [`PageableQuery::to_statement`] (not its
/// counting form) and executed as a scalar statement, so it must already
/// select a single integer.
///
/// # Errors
///
/// A failing count returns [`Error::Query`] carrying the count statement's
/// SQL and bound values.
pub async fn load_page_response_with_count<E, Q, C, T>(
    executor: &mut E,
    query: &mut Q,
    mut page: Option<Page>,
    count_query: &C,
) -> Result<PageResponse<Vec<T>>>
where
    E: FetchAll<T>,
    Q: PageableQuery,
    C: PageableQuery,
    T: Send,
{
    let statement = count_query.to_statement()?;
    let total = match executor.select_int(&statement).await {
        Ok(total) => total,
        Err(err) => {
            tracing::debug!(
                target: TRACING_TARGET_QUERY,
                error = %err,
                sql = statement.sql(),
                "Count statement failed"
            );
            return Err(Error::query(statement, err));
        }
    };

    let data = fetch_page(executor, query, page.as_mut()).await?;
    Ok(PageResponse::new(page, total, data))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::mock::{MockExecutor, MockFailure};
    use crate::page::SortOrder;
    use crate::query::{Bind, SelectQuery, SqlStatement};

    #[derive(Debug, PartialEq, Deserialize)]
    struct Row {
        id: i64,
    }

    fn rows(ids: &[i64]) -> Vec<serde_json::Value> {
        ids.iter().map(|id| json!({ "id": id })).collect()
    }

    #[tokio::test]
    async fn applies_default_descending_order() {
        let mut executor = MockExecutor::new().with_count(5).with_rows(rows(&[3, 4]));
        let mut query = SelectQuery::table("items");
        let mut page = Page::new(1, 2).with_sort("id", SortOrder::Asc);
        page.order.clear();

        let mut holder: Vec<Row> = Vec::new();
        let total = load_page(&mut executor, &mut query, Some(&mut page), &mut holder, None)
            .await
            .unwrap();

        assert_eq!(total, 5);
        assert_eq!(holder, vec![Row { id: 3 }, Row { id: 4 }]);
        assert_eq!(page.order, "DESC");
        assert_eq!(
            executor.statements(),
            &[
                SqlStatement::raw("SELECT COUNT(*) FROM items"),
                SqlStatement::raw(r#"SELECT * FROM items ORDER BY "id" DESC LIMIT 2 OFFSET 1"#),
            ]
        );
    }

    #[tokio::test]
    async fn keeps_query_order_without_sort_field() {
        let mut executor = MockExecutor::new().with_count(1).with_rows(rows(&[1]));
        let mut query = SelectQuery::table("items");
        query.order_by("created_time", SortOrder::Asc);

        let response: PageResponse<Vec<Row>> =
            load_page_response(&mut executor, &mut query, Some(Page::new(0, 10)), None)
                .await
                .unwrap();

        assert_eq!(response.total, 1);
        assert_eq!(
            executor.statements()[1].sql(),
            r#"SELECT * FROM items ORDER BY "created_time" ASC LIMIT 10 OFFSET 0"#
        );
    }

    #[tokio::test]
    async fn replaces_previous_ordering_with_sort_field() {
        let mut executor = MockExecutor::new().with_count(0);
        let mut query = SelectQuery::table("items");
        query.order_by("created_time", SortOrder::Asc);
        let page = Page::new(0, 10).with_sort("name", SortOrder::Asc);

        let _: PageResponse<Vec<Row>> =
            load_page_response(&mut executor, &mut query, Some(page), None)
                .await
                .unwrap();

        assert_eq!(query.ordering(), &[("name".to_string(), SortOrder::Asc)]);
    }

    #[tokio::test]
    async fn without_page_fetches_everything() {
        let mut executor = MockExecutor::new().with_count(3).with_rows(rows(&[1, 2, 3]));
        let mut query = SelectQuery::table("items");

        let response: PageResponse<Vec<Row>> =
            load_page_response(&mut executor, &mut query, None, None)
                .await
                .unwrap();

        assert_eq!(response.page, None);
        assert_eq!(response.data.len(), 3);
        assert_eq!(executor.statements()[1].sql(), "SELECT * FROM items");
    }

    #[tokio::test]
    async fn uses_separate_count_query() {
        let mut executor = MockExecutor::new().with_count(9);
        let mut query = SelectQuery::table("items").filter("kind = ?", [Bind::from("a")]);
        let count_query = SelectQuery::table("item_stats");

        let mut holder: Vec<Row> = Vec::new();
        let total = load_page(
            &mut executor,
            &mut query,
            None,
            &mut holder,
            Some(&count_query),
        )
        .await
        .unwrap();

        assert_eq!(total, 9);
        assert_eq!(executor.statements()[0].sql(), "SELECT COUNT(*) FROM item_stats");
    }

    #[tokio::test]
    async fn count_failure_skips_fetch() {
        let mut executor = MockExecutor::new().failing(MockFailure::Count);
        let mut query = SelectQuery::table("items");

        let mut holder: Vec<Row> = Vec::new();
        let err = load_page(&mut executor, &mut query, None, &mut holder, None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Query { .. }));
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn invalid_page_is_rejected_after_count() {
        let mut executor = MockExecutor::new().with_count(4);
        let mut query = SelectQuery::table("items");
        let mut page = Page::new(-1, 10);

        let mut holder: Vec<Row> = Vec::new();
        let err = load_page(&mut executor, &mut query, Some(&mut page), &mut holder, None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidPagination(_)));
        assert_eq!(executor.statements().len(), 1);
        assert_eq!(query.current_offset(), None);
    }

    #[tokio::test]
    async fn fetch_failure_is_query_error() {
        let mut executor = MockExecutor::new().with_count(4).failing(MockFailure::Fetch);
        let mut query = SelectQuery::table("items");

        let result: Result<PageResponse<Vec<Row>>> =
            load_page_response(&mut executor, &mut query, Some(Page::default()), None).await;

        let err = result.unwrap_err();
        assert_eq!(
            err.statement().map(SqlStatement::sql),
            Some("SELECT * FROM items LIMIT 20 OFFSET 0")
        );
    }

    #[tokio::test]
    async fn prebuilt_count_runs_as_scalar() {
        let mut executor = MockExecutor::new().with_count(2).with_rows(rows(&[7, 8]));
        let mut query = SelectQuery::table("items");
        let count_query = SelectQuery::table("items")
            .columns(["COUNT(DISTINCT owner_id)"])
            .filter("kind = ?", [Bind::from("a")]);

        let response: PageResponse<Vec<Row>> = load_page_response_with_count(
            &mut executor,
            &mut query,
            Some(Page::new(0, 2)),
            &count_query,
        )
        .await
        .unwrap();

        assert_eq!(response.total, 2);
        assert_eq!(response.data, vec![Row { id: 7 }, Row { id: 8 }]);
        assert_eq!(
            executor.statements()[0],
            SqlStatement::new(
                "SELECT COUNT(DISTINCT owner_id) FROM items WHERE (kind = $1)",
                vec![Bind::Text("a".into())]
            )
        );
    }

    #[tokio::test]
    async fn prebuilt_count_failure_keeps_sql_and_binds() {
        let mut executor = MockExecutor::new().failing(MockFailure::Count);
        let mut query = SelectQuery::table("items");
        let count_query = SelectQuery::table("items")
            .columns(["COUNT(*)"])
            .filter("owner_id = ?", [Bind::from(42)]);

        let result: Result<PageResponse<Vec<Row>>> =
            load_page_response_with_count(&mut executor, &mut query, None, &count_query).await;

        let err = result.unwrap_err();
        let statement = err.statement().expect("statement should be attached");
        assert_eq!(
            statement.sql(),
            "SELECT COUNT(*) FROM items WHERE (owner_id = $1)"
        );
        assert_eq!(statement.binds(), &[Bind::Int(42)]);
        assert_eq!(executor.statements().len(), 1);
    }
}
