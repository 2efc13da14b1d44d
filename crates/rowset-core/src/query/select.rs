use std::fmt::Write;

use super::{Bind, PageableQuery, SqlStatement};
use crate::page::SortOrder;
use crate::{Error, Result};

/// A single-table `SELECT` builder rendering Postgres-style placeholders.
///
/// Filters are written with `?` placeholders and are joined with `AND`; they
/// are renumbered to `$1, $2, ...` when the statement is rendered. A `?`
/// inside a quoted literal or identifier is kept as is, and `??` renders a
/// literal `?` for operators such as jsonb `?|`. Columns
/// used for ordering are quoted as identifiers since they usually come from
/// request parameters.
///
/// ```
/// use rowset_core::{Bind, PageableQuery, SelectQuery, SortOrder};
///
/// let mut query = SelectQuery::table("users")
///     .columns(["id", "name"])
///     .filter("region = ?", [Bind::from("eu")]);
/// query.order_by("id", SortOrder::Desc).limit(10);
///
/// let statement = query.to_statement().unwrap();
/// assert_eq!(
///     statement.sql(),
///     r#"SELECT id, name FROM users WHERE (region = $1) ORDER BY "id" DESC LIMIT 10"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    table: String,
    columns: Vec<String>,
    filters: Vec<(String, Vec<Bind>)>,
    order_by: Vec<(String, SortOrder)>,
    offset: Option<i64>,
    limit: Option<i64>,
}

impl SelectQuery {
    /// Starts a query over `table`, selecting every column.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Replaces the projected columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a filter clause with one bound value per `?` placeholder.
    pub fn filter<I>(mut self, clause: impl Into<String>, binds: I) -> Self
    where
        I: IntoIterator<Item = Bind>,
    {
        self.filters
            .push((clause.into(), binds.into_iter().collect()));
        self
    }

    /// Adds a filter clause only when `value` is present.
    pub fn filter_opt<T>(self, clause: impl Into<String>, value: Option<T>) -> Self
    where
        T: Into<Bind>,
    {
        match value {
            Some(value) => self.filter(clause, [value.into()]),
            None => self,
        }
    }

    /// Returns the ordering applied so far.
    pub fn ordering(&self) -> &[(String, SortOrder)] {
        &self.order_by
    }

    /// Returns the current offset.
    pub fn current_offset(&self) -> Option<i64> {
        self.offset
    }

    /// Returns the current limit.
    pub fn current_limit(&self) -> Option<i64> {
        self.limit
    }

    /// Renders `FROM` and `WHERE`, numbering placeholders from `$1`.
    fn render_from(&self, sql: &mut String, binds: &mut Vec<Bind>) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(Error::QueryBuild("table name is empty".into()));
        }
        write!(sql, " FROM {}", self.table).ok();

        for (index, (clause, clause_binds)) in self.filters.iter().enumerate() {
            if clause.trim().is_empty() {
                return Err(Error::QueryBuild("filter clause is empty".into()));
            }

            let rendered = render_clause(clause, clause_binds.len(), binds.len())?;
            binds.extend(clause_binds.iter().cloned());

            sql.push_str(if index == 0 { " WHERE (" } else { " AND (" });
            sql.push_str(&rendered);
            sql.push(')');
        }

        Ok(())
    }
}

/// Rewrites the `?` placeholders of one clause as `$n`, numbering after
/// `offset` earlier binds.
///
/// Single-quoted literals and double-quoted identifiers are copied verbatim.
/// Outside them `??` stands for a literal `?`.
fn render_clause(clause: &str, expected: usize, offset: usize) -> Result<String> {
    let mut rendered = String::with_capacity(clause.len() + expected * 2);
    let mut placeholders = 0;
    let mut quote = None;
    let mut chars = clause.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(open) => {
                if c == open {
                    quote = None;
                }
                rendered.push(c);
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                rendered.push(c);
            }
            None if c == '?' => {
                if chars.next_if_eq(&'?').is_some() {
                    rendered.push('?');
                } else {
                    placeholders += 1;
                    write!(rendered, "${}", offset + placeholders).ok();
                }
            }
            None => rendered.push(c),
        }
    }

    if let Some(open) = quote {
        return Err(Error::QueryBuild(
            format!("filter {clause:?} has an unterminated {open} quote").into(),
        ));
    }
    if placeholders != expected {
        return Err(Error::QueryBuild(
            format!("filter {clause:?} has {placeholders} placeholders but {expected} binds")
                .into(),
        ));
    }
    Ok(rendered)
}

/// Quotes a possibly dotted identifier, e.g. `u.name` becomes `"u"."name"`.
fn quote_ident(ident: &str) -> String {
    ident
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

impl PageableQuery for SelectQuery {
    fn clear_order_by(&mut self) -> &mut Self {
        self.order_by.clear();
        self
    }

    fn order_by(&mut self, column: &str, order: SortOrder) -> &mut Self {
        self.order_by.push((column.to_owned(), order));
        self
    }

    fn offset(&mut self, offset: i64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    fn limit(&mut self, limit: i64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    fn to_statement(&self) -> Result<SqlStatement> {
        let mut sql = String::from("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        let mut binds = Vec::new();
        self.render_from(&mut sql, &mut binds)?;

        if !self.order_by.is_empty() {
            let ordering = self
                .order_by
                .iter()
                .map(|(column, order)| format!("{} {}", quote_ident(column), order.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            write!(sql, " ORDER BY {ordering}").ok();
        }
        if let Some(limit) = self.limit {
            write!(sql, " LIMIT {limit}").ok();
        }
        if let Some(offset) = self.offset {
            write!(sql, " OFFSET {offset}").ok();
        }

        Ok(SqlStatement::new(sql, binds))
    }

    fn to_count_statement(&self) -> Result<SqlStatement> {
        let mut sql = String::from("SELECT COUNT(*)");
        let mut binds = Vec::new();
        self.render_from(&mut sql, &mut binds)?;
        Ok(SqlStatement::new(sql, binds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_select_star_without_clauses() {
        let statement = SelectQuery::table("users").to_statement().unwrap();
        assert_eq!(statement.sql(), "SELECT * FROM users");
        assert!(statement.binds().is_empty());
    }

    #[test]
    fn numbers_placeholders_across_filters() {
        let query = SelectQuery::table("users")
            .filter("region = ?", [Bind::from("eu")])
            .filter("id BETWEEN ? AND ?", [Bind::from(10), Bind::from(20)])
            .filter_opt("name ILIKE ?", None::<String>)
            .filter_opt("removed = ?", Some(false));

        let statement = query.to_statement().unwrap();
        assert_eq!(
            statement.sql(),
            "SELECT * FROM users WHERE (region = $1) AND (id BETWEEN $2 AND $3) AND (removed = $4)"
        );
        assert_eq!(
            statement.binds(),
            &[
                Bind::Text("eu".into()),
                Bind::Int(10),
                Bind::Int(20),
                Bind::Bool(false)
            ]
        );
    }

    #[test]
    fn orders_offsets_and_limits() {
        let mut query = SelectQuery::table("users").columns(["id"]);
        query
            .order_by("name", SortOrder::Asc)
            .order_by("u.id", SortOrder::Desc)
            .offset(40)
            .limit(20);

        let statement = query.to_statement().unwrap();
        assert_eq!(
            statement.sql(),
            r#"SELECT id FROM users ORDER BY "name" ASC, "u"."id" DESC LIMIT 20 OFFSET 40"#
        );
    }

    #[test]
    fn sort_columns_cannot_inject_sql() {
        let mut query = SelectQuery::table("users");
        query.order_by(r#"id"; DROP TABLE users; --"#, SortOrder::Asc);

        let statement = query.to_statement().unwrap();
        assert_eq!(
            statement.sql(),
            r#"SELECT * FROM users ORDER BY "id""; DROP TABLE users; --" ASC"#
        );
    }

    #[test]
    fn clear_order_by_drops_previous_ordering() {
        let mut query = SelectQuery::table("users");
        query.order_by("created_time", SortOrder::Desc);
        query.clear_order_by().order_by("id", SortOrder::Asc);
        assert_eq!(query.ordering(), &[("id".to_string(), SortOrder::Asc)]);
    }

    #[test]
    fn count_ignores_paging_and_ordering() {
        let mut query = SelectQuery::table("users")
            .columns(["id", "name"])
            .filter("region = ?", [Bind::from("eu")]);
        query.order_by("id", SortOrder::Asc).offset(5).limit(5);

        let statement = query.to_count_statement().unwrap();
        assert_eq!(statement.sql(), "SELECT COUNT(*) FROM users WHERE (region = $1)");
        assert_eq!(statement.binds(), &[Bind::Text("eu".into())]);
    }

    #[test]
    fn quoted_question_marks_are_not_placeholders() {
        let statement = SelectQuery::table("notes")
            .filter("note <> '?' AND id = ?", [Bind::from(1)])
            .filter(r#""why?" = ? AND title <> 'it''s ?'"#, [Bind::from("x")])
            .to_statement()
            .unwrap();

        assert_eq!(
            statement.sql(),
            r#"SELECT * FROM notes WHERE (note <> '?' AND id = $1) AND ("why?" = $2 AND title <> 'it''s ?')"#
        );
        assert_eq!(statement.binds().len(), 2);
    }

    #[test]
    fn doubled_question_mark_renders_jsonb_operators() {
        let statement = SelectQuery::table("posts")
            .filter("tags ?? ?", [Bind::from("rust")])
            .filter("tags ??| ?", [Bind::from("{a,b}")])
            .filter("tags ??& ?", [Bind::from("{c}")])
            .to_count_statement()
            .unwrap();

        assert_eq!(
            statement.sql(),
            "SELECT COUNT(*) FROM posts WHERE (tags ? $1) AND (tags ?| $2) AND (tags ?& $3)"
        );
    }

    #[test]
    fn rejects_unterminated_quotes() {
        let err = SelectQuery::table("notes")
            .filter("note = 'open ?", [Bind::from(1)])
            .to_statement()
            .unwrap_err();
        assert!(matches!(err, Error::QueryBuild(_)));
    }

    #[test]
    fn rejects_invalid_queries() {
        assert!(matches!(
            SelectQuery::table(" ").to_statement(),
            Err(Error::QueryBuild(_))
        ));
        assert!(matches!(
            SelectQuery::table("users")
                .filter("id = ? OR id = ?", [Bind::from(1)])
                .to_count_statement(),
            Err(Error::QueryBuild(_))
        ));
        assert!(matches!(
            SelectQuery::table("users")
                .filter("", Vec::new())
                .to_statement(),
            Err(Error::QueryBuild(_))
        ));
    }
}
