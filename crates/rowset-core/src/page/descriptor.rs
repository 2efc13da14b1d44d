//! Offset-based page descriptor built from request parameters.

use std::fmt;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::SortOrder;
use crate::{Error, Result, TRACING_TARGET_PAGINATION};

/// Number of rows returned when the request does not ask for a size.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

const PAGE_START: &str = "pageStart";
const PAGE_SIZE: &str = "pageSize";
const SORT: &str = "sort";
const ORDER: &str = "order";
const KEYWORD: &str = "keyword";

/// Pagination, sorting and keyword parameters of one listing request.
///
/// Construction is forgiving (see [`Page::from_params`]); [`Page::validate`]
/// must pass before the descriptor shapes a query. `order` is kept as raw
/// text so that invalid directions survive parsing and are reported by
/// validation instead of being silently replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    /// Zero-based index of the first row.
    pub page_start: i64,
    /// Maximum number of rows in the page.
    pub page_size: i64,
    /// Sort direction, `ASC` or `DESC`.
    pub order: String,
    /// Field name to sort by; empty keeps the query's own ordering.
    pub sort: String,
    /// Free-text filter interpreted by the caller's query.
    pub keyword: String,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page_start: 0,
            page_size: DEFAULT_PAGE_SIZE,
            order: SortOrder::Desc.to_string(),
            sort: String::new(),
            keyword: String::new(),
        }
    }
}

impl Page {
    /// Creates a page with the given offset and size and default ordering.
    pub fn new(page_start: i64, page_size: i64) -> Self {
        Self {
            page_start,
            page_size,
            ..Self::default()
        }
    }

    /// Sets the field to sort by and the direction.
    pub fn with_sort(mut self, sort: impl Into<String>, order: SortOrder) -> Self {
        self.sort = sort.into();
        self.order = order.to_string();
        self
    }

    /// Sets the keyword filter.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    /// Creates a page from request-style key/value parameters
    /// (e.g. `pageStart=2&pageSize=50&sort=id&order=DESC`).
    ///
    /// Parsing never fails: missing or malformed numbers fall back to `0` and
    /// [`DEFAULT_PAGE_SIZE`], a zero size becomes the default and a missing
    /// order becomes `DESC`. When a key repeats, the first value wins.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut page_start = None;
        let mut page_size = None;
        let mut sort = None;
        let mut order = None;
        let mut keyword = None;

        for (key, value) in params {
            let slot = match key.as_ref() {
                PAGE_START => &mut page_start,
                PAGE_SIZE => &mut page_size,
                SORT => &mut sort,
                ORDER => &mut order,
                KEYWORD => &mut keyword,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.as_ref().to_owned());
            }
        }

        let page_start = page_start
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(0);
        let page_size = page_size
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|size| *size != 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let order = order
            .filter(|order| !order.is_empty())
            .unwrap_or_else(|| SortOrder::Desc.to_string());

        let page = Self {
            page_start,
            page_size,
            order,
            sort: sort.unwrap_or_default(),
            keyword: keyword.unwrap_or_default(),
        };

        tracing::trace!(
            target: TRACING_TARGET_PAGINATION,
            page_start = page.page_start,
            page_size = page.page_size,
            sort = %page.sort,
            order = %page.order,
            "Parsed page from parameters"
        );

        page
    }

    /// Creates a page from a URL query string such as `pageStart=0&pageSize=10`.
    pub fn from_query(query: &str) -> Self {
        Self::from_params(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Checks the offset, size and order constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPagination`] when `page_start` is negative,
    /// `page_size` is below one, or `order` is neither empty, `ASC` nor `DESC`.
    pub fn validate(&self) -> Result<()> {
        if self.page_start < 0 {
            return Err(Error::invalid_pagination(format!(
                "pageStart must be greater than or equal to 0, got {}",
                self.page_start
            )));
        }

        if self.page_size < 1 {
            return Err(Error::invalid_pagination(format!(
                "pageSize must be greater than 0, got {}",
                self.page_size
            )));
        }

        if !self.order.is_empty() && self.order.parse::<SortOrder>().is_err() {
            return Err(Error::invalid_pagination(format!(
                "invalid sort order: {}",
                self.order
            )));
        }

        Ok(())
    }

    /// Returns the parsed sort direction, treating an empty order as `DESC`.
    ///
    /// Returns `None` when the order text is not a valid direction.
    pub fn sort_order(&self) -> Option<SortOrder> {
        if self.order.is_empty() {
            return Some(SortOrder::Desc);
        }
        self.order.parse().ok()
    }

    /// Replaces an empty order with `DESC`.
    pub(crate) fn normalize_order(&mut self) {
        if self.order.is_empty() {
            self.order = SortOrder::Desc.to_string();
        }
    }

    /// Serializes the page back into request parameters.
    ///
    /// `pageStart` and `pageSize` are always present; `sort` and `order` only
    /// when non-empty. The keyword is never emitted.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            (PAGE_START, self.page_start.to_string()),
            (PAGE_SIZE, self.page_size.to_string()),
        ];
        if !self.sort.is_empty() {
            params.push((SORT, self.sort.clone()));
        }
        if !self.order.is_empty() {
            params.push((ORDER, self.order.clone()));
        }
        params
    }

    /// Returns the descriptor of the following page.
    pub fn next(&self) -> Self {
        Self {
            page_start: self.page_start.saturating_add(self.page_size),
            ..self.clone()
        }
    }

    /// Returns whether rows remain after this page given the total count.
    pub fn has_more(&self, total: i64) -> bool {
        self.page_start.saturating_add(self.page_size) < total
    }
}

impl fmt::Display for Page {
    /// Renders the URL-encoded query string used for pagination links.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_params())
            .finish();
        f.write_str(&encoded)
    }
}
