#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Page;

/// Response to a page request.
///
/// Serializes as one flat object: the page fields (when a page was supplied)
/// followed by `total` and `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct PageResponse<T> {
    /// The page descriptor used for the fetch.
    #[serde(flatten)]
    pub page: Option<Page>,
    /// Total number of rows matching the query, across all pages.
    pub total: i64,
    /// The fetched rows.
    pub data: T,
}

impl<T> PageResponse<T> {
    /// Creates a new page response.
    pub fn new(page: Option<Page>, total: i64, data: T) -> Self {
        Self { page, total, data }
    }

    /// Maps the payload to a different type.
    pub fn map<U, F>(self, f: F) -> PageResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        PageResponse {
            page: self.page,
            total: self.total,
            data: f(self.data),
        }
    }

    /// Returns whether rows remain after this page.
    ///
    /// Without a page descriptor the whole result set was fetched.
    pub fn has_more(&self) -> bool {
        self.page
            .as_ref()
            .is_some_and(|page| page.has_more(self.total))
    }
}

impl<T> PageResponse<Vec<T>> {
    /// Maps every row to a different type.
    pub fn map_items<U, F>(self, f: F) -> PageResponse<Vec<U>>
    where
        F: FnMut(T) -> U,
    {
        self.map(|data| data.into_iter().map(f).collect())
    }
}
