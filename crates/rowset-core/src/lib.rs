#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for page descriptor parsing and validation.
pub const TRACING_TARGET_PAGINATION: &str = "rowset_core::pagination";

/// Tracing target for count and fetch statements issued by the pager.
pub const TRACING_TARGET_QUERY: &str = "rowset_core::query";

/// Tracing target for commit and rollback decisions.
pub const TRACING_TARGET_TRANSACTION: &str = "rowset_core::transaction";

mod error;
mod executor;
mod pager;
mod tx;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod model;
pub mod page;
pub mod prelude;
pub mod query;
pub mod time;

pub use crate::error::{BoxedError, Error, Result};
pub use crate::executor::{FetchAll, SqlExecutor, Transaction};
pub use crate::page::{DEFAULT_PAGE_SIZE, Page, PageResponse, SortOrder};
pub use crate::pager::{fetch_page, load_page, load_page_response, load_page_response_with_count};
pub use crate::query::{Bind, PageableQuery, SelectQuery, SqlStatement};
pub use crate::time::{Time, TimeMs};
pub use crate::tx::{TxHandler, UnitOfWork};
