//! Prelude module for rowset-core.
//!
//! Re-exports the page descriptor, the pager, the timestamp codecs and the
//! transaction handler so a repository module needs a single `use`.

// Scoped futures for building units of work
pub use diesel_async::scoped_futures::ScopedFutureExt;

pub use crate::model::{Base, EnableBase};
pub use crate::page::{DEFAULT_PAGE_SIZE, Page, PageResponse, SortOrder};
pub use crate::pager::{fetch_page, load_page, load_page_response, load_page_response_with_count};
pub use crate::query::{Bind, PageableQuery, SelectQuery, SqlStatement};
pub use crate::time::{Time, TimeMs};
pub use crate::tx::TxHandler;
pub use crate::{Error, FetchAll, Result, SqlExecutor, Transaction};
