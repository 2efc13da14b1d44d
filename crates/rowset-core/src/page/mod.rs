//! Page descriptors and paged responses.
//!
//! A [`Page`] is parsed from request parameters, validated, applied to a
//! query by the pager and finally echoed back inside a [`PageResponse`].

mod descriptor;
mod order;
mod response;

pub use descriptor::{DEFAULT_PAGE_SIZE, Page};
pub use order::SortOrder;
pub use response::PageResponse;
