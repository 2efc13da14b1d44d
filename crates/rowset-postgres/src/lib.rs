#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for database connection operations.
///
/// Use this target for logging connection establishment and connection errors.
pub const TRACING_TARGET_CONNECTION: &str = "rowset_postgres::connection";

/// Tracing target for statements and transactions run by the executor.
pub const TRACING_TARGET_QUERY: &str = "rowset_postgres::queries";

mod client;
mod error;
mod executor;
pub mod prelude;

pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{PgConfig, PgConn};
pub use crate::error::{BoxError, PgError, PgResult};
pub use crate::executor::PgTransaction;
