//! Prelude module for rowset-postgres.
//!
//! Re-exports the connection wrapper, its errors and the core pagination and
//! transaction API, so repository code needs a single `use`.
//!
//! # Example
//!
//! ```rust,no_run
//! use rowset_postgres::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let mut connection = PgConfig::new("postgresql://localhost/app").establish().await?;
//! let mut conn = PgConn::new(&mut connection);
//! let query = SelectQuery::table("items").columns(["id"]);
//! let total = query.count(&mut conn).await?;
//! # Ok(())
//! # }
//! ```

pub use diesel::prelude::*;
pub use diesel_async::RunQueryDsl;
pub use rowset_core::prelude::*;

pub use crate::{PgConfig, PgConn, PgError, PgResult, PgTransaction};
