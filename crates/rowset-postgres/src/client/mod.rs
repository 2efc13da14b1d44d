//! Connection configuration and the borrowed connection executor.

mod pg_config;
mod pg_conn;

pub use self::pg_config::PgConfig;
pub use self::pg_conn::PgConn;
