use std::fmt;

use derive_more::{Deref, DerefMut};
use diesel_async::AsyncPgConnection;

/// A connection supplied by the caller, borrowed for the duration of the
/// work run through it.
///
/// The connection may come from anywhere: [`PgConfig::establish`], a pool
/// the application already runs, or a test harness. Implements the executor
/// traits so it can be handed directly to the pager; see [`PgConn::begin`]
/// for transactional work.
///
/// [`PgConfig::establish`]: crate::PgConfig::establish
#[derive(Deref, DerefMut)]
#[deref(forward)]
#[deref_mut(forward)]
pub struct PgConn<'c> {
    conn: &'c mut AsyncPgConnection,
}

impl<'c> PgConn<'c> {
    /// Borrows a driver connection.
    pub fn new(conn: &'c mut AsyncPgConnection) -> Self {
        Self { conn }
    }

    /// Returns the underlying driver connection.
    #[inline]
    pub(crate) fn connection(&mut self) -> &mut AsyncPgConnection {
        &mut *self.conn
    }
}

impl<'c> From<&'c mut AsyncPgConnection> for PgConn<'c> {
    fn from(conn: &'c mut AsyncPgConnection) -> Self {
        Self::new(conn)
    }
}

impl fmt::Debug for PgConn<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConn").finish_non_exhaustive()
    }
}
