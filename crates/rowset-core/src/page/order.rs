#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Sort order direction.
///
/// The textual forms are exactly `ASC` and `DESC`; parsing is case-sensitive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending order (A-Z, oldest first, smallest first).
    Asc,
    /// Descending order (Z-A, newest first, largest first).
    #[default]
    Desc,
}

impl SortOrder {
    /// Returns the SQL keyword for this direction.
    #[inline]
    pub fn as_sql(self) -> &'static str {
        self.into()
    }

    /// Returns whether the sort order is ascending.
    #[inline]
    pub fn is_asc(self) -> bool {
        matches!(self, Self::Asc)
    }

    /// Returns whether the sort order is descending.
    #[inline]
    pub fn is_desc(self) -> bool {
        matches!(self, Self::Desc)
    }
}
