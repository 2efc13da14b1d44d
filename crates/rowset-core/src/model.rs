//! Common columns shared by persisted records.
//!
//! Records embed [`Base`] (or [`EnableBase`] for soft-deletable tables) and
//! flatten it into their own serialized form.

use derive_more::{Deref, DerefMut};
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::time::Time;

/// Identity, audit timestamps and optimistic-lock counter of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Base {
    /// Primary key.
    pub id: i64,
    /// When the record was inserted.
    #[serde(default)]
    pub created_time: Time,
    /// When the record was last written.
    #[serde(default)]
    pub updated_time: Time,
    /// Optimistic-lock counter, bumped on every write.
    #[serde(default)]
    pub updated_seq: i64,
    /// Deployment region owning the record.
    #[serde(default)]
    pub region: String,
}

impl Base {
    /// Creates a base for a new record, stamping both timestamps.
    pub fn new(id: i64, region: impl Into<String>) -> Self {
        let now = Time::now_in_second();
        Self {
            id,
            created_time: now,
            updated_time: now,
            updated_seq: 0,
            region: region.into(),
        }
    }

    /// Stamps `updated_time` with the current second and bumps `updated_seq`.
    ///
    /// Returns the sequence number the stored row is expected to carry, for
    /// use in a `WHERE updated_seq = ?` guard.
    pub fn touch(&mut self) -> i64 {
        let expected = self.updated_seq;
        self.updated_time = Time::now_in_second();
        self.updated_seq = self.updated_seq.saturating_add(1);
        expected
    }
}

/// [`Base`] with a soft-delete flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Deref, DerefMut)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct EnableBase {
    /// Shared record columns.
    #[deref]
    #[deref_mut]
    #[serde(flatten)]
    pub base: Base,
    /// Whether the record has been soft-deleted.
    #[serde(default)]
    pub removed: bool,
}

impl EnableBase {
    /// Wraps `base` as a live record.
    pub fn new(base: Base) -> Self {
        Self {
            base,
            removed: false,
        }
    }

    /// Marks the record as removed and touches it.
    pub fn remove(&mut self) -> i64 {
        self.removed = true;
        self.base.touch()
    }

    /// Clears the removed flag and touches the record.
    pub fn restore(&mut self) -> i64 {
        self.removed = false;
        self.base.touch()
    }
}

impl From<Base> for EnableBase {
    fn from(base: Base) -> Self {
        Self::new(base)
    }
}
