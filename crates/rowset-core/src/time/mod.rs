//! Nullable timestamps with a fixed textual wire format.
//!
//! [`Time`] encodes as `"YYYY-MM-DD HH:MM:SS"` and [`TimeMs`] as
//! `"YYYY-MM-DD HH:MM:SS.sss"`, both in the system time zone. An absent value
//! encodes as JSON `null`. Decoding tries the fixed layout first and falls
//! back to RFC 3339.

mod millis;

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use self::millis::TimeMs;
use crate::{Error, Result};

/// Layout of the second-granularity wire format.
pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Text that encodes an absent value.
pub const NULL: &str = "null";

/// Parse layout; accepts an optional fractional part for both variants.
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Fallback layout with a numeric offset; a trailing `Z` is rewritten first.
const RFC3339_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// A timestamp that may be absent.
///
/// Instants at or before the Unix epoch are never stored: [`Time::set_valid`]
/// ignores them so that zero or negative sentinels read from storage do not
/// turn into valid timestamps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Time {
    value: Option<Timestamp>,
}

impl Time {
    /// Creates an absent value.
    #[inline]
    pub const fn null() -> Self {
        Self { value: None }
    }

    /// Creates a value from an instant, subject to the epoch guard.
    pub fn from_timestamp(timestamp: Timestamp) -> Self {
        let mut time = Self::null();
        time.set_valid(timestamp);
        time
    }

    /// Returns the current instant.
    pub fn now() -> Self {
        Self::from_timestamp(Timestamp::now())
    }

    /// Returns the current instant truncated to whole seconds.
    pub fn now_in_second() -> Self {
        let now = Timestamp::now();
        Timestamp::from_second(now.as_second())
            .map(Self::from_timestamp)
            .unwrap_or_default()
    }

    /// Stores `timestamp` unless its Unix seconds are zero or negative,
    /// in which case the current state is left untouched.
    pub fn set_valid(&mut self, timestamp: Timestamp) {
        if timestamp.as_second() <= 0 {
            return;
        }
        self.value = Some(timestamp);
    }

    /// Marks the value as absent.
    #[inline]
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Returns whether an instant is stored.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    /// Returns the stored instant.
    #[inline]
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.value
    }

    /// Returns the number of seconds since the Unix epoch, or 0 when absent.
    pub fn unix(&self) -> i64 {
        self.value.map_or(0, |ts| ts.as_second())
    }

    /// Returns the number of milliseconds since the Unix epoch, or 0 when absent.
    pub fn unix_milli(&self) -> i64 {
        self.value.map_or(0, |ts| ts.as_millisecond())
    }

    /// Returns the number of nanoseconds since the Unix epoch, or 0 when absent.
    pub fn unix_nano(&self) -> i64 {
        self.value
            .map_or(0, |ts| i64::try_from(ts.as_nanosecond()).unwrap_or(i64::MAX))
    }

    /// Encodes the value in the second-granularity wire format.
    ///
    /// Returns `None` for an absent value.
    pub fn encode(&self) -> Option<String> {
        self.value.map(|ts| {
            ts.to_zoned(TimeZone::system())
                .strftime(FORMAT)
                .to_string()
        })
    }

    /// Decodes wire text.
    ///
    /// `null` and the empty string decode to an absent value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTimestamp`] when the text matches neither the
    /// fixed layout nor RFC 3339.
    pub fn decode(input: &str) -> Result<Self> {
        if input.is_empty() || input == NULL {
            return Ok(Self::null());
        }
        parse(input).map(Self::from_timestamp)
    }
}

/// Parses the fixed layout in the system time zone, then RFC 3339.
pub(crate) fn parse(input: &str) -> Result<Timestamp> {
    let local = DateTime::strptime(PARSE_FORMAT, input)
        .and_then(|datetime| datetime.to_zoned(TimeZone::system()))
        .map(|zoned| zoned.timestamp());

    match local {
        Ok(timestamp) => Ok(timestamp),
        Err(_) => parse_rfc3339(input).map_err(|source| Error::MalformedTimestamp {
            input: input.to_owned(),
            source,
        }),
    }
}

/// Accepts only the RFC 3339 `date-time` production: a `T` separator,
/// seconds, and either `Z` or a `+hh:mm` offset.
fn parse_rfc3339(input: &str) -> std::result::Result<Timestamp, jiff::Error> {
    match input.strip_suffix(['Z', 'z']) {
        Some(rest) => Timestamp::strptime(RFC3339_FORMAT, format!("{rest}+00:00")),
        None => Timestamp::strptime(RFC3339_FORMAT, input),
    }
}

impl From<Timestamp> for Time {
    fn from(timestamp: Timestamp) -> Self {
        Self::from_timestamp(timestamp)
    }
}

impl From<Option<Timestamp>> for Time {
    /// Mirrors a nullable column scan: `None` is absent, `Some` goes through
    /// the epoch guard.
    fn from(value: Option<Timestamp>) -> Self {
        value.map(Self::from_timestamp).unwrap_or_default()
    }
}

impl From<Time> for Option<Timestamp> {
    fn from(time: Time) -> Self {
        time.value
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Some(text) => f.write_str(&text),
            None => f.write_str(NULL),
        }
    }
}

impl FromStr for Time {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl Serialize for Time {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.encode() {
            Some(text) => serializer.serialize_str(&text),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only JSON null and the empty string are absent; the text "null"
        // is not a timestamp.
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Self::null()),
            Some(text) if text.is_empty() => Ok(Self::null()),
            Some(text) => parse(&text)
                .map(Self::from_timestamp)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(feature = "schema")]
impl schemars::JsonSchema for Time {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "Time".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": ["string", "null"],
            "description": "Local time as YYYY-MM-DD HH:MM:SS, or RFC 3339 on input",
        })
    }
}
