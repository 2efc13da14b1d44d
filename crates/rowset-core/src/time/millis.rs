use std::fmt;
use std::str::FromStr;

use derive_more::{Deref, DerefMut, From, Into};
use jiff::Timestamp;
use jiff::tz::TimeZone;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{FORMAT, NULL, Time};
use crate::{Error, Result};

/// A [`Time`] whose wire format carries milliseconds.
///
/// Encodes as `"YYYY-MM-DD HH:MM:SS.sss"` with trailing zeros of the fraction
/// trimmed (the dot is dropped entirely on a whole second). Validity and the
/// epoch guard are those of the wrapped [`Time`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Deref, DerefMut, From, Into)]
pub struct TimeMs(Time);

impl TimeMs {
    /// Creates an absent value.
    #[inline]
    pub const fn null() -> Self {
        Self(Time::null())
    }

    /// Creates a value from an instant, subject to the epoch guard.
    pub fn from_timestamp(timestamp: Timestamp) -> Self {
        Self(Time::from_timestamp(timestamp))
    }

    /// Returns the current instant.
    pub fn now() -> Self {
        Self(Time::now())
    }

    /// Returns the wrapped second-granularity value.
    #[inline]
    pub fn into_inner(self) -> Time {
        self.0
    }

    /// Encodes the value in the millisecond wire format.
    ///
    /// Returns `None` for an absent value.
    pub fn encode(&self) -> Option<String> {
        self.0.timestamp().map(|ts| {
            let zoned = ts.to_zoned(TimeZone::system());
            let mut text = zoned.strftime(FORMAT).to_string();
            let millis = zoned.millisecond();
            if millis != 0 {
                let fraction = format!("{millis:03}");
                text.push('.');
                text.push_str(fraction.trim_end_matches('0'));
            }
            text
        })
    }

    /// Decodes wire text, see [`Time::decode`].
    pub fn decode(input: &str) -> Result<Self> {
        Time::decode(input).map(Self)
    }
}

impl fmt::Display for TimeMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Some(text) => f.write_str(&text),
            None => f.write_str(NULL),
        }
    }
}

impl FromStr for TimeMs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl Serialize for TimeMs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.encode() {
            Some(text) => serializer.serialize_str(&text),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for TimeMs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Time::deserialize(deserializer).map(Self)
    }
}

#[cfg(feature = "schema")]
impl schemars::JsonSchema for TimeMs {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "TimeMs".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": ["string", "null"],
            "description": "Local time as YYYY-MM-DD HH:MM:SS.sss, or RFC 3339 on input",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_millis(millis: i64) -> TimeMs {
        TimeMs::from_timestamp(Timestamp::from_millisecond(millis).unwrap())
    }

    #[test]
    fn fraction_is_trimmed() {
        let base = 1_700_000_000_000;
        let whole = at_millis(base).to_string();
        assert_eq!(whole.len(), "2023-11-14 22:13:20".len());
        assert!(!whole.contains('.'));

        assert!(at_millis(base + 500).to_string().ends_with(".5"));
        assert!(at_millis(base + 120).to_string().ends_with(".12"));
        assert!(at_millis(base + 7).to_string().ends_with(".007"));
    }

    #[test]
    fn round_trip_keeps_milliseconds() {
        let original = at_millis(1_700_000_000_789);
        let json = serde_json::to_string(&original).unwrap();
        let decoded: TimeMs = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.unix_milli(), 1_700_000_000_789);
        assert_eq!(decoded, original);
    }

    #[test]
    fn accepts_whole_seconds_and_rfc3339() {
        let decoded = TimeMs::decode("2024-03-01T12:00:00.250Z").unwrap();
        assert_eq!(decoded.unix_milli(), 1_709_294_400_250);

        let plain = TimeMs::decode(&Time::decode("2024-03-01T12:00:00Z").unwrap().to_string())
            .unwrap();
        assert_eq!(plain.unix(), 1_709_294_400);
    }

    #[test]
    fn null_handling_matches_time() {
        assert_eq!(serde_json::to_string(&TimeMs::null()).unwrap(), "null");
        let decoded: TimeMs = serde_json::from_str("null").unwrap();
        assert!(!decoded.is_valid());
        assert_eq!(decoded.unix_nano(), 0);
    }

    #[test]
    fn converts_to_and_from_time() {
        let time = Time::decode("2024-03-01T12:00:00Z").unwrap();
        let millis = TimeMs::from(time);
        assert_eq!(millis.into_inner(), time);
        assert_eq!(Time::from(millis), time);
    }
}
