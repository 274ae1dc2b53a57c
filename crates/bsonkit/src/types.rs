//! Small value types shared by the borrowed and owned value models.

use alloc::{string::String, vec::Vec};
use core::fmt;

use chrono::{SecondsFormat, Utc};

use crate::{bson::Document, oid::ObjectId, spec::BinarySubtype};

/// Milliseconds since the Unix epoch, as stored on the wire.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DateTime(i64);

impl DateTime {
    pub const UNIX_EPOCH: Self = Self(0);

    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn to_chrono(self) -> Option<chrono::DateTime<Utc>> {
        chrono::DateTime::from_timestamp_millis(self.0)
    }

    /// RFC 3339 form with millisecond precision and a `Z` suffix, or `None`
    /// when the instant is outside chrono's range.
    #[must_use]
    pub fn try_to_rfc3339(self) -> Option<String> {
        self.to_chrono()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Parses an RFC 3339 / ISO-8601 timestamp with an explicit offset.
    #[must_use]
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Self(dt.timestamp_millis()))
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(dt: chrono::DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_to_rfc3339() {
            Some(s) => write!(f, "DateTime({s})"),
            None => write!(f, "DateTime({}ms)", self.0),
        }
    }
}

/// Internal replication timestamp: seconds plus an ordinal within the second.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Timestamp {
    pub time: u32,
    pub increment: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    pub subtype: BinarySubtype,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Regex {
    pub pattern: String,
    /// Option flags; stored sorted when built through [`Regex::new`].
    pub options: String,
}

impl Regex {
    /// Creates a regex with its option characters sorted, which is the form
    /// the server expects.
    #[must_use]
    pub fn new(pattern: impl Into<String>, options: &str) -> Self {
        let mut chars: Vec<char> = options.chars().collect();
        chars.sort_unstable();
        Self {
            pattern: pattern.into(),
            options: chars.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPointer {
    pub namespace: String,
    pub id: ObjectId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptCodeWithScope {
    pub code: String,
    pub scope: Document,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_round_trip() {
        let dt = DateTime::from_millis(1_356_351_330_501);
        let s = dt.try_to_rfc3339().unwrap();
        assert_eq!(s, "2012-12-24T12:15:30.501Z");
        assert_eq!(DateTime::parse_rfc3339(&s), Some(dt));
        assert_eq!(
            DateTime::parse_rfc3339("2012-12-24T13:15:30.501+01:00"),
            Some(dt)
        );
    }

    #[test]
    fn regex_options_are_sorted() {
        assert_eq!(Regex::new("^a", "xim").options, "imx");
    }
}
