use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};
use sqlx::{
    Decode, Type,
    error::BoxDynError,
    sqlite::{Sqlite, SqliteTypeInfo, SqliteValueRef},
};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The wire format for every date exchanged with clients.
pub const SIMPLE_DATE_FORMAT: &str = "%Y-%m-%d";

/// DateFormatError
///
/// Raised when a non-empty date string does not match `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date {input:?}: expected YYYY-MM-DD")]
pub struct DateFormatError {
    pub input: String,
}

/// SimpleDate
///
/// A calendar date without time or zone, exchanged as `"YYYY-MM-DD"`.
///
/// Empty input and `null` decode to the zero date (`0001-01-01`) instead of failing,
/// which leaves "was a birthday supplied?" to the binding layer (see `is_zero`).
/// The zero date encodes back as `"0001-01-01"`, so encode/decode is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimpleDate(NaiveDate);

impl SimpleDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// 0001-01-01, the value produced by empty or null input.
    pub fn zero() -> Self {
        Self(NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Midnight UTC on this date. This is the value bound as a store parameter.
    pub fn to_date_time(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }
}

impl Default for SimpleDate {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<NaiveDate> for SimpleDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<DateTime<Utc>> for SimpleDate {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp.date_naive())
    }
}

impl FromStr for SimpleDate {
    type Err = DateFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::zero());
        }
        NaiveDate::parse_from_str(trimmed, SIMPLE_DATE_FORMAT)
            .map(Self)
            .map_err(|_| DateFormatError {
                input: s.to_string(),
            })
    }
}

impl fmt::Display for SimpleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SIMPLE_DATE_FORMAT))
    }
}

impl Serialize for SimpleDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct SimpleDateVisitor;

impl<'de> Visitor<'de> for SimpleDateVisitor {
    type Value = SimpleDate;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a date string in YYYY-MM-DD form, an empty string or null")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value.parse::<SimpleDate>().map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(SimpleDate::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(SimpleDate::zero())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

// `deserialize_any` lets the same impl read JSON values and urlencoded form fields.
impl<'de> Deserialize<'de> for SimpleDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SimpleDateVisitor)
    }
}

// --- Store Mapping ---

// Birthdays are written as midnight-UTC timestamps; reading one back keeps the date part.
impl Type<Sqlite> for SimpleDate {
    fn type_info() -> SqliteTypeInfo {
        <DateTime<Utc> as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <DateTime<Utc> as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for SimpleDate {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let timestamp = <DateTime<Utc> as Decode<'r, Sqlite>>::decode(value)?;
        Ok(Self::from(timestamp))
    }
}
