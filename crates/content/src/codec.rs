//! Attribute codec - conversions between typed values and the string-only
//! attribute storage of the host repository
//!
//! The storage layer cannot tell an absent attribute from an empty one, so
//! both decode to [`AttributeValue::Null`] whatever the declared kind.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::value::{parse_number, AttributeValue};

/// Storage format for datetime attributes (`2024-05-01T09:00:00+00:00`)
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Values accepted as `true` when encoding or decoding a bool attribute
const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];

/// Declared kind of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Int,
    Bool,
    DateTime,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::String => write!(f, "string"),
            AttributeKind::Int => write!(f, "int"),
            AttributeKind::Bool => write!(f, "bool"),
            AttributeKind::DateTime => write!(f, "datetime"),
        }
    }
}

impl FromStr for AttributeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(AttributeKind::String),
            "int" | "integer" => Ok(AttributeKind::Int),
            "bool" | "boolean" => Ok(AttributeKind::Bool),
            "datetime" => Ok(AttributeKind::DateTime),
            _ => Err(format!("Unsupported attribute kind: {}", s)),
        }
    }
}

/// Encode a typed value for storage
///
/// Returns `None` for [`AttributeValue::Null`]; callers persist that as an
/// attribute deletion.
pub fn encode(value: &AttributeValue, kind: AttributeKind) -> Option<String> {
    if value.is_null() {
        return None;
    }

    let encoded = match kind {
        AttributeKind::String => value.to_string(),
        AttributeKind::Int => int_cast(value).to_string(),
        AttributeKind::Bool => {
            if is_truthy_member(value) {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        AttributeKind::DateTime => match value {
            AttributeValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            AttributeValue::Int(i) => i.to_string(),
            AttributeValue::String(s) => match parse_number(s) {
                Some(n) => (n as i64).to_string(),
                None => s.clone(),
            },
            other => other.to_string(),
        },
    };

    Some(encoded)
}

/// Decode a stored value into its declared kind
///
/// Never fails: an unparseable datetime decodes to `Null`.
pub fn decode(raw: Option<&str>, kind: AttributeKind) -> AttributeValue {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return AttributeValue::Null,
    };

    match kind {
        AttributeKind::String => AttributeValue::String(raw.to_string()),
        AttributeKind::Int => AttributeValue::Int(int_cast_str(raw)),
        AttributeKind::Bool => AttributeValue::Bool(TRUTHY.contains(&raw)),
        AttributeKind::DateTime => parse_datetime(raw)
            .map(AttributeValue::DateTime)
            .unwrap_or(AttributeValue::Null),
    }
}

fn is_truthy_member(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::Bool(b) => *b,
        AttributeValue::Int(i) => *i == 1,
        AttributeValue::String(s) => TRUTHY.contains(&s.as_str()),
        _ => false,
    }
}

fn int_cast(value: &AttributeValue) -> i64 {
    match value {
        AttributeValue::String(s) => int_cast_str(s),
        other => other.to_int().unwrap_or(0),
    }
}

/// Lenient integer cast: numeric strings truncate, otherwise the leading
/// integer prefix is used, otherwise 0
fn int_cast_str(raw: &str) -> i64 {
    if let Some(n) = parse_number(raw) {
        return n as i64;
    }

    let trimmed = raw.trim_start();
    let mut end = 0;

    for (index, c) in trimmed.char_indices() {
        if c.is_ascii_digit() || (index == 0 && (c == '-' || c == '+')) {
            end = index + c.len_utf8();
        } else {
            break;
        }
    }

    trimmed[..end].parse::<i64>().unwrap_or(0)
}

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Some(seconds) = parse_number(raw) {
        return Utc
            .timestamp_opt(seconds as i64, 0)
            .single()
            .map(|dt| dt.into());
    }

    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt);
    }

    // Offset-less forms are read as UTC
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive).into());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive).into());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    #[test]
    fn test_kind_names() {
        assert_eq!("datetime".parse::<AttributeKind>().unwrap(), AttributeKind::DateTime);
        assert_eq!("INT".parse::<AttributeKind>().unwrap(), AttributeKind::Int);
        assert_eq!(AttributeKind::Bool.to_string(), "bool");
        assert!("float".parse::<AttributeKind>().is_err());
    }

    #[test]
    fn test_round_trips() {
        let cases = [
            (AttributeValue::from("9780000000001"), AttributeKind::String),
            (AttributeValue::Int(42), AttributeKind::Int),
            (AttributeValue::Int(-3), AttributeKind::Int),
            (AttributeValue::Bool(true), AttributeKind::Bool),
            (AttributeValue::Bool(false), AttributeKind::Bool),
            (AttributeValue::DateTime(dt("2024-05-01T09:00:00+00:00")), AttributeKind::DateTime),
            (AttributeValue::DateTime(dt("2024-05-01T09:00:00+02:00")), AttributeKind::DateTime),
        ];

        for (value, kind) in cases {
            let encoded = encode(&value, kind);
            assert_eq!(decode(encoded.as_deref(), kind), value, "kind {}", kind);
        }
    }

    #[test]
    fn test_bool_truthy_set_collapses() {
        for truthy in [
            AttributeValue::from("1"),
            AttributeValue::Int(1),
            AttributeValue::Bool(true),
            AttributeValue::from("true"),
            AttributeValue::from("yes"),
            AttributeValue::from("on"),
        ] {
            assert_eq!(encode(&truthy, AttributeKind::Bool).as_deref(), Some("1"));
        }

        for falsy in [
            AttributeValue::from("0"),
            AttributeValue::Int(2),
            AttributeValue::from("TRUE"),
            AttributeValue::from("no"),
        ] {
            assert_eq!(encode(&falsy, AttributeKind::Bool).as_deref(), Some("0"));
        }

        assert_eq!(decode(Some("yes"), AttributeKind::Bool), AttributeValue::Bool(true));
        assert_eq!(decode(Some("0"), AttributeKind::Bool), AttributeValue::Bool(false));
    }

    #[test]
    fn test_empty_and_absent_decode_to_null() {
        for kind in [
            AttributeKind::String,
            AttributeKind::Int,
            AttributeKind::Bool,
            AttributeKind::DateTime,
        ] {
            assert_eq!(decode(None, kind), AttributeValue::Null);
            assert_eq!(decode(Some(""), kind), AttributeValue::Null);
        }
    }

    #[test]
    fn test_null_encodes_to_none() {
        assert_eq!(encode(&AttributeValue::Null, AttributeKind::String), None);
    }

    #[test]
    fn test_int_cast_is_lenient() {
        assert_eq!(decode(Some("12abc"), AttributeKind::Int), AttributeValue::Int(12));
        assert_eq!(decode(Some("abc"), AttributeKind::Int), AttributeValue::Int(0));
        assert_eq!(decode(Some("1.9"), AttributeKind::Int), AttributeValue::Int(1));
        assert_eq!(encode(&AttributeValue::from("7"), AttributeKind::Int).as_deref(), Some("7"));
        assert_eq!(encode(&AttributeValue::Bool(true), AttributeKind::Int).as_deref(), Some("1"));
    }

    #[test]
    fn test_datetime_encoding() {
        let value = AttributeValue::DateTime(dt("2024-05-01T09:00:00+00:00"));
        assert_eq!(
            encode(&value, AttributeKind::DateTime).as_deref(),
            Some("2024-05-01T09:00:00+00:00")
        );

        assert_eq!(
            encode(&AttributeValue::Int(1714554000), AttributeKind::DateTime).as_deref(),
            Some("1714554000")
        );
        assert_eq!(
            encode(&AttributeValue::from("1714554000.7"), AttributeKind::DateTime).as_deref(),
            Some("1714554000")
        );
        assert_eq!(
            encode(&AttributeValue::from("next tuesday"), AttributeKind::DateTime).as_deref(),
            Some("next tuesday")
        );
    }

    #[test]
    fn test_datetime_decoding() {
        assert_eq!(
            decode(Some("1714554000"), AttributeKind::DateTime),
            AttributeValue::DateTime(dt("2024-05-01T09:00:00+00:00"))
        );
        assert_eq!(
            decode(Some("2024-05-01 09:00:00"), AttributeKind::DateTime),
            AttributeValue::DateTime(dt("2024-05-01T09:00:00+00:00"))
        );
        assert_eq!(
            decode(Some("2024-05-01"), AttributeKind::DateTime),
            AttributeValue::DateTime(dt("2024-05-01T00:00:00+00:00"))
        );
        assert_eq!(decode(Some("not a date"), AttributeKind::DateTime), AttributeValue::Null);
    }

    #[test]
    fn test_offsetless_iso_forms_decode_as_utc() {
        let nine = AttributeValue::DateTime(dt("2024-05-01T09:00:00+00:00"));

        for raw in [
            "2024-05-01T09:00:00",
            "2024-05-01T09:00",
            "2024-05-01 09:00",
            "2024-05-01T09:00:00.000",
        ] {
            assert_eq!(decode(Some(raw), AttributeKind::DateTime), nine, "decoding {}", raw);
        }

        assert_eq!(
            decode(Some("2024-05-01T09:00:00.250"), AttributeKind::DateTime),
            AttributeValue::DateTime(dt("2024-05-01T09:00:00.250+00:00"))
        );
    }
}
