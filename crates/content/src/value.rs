//! Typed attribute values held by a [`Model`](crate::model::Model)

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// A typed attribute value
///
/// `Null` is an explicit value: an attribute set to `Null` is present in the
/// attribute map (and so may be dirty) but persists as an attribute deletion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    DateTime(DateTime<FixedOffset>),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            AttributeValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Lenient integer view: ints as-is, numeric strings parsed, bools as 0/1
    pub fn to_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            AttributeValue::Bool(b) => Some(i64::from(*b)),
            AttributeValue::String(s) => parse_number(s).map(|n| n as i64),
            AttributeValue::DateTime(dt) => Some(dt.timestamp()),
            AttributeValue::Null => None,
        }
    }

    /// Unsigned id form; decimal strings above `i64::MAX` are accepted
    pub fn to_u64(&self) -> Option<u64> {
        match self {
            AttributeValue::String(s) => match s.trim().parse::<u64>() {
                Ok(id) => Some(id),
                Err(_) => self.to_int().and_then(|i| u64::try_from(i).ok()),
            },
            other => other.to_int().and_then(|i| u64::try_from(i).ok()),
        }
    }

    /// Truthiness as the host understands it: `null`, `false`, `0`, `""` and `"0"` are false
    pub fn is_truthy(&self) -> bool {
        match self {
            AttributeValue::Null => false,
            AttributeValue::Bool(b) => *b,
            AttributeValue::Int(i) => *i != 0,
            AttributeValue::String(s) => !(s.is_empty() || s == "0"),
            AttributeValue::DateTime(_) => true,
        }
    }

    /// Loose comparison used for dirty checking
    ///
    /// Values of the same variant compare strictly. Across variants, a numeric
    /// string equals the number it spells, a bool equals any value of the same
    /// truthiness, and `Null` equals the empty string, `0` and `false`.
    /// Timestamps compare by instant and never equal a non-timestamp.
    pub fn loosely_eq(&self, other: &AttributeValue) -> bool {
        use AttributeValue as V;

        match (self, other) {
            (V::Null, V::Null) => true,
            (V::Bool(a), b) | (b, V::Bool(a)) => *a == b.is_truthy(),
            (V::Null, V::String(s)) | (V::String(s), V::Null) => s.is_empty(),
            (V::Null, V::Int(i)) | (V::Int(i), V::Null) => *i == 0,
            (V::Int(a), V::Int(b)) => a == b,
            (V::Int(a), V::String(s)) | (V::String(s), V::Int(a)) => match parse_number(s) {
                Some(n) => n == *a as f64,
                None => a.to_string() == *s,
            },
            (V::String(a), V::String(b)) => match (parse_number(a), parse_number(b)) {
                (Some(x), Some(y)) => x == y,
                _ => a == b,
            },
            (V::DateTime(a), V::DateTime(b)) => a == b,
            (V::DateTime(_), _) | (_, V::DateTime(_)) => false,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            AttributeValue::Null => JsonValue::Null,
            AttributeValue::Bool(b) => JsonValue::Bool(*b),
            AttributeValue::Int(i) => JsonValue::from(*i),
            AttributeValue::String(s) => JsonValue::String(s.clone()),
            AttributeValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
        }
    }
}

/// Numeric-string test in the host's sense: optional surrounding whitespace,
/// sign, digits, fraction and exponent
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();

    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }

    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(true) => write!(f, "1"),
            AttributeValue::Bool(false) => Ok(()),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(i64::from(value))
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Int(i64::from(value))
    }
}

/// Values past `i64::MAX` are kept as their decimal string
impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => AttributeValue::Int(value),
            Err(_) => AttributeValue::String(value.to_string()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<DateTime<FixedOffset>> for AttributeValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        AttributeValue::DateTime(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::DateTime(value.into())
    }
}

impl From<NaiveDateTime> for AttributeValue {
    fn from(value: NaiveDateTime) -> Self {
        AttributeValue::DateTime(Utc.from_utc_datetime(&value).into())
    }
}

impl From<NaiveDate> for AttributeValue {
    fn from(value: NaiveDate) -> Self {
        AttributeValue::from(value.and_hms_opt(0, 0, 0).unwrap_or_default())
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

impl From<JsonValue> for AttributeValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => AttributeValue::Null,
            JsonValue::Bool(b) => AttributeValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Int(i),
                None => AttributeValue::String(n.to_string()),
            },
            JsonValue::String(s) => AttributeValue::String(s),
            other => AttributeValue::String(other.to_string()),
        }
    }
}

impl From<&JsonValue> for AttributeValue {
    fn from(value: &JsonValue) -> Self {
        AttributeValue::from(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_string_loosely_equals_int() {
        assert!(AttributeValue::from("7").loosely_eq(&AttributeValue::Int(7)));
        assert!(AttributeValue::Int(7).loosely_eq(&AttributeValue::from("7.0")));
        assert!(!AttributeValue::Int(7).loosely_eq(&AttributeValue::from("8")));
        assert!(!AttributeValue::Int(7).loosely_eq(&AttributeValue::from("seven")));
    }

    #[test]
    fn test_bool_compares_by_truthiness() {
        assert!(AttributeValue::Bool(true).loosely_eq(&AttributeValue::from("1")));
        assert!(AttributeValue::Bool(false).loosely_eq(&AttributeValue::from("0")));
        assert!(AttributeValue::Bool(false).loosely_eq(&AttributeValue::Null));
        assert!(!AttributeValue::Bool(true).loosely_eq(&AttributeValue::from("")));
    }

    #[test]
    fn test_null_loosely_equals_empty_values() {
        assert!(AttributeValue::Null.loosely_eq(&AttributeValue::from("")));
        assert!(AttributeValue::Null.loosely_eq(&AttributeValue::Int(0)));
        assert!(!AttributeValue::Null.loosely_eq(&AttributeValue::from("x")));
    }

    #[test]
    fn test_datetimes_compare_by_instant() {
        let utc = DateTime::parse_from_rfc3339("2024-05-01T09:00:00+00:00").unwrap();
        let shifted = DateTime::parse_from_rfc3339("2024-05-01T11:00:00+02:00").unwrap();

        assert!(AttributeValue::from(utc).loosely_eq(&AttributeValue::from(shifted)));
        assert!(!AttributeValue::from(utc).loosely_eq(&AttributeValue::from("2024-05-01T09:00:00+00:00")));
    }

    #[test]
    fn test_large_unsigned_ids_survive_conversion() {
        let big = u64::MAX - 1;

        assert_eq!(AttributeValue::from(42u64), AttributeValue::Int(42));
        assert_eq!(AttributeValue::from(big), AttributeValue::String(big.to_string()));
        assert_eq!(AttributeValue::from(big).to_u64(), Some(big));
        assert_eq!(AttributeValue::Int(-1).to_u64(), None);
        assert_eq!(AttributeValue::from("17").to_u64(), Some(17));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(AttributeValue::from(json!(5)), AttributeValue::Int(5));
        assert_eq!(AttributeValue::from(json!("x")), AttributeValue::from("x"));
        assert_eq!(AttributeValue::from(json!(null)), AttributeValue::Null);
        assert_eq!(AttributeValue::from(json!(true)), AttributeValue::Bool(true));
        assert_eq!(AttributeValue::from(Some(3)), AttributeValue::Int(3));
        assert_eq!(AttributeValue::from(None::<i64>), AttributeValue::Null);
    }

    #[test]
    fn test_to_int_is_lenient() {
        assert_eq!(AttributeValue::from("42").to_int(), Some(42));
        assert_eq!(AttributeValue::Bool(true).to_int(), Some(1));
        assert_eq!(AttributeValue::from("abc").to_int(), None);
        assert_eq!(AttributeValue::Null.to_int(), None);
    }
}
