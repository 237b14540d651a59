//! Core Repository Traits
//!
//! The host content repository stores two kinds of data: content records
//! (type, title, slug, status, body, excerpt) and string attributes keyed by
//! record id. Everything the model layer does is expressed through the
//! [`Repository`] trait below; adapters translate it to a concrete host.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::codec::DATETIME_FORMAT;
use crate::error::RepositoryError;
use crate::value::AttributeValue;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Host field name to value, as passed to insert and update
pub type RecordFields = BTreeMap<String, String>;

/// Host record field names
pub mod fields {
    pub const RECORD_TYPE: &str = "record_type";
    pub const TITLE: &str = "title";
    pub const SLUG: &str = "slug";
    pub const STATUS: &str = "status";
    pub const BODY: &str = "body";
    pub const EXCERPT: &str = "excerpt";
}

/// A content record as stored by the host
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub record_type: String,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub body: String,
    pub excerpt: String,
}

impl Record {
    pub fn new(id: u64, record_type: impl Into<String>) -> Self {
        Self {
            id,
            record_type: record_type.into(),
            ..Self::default()
        }
    }

    /// Read a field by host field name
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::RECORD_TYPE => Some(&self.record_type),
            fields::TITLE => Some(&self.title),
            fields::SLUG => Some(&self.slug),
            fields::STATUS => Some(&self.status),
            fields::BODY => Some(&self.body),
            fields::EXCERPT => Some(&self.excerpt),
            _ => None,
        }
    }

    /// Overwrite the fields present in `values`; unknown names are ignored
    pub fn apply(&mut self, values: &RecordFields) {
        for (name, value) in values {
            let slot = match name.as_str() {
                fields::RECORD_TYPE => &mut self.record_type,
                fields::TITLE => &mut self.title,
                fields::SLUG => &mut self.slug,
                fields::STATUS => &mut self.status,
                fields::BODY => &mut self.body,
                fields::EXCERPT => &mut self.excerpt,
                _ => continue,
            };
            *slot = value.clone();
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

/// Attribute comparison operators understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MetaCompare {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "NOT BETWEEN")]
    NotBetween,
    #[serde(rename = "EXISTS")]
    Exists,
    #[serde(rename = "NOT EXISTS")]
    NotExists,
}

impl MetaCompare {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaCompare::Eq => "=",
            MetaCompare::NotEq => "!=",
            MetaCompare::Gt => ">",
            MetaCompare::Gte => ">=",
            MetaCompare::Lt => "<",
            MetaCompare::Lte => "<=",
            MetaCompare::Like => "LIKE",
            MetaCompare::NotLike => "NOT LIKE",
            MetaCompare::In => "IN",
            MetaCompare::NotIn => "NOT IN",
            MetaCompare::Between => "BETWEEN",
            MetaCompare::NotBetween => "NOT BETWEEN",
            MetaCompare::Exists => "EXISTS",
            MetaCompare::NotExists => "NOT EXISTS",
        }
    }

    /// `EXISTS` and `NOT EXISTS` test presence only and carry no value
    pub fn takes_value(&self) -> bool {
        !matches!(self, MetaCompare::Exists | MetaCompare::NotExists)
    }
}

impl fmt::Display for MetaCompare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetaCompare {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();

        match normalized.as_str() {
            "=" | "==" => Ok(MetaCompare::Eq),
            "!=" | "<>" => Ok(MetaCompare::NotEq),
            ">" => Ok(MetaCompare::Gt),
            ">=" => Ok(MetaCompare::Gte),
            "<" => Ok(MetaCompare::Lt),
            "<=" => Ok(MetaCompare::Lte),
            "LIKE" => Ok(MetaCompare::Like),
            "NOT LIKE" => Ok(MetaCompare::NotLike),
            "IN" => Ok(MetaCompare::In),
            "NOT IN" => Ok(MetaCompare::NotIn),
            "BETWEEN" => Ok(MetaCompare::Between),
            "NOT BETWEEN" => Ok(MetaCompare::NotBetween),
            "EXISTS" => Ok(MetaCompare::Exists),
            "NOT EXISTS" => Ok(MetaCompare::NotExists),
            _ => Err(format!("Unsupported meta comparison: {}", s)),
        }
    }
}

/// Operand of a meta predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Single(AttributeValue),
    List(Vec<AttributeValue>),
}

impl MetaValue {
    /// The operand as host storage strings
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            MetaValue::Single(value) => vec![storage_string(value)],
            MetaValue::List(values) => values.iter().map(storage_string).collect(),
        }
    }
}

fn storage_string(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Bool(true) => "1".to_string(),
        AttributeValue::Bool(false) => "0".to_string(),
        AttributeValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        other => other.to_string(),
    }
}

impl From<AttributeValue> for MetaValue {
    fn from(value: AttributeValue) -> Self {
        MetaValue::Single(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Single(value.into())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Single(value.into())
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Single(value.into())
    }
}

impl From<i32> for MetaValue {
    fn from(value: i32) -> Self {
        MetaValue::Single(value.into())
    }
}

impl From<u64> for MetaValue {
    fn from(value: u64) -> Self {
        MetaValue::Single(value.into())
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Single(value.into())
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for MetaValue {
    fn from(values: Vec<T>) -> Self {
        MetaValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// One attribute predicate of a [`FilterSpec`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaPredicate {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<MetaValue>,
    pub compare: MetaCompare,
}

impl MetaPredicate {
    pub fn new(key: impl Into<String>, value: impl Into<MetaValue>, compare: MetaCompare) -> Self {
        Self {
            key: key.into(),
            value: if compare.takes_value() {
                Some(value.into())
            } else {
                None
            },
            compare,
        }
    }

    pub fn equals(key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        Self::new(key, value, MetaCompare::Eq)
    }

    pub fn exists(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            compare: MetaCompare::Exists,
        }
    }

    pub fn not_exists(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            compare: MetaCompare::NotExists,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc` (any case) sorts ascending
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Which parts of a record a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSelection {
    #[default]
    All,
    Ids,
}

/// Generic record filter understood by [`Repository::fetch_records`]
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterSpec {
    pub record_type: Option<String>,
    pub status: Option<String>,
    pub meta_query: Vec<MetaPredicate>,
    pub order_by: Option<String>,
    pub order: Option<SortOrder>,
    /// Page size; negative means unlimited
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub fields: FieldSelection,
    /// Host-specific keys passed through untouched
    pub extra: BTreeMap<String, JsonValue>,
}

impl FilterSpec {
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Column header map handed to column hooks, in display order
pub type ColumnHeaders = IndexMap<String, String>;

pub type HookCallback = Arc<dyn Fn(ColumnHeaders) -> ColumnHeaders + Send + Sync>;

/// Host extension point registration
#[derive(Clone)]
pub struct Hook {
    pub name: String,
    pub priority: i32,
    pub arity: u8,
    pub callback: HookCallback,
}

impl Hook {
    pub fn filter<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(ColumnHeaders) -> ColumnHeaders + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority: 10,
            arity: 1,
            callback: Arc::new(callback),
        }
    }

    pub fn apply(&self, headers: ColumnHeaders) -> ColumnHeaders {
        (self.callback)(headers)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Content repository capability set
#[async_trait]
pub trait Repository: Send + Sync {
    /// Create a record and return its new id
    async fn insert_record(&self, fields: RecordFields) -> RepositoryResult<u64>;

    /// Update the given fields of a record and return its id
    async fn update_record(&self, id: u64, fields: RecordFields) -> RepositoryResult<u64>;

    /// Remove a record; `permanent = false` lets the host keep it recoverable
    async fn delete_record(&self, id: u64, permanent: bool) -> RepositoryResult<()>;

    async fn fetch_record(&self, id: u64) -> RepositoryResult<Option<Record>>;

    async fn fetch_records(&self, filter: &FilterSpec) -> RepositoryResult<Vec<Record>>;

    async fn get_attribute(&self, id: u64, key: &str) -> RepositoryResult<Option<String>>;

    async fn set_attribute(&self, id: u64, key: &str, value: &str) -> RepositoryResult<()>;

    async fn delete_attribute(&self, id: u64, key: &str) -> RepositoryResult<()>;

    /// One-time declarative registration of a record type
    async fn register_entity_kind(&self, _key: &str, _definition: &JsonValue) -> RepositoryResult<()> {
        Ok(())
    }

    /// Register an extension point callback
    async fn register_hook(&self, hook: Hook) -> RepositoryResult<()> {
        Err(RepositoryError::Unsupported(format!("hook [{}]", hook.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_parsing() {
        assert_eq!("not  exists".parse::<MetaCompare>().unwrap(), MetaCompare::NotExists);
        assert_eq!("like".parse::<MetaCompare>().unwrap(), MetaCompare::Like);
        assert_eq!(">=".parse::<MetaCompare>().unwrap(), MetaCompare::Gte);
        assert!("~".parse::<MetaCompare>().is_err());
    }

    #[test]
    fn test_presence_predicates_drop_value() {
        let predicate = MetaPredicate::new("deleted_at", "ignored", MetaCompare::Exists);

        assert_eq!(predicate.value, None);
        assert_eq!(
            serde_json::to_value(&predicate).unwrap(),
            serde_json::json!({"key": "deleted_at", "compare": "EXISTS"})
        );
    }

    #[test]
    fn test_sort_order_normalizes() {
        assert_eq!(SortOrder::parse("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("down"), SortOrder::Asc);
    }

    #[test]
    fn test_record_apply_ignores_unknown_fields() {
        let mut record = Record::new(1, "book");
        let mut values = RecordFields::new();
        values.insert("title".to_string(), "Dune".to_string());
        values.insert("colour".to_string(), "blue".to_string());

        record.apply(&values);

        assert_eq!(record.title, "Dune");
        assert_eq!(record.field("colour"), None);
    }

    #[test]
    fn test_meta_value_strings() {
        assert_eq!(MetaValue::from(true).to_strings(), vec!["1"]);
        assert_eq!(MetaValue::from(vec![1i64, 2]).to_strings(), vec!["1", "2"]);
    }
}
