//! Attribute schema derived from a model definition

use indexmap::IndexMap;

use crate::backends::fields;
use crate::codec::AttributeKind;

/// Attribute holding the record id
pub const PRIMARY_KEY: &str = "id";

/// Model attribute aliases for host record fields, in hydration order
pub const CONTENT_FIELDS: [(&str, &str); 5] = [
    ("title", fields::TITLE),
    ("slug", fields::SLUG),
    ("status", fields::STATUS),
    ("content", fields::BODY),
    ("excerpt", fields::EXCERPT),
];

/// Attribute alias that falls back to the definition's default status
pub const STATUS_ATTRIBUTE: &str = "status";

/// Merged attribute layout of one model
///
/// `base` lists identity and content aliases plus enabled timestamp and
/// soft delete columns. `declared` maps every attribute persisted through the
/// repository's attribute storage to its kind: fillable fields first, then
/// timestamps, then the soft delete marker.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    base: Vec<String>,
    declared: IndexMap<String, AttributeKind>,
}

impl AttributeSchema {
    pub(crate) fn build(
        fillable: &IndexMap<String, AttributeKind>,
        timestamp_columns: &[&str],
        deleted_at_column: Option<&str>,
    ) -> Self {
        let mut base: Vec<String> = std::iter::once(PRIMARY_KEY)
            .chain(CONTENT_FIELDS.iter().map(|(alias, _)| *alias))
            .map(str::to_string)
            .collect();
        let mut declared = fillable.clone();

        for column in timestamp_columns.iter().copied().chain(deleted_at_column) {
            if !base.iter().any(|name| name == column) {
                base.push(column.to_string());
            }
            declared.insert(column.to_string(), AttributeKind::DateTime);
        }

        Self { base, declared }
    }

    pub fn base(&self) -> &[String] {
        &self.base
    }

    pub fn declared(&self) -> &IndexMap<String, AttributeKind> {
        &self.declared
    }

    pub fn kind_of(&self, name: &str) -> Option<AttributeKind> {
        self.declared.get(name).copied()
    }

    /// Whether `fill` accepts the attribute and dirty tracking considers it
    pub fn is_fillable(&self, name: &str) -> bool {
        self.declared.contains_key(name) || self.base.iter().any(|base| base == name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains_key(name)
    }

    /// Host field for a content alias
    pub fn content_field(name: &str) -> Option<&'static str> {
        CONTENT_FIELDS
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, field)| *field)
    }

    /// Every fillable name, base names first
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.base.iter().map(String::as_str).chain(
            self.declared
                .keys()
                .map(String::as_str)
                .filter(move |name| !self.base.iter().any(|base| base == name)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fillable() -> IndexMap<String, AttributeKind> {
        let mut fillable = IndexMap::new();
        fillable.insert("isbn".to_string(), AttributeKind::String);
        fillable.insert("pages".to_string(), AttributeKind::Int);
        fillable
    }

    #[test]
    fn test_merge_order() {
        let schema = AttributeSchema::build(
            &fillable(),
            &["created_at", "updated_at"],
            Some("deleted_at"),
        );

        assert_eq!(
            schema.base(),
            ["id", "title", "slug", "status", "content", "excerpt", "created_at", "updated_at", "deleted_at"]
        );
        assert_eq!(
            schema.declared().keys().collect::<Vec<_>>(),
            vec!["isbn", "pages", "created_at", "updated_at", "deleted_at"]
        );
        assert_eq!(schema.kind_of("deleted_at"), Some(AttributeKind::DateTime));
    }

    #[test]
    fn test_without_timestamps_or_soft_deletes() {
        let schema = AttributeSchema::build(&fillable(), &[], None);

        assert!(!schema.is_fillable("created_at"));
        assert!(schema.is_fillable("isbn"));
        assert!(schema.is_fillable("content"));
        assert!(!schema.is_declared("title"));
        assert_eq!(schema.names().count(), 8);
    }

    #[test]
    fn test_content_field_aliases() {
        assert_eq!(AttributeSchema::content_field("content"), Some("body"));
        assert_eq!(AttributeSchema::content_field("isbn"), None);
    }
}
