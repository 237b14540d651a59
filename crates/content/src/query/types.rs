//! Query Builder Types - visibility mode and query arguments

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::backends::{FieldSelection, MetaPredicate, SortOrder};

/// Visibility of soft deleted models in a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrashedMode {
    /// Trashed models are left out
    #[default]
    Exclude,
    /// Trashed and active models are returned
    Include,
    /// Only trashed models are returned
    Only,
}

/// Filter arguments layered onto a query
///
/// Every field is optional; merging another set of arguments replaces each
/// field the other set provides. `meta_query` is replaced as a whole, it is
/// not appended to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryArgs {
    pub record_type: Option<String>,
    pub status: Option<String>,
    pub meta_query: Option<Vec<MetaPredicate>>,
    pub order_by: Option<String>,
    pub order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub fields: Option<FieldSelection>,
    pub extra: BTreeMap<String, JsonValue>,
}

impl QueryArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: &str) -> Self {
        self.order_by = Some(column.into());
        self.order = Some(SortOrder::parse(direction));
        self
    }

    /// Append to this argument set's meta query
    pub fn meta(mut self, predicate: MetaPredicate) -> Self {
        self.meta_query.get_or_insert_with(Vec::new).push(predicate);
        self
    }

    pub fn search(mut self, terms: impl Into<String>) -> Self {
        self.search = Some(terms.into());
        self
    }

    pub fn ids_only(mut self) -> Self {
        self.fields = Some(FieldSelection::Ids);
        self
    }

    /// Host-specific passthrough key
    pub fn extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Layer `other` on top of these arguments
    pub fn merge(&mut self, other: QueryArgs) {
        fn replace<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        replace(&mut self.record_type, other.record_type);
        replace(&mut self.status, other.status);
        replace(&mut self.meta_query, other.meta_query);
        replace(&mut self.order_by, other.order_by);
        replace(&mut self.order, other.order);
        replace(&mut self.limit, other.limit);
        replace(&mut self.search, other.search);
        replace(&mut self.fields, other.fields);
        self.extra.extend(other.extra);
    }

    pub fn merged(mut self, other: QueryArgs) -> Self {
        self.merge(other);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_replaces_provided_fields() {
        let base = QueryArgs::new()
            .status("publish")
            .limit(10)
            .meta(MetaPredicate::equals("genre", "sf"))
            .extra("lang", json!("en"));

        let merged = base.merged(
            QueryArgs::new()
                .limit(1)
                .meta(MetaPredicate::equals("genre", "fantasy"))
                .extra("cache", json!(false)),
        );

        assert_eq!(merged.status.as_deref(), Some("publish"));
        assert_eq!(merged.limit, Some(1));
        assert_eq!(
            merged.meta_query,
            Some(vec![MetaPredicate::equals("genre", "fantasy")])
        );
        assert_eq!(merged.extra.len(), 2);
    }

    #[test]
    fn test_order_direction_normalizes() {
        let args = QueryArgs::new().order_by("title", "Desc");
        assert_eq!(args.order, Some(SortOrder::Desc));

        let args = QueryArgs::new().order_by("title", "sideways");
        assert_eq!(args.order, Some(SortOrder::Asc));
    }
}
