//! Model definitions
//!
//! A [`ModelDefinition`] is everything the engine knows about one kind of
//! content record: its key, host registration options, declared attributes,
//! timestamp and soft delete behavior, relations and query scopes.

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::schema::AttributeSchema;
use crate::codec::AttributeKind;
use crate::config::ContentConfig;
use crate::error::ModelResult;
use crate::query::QueryBuilder;
use crate::relationships::Relation;
use crate::value::AttributeValue;

/// Named query scope: receives the builder and call arguments and returns
/// the narrowed builder
pub type Scope =
    Arc<dyn Fn(QueryBuilder, &[AttributeValue]) -> ModelResult<QueryBuilder> + Send + Sync>;

/// Admin visibility options
///
/// `dashboard` turns on `show_ui`, `show_in_menu`, `show_in_admin_bar` and
/// `show_in_rest`; any explicitly set flag overrides that expansion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminOptions {
    #[serde(default)]
    pub dashboard: bool,
    pub show_ui: Option<bool>,
    pub show_in_menu: Option<bool>,
    pub show_in_admin_bar: Option<bool>,
    pub show_in_nav_menus: Option<bool>,
    pub show_in_rest: Option<bool>,
    pub menu_position: Option<i64>,
    pub menu_icon: Option<String>,
}

impl AdminOptions {
    pub fn dashboard() -> Self {
        Self {
            dashboard: true,
            ..Self::default()
        }
    }

    pub fn menu_icon(mut self, icon: impl Into<String>) -> Self {
        self.menu_icon = Some(icon.into());
        self
    }

    pub fn menu_position(mut self, position: i64) -> Self {
        self.menu_position = Some(position);
        self
    }

    /// Host registration keys derived from these options
    pub fn to_options(&self) -> Map<String, JsonValue> {
        let mut options = Map::new();

        if self.dashboard {
            for key in ["show_ui", "show_in_menu", "show_in_admin_bar", "show_in_rest"] {
                options.insert(key.to_string(), JsonValue::Bool(true));
            }
        }

        let explicit = [
            ("show_ui", self.show_ui.map(JsonValue::from)),
            ("show_in_menu", self.show_in_menu.map(JsonValue::from)),
            ("show_in_admin_bar", self.show_in_admin_bar.map(JsonValue::from)),
            ("show_in_nav_menus", self.show_in_nav_menus.map(JsonValue::from)),
            ("show_in_rest", self.show_in_rest.map(JsonValue::from)),
            ("menu_position", self.menu_position.map(JsonValue::from)),
            ("menu_icon", self.menu_icon.clone().map(JsonValue::from)),
        ];

        for (key, value) in explicit {
            if let Some(value) = value {
                options.insert(key.to_string(), value);
            }
        }

        options
    }
}

#[derive(Clone)]
pub struct ModelDefinition {
    key: String,
    labels: IndexMap<String, String>,
    supports: Vec<String>,
    admin: AdminOptions,
    options: Map<String, JsonValue>,
    fillable: IndexMap<String, AttributeKind>,
    soft_deletes: bool,
    deleted_at_column: String,
    timestamps: bool,
    created_at_column: Option<String>,
    updated_at_column: Option<String>,
    default_status: String,
    relations: IndexMap<String, Relation>,
    scopes: HashMap<String, Scope>,
    schema: OnceCell<AttributeSchema>,
}

impl ModelDefinition {
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_config(key, &ContentConfig::default())
    }

    /// Definition seeded with configured defaults
    pub fn with_config(key: impl Into<String>, config: &ContentConfig) -> Self {
        Self {
            key: key.into(),
            labels: IndexMap::new(),
            supports: vec!["title".to_string(), "editor".to_string()],
            admin: AdminOptions::default(),
            options: Map::new(),
            fillable: IndexMap::new(),
            soft_deletes: false,
            deleted_at_column: config.deleted_at_column.clone(),
            timestamps: config.timestamps,
            created_at_column: Some(config.created_at_column.clone()),
            updated_at_column: Some(config.updated_at_column.clone()),
            default_status: config.default_status.clone(),
            relations: IndexMap::new(),
            scopes: HashMap::new(),
            schema: OnceCell::new(),
        }
    }

    pub fn label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    pub fn labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.labels
            .extend(labels.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    pub fn supports<I, S>(mut self, supports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supports = supports.into_iter().map(Into::into).collect();
        self
    }

    pub fn admin(mut self, admin: AdminOptions) -> Self {
        self.admin = admin;
        self
    }

    /// Free-form registration options, merged last
    pub fn options(mut self, options: JsonValue) -> Self {
        if let JsonValue::Object(options) = options {
            self.options = options;
        }
        self
    }

    pub fn fillable(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.fillable.insert(name.into(), kind);
        self.schema = OnceCell::new();
        self
    }

    pub fn soft_deletes(mut self) -> Self {
        self.soft_deletes = true;
        self.schema = OnceCell::new();
        self
    }

    pub fn deleted_at_column(mut self, column: impl Into<String>) -> Self {
        self.deleted_at_column = column.into();
        self.schema = OnceCell::new();
        self
    }

    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self.schema = OnceCell::new();
        self
    }

    /// Override or, with `None`, drop the created-at column
    pub fn created_at_column(mut self, column: Option<&str>) -> Self {
        self.created_at_column = column.map(str::to_string);
        self.schema = OnceCell::new();
        self
    }

    /// Override or, with `None`, drop the updated-at column
    pub fn updated_at_column(mut self, column: Option<&str>) -> Self {
        self.updated_at_column = column.map(str::to_string);
        self.schema = OnceCell::new();
        self
    }

    pub fn default_status(mut self, status: impl Into<String>) -> Self {
        self.default_status = status.into();
        self
    }

    pub fn belongs_to(
        self,
        name: impl Into<String>,
        related: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(name, Relation::belongs_to(related, foreign_key))
    }

    pub fn has_many(
        self,
        name: impl Into<String>,
        related: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(name, Relation::has_many(related, foreign_key))
    }

    pub fn has_one(
        self,
        name: impl Into<String>,
        related: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(name, Relation::has_one(related, foreign_key))
    }

    /// Declare a relation with explicit keys
    pub fn relation(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn scope<F>(mut self, name: impl Into<String>, scope: F) -> Self
    where
        F: Fn(QueryBuilder, &[AttributeValue]) -> ModelResult<QueryBuilder> + Send + Sync + 'static,
    {
        self.scopes.insert(name.into(), Arc::new(scope));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Labels in declaration order
    pub fn get_labels(&self) -> &IndexMap<String, String> {
        &self.labels
    }

    pub fn get_supports(&self) -> &[String] {
        &self.supports
    }

    pub fn get_admin(&self) -> &AdminOptions {
        &self.admin
    }

    pub fn get_fillable(&self) -> &IndexMap<String, AttributeKind> {
        &self.fillable
    }

    pub fn uses_soft_deletes(&self) -> bool {
        self.soft_deletes
    }

    pub fn get_deleted_at_column(&self) -> &str {
        &self.deleted_at_column
    }

    pub fn uses_timestamps(&self) -> bool {
        self.timestamps
    }

    /// Created-at column, `None` when timestamps are off or the column is dropped
    pub fn get_created_at_column(&self) -> Option<&str> {
        self.created_at_column
            .as_deref()
            .filter(|_| self.timestamps)
    }

    /// Updated-at column, `None` when timestamps are off or the column is dropped
    pub fn get_updated_at_column(&self) -> Option<&str> {
        self.updated_at_column
            .as_deref()
            .filter(|_| self.timestamps)
    }

    pub fn get_default_status(&self) -> &str {
        &self.default_status
    }

    pub fn get_relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn get_relations(&self) -> &IndexMap<String, Relation> {
        &self.relations
    }

    pub fn get_scope(&self, name: &str) -> Option<&Scope> {
        self.scopes.get(name)
    }

    pub fn has_scope(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    pub fn schema(&self) -> &AttributeSchema {
        self.schema.get_or_init(|| {
            let timestamps: Vec<&str> = self
                .get_created_at_column()
                .into_iter()
                .chain(self.get_updated_at_column())
                .collect();
            let deleted_at = Some(self.deleted_at_column.as_str()).filter(|_| self.soft_deletes);

            AttributeSchema::build(&self.fillable, &timestamps, deleted_at)
        })
    }

    /// Host registration payload: labels and supports, then admin options,
    /// then free-form options, merged recursively
    pub fn registration(&self) -> JsonValue {
        let mut definition = json!({
            "labels": self.labels,
            "supports": self.supports,
        });

        merge_recursive(&mut definition, JsonValue::Object(self.admin.to_options()));
        merge_recursive(&mut definition, JsonValue::Object(self.options.clone()));

        definition
    }
}

/// Objects merge key by key; any other value replaces the target
fn merge_recursive(target: &mut JsonValue, source: JsonValue) {
    match (target, source) {
        (JsonValue::Object(target), JsonValue::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_recursive(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

impl fmt::Debug for ModelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDefinition")
            .field("key", &self.key)
            .field("fillable", &self.fillable)
            .field("soft_deletes", &self.soft_deletes)
            .field("timestamps", &self.timestamps)
            .field("relations", &self.relations.keys().collect::<Vec<_>>())
            .field("scopes", &self.scopes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Static description of a content model
///
/// ```ignore
/// struct Book;
///
/// impl ContentModel for Book {
///     fn key() -> &'static str { "book" }
///     fn labels() -> Vec<(&'static str, &'static str)> { vec![("name", "Books")] }
///     fn fillable() -> Vec<(&'static str, AttributeKind)> {
///         vec![("isbn", AttributeKind::String)]
///     }
/// }
/// ```
pub trait ContentModel: 'static {
    fn key() -> &'static str;

    fn labels() -> Vec<(&'static str, &'static str)>;

    fn fillable() -> Vec<(&'static str, AttributeKind)> {
        Vec::new()
    }

    fn supports() -> Vec<&'static str> {
        vec!["title", "editor"]
    }

    fn uses_timestamps() -> bool {
        true
    }

    fn uses_soft_deletes() -> bool {
        false
    }

    fn admin() -> AdminOptions {
        AdminOptions::default()
    }

    /// Relations, scopes and any other definition detail
    fn define(definition: ModelDefinition) -> ModelDefinition {
        definition
    }

    fn definition(config: &ContentConfig) -> ModelDefinition {
        let mut definition = ModelDefinition::with_config(Self::key(), config)
            .labels(Self::labels())
            .supports(Self::supports())
            .admin(Self::admin())
            .timestamps(config.timestamps && Self::uses_timestamps());

        for (name, kind) in Self::fillable() {
            definition = definition.fillable(name, kind);
        }

        if Self::uses_soft_deletes() {
            definition = definition.soft_deletes();
        }

        Self::define(definition)
    }
}
