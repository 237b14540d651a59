//! The model instance: attribute bag, dirty tracking and relation memo

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::definition::ModelDefinition;
use super::handle::ModelType;
use super::schema::{AttributeSchema, PRIMARY_KEY};
use crate::backends::{Record, Repository};
use crate::error::{ModelError, ModelResult};
use crate::events::ModelEvent;
use crate::relationships::{self, Related};
use crate::value::AttributeValue;

static NULL: AttributeValue = AttributeValue::Null;

/// Result of a two-tier property lookup
#[derive(Debug, Clone, Copy)]
pub enum Property<'a> {
    Relation(&'a Related),
    Attribute(&'a AttributeValue),
}

/// One content record bound to a model definition
#[derive(Clone)]
pub struct Model {
    pub(crate) model_type: ModelType,
    pub(crate) attributes: IndexMap<String, AttributeValue>,
    pub(crate) original: IndexMap<String, AttributeValue>,
    pub(crate) relations: HashMap<String, Related>,
    pub(crate) exists: bool,
    pub(crate) record: Option<Record>,
}

impl Model {
    pub(crate) fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            attributes: IndexMap::new(),
            original: IndexMap::new(),
            relations: HashMap::new(),
            exists: false,
            record: None,
        }
    }

    pub fn key(&self) -> &str {
        self.model_type.key()
    }

    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    pub fn definition(&self) -> &ModelDefinition {
        self.model_type.definition()
    }

    pub(crate) fn schema(&self) -> &AttributeSchema {
        self.definition().schema()
    }

    pub(crate) fn repository(&self) -> ModelResult<Arc<dyn Repository>> {
        self.model_type.repository()
    }

    /// Set every fillable attribute in `attributes`; other keys are skipped
    pub fn fill<I, K, V>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        for (key, value) in attributes {
            let key = key.into();
            if self.schema().is_fillable(&key) {
                self.attributes.insert(key, value.into());
            }
        }
        self
    }

    /// [`fill`](Self::fill) from a JSON object; non-objects are ignored
    pub fn fill_json(&mut self, attributes: &JsonValue) -> &mut Self {
        if let JsonValue::Object(attributes) = attributes {
            self.fill(attributes.iter().map(|(key, value)| (key.clone(), AttributeValue::from(value))));
        }
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> &mut Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Current value, `Null` when unset
    pub fn get_attribute(&self, key: &str) -> &AttributeValue {
        self.attributes.get(key).unwrap_or(&NULL)
    }

    /// Loaded relation first, then attribute
    pub fn get(&self, key: &str) -> Property<'_> {
        match self.relations.get(key) {
            Some(related) => Property::Relation(related),
            None => Property::Attribute(self.get_attribute(key)),
        }
    }

    pub fn attributes(&self) -> &IndexMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn original(&self) -> &IndexMap<String, AttributeValue> {
        &self.original
    }

    pub fn id(&self) -> Option<u64> {
        self.get_attribute(PRIMARY_KEY).to_u64()
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// The record this model was last loaded from
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.attributes
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect::<Map<String, JsonValue>>(),
        )
    }

    pub(crate) fn is_attribute_dirty(&self, key: &str) -> bool {
        if !self.schema().is_fillable(key) {
            return false;
        }

        if !self.exists {
            return self.attributes.contains_key(key);
        }

        match self.original.get(key) {
            None => self.attributes.contains_key(key),
            Some(original) => !self.get_attribute(key).loosely_eq(original),
        }
    }

    /// Dirty fillable attributes with their current values
    pub fn dirty(&self) -> IndexMap<String, AttributeValue> {
        self.schema()
            .names()
            .filter(|name| self.is_attribute_dirty(name))
            .map(|name| (name.to_string(), self.get_attribute(name).clone()))
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.schema().names().any(|name| self.is_attribute_dirty(name))
    }

    pub fn is_clean(&self) -> bool {
        !self.is_dirty()
    }

    pub fn trashed(&self) -> bool {
        let definition = self.definition();

        definition.uses_soft_deletes()
            && !self
                .get_attribute(definition.get_deleted_at_column())
                .is_null()
    }

    pub(crate) fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    /// Replace all state wholesale, as after a load
    pub(crate) fn set_raw_attributes(&mut self, attributes: IndexMap<String, AttributeValue>, exists: bool) {
        self.attributes = attributes;
        self.exists = exists;
        self.relations.clear();
        self.sync_original();
    }

    pub(crate) fn fire(&mut self, event: ModelEvent) -> bool {
        let registry = Arc::clone(self.model_type.registry());
        let key = self.key().to_string();

        registry.events().fire(&key, event, self)
    }

    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn relation(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> &HashMap<String, Related> {
        &self.relations
    }

    pub fn set_relation(&mut self, name: impl Into<String>, related: Related) -> &mut Self {
        self.relations.insert(name.into(), related);
        self
    }

    /// Resolve a declared relation, memoizing the result
    pub async fn related(&mut self, name: &str) -> ModelResult<&Related> {
        if !self.relation_loaded(name) {
            let related = self.resolve_relation(name).await?;
            self.relations.insert(name.to_string(), related);
        }

        self.relations
            .get(name)
            .ok_or_else(|| ModelError::Configuration(format!("Relation [{}] was not loaded", name)))
    }

    /// Single related model of a `belongs_to` or `has_one` relation
    pub async fn related_one(&mut self, name: &str) -> ModelResult<Option<&Model>> {
        Ok(self.related(name).await?.as_one())
    }

    /// Related models of a `has_many` relation
    pub async fn related_many(&mut self, name: &str) -> ModelResult<&[Model]> {
        Ok(self.related(name).await?.as_many())
    }

    /// Resolve the named relations now, replacing memoized values
    pub async fn load(&mut self, names: &[&str]) -> ModelResult<&mut Self> {
        for name in names {
            let related = self.resolve_relation(name).await?;
            self.relations.insert(name.to_string(), related);
        }

        Ok(self)
    }

    async fn resolve_relation(&self, name: &str) -> ModelResult<Related> {
        let relation = self.definition().get_relation(name).cloned().ok_or_else(|| {
            ModelError::Configuration(format!(
                "Relation [{}] is not defined on model [{}]",
                name,
                self.key()
            ))
        })?;

        relationships::resolve(self, &relation).await
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("key", &self.key())
            .field("exists", &self.exists)
            .field("attributes", &self.attributes)
            .field("relations", &self.relations.keys().collect::<Vec<_>>())
            .finish()
    }
}
