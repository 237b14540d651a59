//! Query Builder - fluent predicate accumulation

use std::fmt;

use super::types::{QueryArgs, TrashedMode};
use crate::backends::{MetaCompare, MetaPredicate, MetaValue};
use crate::error::{ModelError, ModelResult};
use crate::model::ModelType;
use crate::value::AttributeValue;

/// Query over the records of one model
///
/// Fluent methods consume and return the builder; nothing reaches the
/// repository until a terminal method runs.
#[derive(Clone)]
pub struct QueryBuilder {
    pub(crate) model_type: ModelType,
    pub(crate) args: QueryArgs,
    pub(crate) meta: Vec<MetaPredicate>,
    pub(crate) trashed: TrashedMode,
    pub(crate) with: Vec<String>,
}

impl QueryBuilder {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            args: QueryArgs::default(),
            meta: Vec::new(),
            trashed: TrashedMode::default(),
            with: Vec::new(),
        }
    }

    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    pub fn trashed_mode(&self) -> TrashedMode {
        self.trashed
    }

    /// Eager load relations on every result
    pub fn with<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with.extend(relations.into_iter().map(Into::into));
        self
    }

    pub fn with_trashed(mut self) -> Self {
        self.trashed = TrashedMode::Include;
        self
    }

    pub fn only_trashed(mut self) -> Self {
        self.trashed = TrashedMode::Only;
        self
    }

    pub fn without_trashed(mut self) -> Self {
        self.trashed = TrashedMode::Exclude;
        self
    }

    pub fn where_status(mut self, status: impl Into<String>) -> Self {
        self.args.status = Some(status.into());
        self
    }

    /// Order results; any direction other than `desc` sorts ascending
    pub fn order_by(mut self, column: impl Into<String>, direction: &str) -> Self {
        self.args = self.args.order_by(column, direction);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.args.limit = Some(limit);
        self
    }

    pub fn where_meta(self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.where_meta_compare(key, value, MetaCompare::Eq)
    }

    pub fn where_meta_compare(
        mut self,
        key: impl Into<String>,
        value: impl Into<MetaValue>,
        compare: MetaCompare,
    ) -> Self {
        self.meta.push(MetaPredicate::new(key, value, compare));
        self
    }

    pub fn where_meta_exists(mut self, key: impl Into<String>) -> Self {
        self.meta.push(MetaPredicate::exists(key));
        self
    }

    pub fn where_meta_missing(mut self, key: impl Into<String>) -> Self {
        self.meta.push(MetaPredicate::not_exists(key));
        self
    }

    /// Free-text search over title and body
    pub fn search(mut self, terms: impl Into<String>) -> Self {
        self.args.search = Some(terms.into());
        self
    }

    /// Layer raw arguments over those accumulated so far
    pub fn where_args(mut self, args: QueryArgs) -> Self {
        self.args.merge(args);
        self
    }

    /// Apply a named scope of the model definition
    pub fn scope(self, name: &str, args: &[AttributeValue]) -> ModelResult<Self> {
        let key = self.model_type.key().to_string();
        let scope = self
            .model_type
            .definition()
            .get_scope(name)
            .cloned()
            .ok_or_else(|| {
                ModelError::Configuration(format!(
                    "Scope [{}] is not defined on model [{}]",
                    name, key
                ))
            })?;

        let scoped = scope(self, args)?;

        if scoped.model_type.key() != key {
            return Err(ModelError::Configuration(format!(
                "Scope [{}] must return a builder for model [{}], got [{}]",
                name,
                key,
                scoped.model_type.key()
            )));
        }

        Ok(scoped)
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("model", &self.model_type.key())
            .field("args", &self.args)
            .field("meta", &self.meta)
            .field("trashed", &self.trashed)
            .field("with", &self.with)
            .finish()
    }
}
