//! Relation declarations and resolved relation values

use serde::{Deserialize, Serialize};

use crate::model::Model;

/// Kind of relation between two content models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Many-to-one: this model stores the related model's key
    BelongsTo,
    /// One-to-many: related models store this model's key
    HasMany,
    /// One-to-one: first of a `HasMany`
    HasOne,
}

impl RelationshipType {
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany)
    }
}

/// Declared relation of a model definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub relationship_type: RelationshipType,
    /// Key of the related model definition
    pub related: String,
    /// Attribute holding the link value
    pub foreign_key: String,
    /// Owner key for `BelongsTo`, local key otherwise; `id` when unset
    pub key: Option<String>,
}

impl Relation {
    pub fn belongs_to(related: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationshipType::BelongsTo, related, foreign_key)
    }

    pub fn has_many(related: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationshipType::HasMany, related, foreign_key)
    }

    pub fn has_one(related: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationshipType::HasOne, related, foreign_key)
    }

    fn new(
        relationship_type: RelationshipType,
        related: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            relationship_type,
            related: related.into(),
            foreign_key: foreign_key.into(),
            key: None,
        }
    }

    /// Link through `key` instead of the id
    pub fn via(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Resolved value of a relation
#[derive(Debug, Clone)]
pub enum Related {
    One(Option<Box<Model>>),
    Many(Vec<Model>),
}

impl Related {
    pub fn as_one(&self) -> Option<&Model> {
        match self {
            Related::One(model) => model.as_deref(),
            Related::Many(models) => models.first(),
        }
    }

    pub fn as_many(&self) -> &[Model] {
        match self {
            Related::One(Some(model)) => std::slice::from_ref(&**model),
            Related::One(None) => &[],
            Related::Many(models) => models,
        }
    }

    pub fn into_one(self) -> Option<Model> {
        match self {
            Related::One(model) => model.map(|model| *model),
            Related::Many(models) => models.into_iter().next(),
        }
    }

    pub fn into_many(self) -> Vec<Model> {
        match self {
            Related::One(model) => model.into_iter().map(|model| *model).collect(),
            Related::Many(models) => models,
        }
    }

    pub fn len(&self) -> usize {
        self.as_many().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_many().is_empty()
    }
}
