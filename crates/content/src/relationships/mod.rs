//! Relationships Module - belongs-to, has-many and has-one between content models
//!
//! Relations link through attributes: a `BelongsTo` reads a foreign key from
//! this model, a `HasMany` matches the related models' foreign key attribute
//! against this model's local key.

pub mod loader;
pub mod types;

pub(crate) use loader::resolve;
pub use types::{Related, Relation, RelationshipType};
