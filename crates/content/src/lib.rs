//! # elif-content: Active record models over a content repository
//!
//! Models are typed views over a host store of records (title, slug,
//! status, body) plus string attributes attached to each record. This crate
//! provides model definitions and dirty tracking, the lifecycle with
//! vetoable events, a query builder compiled to repository filters, and
//! lazily or eagerly loaded relations.
//!
//! The host store is reached through the [`Repository`] trait; the
//! [`InMemoryRepository`] backend serves tests and demos.

pub mod backends;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod observers;
pub mod query;
pub mod registry;
pub mod relationships;
pub mod value;

// Re-export core traits and types
pub use backends::{
    FilterSpec, InMemoryRepository, MetaCompare, MetaPredicate, MetaValue, Record, Repository,
    RepositoryCall,
};
pub use codec::AttributeKind;
pub use config::{ConfigError, ContentConfig};
pub use error::{ModelError, ModelResult, RepositoryError};
pub use events::{ModelEvent, ModelObserver};
pub use model::{AdminOptions, ContentModel, Found, Model, ModelDefinition, ModelType, Property};
pub use observers::EventRegistry;
pub use query::{QueryArgs, QueryBuilder, TrashedMode};
pub use registry::ModelRegistry;
pub use relationships::{Related, Relation, RelationshipType};
pub use value::AttributeValue;
