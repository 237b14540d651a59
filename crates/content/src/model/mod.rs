//! Model System - content models over a record repository
//!
//! - `definition`: model definitions and the `ContentModel` trait
//! - `schema`: merged attribute schema of a definition
//! - `entity`: the `Model` instance with attributes and dirty tracking
//! - `handle`: `ModelType`, constructors and finders for one definition
//! - `hydration`: building models from repository records
//! - `lifecycle`: save, delete, restore and reload

pub mod definition;
pub mod entity;
pub mod handle;
pub mod hydration;
pub mod lifecycle;
pub mod schema;

// Re-export main types for convenience
pub use definition::{AdminOptions, ContentModel, ModelDefinition, Scope};
pub use entity::{Model, Property};
pub use handle::{Found, ModelType};
pub use schema::{AttributeSchema, CONTENT_FIELDS, PRIMARY_KEY};
