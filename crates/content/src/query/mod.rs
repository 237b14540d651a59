//! Query Builder Module - fluent queries compiled to repository filters
//!
//! - `builder`: predicate accumulation and named scopes
//! - `compile`: argument merging and filter compilation
//! - `execution`: terminals, hydration and eager loading
//! - `types`: trashed visibility and query arguments

pub mod builder;
pub mod compile;
pub mod execution;
pub mod types;

// Re-export main types and builder
pub use builder::QueryBuilder;
pub use types::{QueryArgs, TrashedMode};
