//! Repository Backend Abstractions
//!
//! The [`Repository`] trait is the only way the model layer reaches the host
//! content store. [`InMemoryRepository`] is a complete in-process adapter.

pub mod core;
pub mod memory;

// Re-export core traits and types
pub use self::core::*;
pub use self::memory::{InMemoryRepository, RepositoryCall};
