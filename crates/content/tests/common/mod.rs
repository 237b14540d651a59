//! Shared models and setup for the integration tests

#![allow(dead_code)]

use elif_content::{
    AttributeKind, AttributeValue, ContentModel, InMemoryRepository, MetaCompare, ModelDefinition,
    ModelRegistry, ModelType,
};
use std::sync::Arc;

pub struct Book;

impl ContentModel for Book {
    fn key() -> &'static str {
        "book"
    }

    fn labels() -> Vec<(&'static str, &'static str)> {
        vec![("name", "Books"), ("singular_name", "Book")]
    }

    fn fillable() -> Vec<(&'static str, AttributeKind)> {
        vec![
            ("isbn", AttributeKind::String),
            ("pages", AttributeKind::Int),
            ("author_id", AttributeKind::Int),
            ("in_print", AttributeKind::Bool),
        ]
    }

    fn uses_soft_deletes() -> bool {
        true
    }

    fn define(definition: ModelDefinition) -> ModelDefinition {
        definition
            .belongs_to("author", "author", "author_id")
            .scope("long", |query, _| {
                Ok(query.where_meta_compare("pages", 300, MetaCompare::Gte))
            })
            .scope("by_author", |query, args| {
                let author = args.first().cloned().unwrap_or(AttributeValue::Null);
                Ok(query.where_meta("author_id", author))
            })
    }
}

pub struct Author;

impl ContentModel for Author {
    fn key() -> &'static str {
        "author"
    }

    fn labels() -> Vec<(&'static str, &'static str)> {
        vec![("name", "Authors")]
    }

    fn fillable() -> Vec<(&'static str, AttributeKind)> {
        vec![("born", AttributeKind::DateTime)]
    }

    fn uses_timestamps() -> bool {
        false
    }

    fn define(definition: ModelDefinition) -> ModelDefinition {
        definition
            .has_many("books", "book", "author_id")
            .has_one("latest_book", "book", "author_id")
    }
}

pub struct Fixture {
    pub repository: Arc<InMemoryRepository>,
    pub registry: Arc<ModelRegistry>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_repository(InMemoryRepository::new())
    }

    pub fn with_repository(repository: InMemoryRepository) -> Self {
        let repository = Arc::new(repository);
        let registry = Arc::new(ModelRegistry::default().with_repository(repository.clone()));
        registry.register_model::<Book>();
        registry.register_model::<Author>();

        Self {
            repository,
            registry,
        }
    }

    pub fn books(&self) -> ModelType {
        self.registry.model_type_of::<Book>().unwrap()
    }

    pub fn authors(&self) -> ModelType {
        self.registry.model_type_of::<Author>().unwrap()
    }

    /// Keys of the attribute writes recorded since the journal was last cleared
    pub fn attribute_sets(&self) -> Vec<String> {
        self.repository
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                elif_content::RepositoryCall::SetAttribute { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn attribute_deletes(&self) -> Vec<String> {
        self.repository
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                elif_content::RepositoryCall::DeleteAttribute { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }
}
