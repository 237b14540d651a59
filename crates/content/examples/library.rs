//! Example: a small library catalogue on the in-memory repository
//!
//! Defines two content models, registers them with the host, then walks
//! through creating, querying, relating, soft deleting and restoring books.

use elif_content::{
    AttributeKind, AttributeValue, ContentModel, InMemoryRepository, MetaCompare, ModelDefinition,
    ModelRegistry, ModelResult,
};
use std::sync::Arc;

struct Book;

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
        ]
    }

    fn uses_soft_deletes() -> bool {
        true
    }

    fn define(definition: ModelDefinition) -> ModelDefinition {
        definition
            .belongs_to("author", "author", "author_id")
            .scope("long", |query, _| {
                Ok(query.where_meta_compare("pages", 400, MetaCompare::Gte))
            })
    }
}

struct Author;

impl ContentModel for Author {
    fn key() -> &'static str {
        "author"
    }

    fn labels() -> Vec<(&'static str, &'static str)> {
        vec![("name", "Authors")]
    }

    fn define(definition: ModelDefinition) -> ModelDefinition {
        definition.has_many("books", "book", "author_id")
    }
}

#[tokio::main]
async fn main() -> ModelResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "elif_content=debug".into()),
        )
        .init();

    let repository = Arc::new(InMemoryRepository::new());
    let registry = Arc::new(ModelRegistry::default().with_repository(repository.clone()));
    registry.register_model::<Book>();
    registry.register_model::<Author>();
    registry.register_all().await?;

    let authors = registry.model_type_of::<Author>()?;
    let books = registry.model_type_of::<Book>()?;

    books.creating(|book| {
        println!("Creating book: {}", book.get_attribute("title"));
        true
    });

    let herbert = authors.create([("title", "Frank Herbert")]).await?;
    let herbert_id = herbert.id().unwrap_or_default();

    for (title, pages) in [("Dune", 412), ("Dune Messiah", 256), ("Children of Dune", 444)] {
        books
            .create([
                ("title", AttributeValue::from(title)),
                ("pages", AttributeValue::from(pages)),
                ("author_id", AttributeValue::from(herbert_id)),
            ])
            .await?;
    }

    let long = books.query().scope("long", &[])?.order_by("title", "asc").all().await?;
    println!("Long books:");
    for book in &long {
        println!("  {} ({} pages)", book.get_attribute("title"), book.get_attribute("pages"));
    }

    let mut author = authors.find_or_fail(herbert_id).await?;
    let author_title = author.get_attribute("title").clone();
    println!(
        "{} wrote {} book(s)",
        author_title,
        author.related_many("books").await?.len()
    );

    let mut messiah = books
        .query()
        .where_meta_compare("pages", 300, MetaCompare::Lt)
        .first_or_fail()
        .await?;
    messiah.delete().await?;
    println!(
        "After trashing: {} visible, {} trashed",
        books.query().count().await?,
        books.query().only_trashed().count().await?
    );

    messiah.restore().await?;
    println!("After restoring: {} visible", books.query().count().await?);

    println!("Repository handled {} write call(s)", repository.write_calls().len());

    Ok(())
}
