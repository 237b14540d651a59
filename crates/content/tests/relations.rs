mod common;

use common::Fixture;
use elif_content::{
    AttributeValue, InMemoryRepository, Model, ModelDefinition, ModelError, ModelRegistry,
    Property, Record, Related, Relation,
};
use std::sync::Arc;

/// Author #7 with two books, a book by somebody else, and a trashed book by #7
async fn library(fixture: &Fixture) -> Model {
    fixture
        .repository
        .seed_record(Record::new(7, "author").with_title("Frank Herbert").with_status("publish"));

    let books = fixture.books();
    for (title, author) in [("Dune", "7"), ("Hyperion", "9"), ("Children of Dune", "7")] {
        books
            .create([("title", title), ("author_id", author)])
            .await
            .unwrap();
    }

    let mut lost = books
        .create([("title", "Lost Manuscript"), ("author_id", "7")])
        .await
        .unwrap();
    lost.delete().await.unwrap();

    fixture.authors().find(7).await.unwrap().unwrap()
}

fn titles(models: &[Model]) -> Vec<String> {
    models
        .iter()
        .map(|model| model.get_attribute("title").to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_has_many_matches_foreign_key() {
        let fixture = Fixture::new();
        let mut author = library(&fixture).await;

        let books = author.related_many("books").await.unwrap();

        assert_eq!(titles(books), vec!["Dune", "Children of Dune"]);
        assert!(books
            .iter()
            .all(|book| book.get_attribute("author_id") == &AttributeValue::Int(7)));
    }

    #[tokio::test]
    async fn test_relation_is_memoized() {
        let fixture = Fixture::new();
        let mut author = library(&fixture).await;

        author.related("books").await.unwrap();
        fixture.repository.clear_calls();
        author.related("books").await.unwrap();

        assert!(author.relation_loaded("books"));
        assert!(fixture.repository.calls().is_empty());

        match author.get("books") {
            Property::Relation(related) => assert_eq!(related.len(), 2),
            Property::Attribute(value) => panic!("Expected relation, got {:?}", value),
        }
    }

    #[tokio::test]
    async fn test_has_one_is_first_match() {
        let fixture = Fixture::new();
        let mut author = library(&fixture).await;

        let latest = author.related_one("latest_book").await.unwrap().unwrap();

        assert_eq!(latest.get_attribute("title").as_str(), Some("Dune"));
    }

    #[tokio::test]
    async fn test_belongs_to_by_id() {
        let fixture = Fixture::new();
        library(&fixture).await;

        let mut book = fixture.books().query().first().await.unwrap().unwrap();
        let author = book.related_one("author").await.unwrap().unwrap();

        assert_eq!(author.id(), Some(7));
        assert_eq!(author.get_attribute("title").as_str(), Some("Frank Herbert"));
    }

    #[tokio::test]
    async fn test_belongs_to_without_foreign_key_is_empty() {
        let fixture = Fixture::new();
        let mut book = fixture.books().create([("title", "Anonymous")]).await.unwrap();

        assert!(book.related_one("author").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eager_loading_on_queries_and_find() {
        let fixture = Fixture::new();
        library(&fixture).await;

        let books = fixture.books().query().with(["author"]).all().await.unwrap();
        assert_eq!(books.len(), 3);
        for book in &books {
            assert!(book.relation_loaded("author"));
        }
        let dune_author = books[0].relation("author").and_then(Related::as_one).unwrap();
        assert_eq!(dune_author.id(), Some(7));

        let author = fixture
            .authors()
            .query()
            .with(["books"])
            .find(7)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(author.relation("books").map(Related::len), Some(2));
    }

    #[tokio::test]
    async fn test_load_replaces_memoized_relation() {
        let fixture = Fixture::new();
        let mut author = library(&fixture).await;
        author.related("books").await.unwrap();

        fixture
            .books()
            .create([("title", "Dune Messiah"), ("author_id", "7")])
            .await
            .unwrap();

        assert_eq!(author.related_many("books").await.unwrap().len(), 2);
        author.load(&["books"]).await.unwrap();
        assert_eq!(author.related_many("books").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_relation_is_configuration_error() {
        let fixture = Fixture::new();
        let mut author = library(&fixture).await;

        let err = author.related("publisher").await.unwrap_err();

        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unregistered_related_model_is_relation_error() {
        let registry = Arc::new(
            ModelRegistry::default().with_repository(Arc::new(InMemoryRepository::new())),
        );
        registry.register(ModelDefinition::new("review").relation(
            "reviewer",
            Relation::belongs_to("critic", "critic_id"),
        ));

        let mut review = registry
            .model_type("review")
            .unwrap()
            .create([("title", "Stunning")])
            .await
            .unwrap();

        let err = review.related("reviewer").await.unwrap_err();
        assert!(matches!(err, ModelError::Relation(_)));
    }

    #[tokio::test]
    async fn test_relations_with_custom_keys() {
        let repository = Arc::new(InMemoryRepository::new());
        let registry = Arc::new(ModelRegistry::default().with_repository(repository.clone()));
        registry.register(
            registry
                .define("country")
                .fillable("code", elif_content::AttributeKind::String)
                .relation("cities", Relation::has_many("city", "country_code").via("code")),
        );
        registry.register(
            registry
                .define("city")
                .fillable("country_code", elif_content::AttributeKind::String)
                .relation("country", Relation::belongs_to("country", "country_code").via("code")),
        );

        let countries = registry.model_type("country").unwrap();
        let cities = registry.model_type("city").unwrap();
        countries
            .create([("title", "Norway"), ("code", "NO")])
            .await
            .unwrap();
        let mut oslo = cities
            .create([("title", "Oslo"), ("country_code", "NO")])
            .await
            .unwrap();

        let country = oslo.related_one("country").await.unwrap().unwrap();
        assert_eq!(country.get_attribute("title").as_str(), Some("Norway"));

        let mut norway = countries.first().await.unwrap().unwrap();
        assert_eq!(titles(norway.related_many("cities").await.unwrap()), vec!["Oslo"]);
    }
}
