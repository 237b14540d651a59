mod common;

use common::{Author, Book, Fixture};
use elif_content::{
    AdminOptions, ContentConfig, ContentModel, InMemoryRepository, ModelDefinition, ModelRegistry,
    RepositoryCall,
};
use serde_json::json;
use std::sync::Arc;

struct Event;

impl ContentModel for Event {
    fn key() -> &'static str {
        "event"
    }

    fn labels() -> Vec<(&'static str, &'static str)> {
        vec![("name", "Events")]
    }

    fn supports() -> Vec<&'static str> {
        vec!["title", "thumbnail"]
    }

    fn admin() -> AdminOptions {
        AdminOptions::dashboard().menu_position(5)
    }

    fn define(definition: ModelDefinition) -> ModelDefinition {
        definition.options(json!({"has_archive": true, "labels": {"menu_name": "Agenda"}}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_all_sends_registration_payloads() {
        let fixture = Fixture::new();
        fixture.registry.register_model::<Event>();

        fixture.registry.register_all().await.unwrap();

        assert_eq!(
            fixture.repository.entity_kind("event").unwrap(),
            json!({
                "labels": {"name": "Events", "menu_name": "Agenda"},
                "supports": ["title", "thumbnail"],
                "show_ui": true,
                "show_in_menu": true,
                "show_in_admin_bar": true,
                "show_in_rest": true,
                "menu_position": 5,
                "has_archive": true,
            })
        );
        assert_eq!(
            fixture.repository.entity_kind("book").unwrap(),
            json!({
                "labels": {"name": "Books", "singular_name": "Book"},
                "supports": ["title", "editor"],
            })
        );

        let registered: Vec<String> = fixture
            .repository
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RepositoryCall::RegisterEntityKind { key } => Some(key),
                _ => None,
            })
            .collect();
        assert_eq!(registered, vec!["author", "book", "event"]);
    }

    #[tokio::test]
    async fn test_column_hooks_only_for_models_with_fillable_attributes() {
        let fixture = Fixture::new();
        fixture.registry.register_model::<Event>();

        fixture.registry.register_all().await.unwrap();

        assert!(fixture.repository.has_hook("manage_book_columns"));
        assert!(fixture.repository.has_hook("manage_author_columns"));
        assert!(!fixture.repository.has_hook("manage_event_columns"));

        let headers = fixture
            .repository
            .apply_hooks("manage_book_columns", Default::default());
        assert_eq!(
            headers.values().cloned().collect::<Vec<_>>(),
            vec!["Isbn", "Pages", "Author Id", "In Print"]
        );
    }

    #[tokio::test]
    async fn test_registration_without_hook_capability() {
        let fixture = Fixture::with_repository(InMemoryRepository::new().without_hooks());

        fixture.registry.register_all().await.unwrap();

        assert!(fixture.repository.entity_kind("book").is_some());
        assert!(!fixture.repository.has_hook("manage_book_columns"));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = Arc::new(ModelRegistry::default());
        registry.register_model::<Book>();
        registry.register_model::<Author>();

        assert_eq!(registry.keys(), vec!["author", "book"]);
        assert!(registry.has("book"));
        assert!(!registry.has("event"));
        assert_eq!(registry.model_type_of::<Book>().unwrap().key(), "book");

        let book = registry.get("book").unwrap();
        assert!(book.uses_soft_deletes());
        assert_eq!(book.get_relation("author").unwrap().related, "author");
        assert!(book.has_scope("long"));
    }

    #[test]
    fn test_config_drives_definitions() {
        let registry = ModelRegistry::new(ContentConfig {
            default_status: "draft".to_string(),
            deleted_at_column: "trashed_at".to_string(),
            timestamps: false,
            ..ContentConfig::default()
        });
        registry.register_model::<Book>();

        let book = registry.get("book").unwrap();

        assert_eq!(book.get_default_status(), "draft");
        assert_eq!(book.get_deleted_at_column(), "trashed_at");
        assert!(!book.uses_timestamps());
        assert!(book.schema().is_declared("trashed_at"));
        assert!(!book.schema().is_declared("created_at"));
    }
}
