//! Model registry and host registration
//!
//! A [`ModelRegistry`] owns everything shared by the models of one
//! application: the configuration, the event listeners, the bound repository
//! and the known model definitions.

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::backends::{ColumnHeaders, Hook, Repository};
use crate::config::ContentConfig;
use crate::error::{ModelError, ModelResult};
use crate::model::{ContentModel, ModelDefinition, ModelType};
use crate::observers::EventRegistry;

pub struct ModelRegistry {
    config: ContentConfig,
    events: EventRegistry,
    repository: OnceCell<Arc<dyn Repository>>,
    definitions: DashMap<String, Arc<ModelDefinition>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(ContentConfig::default())
    }
}

impl ModelRegistry {
    pub fn new(config: ContentConfig) -> Self {
        Self {
            config,
            events: EventRegistry::new(),
            repository: OnceCell::new(),
            definitions: DashMap::new(),
        }
    }

    /// Registry configured from `CONTENT_*` environment variables
    pub fn from_env() -> ModelResult<Self> {
        Ok(Self::new(ContentConfig::from_env()?))
    }

    /// Builder form of [`bind`](Self::bind); the last repository given wins
    pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = OnceCell::from(repository);
        self
    }

    /// Bind the repository; a registry binds exactly once
    pub fn bind(&self, repository: Arc<dyn Repository>) -> ModelResult<()> {
        self.repository.set(repository).map_err(|_| {
            ModelError::Configuration("A repository is already bound to this registry".to_string())
        })
    }

    pub fn is_bound(&self) -> bool {
        self.repository.get().is_some()
    }

    pub fn repository(&self) -> ModelResult<Arc<dyn Repository>> {
        self.repository.get().cloned().ok_or_else(|| {
            ModelError::Configuration("No repository is bound to the model registry".to_string())
        })
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// New definition seeded with this registry's configuration
    pub fn define(&self, key: impl Into<String>) -> ModelDefinition {
        ModelDefinition::with_config(key, &self.config)
    }

    /// Add a definition, replacing any with the same key
    pub fn register(&self, definition: ModelDefinition) {
        tracing::debug!("Registering model [{}]", definition.key());
        self.definitions
            .insert(definition.key().to_string(), Arc::new(definition));
    }

    pub fn register_model<M: ContentModel>(&self) {
        self.register(M::definition(&self.config));
    }

    pub fn has(&self, key: &str) -> bool {
        self.definitions.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Arc<ModelDefinition>> {
        self.definitions.get(key).map(|definition| Arc::clone(&definition))
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .definitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn model_type(self: &Arc<Self>, key: &str) -> ModelResult<ModelType> {
        let definition = self.get(key).ok_or_else(|| {
            ModelError::Configuration(format!("Model [{}] is not registered", key))
        })?;

        Ok(ModelType::new(definition, Arc::clone(self)))
    }

    pub fn model_type_of<M: ContentModel>(self: &Arc<Self>) -> ModelResult<ModelType> {
        self.model_type(M::key())
    }

    /// Register every model with the host, then its column headers
    ///
    /// Column registration is best effort: a host without the hook
    /// capability only gets a warning.
    pub async fn register_all(&self) -> ModelResult<()> {
        let repository = self.repository()?;

        for key in self.keys() {
            let definition = match self.get(&key) {
                Some(definition) => definition,
                None => continue,
            };

            repository
                .register_entity_kind(&key, &definition.registration())
                .await?;

            register_columns(repository.as_ref(), &definition).await;
        }

        Ok(())
    }
}

/// Column label for an attribute name: `book_isbn` becomes `Book Isbn`
pub fn column_label(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn register_columns(repository: &dyn Repository, definition: &ModelDefinition) {
    if definition.get_fillable().is_empty() {
        return;
    }

    let labels: ColumnHeaders = definition
        .get_fillable()
        .keys()
        .map(|field| (field.clone(), column_label(field)))
        .collect();

    let hook = Hook::filter(format!("manage_{}_columns", definition.key()), move |mut headers| {
        for (key, label) in &labels {
            headers.insert(key.clone(), label.clone());
        }
        headers
    });

    match repository.register_hook(hook).await {
        Ok(()) => tracing::debug!("Registered column headers for model [{}]", definition.key()),
        Err(e) => tracing::warn!(
            "Column headers for model [{}] not registered: {}",
            definition.key(),
            e
        ),
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("config", &self.config)
            .field("models", &self.keys())
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryRepository;
    use crate::codec::AttributeKind;
    use crate::model::AdminOptions;

    #[test]
    fn test_column_label() {
        assert_eq!(column_label("book_isbn"), "Book Isbn");
        assert_eq!(column_label("pages"), "Pages");
        assert_eq!(column_label("in__print"), "In  Print");
    }

    #[test]
    fn test_unbound_repository_is_configuration_error() {
        let registry = ModelRegistry::default();

        assert!(matches!(registry.repository(), Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_bind_once() {
        let registry = ModelRegistry::default();

        assert!(registry.bind(Arc::new(InMemoryRepository::new())).is_ok());
        assert!(registry.bind(Arc::new(InMemoryRepository::new())).is_err());
        assert!(registry.is_bound());
    }

    #[tokio::test]
    async fn test_with_repository_replaces_earlier_binding() {
        let first = Arc::new(InMemoryRepository::new());
        let second = Arc::new(InMemoryRepository::new());
        let registry = Arc::new(
            ModelRegistry::default()
                .with_repository(first.clone())
                .with_repository(second.clone()),
        );
        registry.register(registry.define("note"));

        let mut note = registry.model_type("note").unwrap().make_with([("title", "Call")]);
        note.save().await.unwrap();

        assert_eq!(first.record_count(), 0);
        assert_eq!(second.record_count(), 1);
    }

    #[test]
    fn test_unknown_model_key() {
        let registry = Arc::new(ModelRegistry::default());

        assert!(matches!(
            registry.model_type("ghost"),
            Err(ModelError::Configuration(_))
        ));
    }

    #[test]
    fn test_define_uses_config() {
        let registry = ModelRegistry::new(ContentConfig {
            default_status: "pending".to_string(),
            ..ContentConfig::default()
        });

        assert_eq!(registry.define("note").get_default_status(), "pending");
    }

    #[tokio::test]
    async fn test_register_all_registers_kinds_and_columns() {
        let repository = Arc::new(InMemoryRepository::new());
        let registry = ModelRegistry::default().with_repository(repository.clone());

        registry.register(
            registry
                .define("book")
                .label("name", "Books")
                .admin(AdminOptions::dashboard())
                .fillable("book_isbn", AttributeKind::String),
        );
        registry.register(registry.define("author").label("name", "Authors"));

        registry.register_all().await.unwrap();

        let kind = repository.entity_kind("book").unwrap();
        assert_eq!(kind["labels"]["name"], "Books");
        assert_eq!(kind["show_ui"], true);
        assert!(repository.entity_kind("author").is_some());

        assert!(repository.has_hook("manage_book_columns"));
        assert!(!repository.has_hook("manage_author_columns"));

        let mut headers = ColumnHeaders::new();
        headers.insert("title".to_string(), "Title".to_string());
        let headers = repository.apply_hooks("manage_book_columns", headers);
        assert_eq!(
            headers.into_iter().collect::<Vec<_>>(),
            vec![
                ("title".to_string(), "Title".to_string()),
                ("book_isbn".to_string(), "Book Isbn".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_register_all_survives_missing_hook_capability() {
        let repository = Arc::new(InMemoryRepository::new().without_hooks());
        let registry = ModelRegistry::default().with_repository(repository.clone());

        registry.register(registry.define("book").fillable("isbn", AttributeKind::String));

        assert!(registry.register_all().await.is_ok());
        assert!(repository.entity_kind("book").is_some());
        assert!(!repository.has_hook("manage_book_columns"));
    }
}
