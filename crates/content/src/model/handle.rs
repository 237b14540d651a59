//! Handle for one registered model definition

use std::fmt;
use std::sync::Arc;

use super::definition::ModelDefinition;
use super::entity::Model;
use crate::backends::{Record, Repository};
use crate::error::{ModelError, ModelResult};
use crate::events::{ModelEvent, ModelObserver};
use crate::query::{QueryArgs, QueryBuilder};
use crate::registry::ModelRegistry;
use crate::value::AttributeValue;

/// Result of [`ModelType::find_by_mode`]
#[derive(Debug, Clone)]
pub enum Found {
    One(Option<Model>),
    Many(Vec<Model>),
}

impl Found {
    pub fn into_one(self) -> Option<Model> {
        match self {
            Found::One(model) => model,
            Found::Many(models) => models.into_iter().next(),
        }
    }

    pub fn into_many(self) -> Vec<Model> {
        match self {
            Found::One(model) => model.into_iter().collect(),
            Found::Many(models) => models,
        }
    }
}

/// A model definition bound to the registry it was registered with
///
/// This is the static side of a model: constructors, finders and event
/// registration all go through it.
#[derive(Clone)]
pub struct ModelType {
    definition: Arc<ModelDefinition>,
    registry: Arc<ModelRegistry>,
}

impl ModelType {
    pub(crate) fn new(definition: Arc<ModelDefinition>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            definition,
            registry,
        }
    }

    pub fn key(&self) -> &str {
        self.definition.key()
    }

    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub(crate) fn repository(&self) -> ModelResult<Arc<dyn Repository>> {
        self.registry.repository()
    }

    /// New transient instance
    pub fn make(&self) -> Model {
        Model::new(self.clone())
    }

    /// New transient instance filled with `attributes`
    pub fn make_with<I, K, V>(&self, attributes: I) -> Model
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let mut model = self.make();
        model.fill(attributes);
        model
    }

    /// Fill and insert a new instance
    ///
    /// A vetoed insert still returns the (unsaved) instance.
    pub async fn create<I, K, V>(&self, attributes: I) -> ModelResult<Model>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let mut model = self.make_with(attributes);
        model.save().await?;
        Ok(model)
    }

    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.clone())
    }

    pub async fn find(&self, id: u64) -> ModelResult<Option<Model>> {
        self.query().find(id).await
    }

    pub async fn find_or_fail(&self, id: u64) -> ModelResult<Model> {
        self.query().find_or_fail(id).await
    }

    pub async fn all(&self) -> ModelResult<Vec<Model>> {
        self.query().all().await
    }

    pub async fn first(&self) -> ModelResult<Option<Model>> {
        self.query().first().await
    }

    /// Finder by mode string: `"all"` or `""` for every match, `"first"` for
    /// the first match, an integer for a lookup by id
    pub async fn find_by_mode(&self, mode: &str, args: QueryArgs) -> ModelResult<Found> {
        match mode {
            "" | "all" => Ok(Found::Many(self.query().all_with(args).await?)),
            "first" => Ok(Found::One(self.query().first_with(args).await?)),
            other => match other.parse::<u64>() {
                Ok(id) => Ok(Found::One(self.query().find(id).await?)),
                Err(_) => Err(ModelError::InvalidMode {
                    model: self.key().to_string(),
                    mode: other.to_string(),
                }),
            },
        }
    }

    /// Hydrate a model from a record fetched elsewhere
    pub async fn from_record(&self, record: Record) -> ModelResult<Model> {
        Model::hydrate(self, record).await
    }

    pub fn listen<F>(&self, event: ModelEvent, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.registry.events().listen(self.key(), event, listener);
        self
    }

    pub fn creating<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Creating, listener)
    }

    pub fn created<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Created, listener)
    }

    pub fn saving<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Saving, listener)
    }

    pub fn saved<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Saved, listener)
    }

    pub fn updating<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Updating, listener)
    }

    pub fn updated<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Updated, listener)
    }

    pub fn deleting<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Deleting, listener)
    }

    pub fn deleted<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Deleted, listener)
    }

    pub fn restoring<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Restoring, listener)
    }

    pub fn restored<F>(&self, listener: F) -> &Self
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listen(ModelEvent::Restored, listener)
    }

    pub fn observe<O>(&self, observer: O) -> &Self
    where
        O: ModelObserver + 'static,
    {
        self.registry.events().observe(self.key(), Arc::new(observer));
        self
    }

    /// Drop every listener registered for this model
    pub fn flush_event_listeners(&self) {
        self.registry.events().clear(self.key());
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("key", &self.key())
            .finish()
    }
}
