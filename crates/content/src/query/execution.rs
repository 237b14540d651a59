//! Query Builder execution against the bound repository

use super::builder::QueryBuilder;
use super::types::{QueryArgs, TrashedMode};
use crate::backends::FieldSelection;
use crate::error::{ModelError, ModelResult};
use crate::model::Model;

impl QueryBuilder {
    pub async fn all(&self) -> ModelResult<Vec<Model>> {
        self.all_with(QueryArgs::default()).await
    }

    /// Every match, with `overrides` layered over the builder's arguments
    pub async fn all_with(&self, overrides: QueryArgs) -> ModelResult<Vec<Model>> {
        let mut models = self.fetch_models(overrides).await?;
        self.eager_load(&mut models).await?;
        Ok(models)
    }

    pub async fn first(&self) -> ModelResult<Option<Model>> {
        self.first_with(QueryArgs::default()).await
    }

    /// First match; the page size is 1 unless `overrides` sets one
    pub async fn first_with(&self, overrides: QueryArgs) -> ModelResult<Option<Model>> {
        let args = QueryArgs::new().limit(1).merged(overrides);
        Ok(self.all_with(args).await?.into_iter().next())
    }

    pub async fn first_or_fail(&self) -> ModelResult<Model> {
        self.first().await?.ok_or_else(|| {
            ModelError::not_found(self.model_type.key(), "matching the query")
        })
    }

    /// Single lookup by id
    ///
    /// Trashed visibility is checked on the loaded model rather than through
    /// the filter pipeline, which single-record fetches do not use.
    pub async fn find(&self, id: u64) -> ModelResult<Option<Model>> {
        let mut model = match self.find_unloaded(id).await? {
            Some(model) => model,
            None => return Ok(None),
        };

        if !self.with.is_empty() {
            let names: Vec<&str> = self.with.iter().map(String::as_str).collect();
            model.load(&names).await?;
        }

        Ok(Some(model))
    }

    pub async fn find_or_fail(&self, id: u64) -> ModelResult<Model> {
        self.find(id).await?.ok_or_else(|| {
            ModelError::not_found(self.model_type.key(), format!("with ID [{}]", id))
        })
    }

    pub async fn count(&self) -> ModelResult<usize> {
        self.count_with(QueryArgs::default()).await
    }

    /// Number of matches, fetched as an id-only, unlimited query
    pub async fn count_with(&self, overrides: QueryArgs) -> ModelResult<usize> {
        let args = QueryArgs {
            fields: Some(FieldSelection::Ids),
            limit: Some(-1),
            ..QueryArgs::default()
        }
        .merged(overrides);

        let filter = self.to_filter(args);
        let records = self.model_type.repository()?.fetch_records(&filter).await?;

        Ok(records.len())
    }

    /// Fetch and hydrate matches without eager loading
    pub(crate) async fn fetch_models(&self, overrides: QueryArgs) -> ModelResult<Vec<Model>> {
        let filter = self.to_filter(overrides);
        let repository = self.model_type.repository()?;

        tracing::debug!(
            "Querying model [{}] with filter {}",
            self.model_type.key(),
            filter.to_json()
        );

        let records = repository.fetch_records(&filter).await?;
        let mut models = Vec::with_capacity(records.len());

        for record in records {
            models.push(Model::hydrate(&self.model_type, record).await?);
        }

        Ok(models)
    }

    /// [`find`](Self::find) without eager loading
    pub(crate) async fn find_unloaded(&self, id: u64) -> ModelResult<Option<Model>> {
        let repository = self.model_type.repository()?;

        let record = match repository.fetch_record(id).await? {
            Some(record) if record.record_type == self.model_type.key() => record,
            _ => return Ok(None),
        };

        let model = Model::hydrate(&self.model_type, record).await?;

        if self.model_type.definition().uses_soft_deletes() {
            let visible = match self.trashed {
                TrashedMode::Exclude => !model.trashed(),
                TrashedMode::Only => model.trashed(),
                TrashedMode::Include => true,
            };

            if !visible {
                return Ok(None);
            }
        }

        Ok(Some(model))
    }

    async fn eager_load(&self, models: &mut [Model]) -> ModelResult<()> {
        if self.with.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            "Eager loading {:?} on {} [{}] model(s)",
            self.with,
            models.len(),
            self.model_type.key()
        );

        let names: Vec<&str> = self.with.iter().map(String::as_str).collect();

        for model in models.iter_mut() {
            model.load(&names).await?;
        }

        Ok(())
    }
}
