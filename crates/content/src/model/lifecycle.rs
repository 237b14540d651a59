//! Persistence lifecycle: insert, update, delete, restore and reload
//!
//! Every operation returns `Ok(true)` when it ran and `Ok(false)` when a
//! listener vetoed it or there was nothing to do. Vetoes never surface as
//! errors.

use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;

use super::entity::Model;
use super::schema::{AttributeSchema, CONTENT_FIELDS, PRIMARY_KEY, STATUS_ATTRIBUTE};
use crate::backends::{fields, RecordFields};
use crate::codec;
use crate::error::{ModelError, ModelResult};
use crate::events::ModelEvent;
use crate::value::AttributeValue;

fn fresh_timestamp() -> DateTime<FixedOffset> {
    Utc::now().into()
}

impl Model {
    /// Insert a new model or write the dirty attributes of an existing one
    pub async fn save(&mut self) -> ModelResult<bool> {
        if !self.exists {
            return self.insert().await;
        }

        let id = self.id().ok_or(ModelError::MissingPrimaryKey)?;

        if !self.fire(ModelEvent::Saving) || !self.fire(ModelEvent::Updating) {
            tracing::debug!("Update of model [{}] #{} vetoed", self.key(), id);
            return Ok(false);
        }

        if self.content_fields_for_saving().is_empty() && self.declared_for_saving().is_empty() {
            tracing::trace!("Model [{}] #{} has no changes to save", self.key(), id);
            return Ok(false);
        }

        self.touch_timestamps(false);

        let content = self.content_fields_for_saving();
        let declared = self.declared_for_saving();

        if !content.is_empty() {
            let repository = self.repository()?;
            repository
                .update_record(id, content)
                .await
                .map_err(|e| ModelError::persistence(self.key(), "update", e))?;
        }

        self.save_attributes(id, &declared).await?;

        tracing::debug!(
            "Updated model [{}] #{} ({} attribute(s))",
            self.key(),
            id,
            declared.len()
        );

        self.sync_original();
        self.refresh_from_source().await?;
        self.fire(ModelEvent::Updated);
        self.fire(ModelEvent::Saved);

        Ok(true)
    }

    async fn insert(&mut self) -> ModelResult<bool> {
        if !self.fire(ModelEvent::Saving) || !self.fire(ModelEvent::Creating) {
            tracing::debug!("Insert of model [{}] vetoed", self.key());
            return Ok(false);
        }

        let repository = self.repository()?;
        let id = repository
            .insert_record(self.record_fields_for_insert())
            .await
            .map_err(|e| ModelError::persistence(self.key(), "insert", e))?;

        self.set_attribute(PRIMARY_KEY, id);
        self.exists = true;
        self.touch_timestamps(true);

        let declared = self.declared_for_saving();
        self.save_attributes(id, &declared).await?;

        tracing::debug!("Inserted model [{}] #{}", self.key(), id);

        self.sync_original();
        self.refresh_from_source().await?;
        self.fire(ModelEvent::Created);
        self.fire(ModelEvent::Saved);

        Ok(true)
    }

    /// Soft delete when enabled, otherwise remove the record
    pub async fn delete(&mut self) -> ModelResult<bool> {
        if !self.exists {
            return Ok(false);
        }

        if !self.fire(ModelEvent::Deleting) {
            tracing::debug!("Delete of model [{}] vetoed", self.key());
            return Ok(false);
        }

        if self.definition().uses_soft_deletes() {
            let id = self.id().ok_or(ModelError::MissingPrimaryKey)?;
            let column = self.definition().get_deleted_at_column().to_string();
            let now = AttributeValue::from(fresh_timestamp());

            self.set_attribute(column.clone(), now.clone());

            let mut trashed = IndexMap::new();
            trashed.insert(column, now);
            self.save_attributes(id, &trashed).await?;

            tracing::debug!("Soft deleted model [{}] #{}", self.key(), id);

            self.sync_original();
            self.fire(ModelEvent::Deleted);

            return Ok(true);
        }

        self.perform_delete().await?;
        self.exists = false;
        self.fire(ModelEvent::Deleted);

        Ok(true)
    }

    /// Remove the record even when soft deletes are enabled
    pub async fn force_delete(&mut self) -> ModelResult<bool> {
        if !self.exists {
            return Ok(false);
        }

        if !self.fire(ModelEvent::Deleting) {
            tracing::debug!("Force delete of model [{}] vetoed", self.key());
            return Ok(false);
        }

        if self.definition().uses_soft_deletes() {
            if let Some(id) = self.id() {
                self.clear_deleted_at(id).await?;
            }
        }

        self.perform_delete().await?;
        self.exists = false;
        self.fire(ModelEvent::Deleted);

        Ok(true)
    }

    /// Clear the soft delete marker of a trashed model
    pub async fn restore(&mut self) -> ModelResult<bool> {
        if !self.exists || !self.definition().uses_soft_deletes() || !self.trashed() {
            return Ok(false);
        }

        if !self.fire(ModelEvent::Restoring) {
            tracing::debug!("Restore of model [{}] vetoed", self.key());
            return Ok(false);
        }

        let id = self.id().ok_or(ModelError::MissingPrimaryKey)?;
        self.clear_deleted_at(id).await?;

        tracing::debug!("Restored model [{}] #{}", self.key(), id);

        self.sync_original();
        self.fire(ModelEvent::Restored);

        Ok(true)
    }

    /// A newly loaded copy, `None` when there is no id or no record
    ///
    /// A transient model that was never loaded has no trusted id.
    pub async fn fresh(&self) -> ModelResult<Option<Model>> {
        if !self.exists && self.record.is_none() {
            return Ok(None);
        }

        let id = match self.id() {
            Some(id) => id,
            None => return Ok(None),
        };

        let repository = self.repository()?;

        match repository.fetch_record(id).await? {
            Some(record) => Ok(Some(Model::hydrate(self.model_type(), record).await?)),
            None => Ok(None),
        }
    }

    /// Reload this model in place, failing when the record is gone
    pub async fn refresh(&mut self) -> ModelResult<&mut Self> {
        let fresh = self.fresh().await?.ok_or_else(|| {
            ModelError::not_found(
                self.key(),
                match self.id() {
                    Some(id) => format!("with ID [{}]", id),
                    None => "without an ID".to_string(),
                },
            )
        })?;

        self.replace_with(fresh);

        Ok(self)
    }

    async fn refresh_from_source(&mut self) -> ModelResult<()> {
        if let Some(fresh) = self.fresh().await? {
            self.replace_with(fresh);
        }

        Ok(())
    }

    fn replace_with(&mut self, fresh: Model) {
        self.set_raw_attributes(fresh.attributes, true);
        self.record = fresh.record;
    }

    async fn perform_delete(&self) -> ModelResult<()> {
        if let Some(id) = self.id() {
            self.repository()?.delete_record(id, true).await?;
            tracing::debug!("Deleted record of model [{}] #{}", self.key(), id);
        }

        Ok(())
    }

    async fn clear_deleted_at(&mut self, id: u64) -> ModelResult<()> {
        let column = self.definition().get_deleted_at_column().to_string();
        self.set_attribute(column.clone(), AttributeValue::Null);

        let mut cleared = IndexMap::new();
        cleared.insert(column, AttributeValue::Null);

        self.save_attributes(id, &cleared).await
    }

    fn touch_timestamps(&mut self, creating: bool) {
        let now = fresh_timestamp();

        let created = self
            .definition()
            .get_created_at_column()
            .filter(|_| creating)
            .map(str::to_string);
        let updated = self.definition().get_updated_at_column().map(str::to_string);

        for column in created.into_iter().chain(updated) {
            self.set_attribute(column, now);
        }
    }

    /// Host fields for a new record: the record type plus every non-null
    /// content alias, with the default status filled in
    fn record_fields_for_insert(&self) -> RecordFields {
        let mut values = RecordFields::new();
        values.insert(fields::RECORD_TYPE.to_string(), self.key().to_string());

        for (alias, field) in CONTENT_FIELDS {
            if let Some(value) = self.content_value(alias) {
                values.insert(field.to_string(), value);
            }
        }

        values
    }

    /// Host fields for the dirty content aliases
    fn content_fields_for_saving(&self) -> RecordFields {
        CONTENT_FIELDS
            .iter()
            .filter(|(alias, _)| self.is_attribute_dirty(alias))
            .filter_map(|(alias, field)| {
                self.content_value(alias)
                    .map(|value| (field.to_string(), value))
            })
            .collect()
    }

    fn content_value(&self, alias: &str) -> Option<String> {
        match self.get_attribute(alias) {
            AttributeValue::Null if alias == STATUS_ATTRIBUTE => {
                Some(self.definition().get_default_status().to_string())
            }
            AttributeValue::Null => None,
            value => Some(value.to_string()),
        }
    }

    /// Dirty declared attributes present in the attribute map
    fn declared_for_saving(&self) -> IndexMap<String, AttributeValue> {
        self.schema()
            .declared()
            .keys()
            .filter(|name| self.attributes.contains_key(*name) && self.is_attribute_dirty(name))
            .map(|name| (name.clone(), self.get_attribute(name).clone()))
            .collect()
    }

    /// Write declared attributes in schema order; `Null` deletes the attribute
    async fn save_attributes(
        &self,
        id: u64,
        values: &IndexMap<String, AttributeValue>,
    ) -> ModelResult<()> {
        if values.is_empty() {
            return Ok(());
        }

        let repository = self.repository()?;
        let schema: &AttributeSchema = self.schema();

        for (name, kind) in schema.declared() {
            let value = match values.get(name) {
                Some(value) => value,
                None => continue,
            };

            match codec::encode(value, *kind) {
                Some(encoded) => repository.set_attribute(id, name, &encoded).await?,
                None => repository.delete_attribute(id, name).await?,
            }
        }

        Ok(())
    }
}
