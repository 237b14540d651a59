//! Building models from repository records

use indexmap::IndexMap;

use super::entity::Model;
use super::handle::ModelType;
use super::schema::{CONTENT_FIELDS, PRIMARY_KEY};
use crate::backends::Record;
use crate::codec;
use crate::error::ModelResult;
use crate::value::AttributeValue;

impl Model {
    /// Persisted model for `record`, with every declared attribute fetched
    /// and decoded
    pub(crate) async fn hydrate(model_type: &ModelType, record: Record) -> ModelResult<Model> {
        let repository = model_type.repository()?;
        let schema = model_type.definition().schema();

        let mut attributes = IndexMap::new();
        attributes.insert(PRIMARY_KEY.to_string(), AttributeValue::from(record.id));

        for (alias, field) in CONTENT_FIELDS {
            let value = record.field(field).map(AttributeValue::from).unwrap_or_default();
            attributes.insert(alias.to_string(), value);
        }

        for (name, kind) in schema.declared() {
            let raw = repository.get_attribute(record.id, name).await?;
            attributes.insert(name.clone(), codec::decode(raw.as_deref(), *kind));
        }

        tracing::trace!("Hydrated model [{}] #{}", model_type.key(), record.id);

        let mut model = Model::new(model_type.clone());
        model.set_raw_attributes(attributes, true);
        model.record = Some(record);

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryRepository;
    use crate::codec::AttributeKind;
    use crate::model::ModelDefinition;
    use crate::registry::ModelRegistry;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_hydrate_decodes_declared_attributes() {
        let repository = Arc::new(InMemoryRepository::new());
        repository.seed_record(Record::new(5, "book").with_title("Dune").with_status("publish"));
        repository.seed_attribute(5, "pages", "412");
        repository.seed_attribute(5, "in_print", "yes");

        let registry = Arc::new(ModelRegistry::default().with_repository(repository));
        registry.register(
            ModelDefinition::new("book")
                .timestamps(false)
                .fillable("pages", AttributeKind::Int)
                .fillable("in_print", AttributeKind::Bool)
                .fillable("isbn", AttributeKind::String),
        );

        let book_type = registry.model_type("book").unwrap();
        let record = Record::new(5, "book").with_title("Dune").with_status("publish");
        let book = book_type.from_record(record).await.unwrap();

        assert!(book.exists());
        assert!(book.is_clean());
        assert_eq!(book.id(), Some(5));
        assert_eq!(book.get_attribute("title").as_str(), Some("Dune"));
        assert_eq!(book.get_attribute("pages"), &AttributeValue::Int(412));
        assert_eq!(book.get_attribute("in_print"), &AttributeValue::Bool(true));
        assert!(book.get_attribute("isbn").is_null());
        assert_eq!(book.record().map(|record| record.id), Some(5));
    }
}
