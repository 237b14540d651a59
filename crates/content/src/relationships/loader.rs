//! Relation resolution
//!
//! Relation queries run without eager loading of their own, so resolving a
//! relation never re-enters [`Model::load`].

use super::types::{Related, Relation, RelationshipType};
use crate::backends::MetaPredicate;
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelType, PRIMARY_KEY};
use crate::query::QueryArgs;

fn related_type(model: &Model, relation: &Relation) -> ModelResult<ModelType> {
    let registry = model.model_type().registry();

    if !registry.has(&relation.related) {
        return Err(ModelError::Relation(format!(
            "Related model [{}] of [{}] is not a registered content model",
            relation.related,
            model.key()
        )));
    }

    registry.model_type(&relation.related)
}

pub(crate) async fn resolve(model: &Model, relation: &Relation) -> ModelResult<Related> {
    let related = related_type(model, relation)?;

    tracing::trace!(
        "Resolving {:?} [{}] from model [{}]",
        relation.relationship_type,
        relation.related,
        model.key()
    );

    match relation.relationship_type {
        RelationshipType::BelongsTo => resolve_belongs_to(model, relation, &related)
            .await
            .map(|found| Related::One(found.map(Box::new))),
        RelationshipType::HasMany => resolve_has_many(model, relation, &related)
            .await
            .map(Related::Many),
        RelationshipType::HasOne => resolve_has_many(model, relation, &related)
            .await
            .map(|models| Related::One(models.into_iter().next().map(Box::new))),
    }
}

async fn resolve_belongs_to(
    model: &Model,
    relation: &Relation,
    related: &ModelType,
) -> ModelResult<Option<Model>> {
    let foreign_value = model.get_attribute(&relation.foreign_key);

    if foreign_value.is_null() {
        return Ok(None);
    }

    let owner_key = relation.key.as_deref().unwrap_or(PRIMARY_KEY);

    if owner_key == PRIMARY_KEY {
        return match foreign_value.to_u64() {
            Some(id) => related.query().find_unloaded(id).await,
            None => Ok(None),
        };
    }

    let args = QueryArgs::new()
        .limit(1)
        .meta(MetaPredicate::equals(owner_key, foreign_value.clone()));

    Ok(related.query().fetch_models(args).await?.into_iter().next())
}

async fn resolve_has_many(
    model: &Model,
    relation: &Relation,
    related: &ModelType,
) -> ModelResult<Vec<Model>> {
    let local_key = relation.key.as_deref().unwrap_or(PRIMARY_KEY);
    let local_value = model.get_attribute(local_key);

    if local_value.is_null() {
        return Ok(Vec::new());
    }

    let args = QueryArgs::new().meta(MetaPredicate::equals(
        relation.foreign_key.as_str(),
        local_value.to_string(),
    ));

    related.query().fetch_models(args).await
}
