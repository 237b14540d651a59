//! Compilation of a builder into a repository filter

use super::builder::QueryBuilder;
use super::types::{QueryArgs, TrashedMode};
use crate::backends::{FilterSpec, MetaPredicate};

impl QueryBuilder {
    /// Compile without executing
    ///
    /// Arguments layer as defaults (this model's record type and default
    /// status), then the builder's own arguments, then `overrides`. The meta
    /// query is the merged arguments' predicates followed by the builder's
    /// predicates and, for soft deleting models, one visibility predicate.
    pub fn to_filter(&self, overrides: QueryArgs) -> FilterSpec {
        let definition = self.model_type.definition();

        let mut args = QueryArgs {
            record_type: Some(definition.key().to_string()),
            status: Some(definition.get_default_status().to_string()),
            ..QueryArgs::default()
        };
        args.merge(self.args.clone());
        args.merge(overrides);

        let mut meta_query = args.meta_query.take().unwrap_or_default();
        meta_query.extend(self.meta.iter().cloned());

        if definition.uses_soft_deletes() {
            let column = definition.get_deleted_at_column();

            match self.trashed {
                TrashedMode::Exclude => meta_query.push(MetaPredicate::not_exists(column)),
                TrashedMode::Only => meta_query.push(MetaPredicate::exists(column)),
                TrashedMode::Include => {}
            }
        }

        FilterSpec {
            record_type: args.record_type,
            status: args.status,
            meta_query,
            order_by: args.order_by,
            order: args.order,
            limit: args.limit,
            search: args.search,
            fields: args.fields.unwrap_or_default(),
            extra: args.extra,
        }
    }
}
