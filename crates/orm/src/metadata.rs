//! Per-type entity metadata, computed once and memoized.

use std::any::{TypeId, type_name};
use std::sync::Arc;

use moka::sync::Cache;

use crate::config::OrmOptions;
use crate::entity::{ColumnAttr, Entity, ValueKind};
use crate::error::{Error, Result};
use crate::id::IdType;
use crate::naming;

/// A persistent field with its column name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: ValueKind,
    pub column: String,
    /// Generation strategy, present only on the identity field.
    pub id: Option<IdType>,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.id.is_some()
    }
}

/// The immutable description of one entity type.
#[derive(Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    table: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    /// Interpret an entity's declared fields under the given options.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the type has no table name
    /// or declares more than one identity field.
    fn build<M: Entity>(options: &OrmOptions) -> Result<Self, String> {
        let Some(table) = M::table() else {
            return Err(format!("`{}` has no table declaration", type_name::<M>()));
        };

        let mut fields = Vec::new();
        let mut identities = 0;

        for def in M::fields() {
            let column = if let Some(id) = def.id {
                identities += 1;
                match (id.column, def.column) {
                    (Some(column), _) | (None, ColumnAttr::Named(column)) => column.to_string(),
                    (None, ColumnAttr::Default | ColumnAttr::Ignore) => {
                        resolve_name(def.name, options)
                    }
                }
            } else {
                match def.column {
                    ColumnAttr::Ignore => continue,
                    ColumnAttr::Named(column) => column.to_string(),
                    ColumnAttr::Default => resolve_name(def.name, options),
                }
            };

            // an empty column name means the field is not persisted
            if column.is_empty() && def.id.is_none() {
                continue;
            }

            fields.push(FieldDescriptor {
                name: def.name,
                kind: def.kind,
                column,
                id: def.id.map(|id| id.strategy),
            });
        }

        if identities > 1 {
            return Err(format!("`{}` declares {identities} identity fields", type_name::<M>()));
        }

        Ok(Self { table, fields })
    }

    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Persistent fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The identity field, if the type declares one.
    #[must_use]
    pub fn identity(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.is_identity())
    }

    /// Look up a field by its resolved column name.
    #[must_use]
    pub fn field_for_column(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.column == column)
    }
}

fn resolve_name(name: &str, options: &OrmOptions) -> String {
    if options.map_underscore_to_camel_case { naming::to_snake(name) } else { name.to_string() }
}

/// Memoizes [`EntityDescriptor`]s by type.
///
/// Concurrent first requests for the same type run the introspection once;
/// every caller receives the same `Arc`. Entries are never evicted.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    options: OrmOptions,
    entries: Cache<TypeId, Arc<EntityDescriptor>>,
}

impl MetadataCache {
    #[must_use]
    pub fn new(options: OrmOptions) -> Self {
        Self {
            options,
            entries: Cache::builder().build(),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &OrmOptions {
        &self.options
    }

    /// Describe an entity type, introspecting it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the type has no table declaration
    /// or more than one identity field.
    pub fn describe<M: Entity>(&self) -> Result<Arc<EntityDescriptor>> {
        self.entries
            .try_get_with(TypeId::of::<M>(), || {
                let descriptor = EntityDescriptor::build::<M>(&self.options)?;
                tracing::debug!(
                    entity = type_name::<M>(),
                    table = descriptor.table,
                    field_count = descriptor.fields.len(),
                    "described entity"
                );
                Ok::<_, String>(Arc::new(descriptor))
            })
            .map_err(|reason| Error::Configuration(reason.to_string()))
    }
}
