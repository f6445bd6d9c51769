//! CRUD façade over the mapper, the statement builders and a gateway.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::condition::{Condition, Operand};
use crate::config::{FromEnv, OrmOptions};
use crate::delete::DeleteBuilder;
use crate::entity::{Entity, FetchValue, is_null};
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::insert::InsertBuilder;
use crate::mapper::{self, ReadColumns};
use crate::metadata::{EntityDescriptor, MetadataCache};
use crate::select::SelectBuilder;
use crate::table::{Column, Table};
use crate::update::UpdateBuilder;

const COUNT_ALIAS: &str = "count";

/// Wiring for the mapping layer: options, the metadata cache and the
/// gateway statements run through.
#[derive(Debug, Clone)]
pub struct Orm {
    metadata: MetadataCache,
    gateway: Arc<dyn Gateway>,
}

impl Orm {
    #[must_use]
    pub fn new(options: OrmOptions, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            metadata: MetadataCache::new(options),
            gateway,
        }
    }

    /// Wire the layer with [`OrmOptions`] loaded from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment holds invalid options.
    pub fn from_env(gateway: Arc<dyn Gateway>) -> anyhow::Result<Self> {
        Ok(Self::new(OrmOptions::from_env()?, gateway))
    }

    #[must_use]
    pub const fn options(&self) -> &OrmOptions {
        self.metadata.options()
    }

    #[must_use]
    pub const fn metadata(&self) -> &MetadataCache {
        &self.metadata
    }

    #[must_use]
    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    /// Describe an entity type.
    ///
    /// # Errors
    ///
    /// See [`MetadataCache::describe`].
    pub fn describe<M: Entity>(&self) -> Result<Arc<EntityDescriptor>> {
        self.metadata.describe::<M>()
    }

    /// A query-model table with every persistent column of `M`.
    ///
    /// # Errors
    ///
    /// See [`MetadataCache::describe`].
    pub fn table<M: Entity>(&self) -> Result<Table> {
        let descriptor = self.describe::<M>()?;
        Ok(Table::of(&descriptor))
    }

    /// A CRUD façade for `M`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `M` is not a valid entity.
    pub fn repository<M: Entity>(&self) -> Result<Repository<M>> {
        Repository::new(self.clone())
    }

    #[must_use]
    pub fn select(&self, table: Table) -> SelectBuilder {
        SelectBuilder::new(table).dialect(self.options().dialect)
    }

    #[must_use]
    pub fn insert(&self, table: Table) -> InsertBuilder {
        InsertBuilder::new(table).dialect(self.options().dialect)
    }

    #[must_use]
    pub fn update(&self, table: Table) -> UpdateBuilder {
        UpdateBuilder::new(table).dialect(self.options().dialect)
    }

    #[must_use]
    pub fn delete(&self, table: Table) -> DeleteBuilder {
        DeleteBuilder::new(table).dialect(self.options().dialect)
    }
}

/// CRUD operations for one entity type.
///
/// The identity column and the read columns are resolved once, when the
/// repository is created.
pub struct Repository<M: Entity> {
    orm: Orm,
    descriptor: Arc<EntityDescriptor>,
    read: ReadColumns,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Entity> Repository<M> {
    fn new(orm: Orm) -> Result<Self> {
        let descriptor = orm.describe::<M>()?;
        let read = mapper::resolve_for_read(&descriptor);
        Ok(Self {
            orm,
            descriptor,
            read,
            _marker: PhantomData,
        })
    }

    #[must_use]
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// The entity's table with its read columns.
    #[must_use]
    pub fn table(&self) -> Table {
        Table::new(self.descriptor.table()).columns(self.read.columns.iter().cloned())
    }

    /// An empty condition on the entity's table.
    #[must_use]
    pub fn condition(&self) -> Condition {
        Condition::new(self.descriptor.table())
    }

    fn id_column(&self) -> Result<&str> {
        self.read.id.as_deref().ok_or_else(|| {
            Error::Configuration(format!("`{}` has no identity field", self.descriptor.table()))
        })
    }

    /// Insert an entity, returning the number of rows inserted (0 or 1).
    ///
    /// A `Random` identity is generated and set before the insert. A
    /// `DatabaseAssigned` identity is populated from the generated key once
    /// the row is inserted, and left untouched otherwise.
    ///
    /// # Errors
    ///
    /// Returns any mapping, build or gateway error. Nothing is executed when
    /// the statement cannot be built.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn insert(&self, instance: &mut M) -> Result<u64> {
        let plan = mapper::resolve_for_insert(&self.descriptor, instance)?;
        let mut builder = self.orm.insert(self.table().updates(plan.updates));
        if plan.capture.is_some() {
            builder = builder.capture_key();
        }

        if builder.execute(self.orm.gateway())? == 0 {
            return Ok(0);
        }
        if let (Some(field), Some(key)) = (&plan.capture, builder.table().generated_key()) {
            mapper::set_identity(instance, field, key)?;
        }
        Ok(1)
    }

    /// Delete the row with the given identity value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the entity has no identity field,
    /// or any build or gateway error.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn delete_by_id(&self, id: impl Into<Operand>) -> Result<u64> {
        let condition = self.condition().eq(self.id_column()?, id);
        self.delete_where([condition])
    }

    /// Delete rows matching every condition.
    ///
    /// # Errors
    ///
    /// Returns any build or gateway error.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn delete_where(&self, conditions: impl IntoIterator<Item = Condition>) -> Result<u64> {
        conditions
            .into_iter()
            .fold(self.orm.delete(self.table()), DeleteBuilder::r#where)
            .execute(self.orm.gateway())
    }

    /// Delete **every row** of the table. Use [`Repository::delete_where`]
    /// to scope the statement.
    ///
    /// # Errors
    ///
    /// Returns any build or gateway error.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn delete_all(&self) -> Result<u64> {
        self.orm.delete(self.table()).execute(self.orm.gateway())
    }

    /// Write the entity's non-null fields to the row matching its current
    /// identity value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the entity has no identity field,
    /// [`Error::IllegalState`] if the instance's identity is unset, or any
    /// mapping, build or gateway error.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn update_by_id(&self, instance: &M) -> Result<u64> {
        let id_column = self.id_column()?;
        let plan = mapper::resolve_for_update(&self.descriptor, instance)?;
        let id = plan.id.ok_or_else(|| {
            Error::Configuration(format!("`{}` has no identity field", self.descriptor.table()))
        })?;
        if is_null(&id) {
            return Err(Error::IllegalState(format!(
                "`{}` cannot be updated by `{id_column}` while it is unset",
                self.descriptor.table()
            )));
        }

        self.orm
            .update(self.table().updates(plan.updates))
            .r#where(self.condition().eq(id_column, id))
            .execute(self.orm.gateway())
    }

    /// Write the entity's non-null, non-identity fields to rows matching
    /// every condition.
    ///
    /// # Errors
    ///
    /// Returns any mapping, build or gateway error.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn update_where(
        &self, instance: &M, conditions: impl IntoIterator<Item = Condition>,
    ) -> Result<u64> {
        let plan = mapper::resolve_for_update(&self.descriptor, instance)?;
        let builder = self.orm.update(self.table().updates(plan.updates));
        conditions.into_iter().fold(builder, UpdateBuilder::r#where).execute(self.orm.gateway())
    }

    /// Write the entity's non-null, non-identity fields to **every row** of
    /// the table. Use [`Repository::update_where`] to scope the statement.
    ///
    /// # Errors
    ///
    /// Returns any mapping, build or gateway error.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn update_all(&self, instance: &M) -> Result<u64> {
        self.update_where(instance, Vec::new())
    }

    /// Load the row with the given identity value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the entity has no identity field,
    /// or any build, gateway or decode error.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn select_by_id(&self, id: impl Into<Operand>) -> Result<Option<M>> {
        let condition = self.condition().eq(self.id_column()?, id);
        Ok(self.select_list([condition])?.into_iter().next())
    }

    /// Load every row matching all conditions.
    ///
    /// # Errors
    ///
    /// Returns any build, gateway or decode error.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn select_list(&self, conditions: impl IntoIterator<Item = Condition>) -> Result<Vec<M>> {
        conditions
            .into_iter()
            .fold(self.orm.select(self.table()), SelectBuilder::r#where)
            .fetch_as::<M>(self.orm.gateway(), self.orm.metadata())
    }

    /// Count the rows of the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the entity has no columns, or any
    /// build, gateway or decode error.
    #[tracing::instrument(skip_all, fields(table = self.descriptor.table()))]
    pub fn count(&self) -> Result<u64> {
        let Some(column) =
            self.read.id.as_deref().or_else(|| self.read.columns.first().map(Column::name))
        else {
            return Err(Error::Validation(format!(
                "`{}` has no columns to count",
                self.descriptor.table()
            )));
        };

        let table = Table::new(self.descriptor.table())
            .column(Column::new(column).count().alias(COUNT_ALIAS));
        let rows = self.orm.select(table).fetch(self.orm.gateway())?;
        match rows.first() {
            Some(row) => u64::fetch(row, COUNT_ALIAS).map_err(Error::Decode),
            None => Ok(0),
        }
    }
}
