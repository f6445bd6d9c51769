use sea_query::{Alias, SimpleExpr};

use crate::config::Dialect;
use crate::entity::values_to_datatypes;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::query::Query;
use crate::schema::Schema;
use crate::table::Table;

/// Builder for constructing INSERT queries from a table's assignments.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: Table,
    capture_key: bool,
    dialect: Dialect,
}

impl InsertBuilder {
    /// Creates a new INSERT query builder.
    #[must_use]
    pub fn new(table: Table) -> Self {
        Self {
            table,
            capture_key: false,
            dialect: Dialect::default(),
        }
    }

    #[must_use]
    pub const fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Ask the gateway for the key the database generates for the new row.
    #[must_use]
    pub const fn capture_key(mut self) -> Self {
        self.capture_key = true;
        self
    }

    /// The target table, holding the generated key after
    /// [`InsertBuilder::execute`].
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }

    /// Build the INSERT query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if there is nothing to insert, or
    /// [`Error::Type`] for values that cannot be bound.
    pub fn build(&self) -> Result<Query> {
        let mut schema = Schema::default();
        let mut statement = sea_query::Query::insert();

        let index = schema.add_table(self.table.name());
        for column in self.table.column_list() {
            schema.add_column(index, column.name());
        }
        statement.into_table(Alias::new(self.table.name()));
        schema.wire(index);

        let writes = schema.add_writes(index, self.table.update_list());
        if writes.is_empty() {
            return Err(Error::Validation(format!(
                "INSERT into `{}` has no values",
                self.table.name()
            )));
        }

        schema.validate()?;

        let (columns, row): (Vec<_>, Vec<_>) = writes
            .into_iter()
            .map(|(column, value)| (Alias::new(column), SimpleExpr::Value(value)))
            .unzip();
        statement.columns(columns);
        statement.values(row).map_err(|e| Error::Validation(e.to_string()))?;

        let (sql, values) = statement.build(self.dialect.builder());
        let params = values_to_datatypes(values)?;

        tracing::debug!(
            table = self.table.name(),
            sql = %sql,
            param_count = params.len(),
            "InsertBuilder generated SQL"
        );

        Ok(Query { sql, params })
    }

    /// Build and run the insert, returning the number of affected rows. When
    /// a key capture was requested the generated key is stored on the table.
    ///
    /// # Errors
    ///
    /// Returns any build error, or [`Error::Gateway`] if execution fails.
    pub fn execute(&mut self, gateway: &dyn Gateway) -> Result<u64> {
        let query = self.build()?;
        if !self.capture_key {
            return Ok(gateway.exec(&query.sql, &query.params)?);
        }

        let (affected, key) = gateway.exec_returning_key(&query.sql, &query.params)?;
        self.table.set_generated_key(key);
        Ok(affected)
    }
}
