use sea_query::{Alias, SimpleExpr};

use crate::condition::Condition;
use crate::config::Dialect;
use crate::entity::values_to_datatypes;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::query::Query;
use crate::schema::Schema;
use crate::table::Table;

/// Builder for constructing UPDATE queries.
///
/// Without a condition the statement updates every row of the table.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: Table,
    conditions: Vec<Condition>,
    dialect: Dialect,
}

impl UpdateBuilder {
    /// Creates a new UPDATE query builder.
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self {
            table,
            conditions: Vec::new(),
            dialect: Dialect::Postgres,
        }
    }

    #[must_use]
    pub const fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Adds a WHERE clause condition.
    #[must_use]
    pub fn r#where(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Build the UPDATE query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if there is nothing to set, a resolution
    /// error for conditions outside the table, or [`Error::Type`] for values
    /// that cannot be bound.
    pub fn build(&self) -> Result<Query> {
        let mut schema = Schema::default();
        let mut statement = sea_query::Query::update();

        let index = schema.add_table(self.table.name());
        for column in self.table.column_list() {
            schema.add_column(index, column.name());
        }
        statement.table(Alias::new(self.table.name()));
        schema.wire(index);

        let writes = schema.add_writes(index, self.table.update_list());
        if writes.is_empty() {
            return Err(Error::Validation(format!(
                "UPDATE of `{}` sets no columns",
                self.table.name()
            )));
        }
        for (column, value) in writes {
            statement.value(Alias::new(column), SimpleExpr::Value(value));
        }

        for condition in &self.conditions {
            for expr in schema.resolve_condition(condition, false)? {
                statement.and_where(expr);
            }
        }

        schema.validate()?;

        let (sql, values) = statement.build(self.dialect.builder());
        let params = values_to_datatypes(values)?;

        tracing::debug!(
            table = self.table.name(),
            sql = %sql,
            param_count = params.len(),
            "UpdateBuilder generated SQL"
        );

        Ok(Query { sql, params })
    }

    /// Build and run the update, returning the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns any build error, or [`Error::Gateway`] if execution fails.
    pub fn execute(&self, gateway: &dyn Gateway) -> Result<u64> {
        let query = self.build()?;
        Ok(gateway.exec(&query.sql, &query.params)?)
    }
}
