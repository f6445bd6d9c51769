use sea_query::Alias;

use crate::condition::Condition;
use crate::config::Dialect;
use crate::entity::values_to_datatypes;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::query::Query;
use crate::schema::Schema;
use crate::table::Table;

/// Builder for constructing DELETE queries.
///
/// Without a condition the statement deletes every row of the table.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: Table,
    conditions: Vec<Condition>,
    dialect: Dialect,
}

impl DeleteBuilder {
    /// Creates a new DELETE query builder.
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

    /// Build the DELETE query.
    ///
    /// # Errors
    ///
    /// Returns a resolution error for conditions outside the table, or
    /// [`Error::Type`](crate::Error::Type) for values that cannot be bound.
    pub fn build(&self) -> Result<Query> {
        let mut schema = Schema::default();
        let mut statement = sea_query::Query::delete();

        let index = schema.add_table(self.table.name());
        for column in self.table.column_list() {
            schema.add_column(index, column.name());
        }
        statement.from_table(Alias::new(self.table.name()));
        schema.wire(index);

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
            "DeleteBuilder generated SQL"
        );

        Ok(Query { sql, params })
    }

    /// Build and run the delete, returning the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns any build error, or [`Error::Gateway`](crate::Error::Gateway)
    /// if execution fails.
    pub fn execute(&self, gateway: &dyn Gateway) -> Result<u64> {
        let query = self.build()?;
        Ok(gateway.exec(&query.sql, &query.params)?)
    }
}
