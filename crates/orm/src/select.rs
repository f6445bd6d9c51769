use sea_query::{Alias, Expr, Func, Order as SortOrder, SimpleExpr};

use crate::condition::Condition;
use crate::config::Dialect;
use crate::entity::{Entity, values_to_datatypes};
use crate::error::{Error, Result};
use crate::gateway::{Gateway, Row};
use crate::mapper;
use crate::metadata::MetadataCache;
use crate::query::Query;
use crate::schema::{Schema, table_column};
use crate::table::{Column, Order, SqlFunction, Table};

/// Builder for constructing SELECT queries.
///
/// Join tables are linked to the statement through their single
/// foreign-key column; conditions and orderings may only reference tables
/// that are part of the statement.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: Table,
    joins: Vec<Table>,
    conditions: Vec<Condition>,
    order: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
    dialect: Dialect,
}

impl SelectBuilder {
    /// Creates a new SELECT query builder over the primary table.
    #[must_use]
    pub fn new(table: Table) -> Self {
        Self {
            table,
            joins: Vec::new(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            dialect: Dialect::default(),
        }
    }

    #[must_use]
    pub const fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Joins a table. It must carry exactly one column declared with
    /// [`Column::references`] pointing at a table already in the statement.
    #[must_use]
    pub fn join(mut self, table: Table) -> Self {
        self.joins.push(table);
        self
    }

    /// Adds a WHERE clause condition.
    #[must_use]
    pub fn r#where(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    /// Sets the maximum number of rows to return.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Build the SELECT query.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if a join, condition or ordering cannot be
    /// tied to the statement's tables, [`Error::Validation`] if no column is
    /// projected, or [`Error::Type`] for values that cannot be bound.
    pub fn build(&self) -> Result<Query> {
        let mut schema = Schema::default();
        let mut statement = sea_query::Query::select();
        let mut projection: Vec<(&str, &Column)> = Vec::new();

        let primary = schema.add_table(self.table.name());
        for column in self.table.column_list() {
            if schema.add_column(primary, column.name()) {
                projection.push((self.table.name(), column));
            }
        }
        statement.from(Alias::new(self.table.name()));
        schema.wire(primary);

        for join in &self.joins {
            let index = schema.add_table(join.name());
            for column in join.column_list() {
                if schema.add_column(index, column.name()) {
                    projection.push((join.name(), column));
                }
            }

            let on = resolve_join(&mut schema, join)?;
            statement.join(join.join().into(), Alias::new(join.name()), on);
            schema.wire(index);
        }

        if projection.is_empty() {
            return Err(Error::Validation(format!(
                "no columns to select from `{}`",
                self.table.name()
            )));
        }

        for (table, column) in projection {
            let expr: SimpleExpr = match column.function() {
                Some(SqlFunction::Count) => {
                    Func::count(Expr::col(table_column(table, column.name()))).into()
                }
                None => Expr::col(table_column(table, column.name())).into(),
            };
            match column.alias_name() {
                Some(alias) => statement.expr_as(expr, Alias::new(alias)),
                None => statement.expr(expr),
            };
        }

        for condition in &self.conditions {
            for expr in schema.resolve_condition(condition, true)? {
                statement.and_where(expr);
            }
        }

        for order in &self.order {
            let column = schema.resolve(&order.table, &order.column, true)?;
            let direction = if order.ascending { SortOrder::Asc } else { SortOrder::Desc };
            statement.order_by(column, direction);
        }

        if let Some(limit) = self.limit {
            statement.limit(limit);
        }

        if let Some(offset) = self.offset {
            statement.offset(offset);
        }

        schema.validate()?;

        let (sql, values) = statement.build(self.dialect.builder());
        let params = values_to_datatypes(values)?;

        tracing::debug!(
            table = self.table.name(),
            sql = %sql,
            param_count = params.len(),
            "SelectBuilder generated SQL"
        );

        Ok(Query { sql, params })
    }

    /// Build and run the query, returning raw rows keyed by column name
    /// (or alias).
    ///
    /// # Errors
    ///
    /// Returns any build error, or [`Error::Gateway`] if execution fails.
    pub fn fetch(&self, gateway: &dyn Gateway) -> Result<Vec<Row>> {
        let query = self.build()?;
        Ok(gateway.query(&query.sql, &query.params)?)
    }

    /// Build and run the query, decoding each row into an entity.
    ///
    /// # Errors
    ///
    /// Returns any [`SelectBuilder::fetch`] error, or [`Error::Decode`] if a
    /// row does not fit the entity.
    pub fn fetch_as<M: Entity>(
        &self, gateway: &dyn Gateway, metadata: &MetadataCache,
    ) -> Result<Vec<M>> {
        let descriptor = metadata.describe::<M>()?;
        self.fetch(gateway)?
            .into_iter()
            .map(|row| mapper::map_row(&descriptor, metadata.options(), row))
            .collect()
    }
}

/// Link a join table to the statement and return the `ON` predicate
/// `referenced_table.referenced_column = join_table.fk_column`.
fn resolve_join(schema: &mut Schema, join: &Table) -> Result<SimpleExpr> {
    let failure = |reason: String| Error::JoinResolution {
        table: join.name().to_string(),
        reason,
    };

    let mut keys = join
        .column_list()
        .iter()
        .filter_map(|column| column.foreign_key().map(|pointer| (column, pointer)));
    let Some((column, pointer)) = keys.next() else {
        return Err(failure("no column declares a foreign key".to_string()));
    };
    if keys.next().is_some() {
        return Err(failure("more than one column declares a foreign key".to_string()));
    }

    let Some((ref_table, ref_column)) = pointer.parse() else {
        return Err(failure(format!("malformed foreign key `{pointer}`")));
    };
    let referenced = match schema.find_table(ref_table) {
        Some(index) if ref_table != join.name() => index,
        _ => {
            return Err(failure(format!("referenced table `{ref_table}` is not in the statement")));
        }
    };
    schema.add_column(referenced, ref_column);

    Ok(Expr::col(table_column(ref_table, ref_column))
        .equals(table_column(join.name(), column.name())))
}
