//! Tables and columns registered during one statement assembly.

use sea_query::{Alias, ColumnRef, IntoIden, SimpleExpr, Value};

use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::table::Update;

#[derive(Debug)]
struct Registered {
    name: String,
    columns: Vec<String>,
    wired: bool,
}

/// Registry of what a statement references.
///
/// Registration is idempotent per table and per `(table, column)`, so a
/// column listed twice is projected once. A table becomes wired once it is
/// part of the outer statement (`FROM`, `JOIN`, `INTO` or the `UPDATE`
/// target).
#[derive(Debug, Default)]
pub(crate) struct Schema {
    tables: Vec<Registered>,
}

impl Schema {
    pub(crate) fn add_table(&mut self, name: &str) -> usize {
        if let Some(index) = self.find_table(name) {
            return index;
        }
        self.tables.push(Registered {
            name: name.to_string(),
            columns: Vec::new(),
            wired: false,
        });
        self.tables.len() - 1
    }

    /// Returns `true` when the column was not yet registered on the table.
    pub(crate) fn add_column(&mut self, table: usize, column: &str) -> bool {
        let Some(registered) = self.tables.get_mut(table) else {
            return false;
        };
        if registered.columns.iter().any(|existing| existing == column) {
            return false;
        }
        registered.columns.push(column.to_string());
        true
    }

    pub(crate) fn find_table(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|table| table.name == name)
    }

    pub(crate) fn wire(&mut self, table: usize) {
        if let Some(registered) = self.tables.get_mut(table) {
            registered.wired = true;
        }
    }

    /// Register the columns of a write set. A column assigned twice keeps its
    /// first position and its last value.
    pub(crate) fn add_writes(&mut self, table: usize, updates: &[Update]) -> Vec<(String, Value)> {
        let mut writes: Vec<(String, Value)> = Vec::with_capacity(updates.len());
        for update in updates {
            if self.add_column(table, &update.column) {
                writes.push((update.column.clone(), update.value.clone()));
            } else if let Some((_, value)) =
                writes.iter_mut().find(|(column, _)| *column == update.column)
            {
                *value = update.value.clone();
            } else {
                writes.push((update.column.clone(), update.value.clone()));
            }
        }
        writes
    }

    /// Resolve a `(table, column)` pair to a column reference.
    ///
    /// # Errors
    ///
    /// [`Error::ConditionResolution`] if the table is not registered, or
    /// [`Error::ColumnResolution`] if the column is not registered on it.
    pub(crate) fn resolve(&self, table: &str, column: &str, qualified: bool) -> Result<ColumnRef> {
        let Some(index) = self.find_table(table) else {
            return Err(Error::ConditionResolution(table.to_string()));
        };
        if !self.tables[index].columns.iter().any(|existing| existing == column) {
            return Err(Error::ColumnResolution {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        Ok(if qualified { table_column(table, column) } else { plain_column(column) })
    }

    /// Resolve every predicate of a condition into an expression.
    pub(crate) fn resolve_condition(
        &self, condition: &Condition, qualified: bool,
    ) -> Result<Vec<SimpleExpr>> {
        condition
            .predicates()
            .iter()
            .map(|predicate| {
                let column = self.resolve(condition.table(), &predicate.column, qualified)?;
                predicate.to_expr(column)
            })
            .collect()
    }

    /// Check that every registered table is part of the outer statement.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(table) = self.tables.iter().find(|table| !table.wired) {
            return Err(Error::Validation(format!(
                "table `{}` is referenced but not part of the statement",
                table.name
            )));
        }
        Ok(())
    }
}

pub(crate) fn table_column(table: &str, column: &str) -> ColumnRef {
    ColumnRef::TableColumn(Alias::new(table).into_iden(), Alias::new(column).into_iden())
}

pub(crate) fn plain_column(column: &str) -> ColumnRef {
    ColumnRef::Column(Alias::new(column).into_iden())
}
