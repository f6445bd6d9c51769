//! Query model: tables, columns and orderings describing one statement.

use std::fmt;

use sea_query::{JoinType, Value};

use crate::condition::Condition;
use crate::mapper;
use crate::metadata::EntityDescriptor;

/// A `table.column` pointer identifying the column a join column references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey(String);

impl ForeignKey {
    #[must_use]
    pub fn new(table: &str, column: &str) -> Self {
        Self(format!("{table}.{column}"))
    }

    /// Split the pointer into `(table, column)`.
    #[must_use]
    pub fn parse(&self) -> Option<(&str, &str)> {
        let (table, column) = self.0.split_once('.')?;
        if table.is_empty() || column.is_empty() {
            return None;
        }
        Some((table, column))
    }
}

impl From<&str> for ForeignKey {
    fn from(pointer: &str) -> Self {
        Self(pointer.to_string())
    }
}

impl From<String> for ForeignKey {
    fn from(pointer: String) -> Self {
        Self(pointer)
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aggregate functions that can wrap a projected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlFunction {
    Count,
}

/// What a column does besides naming a value. A column is either a join
/// column or an aggregate, never both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnRole {
    #[default]
    Plain,
    ForeignKey(ForeignKey),
    Function(SqlFunction),
}

/// A column reference in the query model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    alias: Option<String>,
    primary_key: bool,
    role: ColumnRole,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            primary_key: false,
            role: ColumnRole::Plain,
        }
    }

    /// Mark the column as the table's primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Project the column under another name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Declare the column a join column referencing `table.column`. Replaces
    /// any aggregate set with [`Column::count`].
    #[must_use]
    pub fn references(mut self, pointer: impl Into<ForeignKey>) -> Self {
        self.role = ColumnRole::ForeignKey(pointer.into());
        self
    }

    /// Project `COUNT(column)`. Replaces any foreign-key pointer.
    #[must_use]
    pub fn count(mut self) -> Self {
        self.role = ColumnRole::Function(SqlFunction::Count);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[must_use]
    pub const fn foreign_key(&self) -> Option<&ForeignKey> {
        match &self.role {
            ColumnRole::ForeignKey(pointer) => Some(pointer),
            _ => None,
        }
    }

    #[must_use]
    pub const fn function(&self) -> Option<SqlFunction> {
        match self.role {
            ColumnRole::Function(function) => Some(function),
            _ => None,
        }
    }
}

/// A column assignment for `INSERT` or `UPDATE`.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub column: String,
    pub value: Value,
}

impl Update {
    #[must_use]
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Join types supported when a table is joined into a `SELECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => Self::InnerJoin,
            JoinKind::Left => Self::LeftJoin,
            JoinKind::Right => Self::RightJoin,
        }
    }
}

/// An ordering on a table's column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub table: String,
    pub column: String,
    pub ascending: bool,
}

/// A table taking part in one statement. Built fresh for every statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    updates: Vec<Update>,
    join: JoinKind,
    generated_key: Option<i64>,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A table carrying every persistent column of an entity, with the
    /// identity column marked as primary key.
    #[must_use]
    pub fn of(descriptor: &EntityDescriptor) -> Self {
        Self::new(descriptor.table()).columns(mapper::resolve_for_read(descriptor).columns)
    }

    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Assign a column for `INSERT` or `UPDATE`.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.updates.push(Update::new(column, value));
        self
    }

    #[must_use]
    pub fn updates(mut self, updates: impl IntoIterator<Item = Update>) -> Self {
        self.updates.extend(updates);
        self
    }

    /// How this table is joined when used as a join table.
    #[must_use]
    pub const fn join_kind(mut self, kind: JoinKind) -> Self {
        self.join = kind;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn column_list(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn update_list(&self) -> &[Update] {
        &self.updates
    }

    #[must_use]
    pub const fn join(&self) -> JoinKind {
        self.join
    }

    /// The key generated by the database for the last insert into this
    /// table, when one was requested.
    #[must_use]
    pub const fn generated_key(&self) -> Option<i64> {
        self.generated_key
    }

    pub(crate) const fn set_generated_key(&mut self, key: Option<i64>) {
        self.generated_key = key;
    }

    /// A pointer to one of this table's columns, for use with
    /// [`Column::references`].
    #[must_use]
    pub fn foreign_key(&self, column: &str) -> ForeignKey {
        ForeignKey::new(&self.name, column)
    }

    /// An empty condition scoped to this table.
    #[must_use]
    pub fn new_condition(&self) -> Condition {
        Condition::new(self.name.clone())
    }

    #[must_use]
    pub fn new_order(&self, column: impl Into<String>, ascending: bool) -> Order {
        Order {
            table: self.name.clone(),
            column: column.into(),
            ascending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_key_pointer() {
        let users = Table::new("users");
        let pointer = users.foreign_key("id");
        assert_eq!(pointer.to_string(), "users.id");
        assert_eq!(pointer.parse(), Some(("users", "id")));

        assert_eq!(ForeignKey::from("users").parse(), None);
        assert_eq!(ForeignKey::from(".id").parse(), None);
    }

    #[test]
    fn column_roles_are_exclusive() {
        let column = Column::new("user_id").count().references("users.id");
        assert!(column.function().is_none());
        assert_eq!(column.foreign_key(), Some(&ForeignKey::from("users.id")));

        let column = Column::new("user_id").references("users.id").count();
        assert!(column.foreign_key().is_none());
        assert_eq!(column.function(), Some(SqlFunction::Count));
    }

    #[test]
    fn table_scoped_helpers() {
        let orders = Table::new("orders").join_kind(JoinKind::Left);
        assert_eq!(orders.join(), JoinKind::Left);
        assert_eq!(orders.new_condition().table(), "orders");

        let order = orders.new_order("created_at", false);
        assert_eq!(order.table, "orders");
        assert!(!order.ascending);
        assert_eq!(JoinType::from(JoinKind::Right), JoinType::RightJoin);
    }
}
