//! Lightweight entity-to-SQL mapping.
//!
//! Declares persistent types with [`entity!`], turns them into
//! `SELECT`/`INSERT`/`UPDATE`/`DELETE` statements rendered by ``SeaQuery``,
//! and runs those statements through a [`Gateway`].
//!
//! # Quick Start
//!
//! ## Define an Entity
//!
//! ```ignore
//! entity! {
//!     table = "users",
//!     id = id(DatabaseAssigned),
//!     columns = [email => "mail"],
//!     ignore = [session],
//!     #[derive(Debug, Clone, Default)]
//!     pub struct User {
//!         pub id: Option<i64>,
//!         pub user_name: Option<String>,
//!         pub email: Option<String>,
//!         pub session: Option<String>,
//!     }
//! }
//! ```
//!
//! ## CRUD Operations
//!
//! ```ignore
//! let orm = Orm::new(OrmOptions::default(), Arc::new(gateway));
//! let users = orm.repository::<User>()?;
//!
//! let mut user = User { user_name: Some("ann".into()), ..User::default() };
//! users.insert(&mut user)?;              // user.id now holds the generated key
//!
//! let found = users.select_by_id(user.id)?;
//! let active = users.select_list([users.condition().not_null("mail").like("user_name", "an")])?;
//!
//! user.email = Some("ann@example.com".into());
//! users.update_by_id(&user)?;
//! users.delete_by_id(user.id)?;
//! ```
//!
//! `delete_all` and `update_all` have no `WHERE` clause and touch every row
//! of the table; use `delete_where` / `update_where` to scope them.
//!
//! ## Joins
//!
//! ```ignore
//! let users = Table::new("users").column(Column::new("id")).column(Column::new("name"));
//! let orders = Table::new("orders")
//!     .column(Column::new("id").alias("order_id"))
//!     .column(Column::new("user_id").references(users.foreign_key("id")))
//!     .join_kind(JoinKind::Left);
//!
//! let rows = orm
//!     .select(users.clone())
//!     .join(orders)
//!     .r#where(users.new_condition().eq("id", 123))
//!     .order_by(users.new_order("name", true))
//!     .fetch(orm.gateway())?;
//! // SELECT "users"."id", "users"."name", "orders"."id" AS "order_id", "orders"."user_id"
//! // FROM "users" LEFT JOIN "orders" ON ("users"."id") = ("orders"."user_id")
//! // WHERE ("users"."id") = ($1) ORDER BY "users"."name" ASC
//! ```
//!
//! ## Custom Types
//!
//! ```ignore
//! impl FetchValue for UserId {
//!     fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
//!         let id: String = FetchValue::fetch(row, col)?;
//!         Ok(UserId(id))
//!     }
//! }
//! ```

mod condition;
mod config;
mod delete;
mod entity;
mod error;
mod gateway;
mod id;
mod insert;
pub mod mapper;
mod metadata;
pub mod naming;
mod query;
mod repository;
mod schema;
mod select;
mod table;
mod update;

pub use condition::{Condition, Operand, Operator, Predicate};
pub use config::{Dialect, FromEnv, OrmOptions};
pub use delete::DeleteBuilder;
pub use entity::{ColumnAttr, Entity, FetchValue, FieldDef, IdAttr, SqlType, ValueKind};
pub use error::{Error, Result};
pub use gateway::{DataType, Field, Gateway, Row};
pub use id::IdType;
pub use insert::InsertBuilder;
pub use metadata::{EntityDescriptor, FieldDescriptor, MetadataCache};
pub use query::{Query, QueryBuilder};
pub use repository::{Orm, Repository};
pub use select::SelectBuilder;
pub use table::{Column, ColumnRole, ForeignKey, JoinKind, Order, SqlFunction, Table, Update};
pub use update::UpdateBuilder;

// Re-exports for ``entity`` macro use only.
#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use sea_query::{Value, ValueType};

    use crate::entity::FieldDef;

    pub fn annotate(fields: &mut [FieldDef], name: &str, apply: impl FnOnce(FieldDef) -> FieldDef) {
        if let Some(field) = fields.iter_mut().find(|field| field.name == name) {
            *field = apply(*field);
        }
    }

    #[must_use]
    pub fn first(columns: &[&'static str]) -> Option<&'static str> {
        columns.first().copied()
    }
}
