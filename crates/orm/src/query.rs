use sea_query::backend::{
    EscapeBuilder, OperLeftAssocDecider, PrecedenceDecider, QuotedBuilder, TableRefBuilder,
};
use sea_query::prepare::SqlWriter;
use sea_query::{BinOper, Oper, Quote, SimpleExpr, SubQueryStatement, Value};

use crate::config::Dialect;
use crate::gateway::DataType;

/// A rendered, validated statement ready for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub params: Vec<DataType>,
}

/// Statement renderer configured for one [`Dialect`].
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    pub quote: Quote,
    pub placeholder: &'static str, // "?" or "$"
    pub numbered: bool,            // false for "?", true for "$1, $2, ..."
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::for_dialect(Dialect::default())
    }
}

impl QueryBuilder {
    /// Quoting and placeholder style for the given dialect.
    #[must_use]
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Postgres => Self {
                quote: Quote::new(b'"'),
                placeholder: "$",
                numbered: true,
            },
            Dialect::Sqlite => Self {
                quote: Quote::new(b'"'),
                placeholder: "?",
                numbered: false,
            },
            Dialect::MySql => Self {
                quote: Quote::new(b'`'),
                placeholder: "?",
                numbered: false,
            },
        }
    }
}

impl QuotedBuilder for QueryBuilder {
    fn quote(&self) -> Quote {
        self.quote
    }
}

impl EscapeBuilder for QueryBuilder {}

impl TableRefBuilder for QueryBuilder {}

impl OperLeftAssocDecider for QueryBuilder {
    fn well_known_left_associative(&self, op: &BinOper) -> bool {
        // Same set as sea-query 0.32.7 `common_well_known_left_associative`
        matches!(
            op,
            BinOper::And | BinOper::Or | BinOper::Add | BinOper::Sub | BinOper::Mul | BinOper::Mod
        )
    }
}

impl PrecedenceDecider for QueryBuilder {
    fn inner_expr_well_known_greater_precedence(
        &self, _inner: &SimpleExpr, _outer_oper: &Oper,
    ) -> bool {
        // Always parenthesise nested expressions
        false
    }
}

impl sea_query::backend::QueryBuilder for QueryBuilder {
    fn prepare_query_statement(&self, query: &SubQueryStatement, sql: &mut dyn SqlWriter) {
        match query {
            SubQueryStatement::SelectStatement(s) => self.prepare_select_statement(s, sql),
            SubQueryStatement::InsertStatement(s) => self.prepare_insert_statement(s, sql),
            SubQueryStatement::UpdateStatement(s) => self.prepare_update_statement(s, sql),
            SubQueryStatement::DeleteStatement(s) => self.prepare_delete_statement(s, sql),
            SubQueryStatement::WithStatement(s) => self.prepare_with_query(s, sql),
        }
    }

    fn prepare_value(&self, value: &Value, sql: &mut dyn SqlWriter) {
        sql.push_param(value.clone(), self);
    }

    fn placeholder(&self) -> (&str, bool) {
        (self.placeholder, self.numbered)
    }
}

#[cfg(test)]
mod tests {
    use sea_query::{Alias, Expr};

    use super::*;

    fn render(dialect: Dialect) -> String {
        let (sql, _) = sea_query::Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("users"))
            .and_where(Expr::col(Alias::new("id")).eq(1))
            .build(QueryBuilder::for_dialect(dialect));
        sql
    }

    #[test]
    fn placeholders_follow_dialect() {
        assert_eq!(
            render(Dialect::Postgres),
            r#"SELECT "id" FROM "users" WHERE ("id") = ($1)"#
        );
        assert_eq!(
            render(Dialect::Sqlite),
            r#"SELECT "id" FROM "users" WHERE ("id") = (?)"#
        );
        assert_eq!(
            render(Dialect::MySql),
            "SELECT `id` FROM `users` WHERE (`id`) = (?)"
        );
    }
}
