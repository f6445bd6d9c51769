//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use quill_orm::{DataType, Field, Gateway, Orm, OrmOptions, Query, Row, entity};

// Common test entities used across multiple test files

entity! {
    table = "users",
    id = id(DatabaseAssigned),
    columns = [email => "mail"],
    ignore = [session],
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct User {
        pub id: Option<i64>,
        pub user_name: Option<String>,
        pub email: Option<String>,
        pub age: Option<i32>,
        pub session: Option<String>,
    }
}

entity! {
    table = "accounts",
    id = account_id(Random, "id"),
    #[derive(Debug, Clone, Default)]
    pub struct Account {
        pub account_id: Option<String>,
        pub owner: Option<String>,
    }
}

entity! {
    table = "orders",
    id = id(DatabaseAssigned),
    #[derive(Debug, Clone, Default)]
    pub struct Purchase {
        pub id: Option<i32>,
        pub user_id: Option<i64>,
        pub total: Option<f64>,
    }
}

entity! {
    table = "audit_log",
    #[derive(Debug, Clone, Default)]
    pub struct AuditEntry {
        pub message: Option<String>,
        pub level: Option<i32>,
    }
}

/// In-memory gateway recording every statement it is handed.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    statements: Mutex<Vec<Query>>,
    rows: Mutex<Vec<Row>>,
    affected: Mutex<u64>,
    key: Mutex<Option<i64>>,
}

impl RecordingGateway {
    pub fn new(affected: u64, key: Option<i64>) -> Arc<Self> {
        Arc::new(Self {
            affected: Mutex::new(affected),
            key: Mutex::new(key),
            ..Self::default()
        })
    }

    pub fn with_rows(rows: Vec<Row>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            ..Self::default()
        })
    }

    pub fn statements(&self) -> Vec<Query> {
        self.statements.lock().clone()
    }

    pub fn last(&self) -> Query {
        self.statements.lock().last().cloned().expect("no statement executed")
    }

    fn record(&self, sql: &str, params: &[DataType]) {
        self.statements.lock().push(Query {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

impl Gateway for RecordingGateway {
    fn query(&self, sql: &str, params: &[DataType]) -> anyhow::Result<Vec<Row>> {
        self.record(sql, params);
        Ok(self.rows.lock().clone())
    }

    fn exec(&self, sql: &str, params: &[DataType]) -> anyhow::Result<u64> {
        self.record(sql, params);
        Ok(*self.affected.lock())
    }

    fn exec_returning_key(
        &self, sql: &str, params: &[DataType],
    ) -> anyhow::Result<(u64, Option<i64>)> {
        self.record(sql, params);
        Ok((*self.affected.lock(), *self.key.lock()))
    }
}

pub fn orm(gateway: &Arc<RecordingGateway>) -> Orm {
    let gateway: Arc<dyn Gateway> = Arc::<RecordingGateway>::clone(gateway);
    Orm::new(OrmOptions::default(), gateway)
}

pub fn row(fields: &[(&str, DataType)]) -> Row {
    Row {
        fields: fields
            .iter()
            .map(|(name, value)| Field {
                name: (*name).to_string(),
                value: value.clone(),
            })
            .collect(),
    }
}

/// Normalize SQL by collapsing whitespace.
fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize SQL for comparison by removing identifier quotes and normalizing whitespace.
/// Preserves quotes inside string literals.
fn canonicalize_sql(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut in_single_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_single_quote = !in_single_quote;
                cleaned.push(ch);
            }
            '"' if !in_single_quote => {
                // Strip identifier quoting to avoid brittle comparisons.
            }
            _ => cleaned.push(ch),
        }
    }

    normalize_sql(&cleaned)
}

/// Assert that SQL contains all expected fragments in order.
///
/// This helper normalizes SQL to avoid brittle exact-string matching with ``SeaQuery`` output.
/// It strips identifier quotes, normalizes whitespace, and checks that fragments appear
/// sequentially in the generated SQL.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_contains(actual: &str, fragments: &[&str]) {
    let actual_canonical = canonicalize_sql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment_canonical = canonicalize_sql(fragment);
        if fragment_canonical.is_empty() {
            continue;
        }

        if let Some(pos) = actual_canonical[search_start..].find(&fragment_canonical) {
            search_start += pos + fragment_canonical.len();
        } else {
            panic!(
                "expected SQL fragment `{fragment_canonical}` not found in `{actual_canonical}`"
            );
        }
    }
}
