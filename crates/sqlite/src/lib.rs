//! `SQLite` gateway for the quill mapping layer.
//!
//! A single shared connection guarded by a mutex; statements run one at a
//! time. Intended for development, tests and embedded use.

#![allow(clippy::significant_drop_tightening)]

use std::sync::Arc;

use anyhow::{Context, Result};
use fromenv::FromEnv;
use parking_lot::Mutex;
use quill_orm::{DataType, Field, Gateway, Row};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, params_from_iter};
use tracing::instrument;

/// Options used to open the `SQLite` database.
///
/// Loaded from environment variables.
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Database file path, or `:memory:`.
    #[env(from = "QUILL_SQLITE_DATABASE", default = ":memory:")]
    pub database: String,
}

impl quill_orm::FromEnv for ConnectOptions {
    fn from_env() -> Result<Self> {
        Self::from_env().finalize().context("issue loading connection options")
    }
}

/// [`Gateway`] backed by `rusqlite`.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    // rusqlite::Connection isn't `Sync`
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGateway {
    /// Open the database named in `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    #[instrument]
    pub fn connect_with(options: &ConnectOptions) -> Result<Self> {
        tracing::debug!("initializing SQLite connection to: {}", options.database);
        let conn = Connection::open(&options.database).context("failed to open SQLite database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database named by the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the database cannot be
    /// opened.
    pub fn connect() -> Result<Self> {
        let options = <ConnectOptions as quill_orm::FromEnv>::from_env()?;
        Self::connect_with(&options)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn in_memory() -> Result<Self> {
        Self::connect_with(&ConnectOptions {
            database: ":memory:".to_string(),
        })
    }

    /// Run one or more `;`-separated statements without parameters, such as
    /// schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing batch: {}", sql);
        self.conn.lock().execute_batch(sql).context("failed to execute batch")
    }
}

impl Gateway for SqliteGateway {
    fn query(&self, sql: &str, params: &[DataType]) -> Result<Vec<Row>> {
        tracing::debug!("executing query: {}", sql);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql).context("failed to prepare statement")?;

        let column_names: Vec<String> =
            stmt.column_names().iter().map(ToString::to_string).collect();

        let mut rows =
            stmt.query(params_from_iter(bind(params)?)).context("failed to execute query")?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().context("failed to fetch row")? {
            let mut fields = Vec::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                let value = row.get_ref(i).context("failed to get column value")?;
                fields.push(Field {
                    name: name.clone(),
                    value: value_to_datatype(value)?,
                });
            }
            result.push(Row { fields });
        }

        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[DataType]) -> Result<u64> {
        tracing::debug!("executing statement: {}", sql);
        let conn = self.conn.lock();
        let affected = conn
            .execute(sql, params_from_iter(bind(params)?))
            .context("failed to execute statement")?;
        Ok(affected as u64)
    }

    fn exec_returning_key(&self, sql: &str, params: &[DataType]) -> Result<(u64, Option<i64>)> {
        tracing::debug!("executing insert: {}", sql);
        let conn = self.conn.lock();
        let affected = conn
            .execute(sql, params_from_iter(bind(params)?))
            .context("failed to execute statement")?;

        // the rowid is only meaningful while the lock is held
        let key = (affected > 0).then(|| conn.last_insert_rowid());
        Ok((affected as u64, key))
    }
}

fn bind(params: &[DataType]) -> Result<Vec<Value>> {
    params.iter().map(datatype_to_value).collect()
}

fn datatype_to_value(data_type: &DataType) -> Result<Value> {
    let value = match data_type {
        DataType::Boolean(Some(b)) => Value::Integer(i64::from(*b)),
        DataType::Int32(Some(i)) => Value::Integer(i64::from(*i)),
        DataType::Int64(Some(i)) => Value::Integer(*i),
        DataType::Uint32(Some(u)) => Value::Integer(i64::from(*u)),
        DataType::Uint64(Some(u)) => Value::Integer(
            i64::try_from(*u).with_context(|| format!("{u} does not fit an SQLite integer"))?,
        ),
        DataType::Float(Some(f)) => Value::Real(f64::from(*f)),
        DataType::Double(Some(f)) => Value::Real(*f),
        DataType::Str(Some(s))
        | DataType::Date(Some(s))
        | DataType::Time(Some(s))
        | DataType::Timestamp(Some(s)) => Value::Text(s.clone()),
        DataType::Binary(Some(b)) => Value::Blob(b.clone()),
        // All None variants map to NULL
        _ => Value::Null,
    };
    Ok(value)
}

fn value_to_datatype(value: ValueRef) -> Result<DataType> {
    match value {
        ValueRef::Null => Ok(DataType::Str(None)),
        ValueRef::Integer(i) => Ok(DataType::Int64(Some(i))),
        ValueRef::Real(f) => Ok(DataType::Double(Some(f))),
        ValueRef::Text(t) => {
            let s = std::str::from_utf8(t).context("invalid UTF-8 in text value")?;
            Ok(DataType::Str(Some(s.to_string())))
        }
        ValueRef::Blob(b) => Ok(DataType::Binary(Some(b.to_vec()))),
    }
}
