//! The execution seam between rendered statements and a database.

use std::fmt::Debug;

use anyhow::Result;

/// A SQL parameter or result value as exchanged with a [`Gateway`].
///
/// `None` payloads represent SQL `NULL`. Temporal values travel as text.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Boolean(Option<bool>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Uint32(Option<u32>),
    Uint64(Option<u64>),
    Float(Option<f32>),
    Double(Option<f64>),
    Str(Option<String>),
    Binary(Option<Vec<u8>>),
    Date(Option<String>),
    Time(Option<String>),
    Timestamp(Option<String>),
}

impl DataType {
    /// Whether the value is SQL `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Boolean(None)
                | Self::Int32(None)
                | Self::Int64(None)
                | Self::Uint32(None)
                | Self::Uint64(None)
                | Self::Float(None)
                | Self::Double(None)
                | Self::Str(None)
                | Self::Binary(None)
                | Self::Date(None)
                | Self::Time(None)
                | Self::Timestamp(None)
        )
    }
}

/// A named value in a result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: DataType,
}

/// A single result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub fields: Vec<Field>,
}

impl Row {
    /// Look up a field by column name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DataType> {
        self.fields.iter().find(|field| field.name == name).map(|field| &field.value)
    }
}

/// Gateways execute rendered SQL against a database.
///
/// Implementations own connection handling, timeouts and retries; the mapping
/// layer calls them synchronously, once per statement.
pub trait Gateway: Debug + Send + Sync {
    /// Execute a query and return the resulting rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn query(&self, sql: &str, params: &[DataType]) -> Result<Vec<Row>>;

    /// Execute a statement that does not return rows (`INSERT`, `UPDATE`,
    /// `DELETE`) and return the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn exec(&self, sql: &str, params: &[DataType]) -> Result<u64>;

    /// Execute an `INSERT` and capture the key generated by the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn exec_returning_key(&self, sql: &str, params: &[DataType]) -> Result<(u64, Option<i64>)>;
}
