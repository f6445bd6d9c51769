use anyhow::{anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_query::{Value, Values};

use crate::error::{Error, Result};
use crate::gateway::{DataType, Row};
use crate::id::IdType;

/// Trait for types that can be extracted from database rows.
///
/// This trait is implemented for all standard Rust types that can be
/// fetched from a database row (`i32`, `String`, `DateTime`, etc.).
pub trait FetchValue: Sized {
    /// Fetch a value from a row by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or the value cannot be converted to the target type.
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self>;
}

/// The declared value type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    Date,
    Timestamp,
    Json,
    /// A user-defined type; the mapper treats it as opaque.
    Other,
}

/// Types usable as entity fields report their [`ValueKind`].
pub trait SqlType {
    /// The kind of value stored in the column.
    const KIND: ValueKind;
}

macro_rules! sql_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl SqlType for $ty {
                const KIND: ValueKind = ValueKind::$kind;
            }
        )*
    };
}

sql_type! {
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    DateTime<Utc> => Timestamp,
    serde_json::Value => Json,
}

impl<T: SqlType> SqlType for Option<T> {
    const KIND: ValueKind = T::KIND;
}

/// Column naming declared on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAttr {
    /// Derive the column name from the field name.
    Default,
    /// Use the given column name.
    Named(&'static str),
    /// The field is not persisted.
    Ignore,
}

/// Identity declaration on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAttr {
    /// How the identity value is produced on insert.
    pub strategy: IdType,
    /// Explicit column name, overriding the naming convention.
    pub column: Option<&'static str>,
}

/// A field as declared on an entity type, before any naming rules are
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: ValueKind,
    pub column: ColumnAttr,
    pub id: Option<IdAttr>,
}

impl FieldDef {
    /// A plain field with no column or identity declaration.
    #[must_use]
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            column: ColumnAttr::Default,
            id: None,
        }
    }

    /// Declare an explicit column name.
    #[must_use]
    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = ColumnAttr::Named(column);
        self
    }

    /// Exclude the field from persistence.
    #[must_use]
    pub const fn ignore(mut self) -> Self {
        self.column = ColumnAttr::Ignore;
        self
    }

    /// Mark the field as the entity's identity.
    #[must_use]
    pub const fn id(mut self, strategy: IdType, column: Option<&'static str>) -> Self {
        self.id = Some(IdAttr { strategy, column });
        self
    }
}

/// Declares an ORM entity with automatic `Entity` trait implementation.
///
/// The optional `id`, `columns` and `ignore` clauses must appear in that
/// order, after `table`. Field names used in clauses are checked at compile
/// time.
///
/// # Examples
///
/// ```ignore
/// entity! {
///     table = "users",
///     id = id(DatabaseAssigned),
///     columns = [email => "mail"],
///     ignore = [session],
///     #[derive(Debug, Clone, Default)]
///     pub struct User {
///         pub id: Option<i64>,
///         pub user_name: Option<String>,
///         pub email: Option<String>,
///         pub session: Option<String>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity {
    // Full form: every clause normalised (single code-generation arm)
    (
        @emit [$table:literal]
        [$($id_field:ident ($strategy:ident $(, $id_col:literal)?))?]
        [$($col_field:ident => $col_name:literal),*]
        [$($ignored:ident),*]
        $(#[$meta:meta])*
        pub struct $struct_name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field_name:ident : $field_type:ty
            ),* $(,)?
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$meta])*
        pub struct $struct_name {
            $(
                $(#[$field_meta])*
                pub $field_name : $field_type
            ),*
        }

        impl $crate::Entity for $struct_name {
            fn table() -> Option<&'static str> {
                Some($table)
            }

            fn fields() -> Vec<$crate::FieldDef> {
                let _ = |entity: &Self| {
                    $( let _ = &entity.$id_field; )?
                    $( let _ = &entity.$col_field; )*
                    $( let _ = &entity.$ignored; )*
                };

                #[allow(unused_mut)]
                let mut fields = vec![
                    $(
                        $crate::FieldDef::new(
                            stringify!($field_name),
                            <$field_type as $crate::SqlType>::KIND,
                        ),
                    )*
                ];
                $(
                    $crate::__private::annotate(&mut fields, stringify!($id_field), |field| {
                        field.id($crate::IdType::$strategy, $crate::__private::first(&[$($id_col)?]))
                    });
                )?
                $(
                    $crate::__private::annotate(&mut fields, stringify!($col_field), |field| {
                        field.column($col_name)
                    });
                )*
                $(
                    $crate::__private::annotate(&mut fields, stringify!($ignored), |field| {
                        field.ignore()
                    });
                )*
                fields
            }

            fn value(&self, field: &str) -> $crate::Result<$crate::__private::Value> {
                match field {
                    $( stringify!($field_name) => Ok(self.$field_name.clone().into()), )*
                    other => Err($crate::Error::IllegalState(format!(
                        "`{}` has no field `{other}`",
                        stringify!($struct_name)
                    ))),
                }
            }

            fn set_value(
                &mut self, field: &str, value: $crate::__private::Value,
            ) -> $crate::Result<()> {
                match field {
                    $(
                        stringify!($field_name) => {
                            self.$field_name =
                                <$field_type as $crate::__private::ValueType>::try_from(value)
                                    .map_err(|_e| $crate::Error::TypeMismatch {
                                        field: stringify!($field_name).to_string(),
                                        kind: <$field_type as $crate::SqlType>::KIND,
                                    })?;
                            Ok(())
                        }
                    )*
                    other => Err($crate::Error::IllegalState(format!(
                        "`{}` has no field `{other}`",
                        stringify!($struct_name)
                    ))),
                }
            }

            fn from_row(row: &$crate::Row) -> $crate::__private::anyhow::Result<Self> {
                Ok(Self {
                    $(
                        $field_name: <$field_type as $crate::FetchValue>::fetch(row, stringify!($field_name))?,
                    )*
                })
            }
        }
    };

    (
        @ignore [$table:literal] [$($id:tt)*] [$($cols:tt)*]
        ignore = [$($ignored:ident),* $(,)?],
        $($rest:tt)*
    ) => {
        $crate::entity! { @emit [$table] [$($id)*] [$($cols)*] [$($ignored),*] $($rest)* }
    };

    (@ignore [$table:literal] [$($id:tt)*] [$($cols:tt)*] $($rest:tt)*) => {
        $crate::entity! { @emit [$table] [$($id)*] [$($cols)*] [] $($rest)* }
    };

    (
        @columns [$table:literal] [$($id:tt)*]
        columns = [$($col_field:ident => $col_name:literal),* $(,)?],
        $($rest:tt)*
    ) => {
        $crate::entity! { @ignore [$table] [$($id)*] [$($col_field => $col_name),*] $($rest)* }
    };

    (@columns [$table:literal] [$($id:tt)*] $($rest:tt)*) => {
        $crate::entity! { @ignore [$table] [$($id)*] [] $($rest)* }
    };

    (@id [$table:literal] id = $id_field:ident ($($spec:tt)*), $($rest:tt)*) => {
        $crate::entity! { @columns [$table] [$id_field ($($spec)*)] $($rest)* }
    };

    (@id [$table:literal] $($rest:tt)*) => {
        $crate::entity! { @columns [$table] [] $($rest)* }
    };

    (table = $table:literal, $($rest:tt)*) => {
        $crate::entity! { @id [$table] $($rest)* }
    };
}

/// A persistent data-model type.
///
/// Typically implemented via the `entity!` macro rather than manually.
pub trait Entity: Sized + 'static {
    /// The database table name for this entity, if declared.
    fn table() -> Option<&'static str>;

    /// The entity's fields in declaration order.
    fn fields() -> Vec<FieldDef>;

    /// Read a field's current value. Unset optional fields read as typed
    /// SQL `NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalState`] if the entity has no such field.
    fn value(&self, field: &str) -> Result<Value>;

    /// Assign a field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalState`] if the entity has no such field, or
    /// [`Error::TypeMismatch`] if the value does not fit the field's type.
    fn set_value(&mut self, field: &str, value: Value) -> Result<()>;

    /// Construct an entity instance from a database row keyed by field name.
    ///
    /// # Errors
    ///
    /// Returns an error if any required column is missing or cannot be converted to the expected type.
    fn from_row(row: &Row) -> anyhow::Result<Self>;
}

/// Whether a bound value is SQL `NULL`.
pub(crate) fn is_null(value: &Value) -> bool {
    match value {
        Value::Bool(v) => v.is_none(),
        Value::TinyInt(v) => v.is_none(),
        Value::SmallInt(v) => v.is_none(),
        Value::Int(v) => v.is_none(),
        Value::BigInt(v) => v.is_none(),
        Value::TinyUnsigned(v) => v.is_none(),
        Value::SmallUnsigned(v) => v.is_none(),
        Value::Unsigned(v) => v.is_none(),
        Value::BigUnsigned(v) => v.is_none(),
        Value::Float(v) => v.is_none(),
        Value::Double(v) => v.is_none(),
        Value::String(v) => v.is_none(),
        Value::Char(v) => v.is_none(),
        Value::Bytes(v) => v.is_none(),
        Value::Json(v) => v.is_none(),
        Value::ChronoDate(v) => v.is_none(),
        Value::ChronoTime(v) => v.is_none(),
        Value::ChronoDateTime(v) => v.is_none(),
        Value::ChronoDateTimeUtc(v) => v.is_none(),
        Value::ChronoDateTimeLocal(v) => v.is_none(),
        Value::ChronoDateTimeWithTimeZone(v) => v.is_none(),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

// Outbound conversion (internal use only)
pub(crate) fn values_to_datatypes(values: Values) -> Result<Vec<DataType>> {
    values.into_iter().map(value_to_datatype).collect()
}

fn value_to_datatype(value: Value) -> Result<DataType> {
    let data_type = match value {
        Value::Bool(v) => DataType::Boolean(v),
        Value::TinyInt(v) => DataType::Int32(v.map(i32::from)),
        Value::SmallInt(v) => DataType::Int32(v.map(i32::from)),
        Value::Int(v) => DataType::Int32(v),
        Value::BigInt(v) => DataType::Int64(v),
        Value::TinyUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::SmallUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::Unsigned(v) => DataType::Uint32(v),
        Value::BigUnsigned(v) => DataType::Uint64(v),
        Value::Float(v) => DataType::Float(v),
        Value::Double(v) => DataType::Double(v),
        Value::String(v) => DataType::Str(v.map(|value| *value)),
        Value::Json(v) => DataType::Str(v.map(|json| json.to_string())),
        Value::ChronoDate(v) => DataType::Date(v.map(|value| {
            let date = *value;
            date.to_string() // "%Y-%m-%d"
        })),
        Value::ChronoTime(v) => DataType::Time(v.map(|value| {
            let time = *value;
            time.to_string() // "%H:%M:%S%.f"
        })),
        Value::ChronoDateTime(v) => DataType::Timestamp(v.map(|value| {
            let dt = *value;
            dt.to_string() // "%Y-%m-%d %H:%M:%S%.f"
        })),
        Value::ChronoDateTimeUtc(v) => DataType::Timestamp(v.map(|value| {
            let dt: DateTime<Utc> = *value;
            dt.to_rfc3339() // "%Y-%m-%dT%H:%M:%S%.f%:z"
        })),
        Value::Char(v) => DataType::Str(v.map(|ch| ch.to_string())),
        Value::Bytes(v) => DataType::Binary(v.map(|bytes| *bytes)),
        other => {
            return Err(Error::Type(format!(
                "unsupported value {other:?} requires explicit conversion before building the query"
            )));
        }
    };
    Ok(data_type)
}

// Inbound conversion
impl FetchValue for bool {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_bool(row_field(row, col)?)
    }
}

impl FetchValue for i32 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_i32(row_field(row, col)?)
    }
}

impl FetchValue for i64 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_i64(row_field(row, col)?)
    }
}

impl FetchValue for u32 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        let value = as_i64(row_field(row, col)?)?;
        Ok(Self::try_from(value)?)
    }
}

impl FetchValue for u64 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        match row_field(row, col)? {
            DataType::Uint64(Some(v)) => Ok(*v),
            other => Ok(Self::try_from(as_i64(other)?)?),
        }
    }
}

impl FetchValue for f32 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_f32(row_field(row, col)?)
    }
}

impl FetchValue for f64 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_f64(row_field(row, col)?)
    }
}

impl FetchValue for String {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_string(row_field(row, col)?)
    }
}

impl FetchValue for Vec<u8> {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_binary(row_field(row, col)?)
    }
}

impl FetchValue for DateTime<Utc> {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_timestamp(row_field(row, col)?)
    }
}

impl FetchValue for NaiveDate {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_date(row_field(row, col)?)
    }
}

impl FetchValue for serde_json::Value {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_json(row_field(row, col)?)
    }
}

impl<T: FetchValue> FetchValue for Option<T> {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        match row.get(col) {
            Some(field) if !field.is_null() => Ok(Some(T::fetch(row, col)?)),
            _ => Ok(None),
        }
    }
}

fn row_field<'a>(row: &'a Row, name: &str) -> anyhow::Result<&'a DataType> {
    row.get(name).ok_or_else(|| anyhow!("missing column '{name}'"))
}

// Integer columns come back as 64-bit from some drivers (SQLite), booleans
// as integers.
fn as_bool(value: &DataType) -> anyhow::Result<bool> {
    match value {
        DataType::Boolean(Some(v)) => Ok(*v),
        DataType::Int32(Some(v)) => Ok(*v != 0),
        DataType::Int64(Some(v)) => Ok(*v != 0),
        _ => bail!("expected boolean data type"),
    }
}

fn as_i32(value: &DataType) -> anyhow::Result<i32> {
    match value {
        DataType::Int32(Some(v)) => Ok(*v),
        DataType::Int64(Some(v)) => Ok(i32::try_from(*v)?),
        _ => bail!("expected int32 data type"),
    }
}

fn as_i64(value: &DataType) -> anyhow::Result<i64> {
    match value {
        DataType::Int64(Some(v)) => Ok(*v),
        DataType::Int32(Some(v)) => Ok(i64::from(*v)),
        DataType::Uint32(Some(v)) => Ok(i64::from(*v)),
        _ => bail!("expected int64 data type"),
    }
}

fn as_f32(value: &DataType) -> anyhow::Result<f32> {
    match value {
        DataType::Float(Some(v)) => Ok(*v),
        _ => bail!("expected float data type"),
    }
}

fn as_f64(value: &DataType) -> anyhow::Result<f64> {
    match value {
        DataType::Double(Some(v)) => Ok(*v),
        DataType::Float(Some(v)) => Ok(f64::from(*v)),
        _ => bail!("expected double data type"),
    }
}

fn as_string(value: &DataType) -> anyhow::Result<String> {
    match value {
        DataType::Str(Some(raw))
        | DataType::Date(Some(raw))
        | DataType::Time(Some(raw))
        | DataType::Timestamp(Some(raw)) => Ok(raw.clone()),
        _ => bail!("expected string data type"),
    }
}

fn as_binary(value: &DataType) -> anyhow::Result<Vec<u8>> {
    match value {
        DataType::Binary(Some(bytes)) => Ok(bytes.clone()),
        _ => bail!("expected binary data type"),
    }
}

fn as_timestamp(value: &DataType) -> anyhow::Result<DateTime<Utc>> {
    match value {
        DataType::Timestamp(Some(raw)) | DataType::Str(Some(raw)) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                return Ok(parsed.with_timezone(&Utc));
            }

            if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
                return Ok(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc));
            }

            bail!(
                "unsupported timestamp: {raw}; expected RFC3339 or \"%Y-%m-%d %H:%M:%S%.f\" format"
            )
        }
        _ => bail!("expected timestamp data type"),
    }
}

fn as_date(value: &DataType) -> anyhow::Result<NaiveDate> {
    match value {
        DataType::Date(Some(raw)) | DataType::Str(Some(raw)) => {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_e| anyhow!("unsupported date: {raw}; expected \"%Y-%m-%d\" format"))
        }
        _ => bail!("expected date data type"),
    }
}

fn as_json(value: &DataType) -> anyhow::Result<serde_json::Value> {
    match value {
        DataType::Str(Some(raw)) => Ok(serde_json::from_str(raw)?),
        DataType::Binary(Some(bytes)) => Ok(serde_json::from_slice(bytes)?),
        _ => bail!("expected json compatible data type"),
    }
}
