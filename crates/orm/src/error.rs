use thiserror::Error as ThisError;

use crate::entity::ValueKind;

/// Result type used throughout the ORM.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while mapping entities, assembling statements, or executing
/// them.
///
/// None of these are retried. Resolution errors indicate a query that was
/// built against tables or columns that are not part of the statement.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The entity type is missing a declaration it needs (table name,
    /// identity field) or was configured with an unknown option.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The entity type does not expose a field it declared, or an instance
    /// lacks the identity value an operation needs.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A joined table could not be linked to the statement.
    #[error("cannot join `{table}`: {reason}")]
    JoinResolution { table: String, reason: String },

    /// A condition is scoped to a table that is not part of the statement.
    #[error("condition references table `{0}` which is not part of the statement")]
    ConditionResolution(String),

    /// A condition or ordering names a column not registered on its table.
    #[error("column `{column}` is not registered on table `{table}`")]
    ColumnResolution { table: String, column: String },

    /// The assembled statement is internally inconsistent.
    #[error("invalid statement: {0}")]
    Validation(String),

    /// A value has the wrong shape for the operator it is used with.
    #[error("type error: {0}")]
    Type(String),

    /// A value (typically a generated key) cannot be stored in a field of
    /// the declared kind.
    #[error("cannot assign value to `{field}` of kind {kind:?}")]
    TypeMismatch { field: String, kind: ValueKind },

    /// A result row could not be converted into an entity.
    #[error("failed to decode row: {0}")]
    Decode(#[source] anyhow::Error),

    /// The execution gateway failed to run the statement.
    #[error("gateway error: {0}")]
    Gateway(#[from] anyhow::Error),
}
