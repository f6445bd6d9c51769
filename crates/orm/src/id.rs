use std::str::FromStr;

use sea_query::Value;
use uuid::Uuid;

use crate::error::Error;

/// How an entity's identity field obtains its value on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdType {
    /// A random 32-character hex identifier generated client-side.
    Random,
    /// The database assigns the key; it is captured after the insert.
    DatabaseAssigned,
    /// The identity is managed by the caller (or a column default).
    None,
}

impl IdType {
    /// Produce a value for a new row, if this strategy generates one
    /// client-side.
    #[must_use]
    pub fn generate(self) -> Option<Value> {
        match self {
            Self::Random => Some(Uuid::new_v4().simple().to_string().into()),
            Self::DatabaseAssigned | Self::None => None,
        }
    }

    /// Whether the insert must ask the gateway for the generated key.
    #[must_use]
    pub const fn captures_key(self) -> bool {
        matches!(self, Self::DatabaseAssigned)
    }
}

impl FromStr for IdType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" | "uuid" => Ok(Self::Random),
            "database" | "database_assigned" | "auto" => Ok(Self::DatabaseAssigned),
            "none" => Ok(Self::None),
            other => Err(Error::Configuration(format!("unknown id strategy `{other}`"))),
        }
    }
}
