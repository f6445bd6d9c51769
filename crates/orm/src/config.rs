//! Configuration for the mapping layer.

use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use fromenv::FromEnv as DeriveFromEnv;

use crate::query::QueryBuilder;

/// Trait for creating options from environment variables.
pub trait FromEnv: Sized {
    /// Create options from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    fn from_env() -> Result<Self>;
}

/// SQL dialect used to render statement text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// `"quoted"` identifiers, `$1` placeholders.
    #[default]
    Postgres,
    /// `"quoted"` identifiers, `?` placeholders.
    Sqlite,
    /// `` `quoted` `` identifiers, `?` placeholders.
    MySql,
}

impl Dialect {
    pub(crate) fn builder(self) -> QueryBuilder {
        QueryBuilder::for_dialect(self)
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            "mysql" => Ok(Self::MySql),
            other => Err(anyhow!("unsupported dialect `{other}`")),
        }
    }
}

/// Options controlling how entities are mapped to SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrmOptions {
    /// When `true`, field names without an explicit column name are converted
    /// from `camelCase` to `snake_case`. When `false` they are used verbatim.
    pub map_underscore_to_camel_case: bool,

    /// Dialect used when rendering statements.
    pub dialect: Dialect,
}

impl OrmOptions {
    /// Enable or disable `camelCase` to `snake_case` column naming.
    #[must_use]
    pub const fn map_underscore_to_camel_case(mut self, enabled: bool) -> Self {
        self.map_underscore_to_camel_case = enabled;
        self
    }

    /// Set the rendering dialect.
    #[must_use]
    pub const fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// Raw environment values behind [`OrmOptions`].
#[doc(hidden)]
#[derive(Debug, Clone, DeriveFromEnv)]
pub struct EnvOptions {
    /// `true` or `false`.
    #[env(from = "QUILL_MAP_UNDERSCORE_TO_CAMEL_CASE", default = "false")]
    pub map_underscore_to_camel_case: String,
    /// `postgres`, `sqlite` or `mysql`.
    #[env(from = "QUILL_DIALECT", default = "postgres")]
    pub dialect: String,
}

impl FromEnv for OrmOptions {
    fn from_env() -> Result<Self> {
        let env = EnvOptions::from_env().finalize().context("issue loading orm options")?;
        Self::parse(&env.map_underscore_to_camel_case, &env.dialect)
    }
}

impl OrmOptions {
    fn parse(map_underscore_to_camel_case: &str, dialect: &str) -> Result<Self> {
        let map_underscore_to_camel_case = map_underscore_to_camel_case
            .trim()
            .parse::<bool>()
            .with_context(|| format!("invalid boolean `{map_underscore_to_camel_case}`"))?;
        Ok(Self {
            map_underscore_to_camel_case,
            dialect: dialect.trim().parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_options() {
        let options = OrmOptions::parse("true", "SQLite").unwrap();
        assert!(options.map_underscore_to_camel_case);
        assert_eq!(options.dialect, Dialect::Sqlite);

        let options = OrmOptions::parse(" false ", "postgresql").unwrap();
        assert!(!options.map_underscore_to_camel_case);
        assert_eq!(options.dialect, Dialect::Postgres);
    }

    #[test]
    fn from_env_defaults() {
        let unset = ["QUILL_MAP_UNDERSCORE_TO_CAMEL_CASE", "QUILL_DIALECT"]
            .iter()
            .all(|name| std::env::var_os(name).is_none());
        if unset {
            assert_eq!(OrmOptions::from_env().unwrap(), OrmOptions::default());
        }
    }

    #[test]
    fn reject_bad_options() {
        OrmOptions::parse("yes", "postgres").unwrap_err();
        OrmOptions::parse("false", "oracle").unwrap_err();
    }

    #[test]
    fn builder_methods() {
        let options =
            OrmOptions::default().map_underscore_to_camel_case(true).dialect(Dialect::MySql);
        assert!(options.map_underscore_to_camel_case);
        assert_eq!(options.dialect, Dialect::MySql);
    }
}
