//! Connection options.

use serde::{Deserialize, Serialize};
use sqlweave_core::DialectKind;

use crate::error::{Error, Result};

/// Options accepted by [`crate::Database::connect`].
///
/// ```rust
/// use sqlweave::Options;
///
/// let options = Options::from_json(r#"{"type": "sqlite", "database": "sqlite::memory:", "prefix": "app_"}"#).unwrap();
/// assert_eq!(options.prefix, "app_");
/// assert!(!options.logging);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Dialect tag: `mysql`, `mariadb`, `pgsql`, `sqlite`, `sybase`,
    /// `oracle` or `mssql`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Connection URL or path for the bundled SQLite driver.
    #[serde(default)]
    pub database: Option<String>,
    /// Prefix applied to every table name.
    #[serde(default)]
    pub prefix: String,
    /// Keep every executed statement for [`crate::Database::log`].
    #[serde(default)]
    pub logging: bool,
}

impl Options {
    /// Creates options for a dialect tag.
    #[must_use]
    pub fn new(kind: &str) -> Self {
        Self {
            kind: String::from(kind),
            database: None,
            prefix: String::new(),
            logging: false,
        }
    }

    /// In-memory SQLite options.
    #[must_use]
    pub fn sqlite_memory() -> Self {
        Self::new("sqlite").database("sqlite::memory:")
    }

    /// Sets the database URL or path.
    #[must_use]
    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(String::from(database));
        self
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = String::from(prefix);
        self
    }

    /// Enables the statement log.
    #[must_use]
    pub const fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Parses options from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for malformed JSON or an unsupported
    /// dialect tag.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(json).map_err(|err| Error::Config(err.to_string()))?;
        options.dialect()?;
        Ok(options)
    }

    /// Resolves the dialect tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unsupported tag.
    pub fn dialect(&self) -> Result<DialectKind> {
        self.kind
            .parse()
            .map_err(|err: sqlweave_core::CompileError| Error::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::from_json(r#"{"type": "pgsql"}"#).unwrap();
        assert_eq!(options, Options::new("pgsql"));
        assert_eq!(options.dialect().unwrap(), DialectKind::PgSql);
    }

    #[test]
    fn test_unsupported_dialect_is_config_error() {
        let err = Options::from_json(r#"{"type": "db2"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_type_is_config_error() {
        let err = Options::from_json(r#"{"prefix": "x_"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_methods() {
        let options = Options::new("sqlite")
            .database("app.db")
            .prefix("app_")
            .logging(true);
        assert_eq!(options.database.as_deref(), Some("app.db"));
        assert_eq!(options.prefix, "app_");
        assert!(options.logging);
    }
}
