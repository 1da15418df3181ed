//! SQL Dialect support.
//!
//! Each supported database gets one implementation of [`Dialect`], selected
//! once from its type tag through [`DialectKind`]. Everything that varies by
//! database (identifier quoting, LIMIT syntax, rename statements, random
//! ordering, table introspection) lives behind this trait. Column type
//! mapping is table driven, see [`crate::migrations::types`].

mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sybase;

use std::fmt;
use std::str::FromStr;

pub use mssql::MsSqlDialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sybase::SybaseDialect;

use crate::error::{CompileError, Result};

/// Tag identifying one of the supported databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    /// MySQL and MariaDB.
    MySql,
    /// PostgreSQL.
    PgSql,
    /// SQLite.
    Sqlite,
    /// Sybase ASE.
    Sybase,
    /// Oracle.
    Oracle,
    /// Microsoft SQL Server.
    MsSql,
}

impl DialectKind {
    /// All supported dialects, in type-table column order.
    pub const ALL: [Self; 6] = [
        Self::MySql,
        Self::PgSql,
        Self::Sqlite,
        Self::Sybase,
        Self::Oracle,
        Self::MsSql,
    ];

    /// Returns the dialect implementation for this tag.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::MySql => &MySqlDialect,
            Self::PgSql => &PostgresDialect,
            Self::Sqlite => &SqliteDialect,
            Self::Sybase => &SybaseDialect,
            Self::Oracle => &OracleDialect,
            Self::MsSql => &MsSqlDialect,
        }
    }

    /// Position of this dialect in [`DialectKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::MySql => 0,
            Self::PgSql => 1,
            Self::Sqlite => 2,
            Self::Sybase => 3,
            Self::Oracle => 4,
            Self::MsSql => 5,
        }
    }

    /// Canonical type tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PgSql => "pgsql",
            Self::Sqlite => "sqlite",
            Self::Sybase => "sybase",
            Self::Oracle => "oracle",
            Self::MsSql => "mssql",
        }
    }
}

impl FromStr for DialectKind {
    type Err = CompileError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "pgsql" | "postgres" | "postgresql" => Ok(Self::PgSql),
            "sqlite" => Ok(Self::Sqlite),
            "sybase" => Ok(Self::Sybase),
            "oracle" => Ok(Self::Oracle),
            "mssql" | "sqlserver" => Ok(Self::MsSql),
            _ => Err(CompileError::UnsupportedDialect(String::from(tag))),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wraps `name` in `open`/`close`, doubling any embedded closing character.
#[must_use]
pub fn wrap_identifier(name: &str, open: char, close: char) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push(open);
    for ch in name.chars() {
        if ch == close {
            escaped.push(close);
        }
        escaped.push(ch);
    }
    escaped.push(close);
    escaped
}

/// Renders a single-quoted string literal.
#[must_use]
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the tag for this dialect.
    fn kind(&self) -> DialectKind;

    /// Returns the opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Quotes an identifier for DML statements.
    fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes();
        wrap_identifier(name, open, close)
    }

    /// Quotes an identifier for DDL statements.
    fn quote_ddl_identifier(&self, name: &str) -> String {
        self.quote_identifier(name)
    }

    /// Expression evaluating to the server's current timestamp.
    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    /// Function producing a random ordering key.
    fn random_function(&self) -> &'static str {
        "RANDOM()"
    }

    /// Renders the row-limiting suffix (with a leading space).
    ///
    /// `ordered` tells whether the statement already has an ORDER BY. A
    /// missing `count` means an offset without a row limit.
    fn limit_clause(&self, count: Option<u64>, offset: Option<u64>, ordered: bool) -> String {
        let _ = ordered;
        match (count, offset) {
            (Some(count), Some(offset)) => format!(" LIMIT {count} OFFSET {offset}"),
            (Some(count), None) => format!(" LIMIT {count}"),
            (None, Some(offset)) => format!(" OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    /// Query returning a row when the table named by the single `?` exists.
    fn table_exists_sql(&self) -> &'static str {
        "SELECT table_name FROM information_schema.tables WHERE table_name = ?"
    }

    /// Whether `CREATE TABLE IF NOT EXISTS` is understood.
    fn supports_if_not_exists(&self) -> bool {
        true
    }

    /// Keyword introducing a new column in ALTER TABLE.
    fn add_column_keyword(&self) -> &'static str {
        "ADD COLUMN"
    }

    /// Generates SQL for renaming a table.
    fn rename_table_sql(&self, from: &str, to: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_ddl_identifier(from),
            self.quote_ddl_identifier(to)
        )
    }

    /// Generates SQL for dropping a table if it exists.
    fn drop_table_if_exists_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_ddl_identifier(table))
    }

    /// Generates SQL for dropping a column.
    fn drop_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_ddl_identifier(table),
            self.quote_ddl_identifier(column)
        )
    }

    /// Generates SQL for renaming a column.
    fn rename_column_sql(&self, table: &str, from: &str, to: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_ddl_identifier(table),
            self.quote_ddl_identifier(from),
            self.quote_ddl_identifier(to)
        )
    }

    /// Generates SQL for changing the definition of an existing column.
    ///
    /// `definition` is the full rendered column definition (quoted name,
    /// type and modifiers).
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Unsupported`] when the dialect cannot alter
    /// columns in place.
    fn modify_column_sql(
        &self,
        table: &str,
        column: &str,
        sql_type: &str,
        definition: &str,
    ) -> Result<Vec<String>>;

    /// Generates SQL for dropping an index.
    fn drop_index_sql(&self, table: &str, index: &str) -> String {
        let _ = table;
        format!("DROP INDEX {}", self.quote_ddl_identifier(index))
    }
}
