//! SQLite dialect.

use super::{Dialect, DialectKind};
use crate::error::{CompileError, Result};

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    fn limit_clause(&self, count: Option<u64>, offset: Option<u64>, _ordered: bool) -> String {
        match (count, offset) {
            (Some(count), Some(offset)) => format!(" LIMIT {count} OFFSET {offset}"),
            (Some(count), None) => format!(" LIMIT {count}"),
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?"
    }

    fn modify_column_sql(
        &self,
        _table: &str,
        _column: &str,
        _sql_type: &str,
        _definition: &str,
    ) -> Result<Vec<String>> {
        // SQLite would need a full table rebuild.
        Err(CompileError::Unsupported {
            dialect: self.name(),
            operation: "changing a column definition",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_statements() {
        let d = SqliteDialect;
        assert_eq!(d.quote_identifier("users"), "`users`");
        assert_eq!(d.rename_table_sql("a", "b"), "ALTER TABLE `a` RENAME TO `b`");
        assert_eq!(d.drop_table_if_exists_sql("a"), "DROP TABLE IF EXISTS `a`");
        assert!(d.modify_column_sql("t", "c", "INTEGER", "`c` INTEGER").is_err());
        assert_eq!(d.limit_clause(None, Some(2), false), " LIMIT -1 OFFSET 2");
    }
}
