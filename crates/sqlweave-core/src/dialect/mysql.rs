//! MySQL / MariaDB dialect.

use super::{Dialect, DialectKind};
use crate::error::Result;

/// MySQL and MariaDB dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    fn random_function(&self) -> &'static str {
        "RAND()"
    }

    fn limit_clause(&self, count: Option<u64>, offset: Option<u64>, _ordered: bool) -> String {
        // MySQL has no OFFSET without LIMIT; the largest row count stands in.
        let count = count.unwrap_or(u64::MAX);
        match offset {
            Some(offset) => format!(" LIMIT {count} OFFSET {offset}"),
            None => format!(" LIMIT {count}"),
        }
    }

    fn rename_table_sql(&self, from: &str, to: &str) -> String {
        format!(
            "RENAME TABLE {} TO {}",
            self.quote_ddl_identifier(from),
            self.quote_ddl_identifier(to)
        )
    }

    fn modify_column_sql(
        &self,
        table: &str,
        _column: &str,
        _sql_type: &str,
        definition: &str,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {definition}",
            self.quote_ddl_identifier(table)
        )])
    }

    fn drop_index_sql(&self, table: &str, index: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_ddl_identifier(index),
            self.quote_ddl_identifier(table)
        )
    }
}
