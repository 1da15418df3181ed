//! Sybase ASE dialect.

use super::{string_literal, Dialect, DialectKind};
use crate::error::Result;

/// Sybase ASE dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SybaseDialect;

impl Dialect for SybaseDialect {
    fn name(&self) -> &'static str {
        "sybase"
    }

    fn kind(&self) -> DialectKind {
        DialectKind::Sybase
    }

    fn current_timestamp(&self) -> &'static str {
        "GETDATE()"
    }

    fn random_function(&self) -> &'static str {
        "NEWID()"
    }

    fn limit_clause(&self, count: Option<u64>, offset: Option<u64>, ordered: bool) -> String {
        fetch_clause(count, offset, ordered)
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT name FROM sysobjects WHERE type = 'U' AND name = ?"
    }

    fn supports_if_not_exists(&self) -> bool {
        false
    }

    fn add_column_keyword(&self) -> &'static str {
        "ADD"
    }

    fn rename_table_sql(&self, from: &str, to: &str) -> String {
        format!("sp_rename {}, {}", string_literal(from), string_literal(to))
    }

    fn drop_table_if_exists_sql(&self, table: &str) -> String {
        format!(
            "IF OBJECT_ID({}) IS NOT NULL DROP TABLE {}",
            string_literal(table),
            self.quote_ddl_identifier(table)
        )
    }

    fn drop_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP {}",
            self.quote_ddl_identifier(table),
            self.quote_ddl_identifier(column)
        )
    }

    fn rename_column_sql(&self, table: &str, from: &str, to: &str) -> String {
        format!(
            "sp_rename {}, {}",
            string_literal(&format!("{table}.{from}")),
            string_literal(to)
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
            "ALTER TABLE {} MODIFY {definition}",
            self.quote_ddl_identifier(table)
        )])
    }

    fn drop_index_sql(&self, table: &str, index: &str) -> String {
        format!(
            "DROP INDEX {}.{}",
            self.quote_ddl_identifier(table),
            self.quote_ddl_identifier(index)
        )
    }
}

/// `OFFSET .. FETCH` row limiting shared by SQL Server and Sybase.
///
/// Both require an ORDER BY, so a constant ordering is inserted when the
/// statement has none.
pub(super) fn fetch_clause(count: Option<u64>, offset: Option<u64>, ordered: bool) -> String {
    let mut sql = String::new();
    if !ordered {
        sql.push_str(" ORDER BY (SELECT 0)");
    }
    sql.push_str(&offset_fetch(count, offset));
    sql
}

/// `OFFSET m ROWS [FETCH NEXT n ROWS ONLY]`.
pub(super) fn offset_fetch(count: Option<u64>, offset: Option<u64>) -> String {
    let offset = offset.unwrap_or(0);
    match count {
        Some(count) => format!(" OFFSET {offset} ROWS FETCH NEXT {count} ROWS ONLY"),
        None => format!(" OFFSET {offset} ROWS"),
    }
}
