//! Microsoft SQL Server dialect.
//!
//! DML quotes identifiers with double quotes (`QUOTED_IDENTIFIER` is on by
//! default for every modern client), DDL uses brackets.

use super::sybase::fetch_clause;
use super::{string_literal, wrap_identifier, Dialect, DialectKind};
use crate::error::Result;

/// SQL Server dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MsSqlDialect;

impl Dialect for MsSqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn kind(&self) -> DialectKind {
        DialectKind::MsSql
    }

    fn quote_ddl_identifier(&self, name: &str) -> String {
        wrap_identifier(name, '[', ']')
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
        "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = ?"
    }

    fn supports_if_not_exists(&self) -> bool {
        false
    }

    fn add_column_keyword(&self) -> &'static str {
        "ADD"
    }

    fn rename_table_sql(&self, from: &str, to: &str) -> String {
        format!(
            "EXEC sp_rename {}, {}",
            string_literal(from),
            string_literal(to)
        )
    }

    fn rename_column_sql(&self, table: &str, from: &str, to: &str) -> String {
        format!(
            "EXEC sp_rename {}, {}, 'COLUMN'",
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
            "ALTER TABLE {} ALTER COLUMN {definition}",
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
