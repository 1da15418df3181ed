//! Oracle dialect.

use super::{string_literal, Dialect, DialectKind};
use crate::error::Result;

/// Oracle dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn current_timestamp(&self) -> &'static str {
        "SYSTIMESTAMP"
    }

    fn random_function(&self) -> &'static str {
        "DBMS_RANDOM.VALUE"
    }

    fn limit_clause(&self, count: Option<u64>, offset: Option<u64>, _ordered: bool) -> String {
        super::sybase::offset_fetch(count, offset)
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT table_name FROM user_tables WHERE table_name = ?"
    }

    fn supports_if_not_exists(&self) -> bool {
        false
    }

    fn add_column_keyword(&self) -> &'static str {
        "ADD"
    }

    fn drop_table_if_exists_sql(&self, table: &str) -> String {
        // ORA-00942: table or view does not exist
        let statement = format!("DROP TABLE {}", self.quote_ddl_identifier(table));
        format!(
            "BEGIN EXECUTE IMMEDIATE {}; EXCEPTION WHEN OTHERS THEN IF SQLCODE != -942 THEN RAISE; END IF; END;",
            string_literal(&statement)
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
            "ALTER TABLE {} MODIFY ({definition})",
            self.quote_ddl_identifier(table)
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_statements() {
        let d = OracleDialect;
        assert_eq!(
            d.limit_clause(Some(1), None, false),
            " OFFSET 0 ROWS FETCH NEXT 1 ROWS ONLY"
        );
        assert_eq!(d.limit_clause(None, Some(3), false), " OFFSET 3 ROWS");
        assert_eq!(
            d.drop_table_if_exists_sql("t"),
            "BEGIN EXECUTE IMMEDIATE 'DROP TABLE \"t\"'; EXCEPTION WHEN OTHERS THEN IF SQLCODE != -942 THEN RAISE; END IF; END;"
        );
        assert_eq!(d.add_column_keyword(), "ADD");
    }
}
