//! PostgreSQL dialect.

use super::{Dialect, DialectKind};
use crate::error::Result;

/// PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn kind(&self) -> DialectKind {
        DialectKind::PgSql
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_name = ?"
    }

    fn modify_column_sql(
        &self,
        table: &str,
        column: &str,
        sql_type: &str,
        definition: &str,
    ) -> Result<Vec<String>> {
        let table = self.quote_ddl_identifier(table);
        let column = self.quote_ddl_identifier(column);
        let mut statements = vec![format!(
            "ALTER TABLE {table} ALTER COLUMN {column} TYPE {sql_type}"
        )];
        // PostgreSQL changes nullability with a separate clause.
        if definition.contains(" NOT NULL") {
            statements.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {column} SET NOT NULL"
            ));
        } else if definition.contains(" NULL") {
            statements.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {column} DROP NOT NULL"
            ));
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_modify_column() {
        let d = PostgresDialect;
        assert_eq!(
            d.modify_column_sql("users", "age", "BIGINT", "\"age\" BIGINT NOT NULL"),
            Ok(vec![
                String::from("ALTER TABLE \"users\" ALTER COLUMN \"age\" TYPE BIGINT"),
                String::from("ALTER TABLE \"users\" ALTER COLUMN \"age\" SET NOT NULL"),
            ])
        );
    }

    #[test]
    fn test_postgres_rename_table() {
        assert_eq!(
            PostgresDialect.rename_table_sql("old", "new"),
            "ALTER TABLE \"old\" RENAME TO \"new\""
        );
    }
}
