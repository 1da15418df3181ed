//! SQLite driver backed by sqlx.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteRow};
use sqlx::{Column as _, Connection, Decode, Row as _, Sqlite, SqliteConnection, TypeInfo, ValueRef};
use sqlweave_core::{DialectKind, SqlValue};
use tracing::debug;

use crate::driver::{Driver, QueryResult, Row};
use crate::error::Result;

type Query<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A [`Driver`] over a single SQLite connection.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: SqliteConnection,
    in_transaction: bool,
}

impl SqliteDriver {
    /// Opens `url` (`sqlite::memory:`, `sqlite://path.db` or a bare path),
    /// creating the database file if missing.
    ///
    /// # Errors
    ///
    /// Fails when the URL is malformed or the file cannot be opened.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let conn = SqliteConnection::connect_with(&options).await?;
        debug!(url, "Opened SQLite connection");
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    async fn control(&mut self, sql: &str) -> Result<()> {
        debug!(sql, "Transaction control");
        sqlx::query(sql).execute(&mut self.conn).await?;
        Ok(())
    }
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param(query: Query<'_>, value: SqlValue) -> Query<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn prepare<'q>(sql: &'q str, params: &[SqlValue]) -> Query<'q> {
    params
        .iter()
        .cloned()
        .fold(sqlx::query(sql), bind_param)
}

/// Decodes one column by the storage class of its value.
fn decode_value(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();
    let decoded = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => <i64 as Decode<Sqlite>>::decode(raw).map(SqlValue::Int),
        "REAL" | "NUMERIC" => <f64 as Decode<Sqlite>>::decode(raw).map(SqlValue::Float),
        "BLOB" => <Vec<u8> as Decode<Sqlite>>::decode(raw).map(SqlValue::Blob),
        _ => <String as Decode<Sqlite>>::decode(raw).map(SqlValue::Text),
    };
    decoded.map_err(|err| sqlx::Error::Decode(err).into())
}

fn convert_row(row: &SqliteRow) -> Result<Row> {
    let columns = row
        .columns()
        .iter()
        .map(|column| String::from(column.name()))
        .collect();
    let values = (0..row.len())
        .map(|index| decode_value(row, index))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row::new(columns, values))
}

#[async_trait]
impl Driver for SqliteDriver {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let rows = prepare(sql, params).fetch_all(&mut self.conn).await?;
        rows.iter().map(convert_row).collect()
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        let result = prepare(sql, params).execute(&mut self.conn).await?;
        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    async fn begin(&mut self) -> Result<()> {
        self.control("BEGIN").await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.control("COMMIT").await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        // The transaction is over even if ROLLBACK itself fails.
        self.in_transaction = false;
        self.control("ROLLBACK").await
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_types() {
        let mut driver = SqliteDriver::connect("sqlite::memory:").await.unwrap();
        driver
            .execute(
                "CREATE TABLE t (i INTEGER, r REAL, s TEXT, b BLOB, n TEXT)",
                &[],
            )
            .await
            .unwrap();
        let result = driver
            .execute(
                "INSERT INTO t (i, r, s, b, n) VALUES (?, ?, ?, ?, ?)",
                &[
                    SqlValue::Int(42),
                    SqlValue::Float(1.5),
                    SqlValue::Text(String::from("hi")),
                    SqlValue::Blob(vec![1, 2]),
                    SqlValue::Null,
                ],
            )
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(1));

        let rows = driver.query("SELECT * FROM t", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].values(),
            &[
                SqlValue::Int(42),
                SqlValue::Float(1.5),
                SqlValue::Text(String::from("hi")),
                SqlValue::Blob(vec![1, 2]),
                SqlValue::Null,
            ]
        );
        assert_eq!(rows[0].columns()[2], "s");
    }

    #[tokio::test]
    async fn test_transaction_flags() {
        let mut driver = SqliteDriver::connect("sqlite::memory:").await.unwrap();
        driver.execute("CREATE TABLE t (i INTEGER)", &[]).await.unwrap();
        driver.begin().await.unwrap();
        assert!(driver.in_transaction());
        driver
            .execute("INSERT INTO t (i) VALUES (?)", &[SqlValue::Int(1)])
            .await
            .unwrap();
        driver.rollback().await.unwrap();
        assert!(!driver.in_transaction());
        let rows = driver.query("SELECT COUNT(*) FROM t", &[]).await.unwrap();
        assert_eq!(rows[0].get_index(0), Some(&SqlValue::Int(0)));
    }

    #[tokio::test]
    async fn test_driver_error_surfaces() {
        let mut driver = SqliteDriver::connect("sqlite::memory:").await.unwrap();
        let err = driver.query("SELECT * FROM missing", &[]).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Driver);
    }
}
