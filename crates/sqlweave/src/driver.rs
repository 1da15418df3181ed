//! The driver seam.
//!
//! A [`Driver`] executes compiled SQL with positional parameters on one
//! connection and controls transactions on it. The facade never sees a
//! connection directly, so any database reachable from Rust can sit behind
//! it; [`crate::SqliteDriver`] is the bundled implementation.

use async_trait::async_trait;
use sqlweave_core::{DialectKind, SqlValue};

use crate::error::Result;

/// One result row: column names and values in select-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row. `columns` and `values` must have the same length.
    #[must_use]
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Returns the value of the named column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.values.get(index))
    }

    /// Returns the value at `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a row without columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the row, returning its first value.
    #[must_use]
    pub fn into_first(self) -> Option<SqlValue> {
        self.values.into_iter().next()
    }
}

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryResult {
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Identifier generated by the last insert on the connection.
    pub last_insert_id: Option<i64>,
}

/// Executes statements on one database connection.
///
/// Implementations bind `params` positionally to the `?` placeholders in
/// `sql`, in order.
#[async_trait]
pub trait Driver: Send {
    /// Returns the dialect this connection speaks.
    fn kind(&self) -> DialectKind;

    /// Runs a row-returning statement.
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Runs a statement and reports affected rows.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<QueryResult>;

    /// Starts a transaction.
    async fn begin(&mut self) -> Result<()>;

    /// Commits the open transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Rolls back the open transaction.
    async fn rollback(&mut self) -> Result<()>;

    /// Whether a transaction is open.
    fn in_transaction(&self) -> bool;
}
