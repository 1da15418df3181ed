//! The query facade.
//!
//! [`Database`] owns one [`Driver`] and a [`QueryBuilder`] for its dialect
//! and table prefix. Every method compiles its statement first, so a
//! malformed request never reaches the database.
//!
//! Read-shaped helpers (`select`, `get`, `count`, `has`, ...) never fail:
//! on any error they return an empty value and keep the error for
//! [`Database::error`]. Use the `try_` variants where an empty result must
//! not be mistaken for a failure. Write-shaped helpers return [`Result`].

use futures::future::BoxFuture;
use sqlweave_core::builder::{
    raw, Aggregate, Columns, Join, QueryBuilder, Replacements, Statement, Values, Where,
};
use sqlweave_core::migrations::Blueprint;
use sqlweave_core::{DialectKind, SqlValue};
use tracing::{debug, info, warn};

use crate::driver::{Driver, QueryResult, Row};
use crate::error::{Error, ErrorInfo, Result};
use crate::options::Options;
use crate::sqlite::SqliteDriver;

/// Multi-dialect query facade over one database connection.
pub struct Database {
    driver: Box<dyn Driver>,
    builder: QueryBuilder,
    logging: bool,
    log: Vec<String>,
    last: Option<String>,
    error: Option<ErrorInfo>,
    last_insert_id: Option<i64>,
}

fn or_empty<T>(result: Result<T>, empty: T) -> T {
    result.unwrap_or_else(|err| {
        warn!(error = %err, "Query failed, returning empty result");
        empty
    })
}

impl Database {
    /// Connects with the bundled driver for `options`.
    ///
    /// Only SQLite ships a driver; use [`Database::with_driver`] for other
    /// dialects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unsupported tag, a dialect without a
    /// bundled driver or a missing `database`, and a driver error when the
    /// connection cannot be opened.
    pub async fn connect(options: &Options) -> Result<Self> {
        let kind = options.dialect()?;
        if kind != DialectKind::Sqlite {
            return Err(Error::Config(format!(
                "no bundled driver for {kind}, use Database::with_driver"
            )));
        }
        let url = options
            .database
            .as_deref()
            .ok_or_else(|| Error::Config(String::from("sqlite requires a database")))?;
        let driver = SqliteDriver::connect(url).await?;
        Self::with_driver(Box::new(driver), options)
    }

    /// Wraps a caller-supplied driver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the options name an unsupported
    /// dialect or one that differs from the driver's.
    pub fn with_driver(driver: Box<dyn Driver>, options: &Options) -> Result<Self> {
        let kind = options.dialect()?;
        if driver.kind() != kind {
            return Err(Error::Config(format!(
                "driver speaks {}, options ask for {kind}",
                driver.kind()
            )));
        }
        Ok(Self {
            driver,
            builder: QueryBuilder::new(kind).with_prefix(options.prefix.as_str()),
            logging: options.logging,
            log: vec![],
            last: None,
            error: None,
            last_insert_id: None,
        })
    }

    /// Returns the statement builder for this connection.
    #[must_use]
    pub const fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn kind(&self) -> DialectKind {
        self.builder.kind()
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.builder.prefix()
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        self.error = result.as_ref().err().map(Error::info);
        result
    }

    fn compiled(&mut self, compiled: sqlweave_core::Result<Statement>) -> Result<Statement> {
        self.record(compiled.map_err(Error::from))
    }

    fn trace(&mut self, statement: &Statement) {
        debug!(
            sql = %statement.sql(),
            params = statement.params().len(),
            "Executing statement"
        );
        let inline = statement.to_inline_sql();
        if self.logging {
            self.log.push(inline.clone());
        }
        self.last = Some(inline);
    }

    async fn fetch(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        self.trace(statement);
        let result = self
            .driver
            .query(statement.sql(), statement.params())
            .await;
        self.record(result)
    }

    async fn run(&mut self, statement: &Statement) -> Result<QueryResult> {
        self.trace(statement);
        let result = self
            .driver
            .execute(statement.sql(), statement.params())
            .await;
        self.record(result)
    }

    async fn run_all(&mut self, statements: Vec<String>) -> Result<()> {
        for sql in statements {
            self.run(&Statement::new(sql, vec![])).await?;
        }
        Ok(())
    }

    fn raw_statement(&self, sql: &str, params: &[SqlValue]) -> Statement {
        Statement::new(
            self.builder.render_raw(&raw(sql)),
            params.iter().cloned().map(SqlValue::coerce).collect(),
        )
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Selects rows, failing on compile or driver errors.
    ///
    /// # Errors
    ///
    /// Returns the compile or driver error; it is also kept for
    /// [`Database::error`].
    pub async fn try_select(
        &mut self,
        table: &str,
        joins: &[Join],
        columns: &Columns,
        conditions: &Where,
    ) -> Result<Vec<Row>> {
        let compiled = self.builder.select(table, joins, columns, conditions);
        let statement = self.compiled(compiled)?;
        self.fetch(&statement).await
    }

    /// Selects rows; empty on error.
    pub async fn select(&mut self, table: &str, columns: &Columns, conditions: &Where) -> Vec<Row> {
        self.select_join(table, &[], columns, conditions).await
    }

    /// Selects rows across joins; empty on error.
    pub async fn select_join(
        &mut self,
        table: &str,
        joins: &[Join],
        columns: &Columns,
        conditions: &Where,
    ) -> Vec<Row> {
        or_empty(self.try_select(table, joins, columns, conditions).await, vec![])
    }

    /// Returns the first selected row, if any.
    pub async fn select_one(
        &mut self,
        table: &str,
        columns: &Columns,
        conditions: &Where,
    ) -> Option<Row> {
        self.select_join_one(table, &[], columns, conditions).await
    }

    /// Returns the first selected row across joins, if any.
    pub async fn select_join_one(
        &mut self,
        table: &str,
        joins: &[Join],
        columns: &Columns,
        conditions: &Where,
    ) -> Option<Row> {
        self.select_join(table, joins, columns, conditions)
            .await
            .into_iter()
            .next()
    }

    /// Returns `column` of the first selected row, if any.
    pub async fn select_value(
        &mut self,
        table: &str,
        column: &str,
        conditions: &Where,
    ) -> Option<SqlValue> {
        self.select_one(table, &Columns::from(column), conditions)
            .await
            .and_then(Row::into_first)
    }

    /// Returns one row, adding `LIMIT 1`.
    pub async fn get(&mut self, table: &str, columns: &Columns, conditions: &Where) -> Option<Row> {
        self.get_join(table, &[], columns, conditions).await
    }

    /// Returns one row across joins, adding `LIMIT 1`.
    pub async fn get_join(
        &mut self,
        table: &str,
        joins: &[Join],
        columns: &Columns,
        conditions: &Where,
    ) -> Option<Row> {
        let conditions = conditions.clone().limit(1);
        self.select_join_one(table, joins, columns, &conditions).await
    }

    /// Selects rows in random order. A `LIMIT` in `conditions` still
    /// applies.
    pub async fn rand(&mut self, table: &str, columns: &Columns, conditions: &Where) -> Vec<Row> {
        self.rand_join(table, &[], columns, conditions).await
    }

    /// Selects rows across joins in random order.
    pub async fn rand_join(
        &mut self,
        table: &str,
        joins: &[Join],
        columns: &Columns,
        conditions: &Where,
    ) -> Vec<Row> {
        let random = raw(self.builder.dialect().random_function());
        let conditions = conditions.clone().order_raw(random);
        self.select_join(table, joins, columns, &conditions).await
    }

    /// Runs raw SQL, failing on driver errors.
    ///
    /// `<table>` and `<column>` tokens are quoted, table positions with the
    /// prefix.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn try_query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let statement = self.raw_statement(sql, params);
        self.fetch(&statement).await
    }

    /// Runs raw SQL; empty on error.
    pub async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Vec<Row> {
        or_empty(self.try_query(sql, params).await, vec![])
    }

    /// Returns the first value of the first row of raw SQL.
    pub async fn query_value(&mut self, sql: &str, params: &[SqlValue]) -> Option<SqlValue> {
        self.query(sql, params)
            .await
            .into_iter()
            .next()
            .and_then(Row::into_first)
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    async fn try_aggregate(
        &mut self,
        function: Aggregate,
        table: &str,
        joins: &[Join],
        column: &str,
        conditions: &Where,
    ) -> Result<Option<SqlValue>> {
        let compiled = self
            .builder
            .aggregate(function, table, joins, column, conditions);
        let statement = self.compiled(compiled)?;
        let value = self
            .fetch(&statement)
            .await?
            .into_iter()
            .next()
            .and_then(Row::into_first);
        Ok(value.filter(|value| !value.is_null()))
    }

    async fn aggregate(
        &mut self,
        function: Aggregate,
        table: &str,
        joins: &[Join],
        column: &str,
        conditions: &Where,
    ) -> Option<SqlValue> {
        let result = self
            .try_aggregate(function, table, joins, column, conditions)
            .await;
        or_empty(result, None)
    }

    /// Counts matching rows; 0 on error.
    pub async fn count(&mut self, table: &str, conditions: &Where) -> i64 {
        self.count_join(table, &[], "*", conditions).await
    }

    /// Counts non-null `column` values across joins; 0 on error.
    pub async fn count_join(
        &mut self,
        table: &str,
        joins: &[Join],
        column: &str,
        conditions: &Where,
    ) -> i64 {
        self.aggregate(Aggregate::Count, table, joins, column, conditions)
            .await
            .as_ref()
            .and_then(SqlValue::as_i64)
            .unwrap_or(0)
    }

    /// `SUM(column)`; `None` on no rows or error.
    pub async fn sum(&mut self, table: &str, column: &str, conditions: &Where) -> Option<SqlValue> {
        self.sum_join(table, &[], column, conditions).await
    }

    /// `SUM(column)` across joins.
    pub async fn sum_join(
        &mut self,
        table: &str,
        joins: &[Join],
        column: &str,
        conditions: &Where,
    ) -> Option<SqlValue> {
        self.aggregate(Aggregate::Sum, table, joins, column, conditions)
            .await
    }

    /// `AVG(column)`; `None` on no rows or error.
    pub async fn avg(&mut self, table: &str, column: &str, conditions: &Where) -> Option<SqlValue> {
        self.avg_join(table, &[], column, conditions).await
    }

    /// `AVG(column)` across joins.
    pub async fn avg_join(
        &mut self,
        table: &str,
        joins: &[Join],
        column: &str,
        conditions: &Where,
    ) -> Option<SqlValue> {
        self.aggregate(Aggregate::Avg, table, joins, column, conditions)
            .await
    }

    /// `MIN(column)`; `None` on no rows or error.
    pub async fn min(&mut self, table: &str, column: &str, conditions: &Where) -> Option<SqlValue> {
        self.min_join(table, &[], column, conditions).await
    }

    /// `MIN(column)` across joins.
    pub async fn min_join(
        &mut self,
        table: &str,
        joins: &[Join],
        column: &str,
        conditions: &Where,
    ) -> Option<SqlValue> {
        self.aggregate(Aggregate::Min, table, joins, column, conditions)
            .await
    }

    /// `MAX(column)`; `None` on no rows or error.
    pub async fn max(&mut self, table: &str, column: &str, conditions: &Where) -> Option<SqlValue> {
        self.max_join(table, &[], column, conditions).await
    }

    /// `MAX(column)` across joins.
    pub async fn max_join(
        &mut self,
        table: &str,
        joins: &[Join],
        column: &str,
        conditions: &Where,
    ) -> Option<SqlValue> {
        self.aggregate(Aggregate::Max, table, joins, column, conditions)
            .await
    }

    /// Whether any row matches; `false` on error.
    pub async fn has(&mut self, table: &str, conditions: &Where) -> bool {
        self.has_join(table, &[], conditions).await
    }

    /// Whether any joined row matches; `false` on error.
    pub async fn has_join(&mut self, table: &str, joins: &[Join], conditions: &Where) -> bool {
        self.count_join(table, joins, "*", conditions).await > 0
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts one or more rows sharing the same columns.
    ///
    /// # Errors
    ///
    /// Returns the compile or driver error.
    pub async fn insert(&mut self, table: &str, rows: &[Values]) -> Result<QueryResult> {
        let compiled = self.builder.insert(table, rows);
        let statement = self.compiled(compiled)?;
        let result = self.run(&statement).await?;
        if result.rows_affected > 0 {
            self.last_insert_id = result.last_insert_id;
        }
        Ok(result)
    }

    /// Updates matching rows and returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns the compile or driver error.
    pub async fn update(&mut self, table: &str, data: &Values, conditions: &Where) -> Result<u64> {
        let compiled = self.builder.update(table, data, conditions);
        let statement = self.compiled(compiled)?;
        Ok(self.run(&statement).await?.rows_affected)
    }

    /// Deletes matching rows and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns the compile or driver error.
    pub async fn delete(&mut self, table: &str, conditions: &Where) -> Result<u64> {
        let compiled = self.builder.delete(table, conditions);
        let statement = self.compiled(compiled)?;
        Ok(self.run(&statement).await?.rows_affected)
    }

    /// Replaces listed old values with new ones in matching rows.
    ///
    /// # Errors
    ///
    /// Returns the compile or driver error.
    pub async fn replace(
        &mut self,
        table: &str,
        replacements: &Replacements,
        conditions: &Where,
    ) -> Result<u64> {
        let compiled = self.builder.replace(table, replacements, conditions);
        let statement = self.compiled(compiled)?;
        Ok(self.run(&statement).await?.rows_affected)
    }

    /// Runs raw SQL and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let statement = self.raw_statement(sql, params);
        Ok(self.run(&statement).await?.rows_affected)
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Creates a table from raw column definitions, if it does not exist.
    ///
    /// `<identifier>` tokens in definitions and options are quoted.
    ///
    /// # Errors
    ///
    /// Returns the compile or driver error.
    pub async fn create(
        &mut self,
        table: &str,
        columns: &[(&str, &str)],
        options: &[&str],
    ) -> Result<()> {
        let supports_if_not_exists = self.builder.dialect().supports_if_not_exists();
        self.create_table(table, |blueprint| {
            for (name, definition) in columns {
                blueprint.raw_column(name, definition);
            }
            for option in options {
                blueprint.option(option);
            }
            if supports_if_not_exists {
                blueprint.if_not_exists();
            }
        })
        .await
    }

    /// Drops a table if it exists.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn drop(&mut self, table: &str) -> Result<()> {
        self.drop_table_if_exists(table).await
    }

    /// Creates a table from a blueprint filled by `build`.
    ///
    /// # Errors
    ///
    /// Returns the compile or driver error.
    pub async fn create_table<F>(&mut self, table: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = Blueprint::create(table).with_prefix(self.prefix());
        build(&mut blueprint);
        let compiled = blueprint.build(self.kind());
        let statements = self.record(compiled.map_err(Error::from))?;
        info!(table, statements = statements.len(), "Creating table");
        self.run_all(statements).await
    }

    /// Alters a table with a blueprint filled by `build`.
    ///
    /// # Errors
    ///
    /// Returns the compile or driver error.
    pub async fn alter_table<F>(&mut self, table: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = Blueprint::alter(table).with_prefix(self.prefix());
        build(&mut blueprint);
        let compiled = blueprint.build(self.kind());
        let statements = self.record(compiled.map_err(Error::from))?;
        info!(table, statements = statements.len(), "Altering table");
        self.run_all(statements).await
    }

    fn prefixed(&self, table: &str) -> String {
        format!("{}{table}", self.prefix())
    }

    /// Renames a table.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        let sql = self
            .builder
            .dialect()
            .rename_table_sql(&self.prefixed(from), &self.prefixed(to));
        self.run_all(vec![sql]).await
    }

    /// Drops a table.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn drop_table(&mut self, table: &str) -> Result<()> {
        let quoted = self
            .builder
            .dialect()
            .quote_ddl_identifier(&self.prefixed(table));
        self.run_all(vec![format!("DROP TABLE {quoted}")]).await
    }

    /// Drops a table if it exists.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn drop_table_if_exists(&mut self, table: &str) -> Result<()> {
        let sql = self
            .builder
            .dialect()
            .drop_table_if_exists_sql(&self.prefixed(table));
        self.run_all(vec![sql]).await
    }

    /// Whether the (prefixed) table exists.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn has_table(&mut self, table: &str) -> Result<bool> {
        let statement = Statement::new(
            self.builder.dialect().table_exists_sql(),
            vec![SqlValue::Text(self.prefixed(table))],
        );
        Ok(!self.fetch(&statement).await?.is_empty())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn begin(&mut self) -> Result<()> {
        let result = self.driver.begin().await;
        self.record(result)
    }

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn commit(&mut self) -> Result<()> {
        let result = self.driver.commit().await;
        self.record(result)
    }

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn rollback(&mut self) -> Result<()> {
        let result = self.driver.rollback().await;
        self.record(result)
    }

    /// Whether a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.driver.in_transaction()
    }

    /// Runs `callback` inside a transaction.
    ///
    /// Commits when the callback returns `Ok(true)`. Rolls back when it
    /// returns `Ok(false)` (and returns `Ok(false)`), when it returns an
    /// error, or when the commit fails. Errors are returned as is, or as
    /// [`Error::RollbackFailed`] when the rollback fails too.
    ///
    /// Calling `action` inside another `action` is not supported.
    ///
    /// ```rust,no_run
    /// # async fn demo(db: &mut sqlweave::Database) -> sqlweave::Result<()> {
    /// use sqlweave::Values;
    ///
    /// let committed = db
    ///     .action(|db| {
    ///         Box::pin(async move {
    ///             db.insert("account", &[Values::new().set("name", "foo")]).await?;
    ///             Ok(true)
    ///         })
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the callback's error or a transaction control error.
    pub async fn action<F>(&mut self, callback: F) -> Result<bool>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<bool>> + Send,
    {
        self.begin().await?;
        match callback(self).await {
            Ok(true) => match self.commit().await {
                Ok(()) => Ok(true),
                Err(error) => {
                    warn!(error = %error, "Commit failed, rolling back");
                    Err(self.abort(error).await)
                }
            },
            Ok(false) => {
                info!("Transaction callback asked for rollback");
                self.rollback().await?;
                Ok(false)
            }
            Err(error) => {
                warn!(error = %error, "Transaction callback failed, rolling back");
                Err(self.abort(error).await)
            }
        }
    }

    /// Rolls back the open transaction after `error` and returns the error
    /// to report: `error` itself, or [`Error::RollbackFailed`] when the
    /// rollback fails too. The result is kept as the last error.
    async fn abort(&mut self, error: Error) -> Error {
        let error = match self.driver.rollback().await {
            Ok(()) => error,
            Err(rollback) => Error::RollbackFailed {
                error: Box::new(error),
                rollback: Box::new(rollback),
            },
        };
        self.error = Some(error.info());
        error
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Returns the id generated by the last successful insert.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// Returns the last error message, kept until the next operation.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|info| info.message.as_str())
    }

    /// Returns details of the last error.
    #[must_use]
    pub const fn error_info(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Returns the last statement with its parameters inlined.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Returns every statement run so far when logging is enabled.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }
}
