//! Migration history tracking.
//!
//! This module manages the bookkeeping table (default `migrations`, prefixed
//! like any other table) that records which migrations were applied, in
//! which batch and when.

use chrono::NaiveDateTime;
use sqlweave::{Columns, Database, Row, SqlValue, Values, Where};
use tracing::info;

use crate::error::Result;

/// Default bookkeeping table name.
pub const DEFAULT_TABLE: &str = "migrations";

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    /// Unique ID in the migrations table.
    pub id: i64,
    /// Migration name.
    pub migration: String,
    /// Batch the migration was applied in.
    pub batch: i64,
    /// When the migration was applied, as reported by the database.
    pub executed_at: Option<NaiveDateTime>,
}

impl AppliedMigration {
    fn from_row(row: &Row) -> Self {
        let int = |column| row.get(column).and_then(SqlValue::as_i64).unwrap_or_default();
        Self {
            id: int("id"),
            migration: row
                .get("migration")
                .and_then(SqlValue::as_str)
                .map(String::from)
                .unwrap_or_default(),
            batch: int("batch"),
            executed_at: row
                .get("executed_at")
                .and_then(SqlValue::as_str)
                .and_then(parse_timestamp),
        }
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Manages the migration history in the database.
#[derive(Debug, Clone)]
pub struct MigrationHistory {
    table: String,
}

impl Default for MigrationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE)
    }
}

impl MigrationHistory {
    /// Creates a history manager for `table` (without prefix).
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: String::from(table),
        }
    }

    /// Returns the table name (without prefix).
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the bookkeeping table when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub async fn ensure_table(&self, db: &mut Database) -> Result<()> {
        if db.has_table(&self.table).await? {
            return Ok(());
        }
        info!(table = %self.table, "Creating migrations table");
        db.create_table(&self.table, |table| {
            table.increments("id");
            table.string("migration", 255);
            table.integer("batch");
            table.timestamp("executed_at").use_current();
        })
        .await?;
        Ok(())
    }

    /// Records a migration as applied in `batch`.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub async fn record_applied(&self, db: &mut Database, migration: &str, batch: i64) -> Result<()> {
        db.insert(
            &self.table,
            &[Values::new()
                .set("migration", migration)
                .set("batch", batch)],
        )
        .await?;
        Ok(())
    }

    /// Removes a migration record.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub async fn record_unapplied(&self, db: &mut Database, migration: &str) -> Result<()> {
        db.delete(&self.table, &Where::new().field("migration", migration))
            .await?;
        Ok(())
    }

    /// Gets all applied migrations in application order.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub async fn get_applied(&self, db: &mut Database) -> Result<Vec<AppliedMigration>> {
        let rows = db
            .try_select(
                &self.table,
                &[],
                &Columns::from(["id", "migration", "batch", "executed_at"]),
                &Where::new().order_by("batch").order_by("id"),
            )
            .await?;
        Ok(rows.iter().map(AppliedMigration::from_row).collect())
    }

    /// Returns the highest batch number, 0 when nothing is applied.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub async fn last_batch(&self, db: &mut Database) -> Result<i64> {
        let applied = self.get_applied(db).await?;
        Ok(applied.iter().map(|m| m.batch).max().unwrap_or(0))
    }
}
