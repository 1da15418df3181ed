//! Migration executor.
//!
//! This module applies and rolls back migrations in batches. Each
//! `migrate`, `rollback` and `reset` call runs in one transaction: when any
//! migration in it fails, neither the schema changes nor the history rows
//! of that call are kept.

use std::collections::HashSet;

use sqlweave::Database;
use tracing::{info, warn};

use crate::error::{MigrateError, Result};
use crate::history::{AppliedMigration, MigrationHistory};
use crate::migration::Migration;
use crate::set::MigrationSet;

/// State of one migration, as reported by [`Migrator::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migration name.
    pub name: String,
    /// Batch it was applied in, `None` while pending.
    pub batch: Option<i64>,
    /// Whether the migration is registered. Applied migrations that are no
    /// longer registered are still listed.
    pub registered: bool,
}

/// Applies and reverts a [`MigrationSet`] against a database.
pub struct Migrator {
    set: MigrationSet,
    history: MigrationHistory,
}

/// Commits the batch transaction, or rolls it back when the batch or its
/// commit failed.
async fn finish<T>(db: &mut Database, result: Result<T>) -> Result<T> {
    let error = match result {
        Ok(value) => match db.commit().await {
            Ok(()) => return Ok(value),
            Err(commit) => MigrateError::Database(commit),
        },
        Err(error) => error,
    };
    warn!(error = %error, "Migration failed, rolling back");
    match db.rollback().await {
        Ok(()) => Err(error),
        Err(rollback) => Err(MigrateError::RollbackFailed {
            error: Box::new(error),
            rollback,
        }),
    }
}

impl Migrator {
    /// Creates a migrator using the default `migrations` table.
    #[must_use]
    pub fn new(set: MigrationSet) -> Self {
        Self {
            set,
            history: MigrationHistory::default(),
        }
    }

    /// Uses `table` for bookkeeping.
    #[must_use]
    pub fn with_table(mut self, table: &str) -> Self {
        self.history = MigrationHistory::new(table);
        self
    }

    /// Returns the registered migrations.
    #[must_use]
    pub const fn set(&self) -> &MigrationSet {
        &self.set
    }

    /// Returns the history manager.
    #[must_use]
    pub const fn history(&self) -> &MigrationHistory {
        &self.history
    }

    /// Applies every pending migration as one new batch and returns their
    /// names. Running it again without new migrations applies nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failing migration's error; the whole batch is
    /// rolled back.
    pub async fn migrate(&self, db: &mut Database) -> Result<Vec<String>> {
        self.migrate_after(db, 0).await
    }

    async fn migrate_after(&self, db: &mut Database, floor: i64) -> Result<Vec<String>> {
        self.history.ensure_table(db).await?;
        let applied = self.history.get_applied(db).await?;
        let done: HashSet<&str> = applied.iter().map(|m| m.migration.as_str()).collect();
        let pending: Vec<&dyn Migration> = self
            .set
            .iter()
            .filter(|migration| !done.contains(migration.name()))
            .collect();

        if pending.is_empty() {
            info!("Nothing to migrate");
            return Ok(vec![]);
        }

        let last = applied.iter().map(|m| m.batch).max().unwrap_or(0);
        let batch = last.max(floor) + 1;
        db.begin().await?;
        let result = self.apply(db, &pending, batch).await;
        finish(db, result).await
    }

    async fn apply(
        &self,
        db: &mut Database,
        pending: &[&dyn Migration],
        batch: i64,
    ) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(pending.len());
        for migration in pending {
            let name = migration.name();
            info!(migration = name, batch, "Applying migration");
            migration.up(db).await?;
            self.history.record_applied(db, name, batch).await?;
            info!(migration = name, "Applied migration");
            names.push(String::from(name));
        }
        Ok(names)
    }

    /// Reverts the last `steps` batches, newest first, and returns the
    /// reverted names in order.
    ///
    /// # Errors
    ///
    /// Fails before touching anything when an applied migration is not
    /// registered; otherwise returns the first failing down step's error
    /// and rolls everything back.
    pub async fn rollback(&self, db: &mut Database, steps: usize) -> Result<Vec<String>> {
        self.history.ensure_table(db).await?;
        let applied = self.history.get_applied(db).await?;
        let mut batches: Vec<i64> = applied.iter().map(|m| m.batch).collect();
        batches.sort_unstable_by(|a, b| b.cmp(a));
        batches.dedup();
        batches.truncate(steps);

        let targets = applied
            .into_iter()
            .filter(|m| batches.contains(&m.batch))
            .collect();
        self.revert(db, targets).await
    }

    /// Reverts every applied migration and returns the reverted names.
    ///
    /// # Errors
    ///
    /// See [`Migrator::rollback`].
    pub async fn reset(&self, db: &mut Database) -> Result<Vec<String>> {
        self.history.ensure_table(db).await?;
        let applied = self.history.get_applied(db).await?;
        self.revert(db, applied).await
    }

    /// Resets, then migrates everything again under a new batch number.
    ///
    /// The two steps run in separate transactions.
    ///
    /// # Errors
    ///
    /// See [`Migrator::reset`] and [`Migrator::migrate`].
    pub async fn refresh(&self, db: &mut Database) -> Result<Vec<String>> {
        self.history.ensure_table(db).await?;
        let last = self.history.last_batch(db).await?;
        self.reset(db).await?;
        self.migrate_after(db, last).await
    }

    async fn revert(
        &self,
        db: &mut Database,
        mut targets: Vec<AppliedMigration>,
    ) -> Result<Vec<String>> {
        if targets.is_empty() {
            info!("Nothing to roll back");
            return Ok(vec![]);
        }
        targets.sort_by(|a, b| (b.batch, b.id).cmp(&(a.batch, a.id)));

        let mut steps = Vec::with_capacity(targets.len());
        for target in &targets {
            let migration = self
                .set
                .get(&target.migration)
                .ok_or_else(|| MigrateError::MissingMigration(target.migration.clone()))?;
            steps.push((migration, target.batch));
        }

        db.begin().await?;
        let result = self.unapply(db, &steps).await;
        finish(db, result).await
    }

    async fn unapply(
        &self,
        db: &mut Database,
        steps: &[(&dyn Migration, i64)],
    ) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(steps.len());
        for (migration, batch) in steps {
            let name = migration.name();
            info!(migration = name, batch, "Rolling back migration");
            migration.down(db).await?;
            self.history.record_unapplied(db, name).await?;
            names.push(String::from(name));
        }
        Ok(names)
    }

    /// Lists registered migrations with their batch, followed by applied
    /// migrations that are no longer registered.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub async fn status(&self, db: &mut Database) -> Result<Vec<MigrationStatus>> {
        self.history.ensure_table(db).await?;
        let applied = self.history.get_applied(db).await?;
        let batch_of = |name: &str| {
            applied
                .iter()
                .find(|m| m.migration == name)
                .map(|m| m.batch)
        };

        let mut status: Vec<MigrationStatus> = self
            .set
            .iter()
            .map(|migration| MigrationStatus {
                name: String::from(migration.name()),
                batch: batch_of(migration.name()),
                registered: true,
            })
            .collect();
        status.extend(
            applied
                .iter()
                .filter(|m| self.set.get(&m.migration).is_none())
                .map(|m| MigrationStatus {
                    name: m.migration.clone(),
                    batch: Some(m.batch),
                    registered: false,
                }),
        );
        Ok(status)
    }
}
