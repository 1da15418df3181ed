//! Directory-based migration helpers on [`Database`].

use std::path::Path;

use async_trait::async_trait;
use sqlweave::Database;

use crate::error::Result;
use crate::migrator::Migrator;
use crate::set::MigrationSet;

/// Runs the `.sql` migrations of a directory against a [`Database`],
/// bookkept in the default `migrations` table.
///
/// ```rust,no_run
/// use std::path::Path;
/// use sqlweave::{Database, Options};
/// use sqlweave_migrate::MigrateExt;
///
/// # async fn demo() -> sqlweave_migrate::Result<()> {
/// let mut db = Database::connect(&Options::sqlite_memory()).await?;
/// let applied = db.migrate(Path::new("migrations")).await?;
/// println!("applied {applied:?}");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MigrateExt {
    /// Applies pending migrations from `dir`.
    async fn migrate(&mut self, dir: &Path) -> Result<Vec<String>>;

    /// Reverts the last `steps` batches.
    async fn rollback_migrations(&mut self, dir: &Path, steps: usize) -> Result<Vec<String>>;

    /// Reverts every applied migration.
    async fn reset(&mut self, dir: &Path) -> Result<Vec<String>>;

    /// Resets, then migrates again.
    async fn refresh(&mut self, dir: &Path) -> Result<Vec<String>>;
}

#[async_trait]
impl MigrateExt for Database {
    async fn migrate(&mut self, dir: &Path) -> Result<Vec<String>> {
        Migrator::new(MigrationSet::from_dir(dir)?).migrate(self).await
    }

    async fn rollback_migrations(&mut self, dir: &Path, steps: usize) -> Result<Vec<String>> {
        Migrator::new(MigrationSet::from_dir(dir)?)
            .rollback(self, steps)
            .await
    }

    async fn reset(&mut self, dir: &Path) -> Result<Vec<String>> {
        Migrator::new(MigrationSet::from_dir(dir)?).reset(self).await
    }

    async fn refresh(&mut self, dir: &Path) -> Result<Vec<String>> {
        Migrator::new(MigrationSet::from_dir(dir)?).refresh(self).await
    }
}
