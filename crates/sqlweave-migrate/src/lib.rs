//! Batch-tracked database migrations for sqlweave.
//!
//! `sqlweave-migrate` applies named migrations in name order and records
//! each one in a bookkeeping table with the batch it was applied in:
//! - every `migrate` call applies all pending migrations as one new batch
//! - `rollback` reverts the most recent batches, newest migration first
//! - `reset` reverts everything and `refresh` resets then migrates again
//! - each of these runs in a single transaction
//!
//! # Architecture
//!
//! - **Migration** - A named `up`/`down` pair, written in Rust or as
//!   `<name>.up.sql` / `<name>.down.sql` files
//! - **MigrationSet** - Registry of migrations, ordered by name
//! - **MigrationHistory** - The bookkeeping table
//! - **Migrator** - Applies and reverts a set against a database
//!
//! # Example
//!
//! ```rust,no_run
//! use sqlweave::{Database, Options};
//! use sqlweave_migrate::prelude::*;
//!
//! # async fn demo() -> sqlweave_migrate::Result<()> {
//! let mut set = MigrationSet::new();
//! set.register(SqlMigration::new(
//!     "2024_01_01_000000_create_users",
//!     "CREATE TABLE <users> (<id> INTEGER PRIMARY KEY, <email> TEXT NOT NULL)",
//!     Some(String::from("DROP TABLE <users>")),
//! ))?;
//!
//! let mut db = Database::connect(&Options::sqlite_memory().prefix("app_")).await?;
//! let migrator = Migrator::new(set);
//! assert_eq!(migrator.migrate(&mut db).await?.len(), 1);
//! assert!(migrator.migrate(&mut db).await?.is_empty());
//! migrator.rollback(&mut db, 1).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod ext;
pub mod history;
pub mod migration;
pub mod migrator;
pub mod set;

pub use error::{MigrateError, Result};
pub use ext::MigrateExt;
pub use history::{AppliedMigration, MigrationHistory, DEFAULT_TABLE};
pub use migration::{split_statements, Migration, SqlMigration};
pub use migrator::{MigrationStatus, Migrator};
pub use set::{create_migration_files, MigrationSet};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{MigrateError, Result};
    pub use crate::ext::MigrateExt;
    pub use crate::history::{AppliedMigration, MigrationHistory};
    pub use crate::migration::{Migration, SqlMigration};
    pub use crate::migrator::{MigrationStatus, Migrator};
    pub use crate::set::MigrationSet;
}
