//! Error types for the migration system.

use std::path::PathBuf;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Database error while running a migration or touching the history.
    #[error("Database error: {0}")]
    Database(#[from] sqlweave::Error),

    /// IO error (reading/writing migration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No migrations directory found.
    #[error("Migrations directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// A `.sql` file that is neither `<name>.up.sql` nor `<name>.down.sql`,
    /// or a down file without its up file.
    #[error("Invalid migration file name: {0}")]
    InvalidFileName(PathBuf),

    /// Two migrations share a name.
    #[error("Migration '{0}' is registered twice")]
    DuplicateMigration(String),

    /// The history lists a migration that is not registered.
    #[error("Migration '{0}' is applied but not registered")]
    MissingMigration(String),

    /// A migration has no down step.
    #[error("Migration '{0}' is not reversible")]
    NotReversible(String),

    /// A batch failed and rolling it back failed too.
    #[error("{error}; rollback failed: {rollback}")]
    RollbackFailed {
        /// The error that aborted the batch.
        error: Box<MigrateError>,
        /// The error raised by the rollback.
        rollback: sqlweave::Error,
    },

    /// Migration file already exists.
    #[error("Migration file already exists: {0}")]
    MigrationExists(PathBuf),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
