//! Error types for the query facade.

use sqlweave_core::CompileError;
use thiserror::Error;

/// Facade errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The statement could not be compiled; nothing reached the database.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Error reported by a non-sqlx driver.
    #[error("driver error: {message}")]
    Driver {
        /// Vendor error code, if any.
        code: Option<String>,
        /// Error message.
        message: String,
    },

    /// Invalid or inconsistent configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A transaction failed and rolling it back failed too.
    #[error("{error}; rollback failed: {rollback}")]
    RollbackFailed {
        /// The error that aborted the transaction.
        error: Box<Error>,
        /// The error raised by the rollback.
        rollback: Box<Error>,
    },
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before reaching the driver.
    Compile,
    /// Raised by the driver or the database.
    Driver,
    /// Configuration problem.
    Config,
    /// Transaction control failure.
    Transaction,
}

/// Snapshot of the last error, kept by [`crate::Database`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Error classification.
    pub kind: ErrorKind,
    /// Vendor error code, if the database reported one.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl Error {
    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Compile(_) => ErrorKind::Compile,
            Self::Database(_) | Self::Driver { .. } => ErrorKind::Driver,
            Self::Config(_) => ErrorKind::Config,
            Self::RollbackFailed { .. } => ErrorKind::Transaction,
        }
    }

    /// Returns the vendor error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<String> {
        match self {
            Self::Database(sqlx::Error::Database(db)) => db.code().map(|code| code.into_owned()),
            Self::Driver { code, .. } => code.clone(),
            Self::RollbackFailed { error, .. } => error.code(),
            _ => None,
        }
    }

    /// Captures this error as an [`ErrorInfo`].
    #[must_use]
    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            kind: self.kind(),
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Result type alias for facade operations.
pub type Result<T> = std::result::Result<T, Error>;
