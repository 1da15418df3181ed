//! # sqlweave
//!
//! Multi-dialect query facade over [`sqlweave_core`].
//!
//! This crate provides:
//! - [`Database`] with select, get, rand, count, sum, avg, min, max and has
//!   helpers, inserts, updates, deletes and raw queries
//! - Schema operations built on [`Blueprint`]
//! - Transactions with commit on success and rollback on failure
//! - The [`Driver`] seam with a bundled sqlx [`SqliteDriver`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sqlweave::{Columns, Database, Options, Values, Where};
//!
//! # async fn demo() -> sqlweave::Result<()> {
//! let mut db = Database::connect(&Options::sqlite_memory().prefix("app_")).await?;
//!
//! db.create_table("account", |table| {
//!     table.id();
//!     table.string("user_name", 50);
//!     table.integer("age");
//! })
//! .await?;
//!
//! db.insert(
//!     "account",
//!     &[Values::new().set("user_name", "foo").set("age", 21)],
//! )
//! .await?;
//!
//! let adults = db
//!     .select(
//!         "account",
//!         &Columns::from(["user_name", "age"]),
//!         &Where::new().field("age[>=]", 18),
//!     )
//!     .await;
//! assert_eq!(adults.len(), 1);
//! assert_eq!(db.count("account", &Where::new()).await, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Read helpers never fail: they return an empty value and keep the error
//! for [`Database::error`] and [`Database::error_info`]. Writes, schema
//! operations and the `try_` helpers return [`Result`].

mod database;
mod driver;
mod error;
mod options;
mod sqlite;

pub use database::Database;
pub use driver::{Driver, QueryResult, Row};
pub use error::{Error, ErrorInfo, ErrorKind, Result};
pub use options::Options;
pub use sqlite::SqliteDriver;

// Re-export commonly used types from sqlweave-core
pub use sqlweave_core::builder::{
    list, raw, Columns, Join, JoinKind, Raw, Replacements, Statement, Values, Where,
};
pub use sqlweave_core::migrations::{Blueprint, ForeignKeyAction};
pub use sqlweave_core::{CompileError, DialectKind, SqlValue, ToSqlValue};
