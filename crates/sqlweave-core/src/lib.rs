//! # sqlweave-core
//!
//! A condition-tree SQL compiler and dialect-aware schema builder.
//!
//! This crate provides:
//! - A compiler from condition trees (`"column[op]" => operand` keys nested
//!   under `AND`/`OR` groups) into parameterized WHERE clauses
//! - SELECT, INSERT, UPDATE, DELETE and REPLACE statement builders with
//!   table prefixes, joins and per-dialect LIMIT rendering
//! - A table blueprint that maps abstract column types to six dialects
//!
//! No engine-specific code lives here: every function is pure and returns
//! SQL text plus positional parameters.
//!
//! ## Conditions
//!
//! ```rust
//! use sqlweave_core::builder::{QueryBuilder, Where};
//! use sqlweave_core::{DialectKind, SqlValue};
//!
//! let builder = QueryBuilder::new(DialectKind::PgSql).with_prefix("app_");
//! let filter = Where::new()
//!     .field("age[>=]", 18)
//!     .field("status", ["active", "pending"])
//!     .order_by_desc("created")
//!     .limit(10);
//!
//! let statement = builder
//!     .select("users", &[], &["id", "name"].into(), &filter)
//!     .unwrap();
//! assert_eq!(
//!     statement.sql(),
//!     "SELECT id, name FROM \"app_users\" WHERE age >= ? AND status IN (?, ?) \
//!      ORDER BY created DESC LIMIT 10"
//! );
//! assert_eq!(statement.params()[0], SqlValue::Int(18));
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are always bound, and every column or table name that reaches
//! the SQL text is validated or quoted:
//!
//! ```rust
//! use sqlweave_core::builder::Where;
//!
//! let user_input = "'; DROP TABLE users; --";
//! let (sql, params) = Where::new().field("name", user_input).compile().unwrap();
//! assert_eq!(sql, "name = ?");
//! assert_eq!(params.len(), 1);
//!
//! assert!(Where::new().field("name; DROP TABLE users", 1).compile().is_err());
//! ```

pub mod builder;
pub mod dialect;
pub mod error;
pub mod migrations;
pub mod value;

pub use builder::{raw, Columns, Join, QueryBuilder, Statement, Values, Where};
pub use dialect::{Dialect, DialectKind};
pub use error::{CompileError, Result};
pub use migrations::Blueprint;
pub use value::{SqlValue, ToSqlValue};
