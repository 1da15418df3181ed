//! Query building.
//!
//! Condition trees compile to parameterized boolean expressions; the
//! statement builder wraps them into SELECT/INSERT/UPDATE/DELETE statements
//! for one dialect.
//!
//! # Example
//!
//! ```rust
//! use sqlweave_core::builder::{Columns, Join, QueryBuilder, Where};
//! use sqlweave_core::DialectKind;
//!
//! let builder = QueryBuilder::new(DialectKind::PgSql);
//! let stmt = builder
//!     .select(
//!         "post",
//!         &[Join::left("account").on("author_id", "user_id")],
//!         &Columns::from(["post.title", "account.name"]),
//!         &Where::new().field("account.age[>]", 18).limit(10),
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     stmt.sql(),
//!     "SELECT post.title, account.name FROM \"post\" \
//!      LEFT JOIN \"account\" ON \"post\".author_id = \"account\".user_id \
//!      WHERE account.age > ? LIMIT 10"
//! );
//! ```

mod columns;
mod condition;
mod expr;
mod join;
mod raw;
mod statement;

pub use columns::{ColumnSource, Columns, SelectItem};
pub use condition::{list, Condition, Direction, IntoOperand, Limit, Logic, Operand, Operator, OrderBy, Where};
pub use expr::{validate_column, Fragment};
pub use join::{Join, JoinKind, JoinOn};
pub use raw::{expand_identifiers, raw, Raw};
pub use statement::{Aggregate, QueryBuilder, Replacements, Statement, TableRef, Values, AGGREGATE_ALIAS};
