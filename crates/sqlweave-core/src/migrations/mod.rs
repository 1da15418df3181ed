//! Dialect-aware schema building.
//!
//! A [`Blueprint`] describes one table operation; each type method returns
//! the new [`Column`] for in-place refinement. Type mapping is table
//! driven, see [`types`].
//!
//! # Example
//!
//! ```rust
//! use sqlweave_core::migrations::{Blueprint, ForeignKeyAction};
//! use sqlweave_core::DialectKind;
//!
//! let mut table = Blueprint::create("posts").with_prefix("blog_");
//! table.id();
//! table.string("title", 200);
//! table.integer("author_id")
//!     .unsigned()
//!     .references("users", "id")
//!     .on_delete(ForeignKeyAction::Cascade);
//! table.engine("InnoDB");
//!
//! let statements = table.build(DialectKind::MySql).unwrap();
//! assert!(statements[0].starts_with("CREATE TABLE `blog_posts`"));
//! assert!(statements[0].contains("REFERENCES `blog_users` (`id`) ON DELETE CASCADE"));
//! ```

mod column_builder;
mod table_builder;
pub mod types;

pub use column_builder::{
    Column, ColumnReference, ColumnSql, DdlContext, DefaultValue, ForeignKeyAction, Position,
};
pub use table_builder::{Blueprint, BlueprintMode, ForeignKey, IndexDefinition};
pub use types::{map_type, ColumnType, MappedType, TypeArgs};
