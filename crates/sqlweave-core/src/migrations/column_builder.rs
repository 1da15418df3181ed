//! Column definitions for table blueprints.
//!
//! A [`Column`] is created by one of the [`Blueprint`](super::Blueprint)
//! type methods and refined in place through the returned `&mut Column`:
//!
//! ```rust
//! use sqlweave_core::migrations::Blueprint;
//!
//! let mut table = Blueprint::create("users");
//! table.string("email", 120).unique();
//! table.integer("age").unsigned().nullable();
//! ```

use super::types::{enum_type_sql, map_type, ColumnType, TypeArgs};
use crate::builder::expand_identifiers;
use crate::dialect::{string_literal, Dialect, DialectKind};
use crate::value::{SqlValue, ToSqlValue};

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A literal, rendered inline.
    Value(SqlValue),
    /// A raw SQL expression.
    Expression(String),
    /// The dialect's current-timestamp expression.
    CurrentTimestamp,
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    #[must_use]
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        match self {
            Self::Value(SqlValue::Bool(b)) if dialect.kind() == DialectKind::PgSql => {
                String::from(if *b { "TRUE" } else { "FALSE" })
            }
            Self::Value(value) => value.to_sql_inline(),
            Self::Expression(expr) => expr.clone(),
            Self::CurrentTimestamp => String::from(dialect.current_timestamp()),
        }
    }
}

/// A foreign key declared on a column with [`Column::references`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReference {
    /// Referenced table, without prefix.
    pub table: String,
    /// Referenced column.
    pub column: String,
    /// Action on delete.
    pub on_delete: Option<ForeignKeyAction>,
    /// Action on update.
    pub on_update: Option<ForeignKeyAction>,
}

/// MySQL column position for ALTER TABLE ... ADD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// `FIRST`
    First,
    /// `AFTER column`
    After(String),
}

/// Naming context for DDL rendering: dialect, table prefix and the
/// prefixed table being defined.
#[derive(Debug, Clone, Copy)]
pub struct DdlContext<'a> {
    /// Target dialect.
    pub kind: DialectKind,
    /// Table prefix.
    pub prefix: &'a str,
    /// Prefixed name of the table being defined.
    pub table: &'a str,
}

impl DdlContext<'_> {
    /// Returns the dialect implementation.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.kind.dialect()
    }

    /// Quotes an identifier for DDL.
    #[must_use]
    pub fn quote(&self, name: &str) -> String {
        self.dialect().quote_ddl_identifier(name)
    }

    /// Prefixes and quotes a table name for DDL.
    #[must_use]
    pub fn quote_table(&self, table: &str) -> String {
        self.quote(&format!("{}{table}", self.prefix))
    }

    /// Expands `<identifier>` tokens in raw DDL text.
    #[must_use]
    pub fn expand(&self, sql: &str) -> String {
        expand_identifiers(sql, |name, is_table| {
            if is_table {
                self.quote_table(name)
            } else {
                self.quote(name)
            }
        })
    }
}

/// SQL produced for one column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnSql {
    /// Full column definition (quoted name, type, modifiers).
    pub definition: String,
    /// SQL type alone.
    pub sql_type: String,
    /// Statements that must run before the table statement.
    pub before: Vec<String>,
    /// Statements that must run after the table statement.
    pub after: Vec<String>,
}

/// A column being defined.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    ty: ColumnType,
    args: TypeArgs,
    raw: Option<String>,
    nullable: bool,
    default: Option<DefaultValue>,
    unsigned: bool,
    unique: bool,
    primary: bool,
    check: Option<String>,
    references: Option<ColumnReference>,
    comment: Option<String>,
    position: Option<Position>,
    change: bool,
}

impl Column {
    /// Creates a NOT NULL column of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ColumnType, args: TypeArgs) -> Self {
        Self {
            name: name.into(),
            ty,
            args,
            raw: None,
            nullable: false,
            default: None,
            unsigned: false,
            unique: false,
            primary: false,
            check: None,
            references: None,
            comment: None,
            position: None,
            change: false,
        }
    }

    /// Creates a column whose definition after the name is given verbatim.
    ///
    /// `<identifier>` tokens in `definition` are quoted.
    #[must_use]
    pub fn raw(name: impl Into<String>, definition: impl Into<String>) -> Self {
        let mut column = Self::new(name, ColumnType::Text, TypeArgs::default());
        column.raw = Some(definition.into());
        column
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the abstract type.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.ty
    }

    /// Returns the column's foreign key, if any.
    #[must_use]
    pub const fn reference(&self) -> Option<&ColumnReference> {
        self.references.as_ref()
    }

    /// Returns the MySQL position hint, if any.
    #[must_use]
    pub const fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Whether this column modifies an existing one.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        self.change
    }

    /// Allows NULL.
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// Rejects NULL (the default).
    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = false;
        self
    }

    /// Sets a literal default.
    pub fn default<T: ToSqlValue>(&mut self, value: T) -> &mut Self {
        self.default = Some(DefaultValue::Value(value.to_sql_value()));
        self
    }

    /// Sets a raw SQL default expression.
    pub fn default_raw(&mut self, expr: impl Into<String>) -> &mut Self {
        self.default = Some(DefaultValue::Expression(expr.into()));
        self
    }

    /// Defaults to the server's current timestamp.
    pub fn use_current(&mut self) -> &mut Self {
        self.default = Some(DefaultValue::CurrentTimestamp);
        self
    }

    /// Marks an integer column UNSIGNED (MySQL only).
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Adds a UNIQUE constraint.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// Makes the column the primary key.
    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    /// Adds a CHECK constraint. `<identifier>` tokens are quoted.
    pub fn check(&mut self, expr: impl Into<String>) -> &mut Self {
        self.check = Some(expr.into());
        self
    }

    /// References `table(column)` with a foreign key.
    pub fn references(&mut self, table: &str, column: &str) -> &mut Self {
        self.references = Some(ColumnReference {
            table: String::from(table),
            column: String::from(column),
            on_delete: None,
            on_update: None,
        });
        self
    }

    /// Sets the foreign key ON DELETE action.
    pub fn on_delete(&mut self, action: ForeignKeyAction) -> &mut Self {
        if let Some(reference) = &mut self.references {
            reference.on_delete = Some(action);
        }
        self
    }

    /// Sets the foreign key ON UPDATE action.
    pub fn on_update(&mut self, action: ForeignKeyAction) -> &mut Self {
        if let Some(reference) = &mut self.references {
            reference.on_update = Some(action);
        }
        self
    }

    /// Attaches a comment (MySQL inline, PostgreSQL/Oracle `COMMENT ON`).
    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    /// Places the new column after `column` (MySQL only).
    pub fn after(&mut self, column: &str) -> &mut Self {
        self.position = Some(Position::After(String::from(column)));
        self
    }

    /// Places the new column first (MySQL only).
    pub fn first(&mut self) -> &mut Self {
        self.position = Some(Position::First);
        self
    }

    /// Modifies the existing column with this definition instead of
    /// adding it (alter mode).
    pub fn change(&mut self) -> &mut Self {
        self.change = true;
        self
    }

    /// Renders the column for `ctx`.
    #[must_use]
    pub fn to_sql(&self, ctx: &DdlContext<'_>) -> ColumnSql {
        let quoted = ctx.quote(&self.name);

        if let Some(raw) = &self.raw {
            let definition = ctx.expand(raw);
            return ColumnSql {
                definition: format!("{quoted} {definition}"),
                sql_type: definition,
                ..ColumnSql::default()
            };
        }

        let dialect = ctx.dialect();
        let enum_type = ctx.quote(&format!("{}_{}_enum", ctx.table, self.name));
        let mapped = map_type(self.ty, ctx.kind, &self.args, &quoted, &enum_type);

        let mut sql_type = mapped.sql_type;
        if self.unsigned && ctx.kind == DialectKind::MySql && self.ty.is_integer() {
            sql_type.push_str(" UNSIGNED");
        }

        let (checks, implied): (Vec<String>, Vec<String>) = mapped
            .modifiers
            .into_iter()
            .partition(|modifier| modifier.starts_with("CHECK"));

        let mut parts = vec![quoted.clone(), sql_type.clone()];
        parts.extend(implied);

        if !self.ty.is_increments() {
            if let Some(default) = &self.default {
                parts.push(format!("DEFAULT {}", default.to_sql(dialect)));
            }
            parts.push(String::from(if self.nullable { "NULL" } else { "NOT NULL" }));
            if self.unique {
                parts.push(String::from("UNIQUE"));
            }
            if self.primary {
                parts.push(String::from("PRIMARY KEY"));
            }
        }

        if let (Some(comment), DialectKind::MySql) = (&self.comment, ctx.kind) {
            parts.push(format!("COMMENT {}", string_literal(comment)));
        }

        parts.extend(checks);
        if let Some(check) = &self.check {
            parts.push(format!("CHECK ({})", ctx.expand(check)));
        }

        let mut before = vec![];
        if self.ty == ColumnType::Enum && ctx.kind == DialectKind::PgSql {
            before.push(enum_type_sql(&enum_type, &self.args.values));
        }

        let mut after = vec![];
        if let Some(comment) = &self.comment {
            if matches!(ctx.kind, DialectKind::PgSql | DialectKind::Oracle) {
                after.push(format!(
                    "COMMENT ON COLUMN {}.{quoted} IS {}",
                    ctx.quote(ctx.table),
                    string_literal(comment)
                ));
            }
        }

        ColumnSql {
            definition: parts.join(" "),
            sql_type,
            before,
            after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(kind: DialectKind) -> DdlContext<'static> {
        DdlContext {
            kind,
            prefix: "app_",
            table: "app_users",
        }
    }

    fn string(name: &str) -> Column {
        Column::new(
            name,
            ColumnType::String,
            TypeArgs {
                length: Some(100),
                ..TypeArgs::default()
            },
        )
    }

    #[test]
    fn test_not_null_by_default() {
        let column = string("email");
        assert_eq!(
            column.to_sql(&ctx(DialectKind::MySql)).definition,
            "`email` VARCHAR(100) NOT NULL"
        );
    }

    #[test]
    fn test_modifiers_in_order() {
        let mut column = string("email");
        column.nullable().default("none").unique().check("<email> <> ''");
        assert_eq!(
            column.to_sql(&ctx(DialectKind::PgSql)).definition,
            "\"email\" VARCHAR(100) DEFAULT 'none' NULL UNIQUE CHECK (\"email\" <> '')"
        );
    }

    #[test]
    fn test_boolean_default_per_dialect() {
        let mut column = Column::new("active", ColumnType::Boolean, TypeArgs::default());
        column.default(true);
        assert_eq!(
            column.to_sql(&ctx(DialectKind::PgSql)).definition,
            "\"active\" BOOLEAN DEFAULT TRUE NOT NULL"
        );
        assert_eq!(
            column.to_sql(&ctx(DialectKind::MsSql)).definition,
            "[active] BIT DEFAULT 1 NOT NULL"
        );
    }

    #[test]
    fn test_use_current() {
        let mut column = Column::new("created_at", ColumnType::Timestamp, TypeArgs::default());
        column.use_current();
        assert_eq!(
            column.to_sql(&ctx(DialectKind::Sybase)).definition,
            "\"created_at\" DATETIME DEFAULT GETDATE() NOT NULL"
        );
    }

    #[test]
    fn test_increments_skip_nullability() {
        let column = Column::new("id", ColumnType::Increments, TypeArgs::default());
        assert_eq!(
            column.to_sql(&ctx(DialectKind::Sqlite)).definition,
            "`id` INTEGER PRIMARY KEY AUTOINCREMENT"
        );
    }

    #[test]
    fn test_unsigned_only_on_mysql() {
        let mut column = Column::new("age", ColumnType::Integer, TypeArgs::default());
        column.unsigned();
        assert_eq!(
            column.to_sql(&ctx(DialectKind::MySql)).definition,
            "`age` INT UNSIGNED NOT NULL"
        );
        assert_eq!(
            column.to_sql(&ctx(DialectKind::PgSql)).definition,
            "\"age\" INTEGER NOT NULL"
        );
    }

    #[test]
    fn test_enum_prelude_and_check() {
        let column = Column::new(
            "role",
            ColumnType::Enum,
            TypeArgs {
                values: vec![String::from("admin"), String::from("user")],
                ..TypeArgs::default()
            },
        );
        let pg = column.to_sql(&ctx(DialectKind::PgSql));
        assert_eq!(pg.definition, "\"role\" \"app_users_role_enum\" NOT NULL");
        assert_eq!(
            pg.before,
            vec![
                "DO $$ BEGIN CREATE TYPE \"app_users_role_enum\" AS ENUM ('admin', 'user'); \
                 EXCEPTION WHEN duplicate_object THEN NULL; END $$"
            ]
        );
        let oracle = column.to_sql(&ctx(DialectKind::Oracle));
        assert_eq!(
            oracle.definition,
            "\"role\" VARCHAR2(255) NOT NULL CHECK (\"role\" IN ('admin', 'user'))"
        );
    }

    #[test]
    fn test_comment_placement() {
        let mut column = string("bio");
        column.comment("about me");
        assert_eq!(
            column.to_sql(&ctx(DialectKind::MySql)).definition,
            "`bio` VARCHAR(100) NOT NULL COMMENT 'about me'"
        );
        let pg = column.to_sql(&ctx(DialectKind::PgSql));
        assert_eq!(
            pg.after,
            vec!["COMMENT ON COLUMN \"app_users\".\"bio\" IS 'about me'"]
        );
    }

    #[test]
    fn test_raw_definition() {
        let column = Column::raw("score", "INT NOT NULL DEFAULT 0");
        assert_eq!(
            column.to_sql(&ctx(DialectKind::MySql)).definition,
            "`score` INT NOT NULL DEFAULT 0"
        );
    }

    #[test]
    fn test_foreign_key_actions_need_reference() {
        let mut column = Column::new("user_id", ColumnType::Integer, TypeArgs::default());
        column.on_delete(ForeignKeyAction::Cascade);
        assert!(column.reference().is_none());
        column.references("users", "id").on_delete(ForeignKeyAction::Cascade);
        assert_eq!(
            column.reference().and_then(|r| r.on_delete),
            Some(ForeignKeyAction::Cascade)
        );
    }
}
