//! Table blueprints.
//!
//! A [`Blueprint`] collects column and constraint declarations for one
//! CREATE TABLE or ALTER TABLE operation. [`Blueprint::build`] consumes it
//! and returns the DDL statements for a dialect, in execution order.
//!
//! # Example
//!
//! ```rust
//! use sqlweave_core::migrations::Blueprint;
//! use sqlweave_core::DialectKind;
//!
//! let mut table = Blueprint::create("users");
//! table.id();
//! table.string("email", 255).unique();
//! table.timestamps();
//!
//! let statements = table.build(DialectKind::PgSql).unwrap();
//! assert_eq!(
//!     statements,
//!     vec![
//!         "CREATE TABLE \"users\" (\"id\" SERIAL PRIMARY KEY, \
//!          \"email\" VARCHAR(255) NOT NULL UNIQUE, \
//!          \"created_at\" TIMESTAMP(0) WITHOUT TIME ZONE NULL, \
//!          \"updated_at\" TIMESTAMP(0) WITHOUT TIME ZONE NULL)"
//!     ]
//! );
//! ```

use super::column_builder::{Column, DdlContext, ForeignKeyAction, Position};
use super::types::{ColumnType, TypeArgs};
use crate::dialect::DialectKind;
use crate::error::{CompileError, Result};

/// Whether a blueprint creates a new table or alters an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlueprintMode {
    /// CREATE TABLE
    Create,
    /// ALTER TABLE
    Alter,
}

/// A table-level index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    /// Index name; derived from the table and columns when absent.
    pub name: Option<String>,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// UNIQUE index.
    pub unique: bool,
}

/// A table-level foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    name: Option<String>,
    columns: Vec<String>,
    table: String,
    references: Vec<String>,
    on_delete: Option<ForeignKeyAction>,
    on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Sets the referenced columns.
    pub fn references<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the referenced table (without prefix).
    pub fn on(&mut self, table: &str) -> &mut Self {
        self.table = String::from(table);
        self
    }

    /// Sets the constraint name.
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = Some(String::from(name));
        self
    }

    /// Sets the ON DELETE action.
    pub fn on_delete(&mut self, action: ForeignKeyAction) -> &mut Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    pub fn on_update(&mut self, action: ForeignKeyAction) -> &mut Self {
        self.on_update = Some(action);
        self
    }

    fn constraint_name(&self, table: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{table}_{}_foreign", self.columns.join("_")))
    }

    fn to_sql(&self, ctx: &DdlContext<'_>) -> Result<String> {
        if self.table.is_empty() || self.columns.is_empty() {
            return Err(CompileError::InvalidInput(format!(
                "foreign key on {} needs local columns and a referenced table",
                ctx.table
            )));
        }
        let references = if self.references.is_empty() {
            &self.columns
        } else {
            &self.references
        };
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            ctx.quote(&self.constraint_name(ctx.table)),
            quote_list(ctx, &self.columns),
            ctx.quote_table(&self.table),
            quote_list(ctx, references)
        );
        if let Some(action) = self.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.as_sql()));
        }
        if let Some(action) = self.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action.as_sql()));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    DropColumn(String),
    RenameColumn { from: String, to: String },
    DropIndex(String),
    DropForeign(String),
}

/// Column and constraint declarations for one table operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    table: String,
    prefix: String,
    mode: BlueprintMode,
    columns: Vec<Column>,
    indexes: Vec<IndexDefinition>,
    foreign_keys: Vec<ForeignKey>,
    primary: Option<Vec<String>>,
    commands: Vec<Command>,
    engine: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
    options: Vec<String>,
    if_not_exists: bool,
}

fn quote_list(ctx: &DdlContext<'_>, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| ctx.quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn index_sql(ctx: &DdlContext<'_>, index: &IndexDefinition) -> String {
    let suffix = if index.unique { "unique" } else { "index" };
    let name = index
        .name
        .clone()
        .unwrap_or_else(|| format!("{}_{}_{suffix}", ctx.table, index.columns.join("_")));
    format!(
        "CREATE {}INDEX {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        ctx.quote(&name),
        ctx.quote(ctx.table),
        quote_list(ctx, &index.columns)
    )
}

fn owned<I, S>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns.into_iter().map(Into::into).collect()
}

macro_rules! simple_column {
    ($(#[$doc:meta] $method:ident => $ty:ident),* $(,)?) => {
        $(
            #[$doc]
            pub fn $method(&mut self, name: &str) -> &mut Column {
                self.add(name, ColumnType::$ty, TypeArgs::default())
            }
        )*
    };
}

impl Blueprint {
    /// Starts a CREATE TABLE blueprint.
    #[must_use]
    pub fn create(table: &str) -> Self {
        Self::new(table, BlueprintMode::Create)
    }

    /// Starts an ALTER TABLE blueprint.
    #[must_use]
    pub fn alter(table: &str) -> Self {
        Self::new(table, BlueprintMode::Alter)
    }

    /// Creates a blueprint in the given mode.
    #[must_use]
    pub fn new(table: &str, mode: BlueprintMode) -> Self {
        Self {
            table: String::from(table),
            prefix: String::new(),
            mode,
            columns: vec![],
            indexes: vec![],
            foreign_keys: vec![],
            primary: None,
            commands: vec![],
            engine: None,
            charset: None,
            collation: None,
            options: vec![],
            if_not_exists: false,
        }
    }

    /// Sets the table prefix applied to this and referenced tables.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = String::from(prefix);
        self
    }

    /// Returns the unprefixed table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the mode.
    #[must_use]
    pub const fn mode(&self) -> BlueprintMode {
        self.mode
    }

    /// Returns the declared columns.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn add(&mut self, name: &str, ty: ColumnType, args: TypeArgs) -> &mut Column {
        self.push(Column::new(name, ty, args))
    }

    fn push(&mut self, column: Column) -> &mut Column {
        self.columns.push(column);
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Adds a column whose definition is given verbatim.
    pub fn raw_column(&mut self, name: &str, definition: &str) -> &mut Column {
        self.push(Column::raw(name, definition))
    }

    /// Adds an auto-incrementing `id` primary key.
    pub fn id(&mut self) -> &mut Column {
        self.increments("id")
    }

    simple_column! {
        /// Adds an auto-incrementing integer primary key.
        increments => Increments,
        /// Adds an auto-incrementing big integer primary key.
        big_increments => BigIncrements,
        /// Adds a TEXT column.
        text => Text,
        /// Adds a medium TEXT column.
        medium_text => MediumText,
        /// Adds a long TEXT column.
        long_text => LongText,
        /// Adds a 1-byte integer column.
        tiny_integer => TinyInteger,
        /// Adds a 2-byte integer column.
        small_integer => SmallInteger,
        /// Adds a 3-byte integer column.
        medium_integer => MediumInteger,
        /// Adds a 4-byte integer column.
        integer => Integer,
        /// Adds an 8-byte integer column.
        big_integer => BigInteger,
        /// Adds a single-precision float column.
        float => Float,
        /// Adds a double-precision float column.
        double => Double,
        /// Adds a boolean column.
        boolean => Boolean,
        /// Adds a JSON column.
        json => Json,
        /// Adds a DATE column.
        date => Date,
        /// Adds a date and time column.
        date_time => DateTime,
        /// Adds a time column.
        time => Time,
        /// Adds a TIMESTAMP column.
        timestamp => Timestamp,
        /// Adds an unbounded binary column.
        binary => Binary,
        /// Adds a UUID column.
        uuid => Uuid,
    }

    /// Adds a fixed-length string column.
    pub fn char(&mut self, name: &str, length: u32) -> &mut Column {
        let args = TypeArgs {
            length: Some(length),
            ..TypeArgs::default()
        };
        self.add(name, ColumnType::Char, args)
    }

    /// Adds a variable-length string column.
    pub fn string(&mut self, name: &str, length: u32) -> &mut Column {
        let args = TypeArgs {
            length: Some(length),
            ..TypeArgs::default()
        };
        self.add(name, ColumnType::String, args)
    }

    /// Adds a bounded binary column.
    pub fn var_binary(&mut self, name: &str, length: u32) -> &mut Column {
        let args = TypeArgs {
            length: Some(length),
            ..TypeArgs::default()
        };
        self.add(name, ColumnType::VarBinary, args)
    }

    /// Adds an exact decimal column.
    pub fn decimal(&mut self, name: &str, precision: u32, scale: u32) -> &mut Column {
        let args = TypeArgs {
            precision: Some(precision),
            scale: Some(scale),
            ..TypeArgs::default()
        };
        self.add(name, ColumnType::Decimal, args)
    }

    /// Adds an enum column restricted to `values`.
    pub fn enumeration<I, S>(&mut self, name: &str, values: I) -> &mut Column
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = TypeArgs {
            values: owned(values),
            ..TypeArgs::default()
        };
        self.add(name, ColumnType::Enum, args)
    }

    /// Adds nullable `created_at` and `updated_at` timestamps.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
    }

    /// Adds an index.
    pub fn index<I, S>(&mut self, columns: I) -> &mut IndexDefinition
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_index(owned(columns), false)
    }

    /// Adds a unique index.
    pub fn unique<I, S>(&mut self, columns: I) -> &mut IndexDefinition
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_index(owned(columns), true)
    }

    fn push_index(&mut self, columns: Vec<String>, unique: bool) -> &mut IndexDefinition {
        self.indexes.push(IndexDefinition {
            name: None,
            columns,
            unique,
        });
        let last = self.indexes.len() - 1;
        &mut self.indexes[last]
    }

    /// Declares a composite primary key.
    pub fn primary<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary = Some(owned(columns));
    }

    /// Declares a foreign key on `columns`.
    pub fn foreign<I, S>(&mut self, columns: I) -> &mut ForeignKey
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.foreign_keys.push(ForeignKey {
            name: None,
            columns: owned(columns),
            table: String::new(),
            references: vec![],
            on_delete: None,
            on_update: None,
        });
        let last = self.foreign_keys.len() - 1;
        &mut self.foreign_keys[last]
    }

    /// Drops a column (alter mode).
    pub fn drop_column(&mut self, name: &str) {
        self.commands.push(Command::DropColumn(String::from(name)));
    }

    /// Renames a column (alter mode).
    pub fn rename_column(&mut self, from: &str, to: &str) {
        self.commands.push(Command::RenameColumn {
            from: String::from(from),
            to: String::from(to),
        });
    }

    /// Drops an index by name (alter mode).
    pub fn drop_index(&mut self, name: &str) {
        self.commands.push(Command::DropIndex(String::from(name)));
    }

    /// Drops a foreign key constraint by name (alter mode).
    pub fn drop_foreign(&mut self, name: &str) {
        self.commands.push(Command::DropForeign(String::from(name)));
    }

    /// Sets the storage engine (MySQL).
    pub fn engine(&mut self, engine: &str) {
        self.engine = Some(String::from(engine));
    }

    /// Sets the default character set (MySQL).
    pub fn charset(&mut self, charset: &str) {
        self.charset = Some(String::from(charset));
    }

    /// Sets the default collation (MySQL).
    pub fn collation(&mut self, collation: &str) {
        self.collation = Some(String::from(collation));
    }

    /// Appends raw text after the CREATE TABLE column list.
    pub fn option(&mut self, option: &str) {
        self.options.push(String::from(option));
    }

    /// Emits `CREATE TABLE IF NOT EXISTS`.
    pub fn if_not_exists(&mut self) {
        self.if_not_exists = true;
    }

    /// Finalizes the blueprint into DDL statements for `kind`.
    ///
    /// # Errors
    ///
    /// Fails when the blueprint is empty, declares something the dialect
    /// cannot express, or has an incomplete foreign key.
    pub fn build(self, kind: DialectKind) -> Result<Vec<String>> {
        let table = format!("{}{}", self.prefix, self.table);
        let ctx = DdlContext {
            kind,
            prefix: &self.prefix,
            table: &table,
        };
        match self.mode {
            BlueprintMode::Create => self.build_create(&ctx),
            BlueprintMode::Alter => self.build_alter(&ctx),
        }
    }

    fn column_foreign_keys(&self) -> Vec<ForeignKey> {
        self.columns
            .iter()
            .filter_map(|column| {
                column.reference().map(|reference| ForeignKey {
                    name: None,
                    columns: vec![String::from(column.name())],
                    table: reference.table.clone(),
                    references: vec![reference.column.clone()],
                    on_delete: reference.on_delete,
                    on_update: reference.on_update,
                })
            })
            .collect()
    }

    fn build_create(&self, ctx: &DdlContext<'_>) -> Result<Vec<String>> {
        if self.columns.is_empty() {
            return Err(CompileError::InvalidInput(format!(
                "table {} has no columns",
                ctx.table
            )));
        }
        let dialect = ctx.dialect();

        let mut before = vec![];
        let mut after = vec![];
        let mut definitions = vec![];
        for column in &self.columns {
            let sql = column.to_sql(ctx);
            before.extend(sql.before);
            after.extend(sql.after);
            definitions.push(sql.definition);
        }

        if let Some(primary) = &self.primary {
            definitions.push(format!("PRIMARY KEY ({})", quote_list(ctx, primary)));
        }
        for foreign in self.column_foreign_keys().iter().chain(&self.foreign_keys) {
            definitions.push(foreign.to_sql(ctx)?);
        }

        let if_not_exists = if self.if_not_exists {
            if !dialect.supports_if_not_exists() {
                return Err(CompileError::Unsupported {
                    dialect: dialect.name(),
                    operation: "CREATE TABLE IF NOT EXISTS",
                });
            }
            "IF NOT EXISTS "
        } else {
            ""
        };

        let mut create = format!(
            "CREATE TABLE {if_not_exists}{} ({})",
            ctx.quote(ctx.table),
            definitions.join(", ")
        );
        if ctx.kind == DialectKind::MySql {
            if let Some(engine) = &self.engine {
                create.push_str(&format!(" ENGINE = {engine}"));
            }
            if let Some(charset) = &self.charset {
                create.push_str(&format!(" DEFAULT CHARSET = {charset}"));
            }
            if let Some(collation) = &self.collation {
                create.push_str(&format!(" COLLATE = {collation}"));
            }
        }
        for option in &self.options {
            create.push(' ');
            create.push_str(&ctx.expand(option));
        }

        let mut statements = before;
        statements.push(create);
        statements.extend(self.indexes.iter().map(|index| index_sql(ctx, index)));
        statements.extend(after);
        Ok(statements)
    }

    fn build_alter(&self, ctx: &DdlContext<'_>) -> Result<Vec<String>> {
        let dialect = ctx.dialect();
        let table = ctx.quote(ctx.table);
        let unsupported = |operation| CompileError::Unsupported {
            dialect: dialect.name(),
            operation,
        };
        let mut statements = vec![];

        for column in &self.columns {
            let sql = column.to_sql(ctx);
            statements.extend(sql.before);
            if column.is_change() {
                statements.extend(dialect.modify_column_sql(
                    ctx.table,
                    column.name(),
                    &sql.sql_type,
                    &sql.definition,
                )?);
            } else {
                let mut add = format!(
                    "ALTER TABLE {table} {} {}",
                    dialect.add_column_keyword(),
                    sql.definition
                );
                if ctx.kind == DialectKind::MySql {
                    match column.position() {
                        Some(Position::First) => add.push_str(" FIRST"),
                        Some(Position::After(other)) => {
                            add.push_str(&format!(" AFTER {}", ctx.quote(other)));
                        }
                        None => {}
                    }
                }
                statements.push(add);
            }
            statements.extend(sql.after);
        }

        for command in &self.commands {
            statements.push(match command {
                Command::DropColumn(name) => dialect.drop_column_sql(ctx.table, name),
                Command::RenameColumn { from, to } => dialect.rename_column_sql(ctx.table, from, to),
                Command::DropIndex(name) => dialect.drop_index_sql(ctx.table, name),
                Command::DropForeign(name) => match ctx.kind {
                    DialectKind::Sqlite => return Err(unsupported("dropping a foreign key")),
                    DialectKind::MySql => {
                        format!("ALTER TABLE {table} DROP FOREIGN KEY {}", ctx.quote(name))
                    }
                    _ => format!("ALTER TABLE {table} DROP CONSTRAINT {}", ctx.quote(name)),
                },
            });
        }

        statements.extend(self.indexes.iter().map(|index| index_sql(ctx, index)));

        for foreign in self.column_foreign_keys().iter().chain(&self.foreign_keys) {
            if ctx.kind == DialectKind::Sqlite {
                return Err(unsupported("adding a foreign key to an existing table"));
            }
            statements.push(format!("ALTER TABLE {table} ADD {}", foreign.to_sql(ctx)?));
        }

        if let Some(primary) = &self.primary {
            if ctx.kind == DialectKind::Sqlite {
                return Err(unsupported("adding a primary key to an existing table"));
            }
            statements.push(format!(
                "ALTER TABLE {table} ADD PRIMARY KEY ({})",
                quote_list(ctx, primary)
            ));
        }

        if statements.is_empty() {
            return Err(CompileError::InvalidInput(format!(
                "alter table {} has no changes",
                ctx.table
            )));
        }
        Ok(statements)
    }
}

impl IndexDefinition {
    /// Sets the index name.
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = Some(String::from(name));
        self
    }
}
