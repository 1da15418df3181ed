//! Abstract column types and their per-dialect SQL.
//!
//! The mapping is a single static table: one row per [`ColumnType`], one
//! entry per dialect in [`DialectKind::ALL`] order. Entries are templates
//! with `{length}`, `{precision}`, `{scale}`, `{values}`, `{column}` and
//! `{enum_type}` placeholders, plus the modifiers the type implies.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::dialect::{string_literal, DialectKind};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("Invalid type placeholder regex"));

/// Abstract column types understood by the schema builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Auto-incrementing integer primary key.
    Increments,
    /// Auto-incrementing big integer primary key.
    BigIncrements,
    /// Fixed-length string.
    Char,
    /// Variable-length string.
    String,
    /// Text.
    Text,
    /// Medium text.
    MediumText,
    /// Long text.
    LongText,
    /// 1-byte integer.
    TinyInteger,
    /// 2-byte integer.
    SmallInteger,
    /// 3-byte integer.
    MediumInteger,
    /// 4-byte integer.
    Integer,
    /// 8-byte integer.
    BigInteger,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Exact decimal with precision and scale.
    Decimal,
    /// Boolean.
    Boolean,
    /// One of a fixed set of strings.
    Enum,
    /// JSON document.
    Json,
    /// Date.
    Date,
    /// Date and time.
    DateTime,
    /// Time of day.
    Time,
    /// Timestamp.
    Timestamp,
    /// Variable-length binary data without a size limit.
    Binary,
    /// Variable-length binary data with a maximum length.
    VarBinary,
    /// UUID.
    Uuid,
}

impl ColumnType {
    /// Returns `true` for the integer family (MySQL accepts `UNSIGNED`).
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::TinyInteger
                | Self::SmallInteger
                | Self::MediumInteger
                | Self::Integer
                | Self::BigInteger
        )
    }

    /// Returns `true` for auto-incrementing primary keys.
    #[must_use]
    pub const fn is_increments(self) -> bool {
        matches!(self, Self::Increments | Self::BigIncrements)
    }
}

/// SQL template and implied modifiers for one type in one dialect.
#[derive(Debug, Clone, Copy)]
struct TypeEntry {
    sql: &'static str,
    modifiers: &'static [&'static str],
}

const fn t(sql: &'static str) -> TypeEntry {
    TypeEntry { sql, modifiers: &[] }
}

const fn m(sql: &'static str, modifiers: &'static [&'static str]) -> TypeEntry {
    TypeEntry { sql, modifiers }
}

const ENUM_CHECK: &[&str] = &["CHECK ({column} IN ({values}))"];

#[rustfmt::skip]
static TYPE_TABLE: &[(ColumnType, [TypeEntry; 6])] = &[
    (ColumnType::Increments, [
        m("INT UNSIGNED", &["NOT NULL", "AUTO_INCREMENT", "PRIMARY KEY"]),
        m("SERIAL", &["PRIMARY KEY"]),
        m("INTEGER", &["PRIMARY KEY", "AUTOINCREMENT"]),
        m("INT", &["IDENTITY", "PRIMARY KEY"]),
        m("NUMBER(10)", &["PRIMARY KEY"]),
        m("INT", &["IDENTITY(1,1)", "PRIMARY KEY"]),
    ]),
    (ColumnType::BigIncrements, [
        m("BIGINT UNSIGNED", &["NOT NULL", "AUTO_INCREMENT", "PRIMARY KEY"]),
        m("BIGSERIAL", &["PRIMARY KEY"]),
        m("INTEGER", &["PRIMARY KEY", "AUTOINCREMENT"]),
        m("BIGINT", &["IDENTITY", "PRIMARY KEY"]),
        m("NUMBER(19)", &["PRIMARY KEY"]),
        m("BIGINT", &["IDENTITY(1,1)", "PRIMARY KEY"]),
    ]),
    (ColumnType::Char, [
        t("CHAR({length})"), t("CHAR({length})"), t("CHAR({length})"),
        t("CHAR({length})"), t("CHAR({length})"), t("NCHAR({length})"),
    ]),
    (ColumnType::String, [
        t("VARCHAR({length})"), t("VARCHAR({length})"), t("VARCHAR({length})"),
        t("VARCHAR({length})"), t("VARCHAR2({length})"), t("NVARCHAR({length})"),
    ]),
    (ColumnType::Text, [
        t("TEXT"), t("TEXT"), t("TEXT"), t("TEXT"), t("CLOB"), t("NVARCHAR(MAX)"),
    ]),
    (ColumnType::MediumText, [
        t("MEDIUMTEXT"), t("TEXT"), t("TEXT"), t("TEXT"), t("CLOB"), t("NVARCHAR(MAX)"),
    ]),
    (ColumnType::LongText, [
        t("LONGTEXT"), t("TEXT"), t("TEXT"), t("TEXT"), t("CLOB"), t("NVARCHAR(MAX)"),
    ]),
    (ColumnType::TinyInteger, [
        t("TINYINT"), t("SMALLINT"), t("INTEGER"), t("TINYINT"), t("NUMBER(3)"), t("TINYINT"),
    ]),
    (ColumnType::SmallInteger, [
        t("SMALLINT"), t("SMALLINT"), t("INTEGER"), t("SMALLINT"), t("NUMBER(5)"), t("SMALLINT"),
    ]),
    (ColumnType::MediumInteger, [
        t("MEDIUMINT"), t("INTEGER"), t("INTEGER"), t("INT"), t("NUMBER(7)"), t("INT"),
    ]),
    (ColumnType::Integer, [
        t("INT"), t("INTEGER"), t("INTEGER"), t("INT"), t("NUMBER(10)"), t("INT"),
    ]),
    (ColumnType::BigInteger, [
        t("BIGINT"), t("BIGINT"), t("INTEGER"), t("BIGINT"), t("NUMBER(19)"), t("BIGINT"),
    ]),
    (ColumnType::Float, [
        t("FLOAT"), t("REAL"), t("REAL"), t("REAL"), t("BINARY_FLOAT"), t("REAL"),
    ]),
    (ColumnType::Double, [
        t("DOUBLE"), t("DOUBLE PRECISION"), t("REAL"), t("DOUBLE PRECISION"), t("BINARY_DOUBLE"), t("FLOAT"),
    ]),
    (ColumnType::Decimal, [
        t("DECIMAL({precision}, {scale})"), t("NUMERIC({precision}, {scale})"), t("NUMERIC({precision}, {scale})"),
        t("DECIMAL({precision}, {scale})"), t("NUMBER({precision}, {scale})"), t("DECIMAL({precision}, {scale})"),
    ]),
    (ColumnType::Boolean, [
        t("TINYINT(1)"), t("BOOLEAN"), t("INTEGER"), t("BIT"), t("NUMBER(1)"), t("BIT"),
    ]),
    (ColumnType::Enum, [
        t("ENUM({values})"),
        t("{enum_type}"),
        m("VARCHAR(255)", ENUM_CHECK),
        m("VARCHAR(255)", ENUM_CHECK),
        m("VARCHAR2(255)", ENUM_CHECK),
        m("NVARCHAR(255)", ENUM_CHECK),
    ]),
    (ColumnType::Json, [
        t("JSON"), t("JSONB"), t("TEXT"), t("TEXT"), t("CLOB"), t("NVARCHAR(MAX)"),
    ]),
    (ColumnType::Date, [
        t("DATE"), t("DATE"), t("DATE"), t("DATE"), t("DATE"), t("DATE"),
    ]),
    (ColumnType::DateTime, [
        t("DATETIME"), t("TIMESTAMP(0) WITHOUT TIME ZONE"), t("DATETIME"),
        t("DATETIME"), t("TIMESTAMP"), t("DATETIME2"),
    ]),
    (ColumnType::Time, [
        t("TIME"), t("TIME(0) WITHOUT TIME ZONE"), t("TIME"), t("TIME"), t("DATE"), t("TIME"),
    ]),
    (ColumnType::Timestamp, [
        t("TIMESTAMP"), t("TIMESTAMP(0) WITHOUT TIME ZONE"), t("DATETIME"),
        t("DATETIME"), t("TIMESTAMP"), t("DATETIME2"),
    ]),
    (ColumnType::Binary, [
        t("BLOB"), t("BYTEA"), t("BLOB"), t("IMAGE"), t("BLOB"), t("VARBINARY(MAX)"),
    ]),
    (ColumnType::VarBinary, [
        t("VARBINARY({length})"), t("BYTEA"), t("BLOB"),
        t("VARBINARY({length})"), t("RAW({length})"), t("VARBINARY({length})"),
    ]),
    (ColumnType::Uuid, [
        t("CHAR(36)"), t("UUID"), t("VARCHAR(36)"), t("CHAR(36)"), t("CHAR(36)"), t("UNIQUEIDENTIFIER"),
    ]),
];

/// Default length for string and binary types.
pub const DEFAULT_LENGTH: u32 = 255;
/// Default decimal precision.
pub const DEFAULT_PRECISION: u32 = 8;
/// Default decimal scale.
pub const DEFAULT_SCALE: u32 = 2;

/// Arguments substituted into a type template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeArgs {
    /// `{length}`
    pub length: Option<u32>,
    /// `{precision}`
    pub precision: Option<u32>,
    /// `{scale}`
    pub scale: Option<u32>,
    /// Allowed enum values, rendered as `{values}`.
    pub values: Vec<String>,
}

/// Concrete SQL type and implied modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    /// SQL type.
    pub sql_type: String,
    /// Modifiers implied by the type, in emission order.
    pub modifiers: Vec<String>,
}

/// Maps an abstract type for `column` to `dialect`.
///
/// `column` and `enum_type` must already be quoted for DDL.
#[must_use]
pub fn map_type(
    ty: ColumnType,
    dialect: DialectKind,
    args: &TypeArgs,
    column: &str,
    enum_type: &str,
) -> MappedType {
    let entry = TYPE_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == ty)
        .map_or(TypeEntry { sql: "TEXT", modifiers: &[] }, |(_, entries)| {
            entries[dialect.index()]
        });

    let values = args
        .values
        .iter()
        .map(|v| string_literal(v))
        .collect::<Vec<_>>()
        .join(", ");
    // One pass, so substituted text is never scanned again.
    let fill = |template: &str| {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
                "length" => args.length.unwrap_or(DEFAULT_LENGTH).to_string(),
                "precision" => args.precision.unwrap_or(DEFAULT_PRECISION).to_string(),
                "scale" => args.scale.unwrap_or(DEFAULT_SCALE).to_string(),
                "values" => values.clone(),
                "column" => String::from(column),
                "enum_type" => String::from(enum_type),
                _ => String::from(&caps[0]),
            })
            .into_owned()
    };

    MappedType {
        sql_type: fill(entry.sql),
        modifiers: entry.modifiers.iter().map(|modifier| fill(*modifier)).collect(),
    }
}

/// Returns the PostgreSQL prelude creating a native enum type.
///
/// Dropping a table keeps its enum types, so the prelude skips a type that
/// already exists.
#[must_use]
pub fn enum_type_sql(enum_type: &str, values: &[String]) -> String {
    let values: Vec<String> = values.iter().map(|v| string_literal(v)).collect();
    format!(
        "DO $$ BEGIN CREATE TYPE {enum_type} AS ENUM ({}); \
         EXCEPTION WHEN duplicate_object THEN NULL; END $$",
        values.join(", ")
    )
}
