//! Compilation errors.
//!
//! Every error in this module is raised before a statement reaches a
//! database driver. They describe caller mistakes in condition trees,
//! column specs, join specs or table blueprints.

use thiserror::Error;

/// Errors raised while compiling queries or schema definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A condition key could not be parsed as `column` or `column[OP]`.
    #[error("invalid condition key '{0}'")]
    InvalidKey(String),

    /// The bracketed operator suffix is not a known operator.
    #[error("unknown operator '{operator}' in condition key '{key}'")]
    UnknownOperator {
        /// Full condition key.
        key: String,
        /// The unrecognised operator token.
        operator: String,
    },

    /// The operator requires a sequence value.
    #[error("operator {operator} on '{column}' expects a list value")]
    ExpectedList {
        /// Column the operator was applied to.
        column: String,
        /// Operator keyword.
        operator: &'static str,
    },

    /// The operator requires a scalar value.
    #[error("operator {operator} on '{column}' expects a single value")]
    ExpectedScalar {
        /// Column the operator was applied to.
        column: String,
        /// Operator keyword.
        operator: &'static str,
    },

    /// BETWEEN takes exactly two bounds.
    #[error("{operator} on '{column}' expects exactly 2 values, got {len}")]
    BetweenArity {
        /// Column the operator was applied to.
        column: String,
        /// Operator keyword.
        operator: &'static str,
        /// Number of values supplied.
        len: usize,
    },

    /// Arithmetic suffixes (`[+]`, `[-]`, `[*]`, `[/]`) are only valid in SET.
    #[error("arithmetic operator in '{0}' is only valid in UPDATE data")]
    ArithmeticInCondition(String),

    /// Group keys (`AND`/`OR`) must hold a nested condition tree.
    #[error("group '{0}' must contain a nested condition tree")]
    InvalidGroup(String),

    /// An identifier contains characters that cannot be emitted safely.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Rows of a multi-row insert do not share the same column set.
    #[error("row {row} of the insert has a different column set than row 0")]
    ColumnSetMismatch {
        /// Index of the first mismatching row.
        row: usize,
    },

    /// Insert without rows or without columns.
    #[error("insert into '{0}' has no values")]
    EmptyInsert(String),

    /// Update without any SET data.
    #[error("update of '{0}' has no values")]
    EmptyUpdate(String),

    /// A join was given without an ON/USING constraint.
    #[error("join on '{0}' has no constraint")]
    JoinWithoutConstraint(String),

    /// A join key tag could not be parsed.
    #[error("invalid join key '{0}'")]
    InvalidJoin(String),

    /// Unknown database type tag.
    #[error("unsupported database type '{0}'")]
    UnsupportedDialect(String),

    /// The requested DDL operation has no rendering for this dialect.
    #[error("{operation} is not supported by {dialect}")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// Operation description.
        operation: &'static str,
    },

    /// A JSON document did not have the expected shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
