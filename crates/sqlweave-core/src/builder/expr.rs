//! SQL fragments carrying positional parameters.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CompileError, Result};
use crate::value::{SqlValue, ToSqlValue};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$")
        .expect("Invalid identifier pattern regex")
});

/// Checks that `name` is a plain or table-qualified column reference.
///
/// Column names in conditions and SET/VALUES lists are emitted without
/// quoting, so anything outside `[A-Za-z0-9_$.]` is rejected.
///
/// # Errors
///
/// Returns [`CompileError::InvalidIdentifier`] for anything else.
pub fn validate_column(name: &str) -> Result<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(CompileError::InvalidIdentifier(String::from(name)))
    }
}

/// A piece of SQL text together with the values bound to its placeholders.
///
/// Parameters are stored in the left-to-right order of their `?`
/// placeholders, and every value is coerced for binding on the way in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    sql: String,
    params: Vec<SqlValue>,
}

impl Fragment {
    /// Creates an empty fragment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fragment from trusted SQL text with no parameters.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: vec![],
        }
    }

    /// Creates a single placeholder bound to `value`.
    #[must_use]
    pub fn value<T: ToSqlValue>(value: T) -> Self {
        Self {
            sql: String::from("?"),
            params: vec![value.to_sql_value().coerce()],
        }
    }

    /// Creates a binary expression `left op right`.
    #[must_use]
    pub fn binary(left: Self, op: &str, right: Self) -> Self {
        let mut params = left.params;
        params.extend(right.params);
        Self {
            sql: format!("{} {op} {}", left.sql, right.sql),
            params,
        }
    }

    /// Creates a postfix expression such as `col IS NULL`.
    #[must_use]
    pub fn postfix(operand: Self, op: &str) -> Self {
        Self {
            sql: format!("{} {op}", operand.sql),
            params: operand.params,
        }
    }

    /// Creates a `BETWEEN` / `NOT BETWEEN` expression.
    #[must_use]
    pub fn between(expr: Self, low: SqlValue, high: SqlValue, negated: bool) -> Self {
        let keyword = if negated { "NOT BETWEEN" } else { "BETWEEN" };
        let mut params = expr.params;
        params.push(low.coerce());
        params.push(high.coerce());
        Self {
            sql: format!("{} {keyword} ? AND ?", expr.sql),
            params,
        }
    }

    /// Creates an `IN` / `NOT IN` expression.
    ///
    /// An empty list compiles to a constant predicate (`1 = 0` for IN,
    /// `1 = 1` for NOT IN) instead of the invalid `IN ()`.
    #[must_use]
    pub fn in_list(expr: Self, values: Vec<SqlValue>, negated: bool) -> Self {
        if values.is_empty() {
            return Self::raw(if negated { "1 = 1" } else { "1 = 0" });
        }
        let keyword = if negated { "NOT IN" } else { "IN" };
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        let mut params = expr.params;
        params.extend(values.into_iter().map(SqlValue::coerce));
        Self {
            sql: format!("{} {keyword} ({})", expr.sql, placeholders.join(", ")),
            params,
        }
    }

    /// Joins fragments with `separator`, keeping parameter order.
    #[must_use]
    pub fn join(parts: Vec<Self>, separator: &str) -> Self {
        let mut sql = Vec::with_capacity(parts.len());
        let mut params = vec![];
        for part in parts {
            sql.push(part.sql);
            params.extend(part.params);
        }
        Self {
            sql: sql.join(separator),
            params,
        }
    }

    /// Wraps the fragment in parentheses.
    #[must_use]
    pub fn paren(self) -> Self {
        Self {
            sql: format!("({})", self.sql),
            params: self.params,
        }
    }

    /// Appends trusted SQL text.
    pub fn push_str(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Appends another fragment.
    pub fn append(&mut self, other: Self) {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }

    /// Returns `true` when there is no SQL text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Returns the SQL string.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameters.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Consumes the fragment and returns the SQL and parameters.
    #[must_use]
    pub fn build(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}
