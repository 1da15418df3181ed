//! Condition trees and the WHERE-clause compiler.
//!
//! A condition tree maps condition keys to values. A key is either a column
//! name (`"age"`), a column with an operator suffix (`"age[>]"`), or a group
//! key (`"AND"`, `"OR"`, optionally followed by `#comment`) holding a nested
//! tree. Sibling conditions are joined with `AND`; a group joins its
//! children with its own operator and is wrapped in parentheses.
//!
//! Trees are represented by [`Where`], built either with the fluent API or
//! parsed from an ordered JSON object.
//!
//! # Example
//!
//! ```rust
//! use sqlweave_core::builder::Where;
//! use sqlweave_core::SqlValue;
//!
//! let (sql, params) = Where::new()
//!     .field("age[>]", 18)
//!     .field("name[LIKE]", "A%")
//!     .compile()
//!     .unwrap();
//!
//! assert_eq!(sql, "age > ? AND name LIKE ?");
//! assert_eq!(params, vec![SqlValue::Int(18), SqlValue::Text("A%".into())]);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value as Json};

use super::expr::{validate_column, Fragment};
use super::raw::Raw;
use super::statement::QueryBuilder;
use crate::dialect::wrap_identifier;
use crate::error::{CompileError, Result};
use crate::value::{SqlValue, ToSqlValue};

static CONDITION_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_$]*(?:\.[A-Za-z_][A-Za-z0-9_$]*)?)\s*(?:\[([^\]]*)\])?\s*$")
        .expect("Invalid condition key regex")
});

/// Splits `column[OP]` into the column and the trimmed operator token.
pub(crate) fn split_key(key: &str) -> Result<(&str, Option<&str>)> {
    let caps = CONDITION_KEY
        .captures(key)
        .ok_or_else(|| CompileError::InvalidKey(String::from(key)))?;
    let column = caps
        .get(1)
        .map(|m| &key[m.range()])
        .ok_or_else(|| CompileError::InvalidKey(String::from(key)))?;
    let operator = caps.get(2).map(|m| key[m.range()].trim());
    Ok((column, operator))
}

// =============================================================================
// Operators and operands
// =============================================================================

/// Operators accepted in a `column[OP]` condition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `!=` (also written `!`)
    Ne,
    /// `<>`
    LtGt,
    /// `LIKE` (also written `~`)
    Like,
    /// `NOT LIKE` (also written `!~`)
    NotLike,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `BETWEEN`
    Between,
    /// `NOT BETWEEN`
    NotBetween,
}

impl Operator {
    /// Parses an operator token, ignoring case and repeated whitespace.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let normalized = token
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        let op = match normalized.as_str() {
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Gte,
            "<=" => Self::Lte,
            "!=" | "!" => Self::Ne,
            "<>" => Self::LtGt,
            "LIKE" | "~" => Self::Like,
            "NOT LIKE" | "!~" => Self::NotLike,
            "IN" => Self::In,
            "NOT IN" => Self::NotIn,
            "BETWEEN" => Self::Between,
            "NOT BETWEEN" => Self::NotBetween,
            _ => return None,
        };
        Some(op)
    }

    /// Returns the SQL keyword for this operator.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Ne => "!=",
            Self::LtGt => "<>",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
        }
    }
}

/// Returns `true` for the arithmetic SET suffixes `+ - * /`.
pub(crate) fn is_arithmetic(token: &str) -> bool {
    matches!(token, "+" | "-" | "*" | "/")
}

/// The right-hand side of a condition or assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single bound value.
    Value(SqlValue),
    /// An ordered sequence of bound values.
    List(Vec<SqlValue>),
    /// Trusted SQL inserted verbatim.
    Raw(Raw),
}

/// Conversion into an [`Operand`].
pub trait IntoOperand {
    /// Converts `self` into an operand.
    fn into_operand(self) -> Operand;
}

impl<T: ToSqlValue> IntoOperand for T {
    fn into_operand(self) -> Operand {
        Operand::Value(self.to_sql_value())
    }
}

impl IntoOperand for Operand {
    fn into_operand(self) -> Operand {
        self
    }
}

impl IntoOperand for Raw {
    fn into_operand(self) -> Operand {
        Operand::Raw(self)
    }
}

impl<T: ToSqlValue, const N: usize> IntoOperand for [T; N] {
    fn into_operand(self) -> Operand {
        list(self)
    }
}

/// Builds a list operand from any sequence of values.
#[must_use]
pub fn list<I, T>(values: I) -> Operand
where
    I: IntoIterator<Item = T>,
    T: ToSqlValue,
{
    Operand::List(values.into_iter().map(ToSqlValue::to_sql_value).collect())
}

// =============================================================================
// Conditions
// =============================================================================

/// Logical operator of a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Logic {
    /// Parses a group key such as `"AND"` or `"OR #price"`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let head = key.split_once('#').map_or(key, |(head, _)| head).trim();
        match head {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    const fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// One node of a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A comparison on one column.
    Compare {
        /// Column name, optionally table-qualified.
        column: String,
        /// Operator from the key suffix; `None` for a plain column key.
        operator: Option<Operator>,
        /// Compared value(s).
        operand: Operand,
    },
    /// A parenthesized group of conditions.
    Group {
        /// Operator joining the children.
        logic: Logic,
        /// Nested conditions.
        children: Vec<Condition>,
    },
}

impl Condition {
    /// Parses a `column` / `column[OP]` key into a comparison.
    ///
    /// # Errors
    ///
    /// Fails on group keys, malformed keys, unknown operators and
    /// arithmetic suffixes.
    pub fn parse(key: &str, operand: Operand) -> Result<Self> {
        if Logic::from_key(key).is_some() {
            return Err(CompileError::InvalidGroup(String::from(key)));
        }
        let (column, token) = split_key(key)?;
        let operator = match token {
            None => None,
            Some(token) if is_arithmetic(token) => {
                return Err(CompileError::ArithmeticInCondition(String::from(key)));
            }
            Some(token) => Some(Operator::parse(token).ok_or_else(|| {
                CompileError::UnknownOperator {
                    key: String::from(key),
                    operator: String::from(token),
                }
            })?),
        };
        Ok(Self::Compare {
            column: String::from(validate_column(column)?),
            operator,
            operand,
        })
    }

    /// Compiles this node into SQL text and bound parameters.
    ///
    /// `render` expands raw operands.
    ///
    /// # Errors
    ///
    /// Fails when the operand shape does not fit the operator.
    pub fn compile(&self, render: &dyn Fn(&Raw) -> String) -> Result<Fragment> {
        match self {
            Self::Group { logic, children } => {
                let inner = compile_all(children, *logic, render)?;
                if inner.is_empty() {
                    Ok(inner)
                } else {
                    Ok(inner.paren())
                }
            }
            Self::Compare {
                column,
                operator,
                operand,
            } => compile_compare(column, *operator, operand, render),
        }
    }
}

fn compile_all(
    conditions: &[Condition],
    logic: Logic,
    render: &dyn Fn(&Raw) -> String,
) -> Result<Fragment> {
    let mut parts = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let fragment = condition.compile(render)?;
        if !fragment.is_empty() {
            parts.push(fragment);
        }
    }
    Ok(Fragment::join(parts, logic.separator()))
}

fn compile_compare(
    column: &str,
    operator: Option<Operator>,
    operand: &Operand,
    render: &dyn Fn(&Raw) -> String,
) -> Result<Fragment> {
    let col = Fragment::raw(column);
    let Some(op) = operator else {
        return Ok(match operand {
            Operand::Raw(raw) => Fragment::binary(col, "=", Fragment::raw(render(raw))),
            Operand::Value(SqlValue::Null) => Fragment::postfix(col, "IS NULL"),
            Operand::Value(value) => Fragment::binary(col, "=", Fragment::value(value.clone())),
            Operand::List(values) => Fragment::in_list(col, values.clone(), false),
        });
    };

    match (op, operand) {
        (Operator::In | Operator::NotIn, Operand::List(values)) => {
            Ok(Fragment::in_list(col, values.clone(), op == Operator::NotIn))
        }
        (Operator::In | Operator::NotIn, Operand::Raw(raw)) => Ok(Fragment::binary(
            col,
            op.keyword(),
            Fragment::raw(render(raw)).paren(),
        )),
        (Operator::In | Operator::NotIn, Operand::Value(_)) => Err(CompileError::ExpectedList {
            column: String::from(column),
            operator: op.keyword(),
        }),
        (Operator::Between | Operator::NotBetween, Operand::List(values)) => match values.as_slice() {
            [low, high] => Ok(Fragment::between(
                col,
                low.clone(),
                high.clone(),
                op == Operator::NotBetween,
            )),
            _ => Err(CompileError::BetweenArity {
                column: String::from(column),
                operator: op.keyword(),
                len: values.len(),
            }),
        },
        (Operator::Between | Operator::NotBetween, _) => Err(CompileError::ExpectedList {
            column: String::from(column),
            operator: op.keyword(),
        }),
        (_, Operand::List(_)) => Err(CompileError::ExpectedScalar {
            column: String::from(column),
            operator: op.keyword(),
        }),
        (Operator::Ne | Operator::LtGt, Operand::Value(SqlValue::Null)) => {
            Ok(Fragment::postfix(col, "IS NOT NULL"))
        }
        (_, Operand::Value(value)) => Ok(Fragment::binary(
            col,
            op.keyword(),
            Fragment::value(value.clone()),
        )),
        (_, Operand::Raw(raw)) => Ok(Fragment::binary(
            col,
            op.keyword(),
            Fragment::raw(render(raw)),
        )),
    }
}

// =============================================================================
// Ordering and limits
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderBy {
    /// A column with an optional direction.
    Column {
        /// Column name.
        column: String,
        /// Direction, or the database default.
        direction: Option<Direction>,
    },
    /// A raw ordering expression.
    Raw(Raw),
}

/// Row limit with optional offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Maximum number of rows, or `None` for an offset alone.
    pub count: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
}

// =============================================================================
// Where
// =============================================================================

/// A condition tree plus the reserved `GROUP`, `HAVING`, `ORDER` and
/// `LIMIT` clauses.
///
/// Builder methods never fail; the first malformed key is kept and reported
/// by [`Where::compile`] or by the statement builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    conditions: Vec<Condition>,
    group_by: Vec<String>,
    having: Vec<Condition>,
    order_by: Vec<OrderBy>,
    limit: Option<Limit>,
    error: Option<CompileError>,
}

impl Where {
    /// Creates an empty condition tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn keep_error(&mut self, error: CompileError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn absorb(&mut self, other: Self) -> Vec<Condition> {
        if let Some(error) = other.error {
            self.keep_error(error);
        }
        other.conditions
    }

    /// Adds a `column` / `column[OP]` condition.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl IntoOperand) -> Self {
        match Condition::parse(key, value.into_operand()) {
            Ok(condition) => self.conditions.push(condition),
            Err(error) => self.keep_error(error),
        }
        self
    }

    /// Adds an already-built condition.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds a parenthesized group whose children are joined with `AND`.
    #[must_use]
    pub fn and(self, group: Self) -> Self {
        self.group(Logic::And, group)
    }

    /// Adds a parenthesized group whose children are joined with `OR`.
    #[must_use]
    pub fn or(self, group: Self) -> Self {
        self.group(Logic::Or, group)
    }

    /// Adds a parenthesized group with the given operator.
    #[must_use]
    pub fn group(mut self, logic: Logic, group: Self) -> Self {
        let children = self.absorb(group);
        self.conditions.push(Condition::Group { logic, children });
        self
    }

    /// Adds a GROUP BY column.
    #[must_use]
    pub fn group_by(mut self, column: &str) -> Self {
        match validate_column(column) {
            Ok(column) => self.group_by.push(String::from(column)),
            Err(error) => self.keep_error(error),
        }
        self
    }

    /// Sets the HAVING condition tree.
    #[must_use]
    pub fn having(mut self, having: Self) -> Self {
        let conditions = self.absorb(having);
        self.having.extend(conditions);
        self
    }

    /// Adds an ascending ORDER BY column.
    #[must_use]
    pub fn order_by(self, column: &str) -> Self {
        self.order(column, Some(Direction::Asc))
    }

    /// Adds a descending ORDER BY column.
    #[must_use]
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order(column, Some(Direction::Desc))
    }

    fn order(mut self, column: &str, direction: Option<Direction>) -> Self {
        match validate_column(column) {
            Ok(column) => self.order_by.push(OrderBy::Column {
                column: String::from(column),
                direction,
            }),
            Err(error) => self.keep_error(error),
        }
        self
    }

    /// Adds a raw ORDER BY expression.
    #[must_use]
    pub fn order_raw(mut self, expr: Raw) -> Self {
        self.order_by.push(OrderBy::Raw(expr));
        self
    }

    /// Limits the number of returned rows. Counts above `i64::MAX` are
    /// reported when compiling.
    #[must_use]
    pub fn limit(mut self, count: u64) -> Self {
        if let Err(error) = check_row_count(count) {
            self.keep_error(error);
        }
        let offset = self.limit.and_then(|l| l.offset);
        self.limit = Some(Limit {
            count: Some(count),
            offset,
        });
        self
    }

    /// Skips rows, with or without a limit.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        if let Err(error) = check_row_count(offset) {
            self.keep_error(error);
        }
        let count = self.limit.and_then(|l| l.count);
        self.limit = Some(Limit {
            count,
            offset: Some(offset),
        });
        self
    }

    /// Returns the top-level conditions.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns the configured limit.
    #[must_use]
    pub const fn limit_value(&self) -> Option<Limit> {
        self.limit
    }

    /// Returns `true` when no condition or clause has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
            && self.group_by.is_empty()
            && self.having.is_empty()
            && self.order_by.is_empty()
            && self.limit.is_none()
    }

    /// Parses a condition tree from an ordered JSON object.
    ///
    /// Reserved keys: `ORDER`, `LIMIT`, `GROUP`, `HAVING`.
    ///
    /// # Errors
    ///
    /// Fails on any malformed key or value.
    pub fn from_json(value: &Json) -> Result<Self> {
        let map = as_object(value, "condition tree")?;
        let mut tree = Self::new();
        for (key, value) in map {
            match key.as_str() {
                "ORDER" => tree.order_by.extend(order_from_json(value)?),
                "LIMIT" => tree.limit = Some(limit_from_json(value)?),
                "GROUP" => {
                    for column in strings_from_json(value, "GROUP")? {
                        tree.group_by.push(String::from(validate_column(&column)?));
                    }
                }
                "HAVING" => tree
                    .having
                    .extend(conditions_from_json(as_object(value, "HAVING")?)?),
                _ => tree.conditions.push(condition_from_json(key, value)?),
            }
        }
        Ok(tree)
    }

    /// Compiles the condition tree into a boolean SQL expression and its
    /// parameters, in placeholder order.
    ///
    /// Identifiers inside raw operands are expanded with ANSI double quotes;
    /// statements built through [`QueryBuilder`] use the dialect's quoting.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building, or an operand shape
    /// error found while compiling.
    pub fn compile(&self) -> Result<(String, Vec<SqlValue>)> {
        let ansi = |raw: &Raw| raw.render(|name| wrap_identifier(name, '"', '"'));
        Ok(self.predicate(&ansi)?.build())
    }

    /// Compiles only the boolean condition, ignoring reserved clauses.
    pub(crate) fn predicate(&self, render: &dyn Fn(&Raw) -> String) -> Result<Fragment> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        compile_all(&self.conditions, Logic::And, render)
    }

    /// Renders ` WHERE ... GROUP BY ... HAVING ... ORDER BY ... LIMIT ...`
    /// for statements built by `builder`. Empty parts are omitted.
    ///
    /// # Errors
    ///
    /// See [`Where::compile`].
    pub fn clauses(&self, builder: &QueryBuilder) -> Result<Fragment> {
        let render = |raw: &Raw| builder.render_raw(raw);
        let mut out = Fragment::new();

        let predicate = self.predicate(&render)?;
        if !predicate.is_empty() {
            out.push_str(" WHERE ");
            out.append(predicate);
        }

        if !self.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            out.push_str(&self.group_by.join(", "));
        }

        let having = compile_all(&self.having, Logic::And, &render)?;
        if !having.is_empty() {
            out.push_str(" HAVING ");
            out.append(having);
        }

        if !self.order_by.is_empty() {
            let items: Vec<String> = self
                .order_by
                .iter()
                .map(|item| match item {
                    OrderBy::Column { column, direction } => match direction {
                        Some(Direction::Asc) => format!("{column} ASC"),
                        Some(Direction::Desc) => format!("{column} DESC"),
                        None => column.clone(),
                    },
                    OrderBy::Raw(raw) => builder.render_raw(raw),
                })
                .collect();
            out.push_str(" ORDER BY ");
            out.push_str(&items.join(", "));
        }

        if let Some(limit) = self.limit {
            out.push_str(&builder.dialect().limit_clause(
                limit.count,
                limit.offset,
                !self.order_by.is_empty(),
            ));
        }

        Ok(out)
    }
}

// =============================================================================
// JSON parsing
// =============================================================================

fn as_object<'a>(value: &'a Json, what: &str) -> Result<&'a Map<String, Json>> {
    value
        .as_object()
        .ok_or_else(|| CompileError::InvalidInput(format!("{what} must be an object")))
}

fn conditions_from_json(map: &Map<String, Json>) -> Result<Vec<Condition>> {
    map.iter()
        .map(|(key, value)| condition_from_json(key, value))
        .collect()
}

fn condition_from_json(key: &str, value: &Json) -> Result<Condition> {
    if let Some(logic) = Logic::from_key(key) {
        let children = value
            .as_object()
            .ok_or_else(|| CompileError::InvalidGroup(String::from(key)))?;
        return Ok(Condition::Group {
            logic,
            children: conditions_from_json(children)?,
        });
    }
    Condition::parse(key, operand_from_json(key, value)?)
}

/// Converts a JSON value into an operand: arrays become lists.
pub(crate) fn operand_from_json(key: &str, value: &Json) -> Result<Operand> {
    match value {
        Json::Array(items) => Ok(Operand::List(items.iter().map(SqlValue::from_json).collect())),
        Json::Object(_) => Err(CompileError::InvalidInput(format!(
            "value for '{key}' must be a scalar or a list"
        ))),
        other => Ok(Operand::Value(SqlValue::from_json(other))),
    }
}

fn strings_from_json(value: &Json, what: &str) -> Result<Vec<String>> {
    match value {
        Json::String(s) => Ok(vec![s.clone()]),
        Json::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(String::from).ok_or_else(|| {
                    CompileError::InvalidInput(format!("{what} entries must be strings"))
                })
            })
            .collect(),
        _ => Err(CompileError::InvalidInput(format!(
            "{what} must be a string or a list of strings"
        ))),
    }
}

fn order_from_json(value: &Json) -> Result<Vec<OrderBy>> {
    if let Json::Object(map) = value {
        return map
            .iter()
            .map(|(column, direction)| {
                let direction = match direction.as_str().map(str::to_ascii_uppercase).as_deref() {
                    Some("ASC") => Direction::Asc,
                    Some("DESC") => Direction::Desc,
                    _ => {
                        return Err(CompileError::InvalidInput(format!(
                            "ORDER direction for '{column}' must be ASC or DESC"
                        )))
                    }
                };
                Ok(OrderBy::Column {
                    column: String::from(validate_column(column)?),
                    direction: Some(direction),
                })
            })
            .collect();
    }
    strings_from_json(value, "ORDER")?
        .into_iter()
        .map(|column| {
            Ok(OrderBy::Column {
                column: String::from(validate_column(&column)?),
                direction: None,
            })
        })
        .collect()
}

fn check_row_count(n: u64) -> Result<u64> {
    if i64::try_from(n).is_ok() {
        Ok(n)
    } else {
        Err(CompileError::InvalidInput(format!(
            "row count {n} exceeds the largest signed 64-bit integer"
        )))
    }
}

fn limit_from_json(value: &Json) -> Result<Limit> {
    let invalid = || CompileError::InvalidInput(String::from("LIMIT must be a count or [offset, count]"));
    let row_count = |n: &Json| n.as_u64().ok_or_else(invalid).and_then(check_row_count);
    match value {
        Json::Number(_) => Ok(Limit {
            count: Some(row_count(value)?),
            offset: None,
        }),
        Json::Array(items) => match items.as_slice() {
            [offset, count] => Ok(Limit {
                count: Some(row_count(count)?),
                offset: Some(row_count(offset)?),
            }),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}
