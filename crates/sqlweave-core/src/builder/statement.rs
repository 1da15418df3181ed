//! Statement assembly.
//!
//! [`QueryBuilder`] combines condition trees, column specs and joins into
//! complete statements for one dialect and table prefix. Table names are
//! prefixed and quoted; column references are validated and emitted bare;
//! every non-raw value is bound positionally.
//!
//! # Example
//!
//! ```rust
//! use sqlweave_core::builder::{Columns, QueryBuilder, Where};
//! use sqlweave_core::DialectKind;
//!
//! let builder = QueryBuilder::new(DialectKind::MySql).with_prefix("app_");
//! let stmt = builder
//!     .select("users", &[], &Columns::from(["id", "name"]), &Where::new().field("id", 1))
//!     .unwrap();
//!
//! assert_eq!(stmt.sql(), "SELECT id, name FROM `app_users` WHERE id = ?");
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as Json;

use super::columns::{Columns, SelectItem};
use super::condition::{is_arithmetic, operand_from_json, split_key, IntoOperand, Operand, Where};
use super::expr::{validate_column, Fragment};
use super::join::Join;
use super::raw::{expand_identifiers, Raw};
use crate::dialect::{Dialect, DialectKind};
use crate::error::{CompileError, Result};
use crate::value::{SqlValue, ToSqlValue};

static TABLE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_$]*)\s*\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)\s*$")
        .expect("Invalid table alias regex")
});

// =============================================================================
// Statement
// =============================================================================

/// A compiled statement: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<SqlValue>,
}

impl Statement {
    /// Creates a statement from parts.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Returns the SQL string.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameters, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Consumes the statement and returns its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }

    /// Renders the SQL with every placeholder replaced by its inlined value.
    ///
    /// For logs only; placeholders inside string literals are left alone.
    #[must_use]
    pub fn to_inline_sql(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut params = self.params.iter();
        let mut in_literal = false;
        for ch in self.sql.chars() {
            match ch {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(ch);
                }
                '?' if !in_literal => match params.next() {
                    Some(value) => out.push_str(&value.to_sql_inline()),
                    None => out.push(ch),
                },
                _ => out.push(ch),
            }
        }
        out
    }
}

impl From<Fragment> for Statement {
    fn from(fragment: Fragment) -> Self {
        let (sql, params) = fragment.build();
        Self { sql, params }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

// =============================================================================
// Row data
// =============================================================================

/// Ordered column → value data for INSERT and UPDATE.
///
/// Keys are plain column names; UPDATE additionally accepts the arithmetic
/// suffixes `col[+]`, `col[-]`, `col[*]` and `col[/]`. List values are stored
/// as JSON text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: Vec<(String, Operand)>,
}

impl Values {
    /// Creates empty row data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing an earlier value for the same key.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl IntoOperand) -> Self {
        let value = value.into_operand();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((String::from(key), value)),
        }
        self
    }

    /// Parses row data from a JSON object. Arrays and objects become JSON
    /// text.
    ///
    /// # Errors
    ///
    /// Fails when `value` is not an object.
    pub fn from_json(value: &Json) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| CompileError::InvalidInput(String::from("row data must be an object")))?;
        let entries = map
            .iter()
            .map(|(key, value)| {
                let operand = match value {
                    Json::Object(_) => Operand::Value(SqlValue::from_json(value)),
                    other => operand_from_json(key, other)?,
                };
                Ok((key.clone(), operand))
            })
            .collect::<Result<_>>()?;
        Ok(Self { entries })
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operand)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, key: &str) -> Option<&Operand> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn key_set(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }
}

/// Old → new value pairs per column for [`QueryBuilder::replace`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replacements {
    columns: Vec<(String, Vec<(SqlValue, SqlValue)>)>,
}

impl Replacements {
    /// Creates an empty replacement set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces `old` with `new` in `column`.
    #[must_use]
    pub fn replace<O: ToSqlValue, N: ToSqlValue>(mut self, column: &str, old: O, new: N) -> Self {
        let pair = (old.to_sql_value(), new.to_sql_value());
        match self.columns.iter_mut().find(|(c, _)| c == column) {
            Some((_, pairs)) => pairs.push(pair),
            None => self.columns.push((String::from(column), vec![pair])),
        }
        self
    }

    /// Parses `{"column": {"old": "new", ...}}` or
    /// `{"column": [[old, new], ...]}`.
    ///
    /// Object keys are always text, so old values of other types (numbers,
    /// booleans) need the pair-list form.
    ///
    /// # Errors
    ///
    /// Fails on any other shape.
    pub fn from_json(value: &Json) -> Result<Self> {
        let invalid = || {
            CompileError::InvalidInput(String::from(
                "replacements must map columns to {old: new} objects or [old, new] pairs",
            ))
        };
        let map = value.as_object().ok_or_else(invalid)?;
        let mut replacements = Self::new();
        for (column, pairs) in map {
            match pairs {
                Json::Object(pairs) => {
                    for (old, new) in pairs {
                        replacements =
                            replacements.replace(column, old.as_str(), SqlValue::from_json(new));
                    }
                }
                Json::Array(pairs) => {
                    for pair in pairs {
                        let [old, new] = pair.as_array().map(Vec::as_slice).ok_or_else(invalid)? else {
                            return Err(invalid());
                        };
                        replacements = replacements.replace(
                            column,
                            SqlValue::from_json(old),
                            SqlValue::from_json(new),
                        );
                    }
                }
                _ => return Err(invalid()),
            }
        }
        Ok(replacements)
    }

    /// Returns `true` when no pair has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|(_, pairs)| pairs.is_empty())
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// `COUNT`
    Count,
    /// `SUM`
    Sum,
    /// `AVG`
    Avg,
    /// `MIN`
    Min,
    /// `MAX`
    Max,
}

impl Aggregate {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn function(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Alias of the single column returned by aggregate statements.
pub const AGGREGATE_ALIAS: &str = "aggregate";

// =============================================================================
// Builder
// =============================================================================

/// A table in FROM or JOIN position, already prefixed and quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    table: String,
    alias: Option<String>,
}

impl TableRef {
    /// `"table"` or `"table" AS "alias"`.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {alias}", self.table),
            None => self.table.clone(),
        }
    }

    /// The name other clauses qualify columns with.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// Builds statements for one dialect and table prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    kind: DialectKind,
    prefix: String,
}

impl QueryBuilder {
    /// Creates a builder without table prefix.
    #[must_use]
    pub fn new(kind: DialectKind) -> Self {
        Self {
            kind,
            prefix: String::new(),
        }
    }

    /// Sets the prefix prepended to every table name.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the dialect tag.
    #[must_use]
    pub const fn kind(&self) -> DialectKind {
        self.kind
    }

    /// Returns the dialect implementation.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.kind.dialect()
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefixes and quotes a table name.
    #[must_use]
    pub fn quote_table(&self, table: &str) -> String {
        self.dialect()
            .quote_identifier(&format!("{}{table}", self.prefix))
    }

    /// Builds a FROM/JOIN reference with an optional alias.
    #[must_use]
    pub fn table_ref(&self, table: &str, alias: Option<&str>) -> TableRef {
        TableRef {
            table: self.quote_table(table),
            alias: alias.map(|a| self.dialect().quote_identifier(a)),
        }
    }

    /// Parses `table` or `table(alias)`.
    #[must_use]
    pub fn parse_table(&self, spec: &str) -> TableRef {
        match TABLE_ALIAS.captures(spec) {
            Some(caps) => self.table_ref(&caps[1], Some(&caps[2])),
            None => self.table_ref(spec.trim(), None),
        }
    }

    /// Renders `table.column` with the table part prefixed and quoted.
    #[must_use]
    pub fn qualified_column(&self, column: &str) -> String {
        match column.split_once('.') {
            Some((table, column)) => format!("{}.{column}", self.quote_table(table)),
            None => String::from(column),
        }
    }

    /// Expands `<identifier>` tokens in raw SQL. Table positions receive
    /// the prefix.
    #[must_use]
    pub fn render_raw(&self, raw: &Raw) -> String {
        let dialect = self.dialect();
        expand_identifiers(raw.sql(), |name, is_table| {
            if is_table {
                self.quote_table(name)
            } else {
                dialect.quote_identifier(name)
            }
        })
    }

    fn where_clause(&self, conditions: &Where) -> Result<Fragment> {
        let render = |raw: &Raw| self.render_raw(raw);
        let predicate = conditions.predicate(&render)?;
        let mut out = Fragment::new();
        if !predicate.is_empty() {
            out.push_str(" WHERE ");
            out.append(predicate);
        }
        Ok(out)
    }

    fn from_clause(&self, table: &str, joins: &[Join]) -> Result<String> {
        let main = self.parse_table(table);
        let mut sql = format!(" FROM {}", main.render());
        for join in joins {
            sql.push_str(&join.render(&main, self)?);
        }
        Ok(sql)
    }

    fn bind(&self, operand: &Operand) -> Fragment {
        match operand {
            Operand::Value(value) => Fragment::value(value.clone()),
            Operand::List(values) => Fragment::value(SqlValue::json_array(values)),
            Operand::Raw(raw) => Fragment::raw(self.render_raw(raw)),
        }
    }

    /// Builds `SELECT columns FROM table [joins] [clauses]`.
    ///
    /// `table` may carry an alias: `"users(u)"`.
    ///
    /// # Errors
    ///
    /// Fails on condition, join or identifier errors.
    pub fn select(
        &self,
        table: &str,
        joins: &[Join],
        columns: &Columns,
        conditions: &Where,
    ) -> Result<Statement> {
        let items: Vec<String> = columns
            .items()
            .iter()
            .map(|item: &SelectItem| item.render(self))
            .collect();
        let mut stmt = Fragment::raw(format!(
            "SELECT {}{}",
            items.join(", "),
            self.from_clause(table, joins)?
        ));
        stmt.append(conditions.clauses(self)?);
        Ok(stmt.into())
    }

    /// Builds `SELECT FN(column) AS aggregate FROM ...`.
    ///
    /// `column` may be `*` for counts.
    ///
    /// # Errors
    ///
    /// Fails on condition, join or identifier errors.
    pub fn aggregate(
        &self,
        function: Aggregate,
        table: &str,
        joins: &[Join],
        column: &str,
        conditions: &Where,
    ) -> Result<Statement> {
        let column = match column.trim() {
            "*" => "*",
            other => validate_column(other)?,
        };
        let mut stmt = Fragment::raw(format!(
            "SELECT {}({column}) AS {AGGREGATE_ALIAS}{}",
            function.function(),
            self.from_clause(table, joins)?
        ));
        stmt.append(conditions.clauses(self)?);
        Ok(stmt.into())
    }

    /// Builds a single- or multi-row INSERT.
    ///
    /// Columns come from the first row; every other row must hold exactly
    /// the same column set.
    ///
    /// # Errors
    ///
    /// Fails on an empty row list, an empty row, a mismatching row or an
    /// invalid column name.
    pub fn insert(&self, table: &str, rows: &[Values]) -> Result<Statement> {
        let Some(first) = rows.first().filter(|row| !row.is_empty()) else {
            return Err(CompileError::EmptyInsert(String::from(table)));
        };

        let mut columns = Vec::with_capacity(first.len());
        for (key, _) in first.iter() {
            let (column, operator) = split_key(key)?;
            if operator.is_some() {
                return Err(CompileError::InvalidKey(String::from(key)));
            }
            columns.push((key, validate_column(column)?));
        }

        let expected = first.key_set();
        let mut tuples = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.key_set() != expected || row.len() != first.len() {
                return Err(CompileError::ColumnSetMismatch { row: index });
            }
            let values = columns
                .iter()
                .filter_map(|(key, _)| row.get(key))
                .map(|operand| self.bind(operand))
                .collect();
            tuples.push(Fragment::join(values, ", ").paren());
        }

        let names: Vec<&str> = columns.iter().map(|(_, column)| *column).collect();
        let mut stmt = Fragment::raw(format!(
            "INSERT INTO {} ({}) VALUES ",
            self.quote_table(table),
            names.join(", ")
        ));
        stmt.append(Fragment::join(tuples, ", "));
        Ok(stmt.into())
    }

    /// Builds `UPDATE table SET ... [WHERE ...]`.
    ///
    /// `col[+]` style keys compile to `col = col + ?`.
    ///
    /// # Errors
    ///
    /// Fails on empty data, malformed keys or condition errors.
    pub fn update(&self, table: &str, data: &Values, conditions: &Where) -> Result<Statement> {
        if data.is_empty() {
            return Err(CompileError::EmptyUpdate(String::from(table)));
        }

        let mut assignments = Vec::with_capacity(data.len());
        for (key, operand) in data.iter() {
            let (column, operator) = split_key(key)?;
            let column = validate_column(column)?;
            let target = Fragment::raw(column);
            let assignment = match operator {
                None => Fragment::binary(target, "=", self.bind(operand)),
                Some(op) if is_arithmetic(op) => {
                    if let Operand::List(_) = operand {
                        return Err(CompileError::ExpectedScalar {
                            column: String::from(column),
                            operator: arithmetic_keyword(op),
                        });
                    }
                    let value = Fragment::binary(Fragment::raw(column), op, self.bind(operand));
                    Fragment::binary(target, "=", value)
                }
                Some(_) => return Err(CompileError::InvalidKey(String::from(key))),
            };
            assignments.push(assignment);
        }

        let mut stmt = Fragment::raw(format!("UPDATE {} SET ", self.quote_table(table)));
        stmt.append(Fragment::join(assignments, ", "));
        stmt.append(self.where_clause(conditions)?);
        Ok(stmt.into())
    }

    /// Builds `DELETE FROM table [WHERE ...]`.
    ///
    /// # Errors
    ///
    /// Fails on condition errors.
    pub fn delete(&self, table: &str, conditions: &Where) -> Result<Statement> {
        let mut stmt = Fragment::raw(format!("DELETE FROM {}", self.quote_table(table)));
        stmt.append(self.where_clause(conditions)?);
        Ok(stmt.into())
    }

    /// Builds a conditional value replacement:
    /// `UPDATE t SET col = CASE WHEN col = ? THEN ? ... ELSE col END`.
    ///
    /// Rows whose value matches no listed old value keep it.
    ///
    /// # Errors
    ///
    /// Fails on an empty replacement set, invalid columns or condition
    /// errors.
    pub fn replace(
        &self,
        table: &str,
        replacements: &Replacements,
        conditions: &Where,
    ) -> Result<Statement> {
        if replacements.is_empty() {
            return Err(CompileError::EmptyUpdate(String::from(table)));
        }

        let mut assignments = vec![];
        for (column, pairs) in &replacements.columns {
            if pairs.is_empty() {
                continue;
            }
            let column = validate_column(column)?;
            let mut case = Fragment::raw(format!("{column} = CASE"));
            for (old, new) in pairs {
                case.push_str(&format!(" WHEN {column} = "));
                case.append(Fragment::value(old.clone()));
                case.push_str(" THEN ");
                case.append(Fragment::value(new.clone()));
            }
            case.push_str(&format!(" ELSE {column} END"));
            assignments.push(case);
        }

        let mut stmt = Fragment::raw(format!("UPDATE {} SET ", self.quote_table(table)));
        stmt.append(Fragment::join(assignments, ", "));
        stmt.append(self.where_clause(conditions)?);
        Ok(stmt.into())
    }
}

fn arithmetic_keyword(op: &str) -> &'static str {
    match op {
        "+" => "+",
        "-" => "-",
        "*" => "*",
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{list, raw, JoinKind};
    use serde_json::json;

    fn sqlite() -> QueryBuilder {
        QueryBuilder::new(DialectKind::Sqlite)
    }

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(String::from(s))
    }

    #[test]
    fn test_select_all() {
        let stmt = sqlite()
            .select("users", &[], &Columns::All, &Where::new())
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM `users`");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_select_with_prefix_alias_and_clauses() {
        let builder = QueryBuilder::new(DialectKind::PgSql).with_prefix("app_");
        let stmt = builder
            .select(
                "users(u)",
                &[],
                &Columns::from(["@u.city(town)", "u.id"]),
                &Where::new()
                    .field("u.age[>=]", 18)
                    .order_by_desc("u.id")
                    .limit(5),
            )
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT DISTINCT u.city AS town, u.id FROM \"app_users\" AS \"u\" WHERE u.age >= ? ORDER BY u.id DESC LIMIT 5"
        );
        assert_eq!(stmt.params(), &[SqlValue::Int(18)]);
    }

    #[test]
    fn test_select_with_join() {
        let stmt = sqlite()
            .select(
                "post",
                &[Join::left("account").on("author_id", "user_id")],
                &Columns::from(["post.title", "account.name"]),
                &Where::new().field("account.active", true),
            )
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT post.title, account.name FROM `post` LEFT JOIN `account` ON `post`.author_id = `account`.user_id WHERE account.active = ?"
        );
        assert_eq!(stmt.params(), &[SqlValue::Int(1)]);
    }

    #[test]
    fn test_select_join_from_json() {
        let joins = Join::from_json(&json!({"[<>]account": "user_id"})).unwrap();
        assert_eq!(joins[0].kind(), JoinKind::Full);
        let stmt = sqlite()
            .select("post", &joins, &Columns::All, &Where::new())
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM `post` FULL JOIN `account` USING (user_id)"
        );
    }

    #[test]
    fn test_aggregate() {
        let stmt = sqlite()
            .aggregate(
                Aggregate::Count,
                "users",
                &[],
                "*",
                &Where::new().field("age[<]", 30),
            )
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT COUNT(*) AS aggregate FROM `users` WHERE age < ?"
        );
        let stmt = sqlite()
            .aggregate(Aggregate::Max, "users", &[], "age", &Where::new())
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT MAX(age) AS aggregate FROM `users`");
        assert!(sqlite()
            .aggregate(Aggregate::Sum, "users", &[], "age)--", &Where::new())
            .is_err());
    }

    #[test]
    fn test_insert_single_row_with_coercion() {
        let row = Values::new()
            .set("name", "Ann")
            .set("active", true)
            .set("tags", list(["a", "b"]))
            .set("created", raw("CURRENT_TIMESTAMP"));
        let stmt = sqlite().insert("users", &[row]).unwrap();
        assert_eq!(
            stmt.sql(),
            "INSERT INTO `users` (name, active, tags, created) VALUES (?, ?, ?, CURRENT_TIMESTAMP)"
        );
        assert_eq!(
            stmt.params(),
            &[text("Ann"), SqlValue::Int(1), text(r#"["a","b"]"#)]
        );
    }

    #[test]
    fn test_insert_multi_row_follows_first_row_order() {
        let rows = [
            Values::new().set("a", 1).set("b", 2),
            Values::new().set("b", 4).set("a", 3),
        ];
        let stmt = sqlite().insert("t", &rows).unwrap();
        assert_eq!(stmt.sql(), "INSERT INTO `t` (a, b) VALUES (?, ?), (?, ?)");
        assert_eq!(
            stmt.params(),
            &[
                SqlValue::Int(1),
                SqlValue::Int(2),
                SqlValue::Int(3),
                SqlValue::Int(4)
            ]
        );
    }

    #[test]
    fn test_insert_column_set_mismatch() {
        let rows = [
            Values::new().set("a", 1).set("b", 2),
            Values::new().set("a", 3).set("c", 4),
        ];
        assert_eq!(
            sqlite().insert("t", &rows),
            Err(CompileError::ColumnSetMismatch { row: 1 })
        );
    }

    #[test]
    fn test_insert_empty() {
        assert_eq!(
            sqlite().insert("t", &[]),
            Err(CompileError::EmptyInsert(String::from("t")))
        );
        assert_eq!(
            sqlite().insert("t", &[Values::new()]),
            Err(CompileError::EmptyInsert(String::from("t")))
        );
    }

    #[test]
    fn test_insert_rejects_operator_keys() {
        let row = Values::new().set("age[+]", 1);
        assert!(matches!(
            sqlite().insert("t", &[row]),
            Err(CompileError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_update_with_arithmetic() {
        let data = Values::new()
            .set("age[+]", 1)
            .set("score[*]", 2)
            .set("name", "Bob");
        let stmt = sqlite()
            .update("users", &data, &Where::new().field("id", 7))
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "UPDATE `users` SET age = age + ?, score = score * ?, name = ? WHERE id = ?"
        );
        assert_eq!(
            stmt.params(),
            &[
                SqlValue::Int(1),
                SqlValue::Int(2),
                text("Bob"),
                SqlValue::Int(7)
            ]
        );
    }

    #[test]
    fn test_update_rejects_comparison_keys() {
        let data = Values::new().set("age[>]", 1);
        assert!(matches!(
            sqlite().update("users", &data, &Where::new()),
            Err(CompileError::InvalidKey(_))
        ));
        assert!(matches!(
            sqlite().update("users", &Values::new(), &Where::new()),
            Err(CompileError::EmptyUpdate(_))
        ));
    }

    #[test]
    fn test_delete() {
        let stmt = QueryBuilder::new(DialectKind::MsSql)
            .delete("logs", &Where::new().field("level[IN]", ["debug", "trace"]))
            .unwrap();
        assert_eq!(stmt.sql(), "DELETE FROM \"logs\" WHERE level IN (?, ?)");
        assert_eq!(stmt.params(), &[text("debug"), text("trace")]);
    }

    #[test]
    fn test_replace_uses_case() {
        let replacements = Replacements::new()
            .replace("status", "draft", "review")
            .replace("status", "old", "archived");
        let stmt = sqlite()
            .replace("posts", &replacements, &Where::new().field("author", 3))
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "UPDATE `posts` SET status = CASE WHEN status = ? THEN ? WHEN status = ? THEN ? ELSE status END WHERE author = ?"
        );
        assert_eq!(stmt.params().len(), 5);
    }

    #[test]
    fn test_replacements_from_json_pairs_keep_types() {
        let replacements = Replacements::from_json(&json!({
            "level": [[1, 2], [3, 4]],
            "status": {"draft": "review"}
        }))
        .unwrap();
        let stmt = sqlite()
            .replace("posts", &replacements, &Where::new())
            .unwrap();
        assert_eq!(
            stmt.params(),
            &[
                SqlValue::Int(1),
                SqlValue::Int(2),
                SqlValue::Int(3),
                SqlValue::Int(4),
                text("draft"),
                text("review")
            ]
        );
        assert!(Replacements::from_json(&json!({"level": [[1, 2, 3]]})).is_err());
        assert!(Replacements::from_json(&json!({"level": 1})).is_err());
    }

    #[test]
    fn test_values_from_json() {
        let values = Values::from_json(&json!({"name": "x", "meta": {"k": 1}, "ids": [1, 2]})).unwrap();
        let stmt = sqlite().insert("t", &[values]).unwrap();
        assert_eq!(
            stmt.params(),
            &[text("x"), text(r#"{"k":1}"#), text("[1,2]")]
        );
    }

    #[test]
    fn test_inline_sql() {
        let stmt = Statement::new(
            "SELECT * FROM t WHERE a = ? AND b = '?' AND c = ?",
            vec![text("it's"), SqlValue::Null],
        );
        assert_eq!(
            stmt.to_inline_sql(),
            "SELECT * FROM t WHERE a = 'it''s' AND b = '?' AND c = NULL"
        );
    }

    #[test]
    fn test_raw_table_tokens_receive_prefix() {
        let builder = QueryBuilder::new(DialectKind::MySql).with_prefix("p_");
        assert_eq!(
            builder.render_raw(&raw("SELECT <id> FROM <users> WHERE <users.age> > 1")),
            "SELECT `id` FROM `p_users` WHERE `p_users`.`age` > 1"
        );
    }
}
