//! JOIN clauses.
//!
//! Join keys use a tag prefix for the join kind: `[>]` LEFT, `[<]` RIGHT,
//! `[<>]` FULL and `[><]` (or no tag) INNER. The table may carry an alias,
//! `"[>]accounts(a)"`. Every join needs a constraint.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as Json;

use super::expr::validate_column;
use super::raw::Raw;
use super::statement::{QueryBuilder, TableRef};
use crate::error::{CompileError, Result};

static JOIN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\[(>|<|<>|><)\])?\s*([A-Za-z_][A-Za-z0-9_$]*)\s*(?:\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\))?\s*$")
        .expect("Invalid join key regex")
});

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// `INNER JOIN`
    #[default]
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `FULL JOIN`
    Full,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
        }
    }

    fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(">") => Self::Left,
            Some("<") => Self::Right,
            Some("<>") => Self::Full,
            _ => Self::Inner,
        }
    }
}

/// Join constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// `USING (a, b)`
    Using(Vec<String>),
    /// `ON main.left = joined.right` pairs, joined with `AND`.
    ///
    /// A left column that is already table-qualified is kept as given.
    Columns(Vec<(String, String)>),
    /// `ON <raw>`
    Raw(Raw),
}

/// One JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    kind: JoinKind,
    table: String,
    alias: Option<String>,
    constraint: Option<JoinOn>,
}

impl Join {
    /// Creates a join of the given kind without a constraint yet.
    #[must_use]
    pub fn new(kind: JoinKind, table: &str) -> Self {
        Self {
            kind,
            table: String::from(table),
            alias: None,
            constraint: None,
        }
    }

    /// `INNER JOIN table`
    #[must_use]
    pub fn inner(table: &str) -> Self {
        Self::new(JoinKind::Inner, table)
    }

    /// `LEFT JOIN table`
    #[must_use]
    pub fn left(table: &str) -> Self {
        Self::new(JoinKind::Left, table)
    }

    /// `RIGHT JOIN table`
    #[must_use]
    pub fn right(table: &str) -> Self {
        Self::new(JoinKind::Right, table)
    }

    /// `FULL JOIN table`
    #[must_use]
    pub fn full(table: &str) -> Self {
        Self::new(JoinKind::Full, table)
    }

    /// Parses a tagged join key such as `"[>]posts(p)"`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidJoin`] for a malformed key.
    pub fn parse(key: &str, constraint: JoinOn) -> Result<Self> {
        let caps = JOIN_KEY
            .captures(key)
            .ok_or_else(|| CompileError::InvalidJoin(String::from(key)))?;
        Ok(Self {
            kind: JoinKind::from_tag(caps.get(1).map(|m| m.as_str())),
            table: String::from(&caps[2]),
            alias: caps.get(3).map(|m| String::from(m.as_str())),
            constraint: Some(constraint),
        })
    }

    /// Sets the table alias.
    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(String::from(alias));
        self
    }

    /// Adds an `ON main.left = joined.right` pair.
    #[must_use]
    pub fn on(mut self, left: &str, right: &str) -> Self {
        let pair = (String::from(left), String::from(right));
        match &mut self.constraint {
            Some(JoinOn::Columns(pairs)) => pairs.push(pair),
            constraint => *constraint = Some(JoinOn::Columns(vec![pair])),
        }
        self
    }

    /// Joins with `USING (columns)`.
    #[must_use]
    pub fn using<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraint = Some(JoinOn::Using(columns.into_iter().map(Into::into).collect()));
        self
    }

    /// Joins with a raw `ON` expression.
    #[must_use]
    pub fn on_raw(mut self, expr: Raw) -> Self {
        self.constraint = Some(JoinOn::Raw(expr));
        self
    }

    /// Returns the join kind.
    #[must_use]
    pub const fn kind(&self) -> JoinKind {
        self.kind
    }

    /// Returns the unprefixed joined table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Parses a join spec object: tagged table key → constraint.
    ///
    /// Constraint values: a column name or list of names (`USING`), an
    /// object of `main_column: joined_column` pairs (`ON`).
    ///
    /// # Errors
    ///
    /// Fails on malformed keys or constraint shapes.
    pub fn from_json(value: &Json) -> Result<Vec<Self>> {
        let map = value
            .as_object()
            .ok_or_else(|| CompileError::InvalidInput(String::from("join spec must be an object")))?;
        map.iter()
            .map(|(key, constraint)| {
                let on = match constraint {
                    Json::String(column) => JoinOn::Using(vec![column.clone()]),
                    Json::Array(columns) => JoinOn::Using(
                        columns
                            .iter()
                            .map(|c| {
                                c.as_str().map(String::from).ok_or_else(|| {
                                    CompileError::InvalidJoin(String::from(key))
                                })
                            })
                            .collect::<Result<_>>()?,
                    ),
                    Json::Object(pairs) => JoinOn::Columns(
                        pairs
                            .iter()
                            .map(|(left, right)| {
                                right
                                    .as_str()
                                    .map(|right| (left.clone(), String::from(right)))
                                    .ok_or_else(|| CompileError::InvalidJoin(String::from(key)))
                            })
                            .collect::<Result<_>>()?,
                    ),
                    _ => return Err(CompileError::JoinWithoutConstraint(String::from(key))),
                };
                Self::parse(key, on)
            })
            .collect()
    }

    /// Renders ` KIND JOIN table [AS alias] ON ...` against the main table.
    ///
    /// # Errors
    ///
    /// Fails when the join has no usable constraint or names an invalid
    /// column.
    pub fn render(&self, main: &TableRef, builder: &QueryBuilder) -> Result<String> {
        let joined = builder.table_ref(&self.table, self.alias.as_deref());
        let missing = || CompileError::JoinWithoutConstraint(self.table.clone());
        let constraint = match self.constraint.as_ref().ok_or_else(missing)? {
            JoinOn::Using(columns) if columns.is_empty() => return Err(missing()),
            JoinOn::Columns(pairs) if pairs.is_empty() => return Err(missing()),
            JoinOn::Using(columns) => {
                let columns = columns
                    .iter()
                    .map(|c| validate_column(c))
                    .collect::<Result<Vec<_>>>()?;
                format!("USING ({})", columns.join(", "))
            }
            JoinOn::Columns(pairs) => {
                let mut parts = Vec::with_capacity(pairs.len());
                for (left, right) in pairs {
                    let left = validate_column(left)?;
                    let right = validate_column(right)?;
                    let left = if left.contains('.') {
                        builder.qualified_column(left)
                    } else {
                        format!("{}.{left}", main.reference())
                    };
                    parts.push(format!("{left} = {}.{right}", joined.reference()));
                }
                format!("ON {}", parts.join(" AND "))
            }
            JoinOn::Raw(raw) => format!("ON {}", builder.render_raw(raw)),
        };
        Ok(format!(
            " {} {} {constraint}",
            self.kind.keyword(),
            joined.render()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::raw;
    use crate::dialect::DialectKind;
    use serde_json::json;

    fn render(join: &Join) -> Result<String> {
        let builder = QueryBuilder::new(DialectKind::PgSql).with_prefix("app_");
        let main = builder.table_ref("post", None);
        join.render(&main, &builder)
    }

    #[test]
    fn test_join_tags() {
        let cases = [
            ("[>]account", JoinKind::Left),
            ("[<]account", JoinKind::Right),
            ("[<>]account", JoinKind::Full),
            ("[><]account", JoinKind::Inner),
            ("account", JoinKind::Inner),
        ];
        for (key, kind) in cases {
            let join = Join::parse(key, JoinOn::Using(vec![String::from("id")])).unwrap();
            assert_eq!(join.kind(), kind, "{key}");
            assert_eq!(join.table(), "account");
        }
    }

    #[test]
    fn test_invalid_join_key() {
        assert!(Join::parse("[>>]account", JoinOn::Using(vec![])).is_err());
    }

    #[test]
    fn test_using() {
        let join = Join::left("account").using(["user_id"]);
        assert_eq!(
            render(&join).unwrap(),
            " LEFT JOIN \"app_account\" USING (user_id)"
        );
    }

    #[test]
    fn test_on_pairs_with_alias() {
        let join = Join::inner("account")
            .alias("a")
            .on("author_id", "user_id")
            .on("app_ref.kind", "kind");
        assert_eq!(
            render(&join).unwrap(),
            " INNER JOIN \"app_account\" AS \"a\" ON \"app_post\".author_id = \"a\".user_id AND \"app_app_ref\".kind = \"a\".kind"
        );
    }

    #[test]
    fn test_raw_on() {
        let join = Join::right("account").on_raw(raw("<account.id> = <post.author_id>"));
        assert_eq!(
            render(&join).unwrap(),
            " RIGHT JOIN \"app_account\" ON \"app_account\".\"id\" = \"app_post\".\"author_id\""
        );
    }

    #[test]
    fn test_join_without_constraint() {
        let err = render(&Join::full("account")).unwrap_err();
        assert_eq!(err, CompileError::JoinWithoutConstraint(String::from("account")));
        let err = render(&Join::left("account").using(Vec::<String>::new())).unwrap_err();
        assert_eq!(err, CompileError::JoinWithoutConstraint(String::from("account")));
    }

    #[test]
    fn test_from_json_keeps_order() {
        let joins = Join::from_json(&json!({
            "[>]account": {"author_id": "user_id"},
            "[<]album(al)": ["album_id"]
        }))
        .unwrap();
        assert_eq!(joins.len(), 2);
        assert_eq!(joins[0].kind(), JoinKind::Left);
        assert_eq!(joins[1].kind(), JoinKind::Right);
        assert_eq!(
            render(&joins[1]).unwrap(),
            " RIGHT JOIN \"app_album\" AS \"al\" USING (album_id)"
        );
    }

    #[test]
    fn test_from_json_rejects_missing_constraint() {
        let err = Join::from_json(&json!({"[>]account": null})).unwrap_err();
        assert_eq!(err, CompileError::JoinWithoutConstraint(String::from("[>]account")));
    }
}
