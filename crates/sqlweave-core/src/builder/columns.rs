//! Select-list resolution.
//!
//! A [`Columns`] spec is the wildcard, a verbatim expression, a list of
//! column references, or an ordered alias map. References accept two inline
//! markers: `@column` selects `DISTINCT column` and `column(alias)` selects
//! `column AS alias`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as Json;

use super::raw::{raw, Raw};
use super::statement::QueryBuilder;
use crate::error::{CompileError, Result};

static COLUMN_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(@?)\s*([A-Za-z_][A-Za-z0-9_$]*(?:\.[A-Za-z_][A-Za-z0-9_$]*)?)\s*(?:\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\))?\s*$",
    )
    .expect("Invalid column reference regex")
});

/// Source of one aliased entry in a column map.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    /// A column reference (markers allowed).
    Column(String),
    /// A raw expression.
    Raw(Raw),
    /// A nested alias map, flattened into the select list.
    Nested(Vec<(String, ColumnSource)>),
}

/// Column spec of a SELECT.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Columns {
    /// `*`
    #[default]
    All,
    /// A select list passed through verbatim.
    Expr(String),
    /// Column references.
    List(Vec<String>),
    /// Ordered alias → source entries.
    Map(Vec<(String, ColumnSource)>),
}

/// One resolved select-list item.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// Verbatim text.
    Token(String),
    /// A column reference with optional `DISTINCT` and alias.
    Column {
        /// Column, optionally table-qualified.
        name: String,
        /// Output alias.
        alias: Option<String>,
        /// Whether the `@` marker was present.
        distinct: bool,
    },
    /// A raw expression under an alias.
    Raw {
        /// Expression.
        raw: Raw,
        /// Output alias.
        alias: String,
    },
}

impl SelectItem {
    /// Parses a column reference, falling back to a verbatim token.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match COLUMN_REFERENCE.captures(token) {
            Some(caps) => Self::Column {
                name: String::from(&caps[2]),
                alias: caps.get(3).map(|m| String::from(m.as_str())),
                distinct: !caps[1].is_empty(),
            },
            None => Self::Token(String::from(token.trim())),
        }
    }

    /// Resolver form: markers expanded except inline aliases, which stay
    /// as `column(alias)`.
    #[must_use]
    pub fn token(&self) -> String {
        match self {
            Self::Token(token) => token.clone(),
            Self::Column {
                name,
                alias,
                distinct,
            } => {
                let mut out = String::new();
                if *distinct {
                    out.push_str("DISTINCT ");
                }
                out.push_str(name);
                if let Some(alias) = alias {
                    out.push_str(&format!("({alias})"));
                }
                out
            }
            Self::Raw { raw, alias } => format!("{}({alias})", raw.sql()),
        }
    }

    /// Statement form, with `AS` aliases and raw identifiers expanded.
    #[must_use]
    pub fn render(&self, builder: &QueryBuilder) -> String {
        match self {
            Self::Token(token) => token.clone(),
            Self::Column {
                name,
                alias,
                distinct,
            } => {
                let mut out = String::new();
                if *distinct {
                    out.push_str("DISTINCT ");
                }
                out.push_str(name);
                if let Some(alias) = alias {
                    out.push_str(" AS ");
                    out.push_str(alias);
                }
                out
            }
            Self::Raw { raw, alias } => format!("{} AS {alias}", builder.render_raw(raw)),
        }
    }

    fn with_alias(self, alias: &str) -> Self {
        match self {
            Self::Column { name, distinct, .. } => Self::Column {
                name,
                alias: Some(String::from(alias)),
                distinct,
            },
            Self::Token(token) if token != "*" => Self::Raw {
                raw: raw(token),
                alias: String::from(alias),
            },
            other => other,
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, Self::Token(token) if token == "*")
    }
}

impl Columns {
    /// Creates a list spec.
    #[must_use]
    pub fn list<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(columns.into_iter().map(Into::into).collect())
    }

    /// Creates an empty alias map.
    #[must_use]
    pub fn map() -> Self {
        Self::Map(vec![])
    }

    fn push(&mut self, alias: &str, source: ColumnSource) {
        let entry = (String::from(alias), source);
        match self {
            Self::Map(entries) => entries.push(entry),
            other => *other = Self::Map(vec![entry]),
        }
    }

    /// Adds `source AS alias` to an alias map.
    #[must_use]
    pub fn column(mut self, alias: &str, source: &str) -> Self {
        self.push(alias, ColumnSource::Column(String::from(source)));
        self
    }

    /// Adds `raw AS alias` to an alias map.
    #[must_use]
    pub fn raw(mut self, alias: &str, raw: Raw) -> Self {
        self.push(alias, ColumnSource::Raw(raw));
        self
    }

    /// Adds a nested alias map. Its entries are flattened into the select
    /// list; `key` only groups them.
    #[must_use]
    pub fn nested(mut self, key: &str, nested: Self) -> Self {
        let children = match nested {
            Self::Map(entries) => entries,
            Self::List(columns) => columns
                .into_iter()
                .map(|c| (c.clone(), ColumnSource::Column(c)))
                .collect(),
            Self::All | Self::Expr(_) => vec![],
        };
        self.push(key, ColumnSource::Nested(children));
        self
    }

    /// Parses a spec from JSON: `"*"`, a string, an array of strings, or an
    /// object of alias → column / nested object.
    ///
    /// # Errors
    ///
    /// Fails on any other shape.
    pub fn from_json(value: &Json) -> Result<Self> {
        match value {
            Json::String(s) if s.trim() == "*" => Ok(Self::All),
            Json::String(s) => Ok(Self::Expr(s.clone())),
            Json::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(String::from).ok_or_else(|| {
                        CompileError::InvalidInput(String::from("column list entries must be strings"))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            Json::Object(map) => Ok(Self::Map(map_from_json(map)?)),
            _ => Err(CompileError::InvalidInput(String::from(
                "columns must be \"*\", a string, a list or an object",
            ))),
        }
    }

    /// Resolves the spec into select-list items, in order.
    #[must_use]
    pub fn items(&self) -> Vec<SelectItem> {
        let items = match self {
            Self::All => return vec![SelectItem::Token(String::from("*"))],
            Self::Expr(expr) => return vec![SelectItem::Token(expr.clone())],
            Self::List(columns) => columns.iter().map(|c| SelectItem::parse(c)).collect(),
            Self::Map(entries) => {
                let mut items = vec![];
                flatten(entries, &mut items);
                items
            }
        };
        if items.is_empty() || items.iter().any(SelectItem::is_wildcard) {
            vec![SelectItem::Token(String::from("*"))]
        } else {
            items
        }
    }

    /// Resolves the spec into a select-list string.
    #[must_use]
    pub fn resolve(&self) -> String {
        self.items()
            .iter()
            .map(SelectItem::token)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn flatten(entries: &[(String, ColumnSource)], out: &mut Vec<SelectItem>) {
    for (alias, source) in entries {
        match source {
            ColumnSource::Column(column) => {
                let item = SelectItem::parse(column);
                out.push(if column.trim() == alias.as_str() {
                    item
                } else {
                    item.with_alias(alias)
                });
            }
            ColumnSource::Raw(raw) => out.push(SelectItem::Raw {
                raw: raw.clone(),
                alias: alias.clone(),
            }),
            ColumnSource::Nested(children) => flatten(children, out),
        }
    }
}

fn map_from_json(map: &serde_json::Map<String, Json>) -> Result<Vec<(String, ColumnSource)>> {
    map.iter()
        .map(|(alias, source)| {
            let source = match source {
                Json::String(column) => ColumnSource::Column(column.clone()),
                Json::Object(nested) => ColumnSource::Nested(map_from_json(nested)?),
                Json::Array(columns) => ColumnSource::Nested(
                    columns
                        .iter()
                        .map(|column| {
                            column
                                .as_str()
                                .map(|c| (String::from(c), ColumnSource::Column(String::from(c))))
                                .ok_or_else(|| {
                                    CompileError::InvalidInput(format!(
                                        "column list for '{alias}' must contain only strings"
                                    ))
                                })
                        })
                        .collect::<Result<_>>()?,
                ),
                _ => {
                    return Err(CompileError::InvalidInput(format!(
                        "column source for '{alias}' must be a string, a list or an object"
                    )))
                }
            };
            Ok((alias.clone(), source))
        })
        .collect()
}

impl From<&str> for Columns {
    fn from(spec: &str) -> Self {
        if spec.trim() == "*" {
            Self::All
        } else {
            Self::Expr(String::from(spec))
        }
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(columns: [&str; N]) -> Self {
        Self::list(columns)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(columns: Vec<&str>) -> Self {
        Self::list(columns)
    }
}

impl From<Vec<String>> for Columns {
    fn from(columns: Vec<String>) -> Self {
        Self::List(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use serde_json::json;

    #[test]
    fn test_wildcard() {
        assert_eq!(Columns::All.resolve(), "*");
        assert_eq!(Columns::from("*").resolve(), "*");
        assert_eq!(Columns::from(["id", "*"]).resolve(), "*");
    }

    #[test]
    fn test_verbatim_expression() {
        assert_eq!(
            Columns::from("id, COUNT(*) AS n").resolve(),
            "id, COUNT(*) AS n"
        );
    }

    #[test]
    fn test_distinct_marker() {
        assert_eq!(
            Columns::from(["@city", "name"]).resolve(),
            "DISTINCT city, name"
        );
    }

    #[test]
    fn test_inline_alias_left_for_statement() {
        let columns = Columns::from(["users.id(uid)", "email"]);
        assert_eq!(columns.resolve(), "users.id(uid), email");
        let builder = QueryBuilder::new(DialectKind::MySql);
        let rendered: Vec<String> = columns.items().iter().map(|i| i.render(&builder)).collect();
        assert_eq!(rendered, vec!["users.id AS uid", "email"]);
    }

    #[test]
    fn test_alias_map_with_nested_and_raw() {
        let columns = Columns::map()
            .column("user_id", "id")
            .nested("profile", Columns::map().column("nick", "nickname").column("city", "city"))
            .raw("total", raw("SUM(<amount>)"));
        let builder = QueryBuilder::new(DialectKind::PgSql);
        let rendered: Vec<String> = columns.items().iter().map(|i| i.render(&builder)).collect();
        assert_eq!(
            rendered,
            vec![
                "id AS user_id",
                "nickname AS nick",
                "city",
                "SUM(\"amount\") AS total"
            ]
        );
    }

    #[test]
    fn test_alias_on_expression_is_kept() {
        let columns = Columns::map()
            .column("total", "COUNT(*)")
            .column("u", "user.name");
        assert_eq!(columns.resolve(), "COUNT(*)(total), user.name(u)");
        let builder = QueryBuilder::new(DialectKind::Sqlite);
        let rendered: Vec<String> = columns.items().iter().map(|i| i.render(&builder)).collect();
        assert_eq!(rendered, vec!["COUNT(*) AS total", "user.name AS u"]);
    }

    #[test]
    fn test_from_json_rejects_non_string_list_entries() {
        let err = Columns::from_json(&json!({"meta": ["name", 3]})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidInput(_)));
        let columns = Columns::from_json(&json!({"meta": ["name", "city"]})).unwrap();
        assert_eq!(columns.resolve(), "name, city");
    }

    #[test]
    fn test_from_json() {
        let columns = Columns::from_json(&json!({"uid": "id", "meta": {"n": "name"}})).unwrap();
        assert_eq!(columns.resolve(), "id(uid), name(n)");
        assert_eq!(Columns::from_json(&json!("*")).unwrap(), Columns::All);
        assert!(Columns::from_json(&json!(3)).is_err());
    }
}
