//! Raw SQL expressions.
//!
//! A [`Raw`] value is emitted verbatim and never bound as a parameter. Only
//! use it for trusted text. Inside the text, `<name>` and `<table.column>`
//! tokens are replaced with dialect-quoted identifiers.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static IDENTIFIER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\b(?:FROM|TABLE|INTO|UPDATE|JOIN)\s+)?<([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)>",
    )
    .expect("Invalid raw identifier regex")
});

/// Trusted SQL text inserted without parameter binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw {
    sql: String,
}

/// Creates a raw SQL expression.
///
/// # Example
///
/// ```rust
/// use sqlweave_core::builder::raw;
///
/// let now = raw("NOW()");
/// assert_eq!(now.sql(), "NOW()");
/// ```
#[must_use]
pub fn raw(sql: impl Into<String>) -> Raw {
    Raw { sql: sql.into() }
}

impl Raw {
    /// Returns the unexpanded SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Expands `<identifier>` tokens with `quote`, applied to each dotted
    /// part separately.
    #[must_use]
    pub fn render(&self, quote: impl Fn(&str) -> String) -> String {
        expand_identifiers(&self.sql, |part, _| quote(part))
    }
}

/// Replaces `<a>` / `<a.b>` tokens in `sql`.
///
/// `quote` receives each dotted part and whether that part names a table:
/// the leading part of a qualified name, or a token directly following
/// `FROM`, `TABLE`, `INTO`, `UPDATE` or `JOIN`.
#[must_use]
pub fn expand_identifiers(sql: &str, quote: impl Fn(&str, bool) -> String) -> String {
    IDENTIFIER_TOKEN
        .replace_all(sql, |caps: &Captures<'_>| {
            let keyword = caps.get(1).map_or("", |m| m.as_str());
            let name = &caps[2];
            let quoted = match name.split_once('.') {
                Some((table, column)) => format!("{}.{}", quote(table, true), quote(column, false)),
                None => quote(name, !keyword.is_empty()),
            };
            format!("{keyword}{quoted}")
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_without_tokens() {
        assert_eq!(raw("COUNT(*)").render(|s| format!("\"{s}\"")), "COUNT(*)");
    }

    #[test]
    fn test_raw_quotes_tokens() {
        let expr = raw("LOWER(<name>) = <users.email>");
        assert_eq!(
            expr.render(|s| format!("`{s}`")),
            "LOWER(`name`) = `users`.`email`"
        );
    }

    #[test]
    fn test_comparison_is_not_a_token() {
        assert_eq!(raw("a < b AND c > d").render(|s| format!("[{s}]")), "a < b AND c > d");
    }

    #[test]
    fn test_table_part_flag() {
        let sql = expand_identifiers("SELECT <id>, <posts.id> FROM <users>", |s, table| {
            if table {
                format!("T:{s}")
            } else {
                s.to_string()
            }
        });
        assert_eq!(sql, "SELECT id, T:posts.id FROM T:users");
    }
}
