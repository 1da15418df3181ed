//! The migration contract and SQL-file migrations.

use async_trait::async_trait;
use sqlweave::Database;
use tracing::debug;

use crate::error::{MigrateError, Result};

/// A named, reversible schema change.
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use sqlweave::Database;
/// use sqlweave_migrate::{Migration, Result};
///
/// struct CreateUsers;
///
/// #[async_trait]
/// impl Migration for CreateUsers {
///     fn name(&self) -> &str {
///         "2024_01_01_000000_create_users"
///     }
///
///     async fn up(&self, db: &mut Database) -> Result<()> {
///         db.create_table("users", |table| {
///             table.id();
///             table.string("email", 255).unique();
///             table.timestamps();
///         })
///         .await?;
///         Ok(())
///     }
///
///     async fn down(&self, db: &mut Database) -> Result<()> {
///         db.drop_table("users").await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Migration: Send + Sync {
    /// Logical name, recorded in the history. Migrations run in name order.
    fn name(&self) -> &str;

    /// Applies the change.
    async fn up(&self, db: &mut Database) -> Result<()>;

    /// Reverts the change. Irreversible migrations keep the default.
    async fn down(&self, _db: &mut Database) -> Result<()> {
        Err(MigrateError::NotReversible(String::from(self.name())))
    }
}

/// A migration read from `<name>.up.sql` and an optional `<name>.down.sql`.
///
/// `<identifier>` tokens are quoted for the dialect; table positions get
/// the table prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlMigration {
    name: String,
    up: String,
    down: Option<String>,
}

impl SqlMigration {
    /// Creates a SQL migration.
    #[must_use]
    pub fn new(name: impl Into<String>, up: impl Into<String>, down: Option<String>) -> Self {
        Self {
            name: name.into(),
            up: up.into(),
            down,
        }
    }

    /// Returns the up script.
    #[must_use]
    pub fn up_sql(&self) -> &str {
        &self.up
    }

    /// Returns the down script, if any.
    #[must_use]
    pub fn down_sql(&self) -> Option<&str> {
        self.down.as_deref()
    }
}

async fn run_script(db: &mut Database, name: &str, script: &str) -> Result<()> {
    for statement in split_statements(script) {
        debug!(migration = name, statement, "Running migration statement");
        db.execute(statement, &[]).await?;
    }
    Ok(())
}

#[async_trait]
impl Migration for SqlMigration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn up(&self, db: &mut Database) -> Result<()> {
        run_script(db, &self.name, &self.up).await
    }

    async fn down(&self, db: &mut Database) -> Result<()> {
        match &self.down {
            Some(script) => run_script(db, &self.name, script).await,
            None => Err(MigrateError::NotReversible(self.name.clone())),
        }
    }
}

/// Splits a script on `;` outside quotes and `--` comments.
///
/// Blank statements are dropped.
#[must_use]
pub fn split_statements(script: &str) -> Vec<&str> {
    let mut statements = vec![];
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut chars = script.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if in_comment {
            in_comment = ch != '\n';
            continue;
        }
        match (quote, ch) {
            (Some(open), _) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, '-') if chars.peek().is_some_and(|(_, next)| *next == '-') => {
                in_comment = true;
            }
            (None, ';') => {
                statements.push(&script[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    statements.push(&script[start..]);

    statements
        .into_iter()
        .map(str::trim)
        .filter(|statement| !is_blank(statement))
        .collect()
}

fn is_blank(statement: &str) -> bool {
    statement
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_statements() {
        let script = "CREATE TABLE a (x TEXT);\n\nINSERT INTO a VALUES ('x;y');\n";
        assert_eq!(
            split_statements(script),
            vec!["CREATE TABLE a (x TEXT)", "INSERT INTO a VALUES ('x;y')"]
        );
    }

    #[test]
    fn test_split_ignores_comments() {
        let script = "-- drop it; all of it\nDROP TABLE a;\n-- trailing note\n";
        assert_eq!(
            split_statements(script),
            vec!["-- drop it; all of it\nDROP TABLE a"]
        );
    }

    #[test]
    fn test_split_keeps_quoted_identifiers() {
        let script = "SELECT \"a;b\" FROM t; SELECT 1";
        assert_eq!(
            split_statements(script),
            vec!["SELECT \"a;b\" FROM t", "SELECT 1"]
        );
    }

    #[test]
    fn test_empty_script() {
        assert!(split_statements("  \n-- nothing\n").is_empty());
    }
}
