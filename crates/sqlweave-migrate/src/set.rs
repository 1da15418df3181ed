//! The migration registry.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::migration::{Migration, SqlMigration};

const UP_SUFFIX: &str = ".up.sql";
const DOWN_SUFFIX: &str = ".down.sql";

/// Registered migrations, ordered by name.
#[derive(Default)]
pub struct MigrationSet {
    migrations: BTreeMap<String, Box<dyn Migration>>,
}

impl MigrationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a migration.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::DuplicateMigration`] when the name is taken.
    pub fn register(&mut self, migration: impl Migration + 'static) -> Result<()> {
        let name = String::from(migration.name());
        if self.migrations.contains_key(&name) {
            return Err(MigrateError::DuplicateMigration(name));
        }
        self.migrations.insert(name, Box::new(migration));
        Ok(())
    }

    /// Registers a migration, builder style.
    ///
    /// # Errors
    ///
    /// See [`MigrationSet::register`].
    pub fn with(mut self, migration: impl Migration + 'static) -> Result<Self> {
        self.register(migration)?;
        Ok(self)
    }

    /// Discovers `<name>.up.sql` / `<name>.down.sql` pairs in `dir`.
    ///
    /// Other extensions are ignored. A missing down file makes the
    /// migration irreversible.
    ///
    /// # Errors
    ///
    /// Fails when `dir` is missing or unreadable, or holds a `.sql` file
    /// that does not follow the naming scheme.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(MigrateError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut ups = BTreeMap::new();
        let mut downs = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !file_name.ends_with(".sql") {
                continue;
            }
            if let Some(name) = file_name.strip_suffix(UP_SUFFIX).filter(|n| !n.is_empty()) {
                ups.insert(String::from(name), path.clone());
            } else if let Some(name) = file_name.strip_suffix(DOWN_SUFFIX).filter(|n| !n.is_empty()) {
                downs.insert(String::from(name), path.clone());
            } else {
                return Err(MigrateError::InvalidFileName(path));
            }
        }

        if let Some((_, path)) = downs.iter().find(|(name, _)| !ups.contains_key(*name)) {
            return Err(MigrateError::InvalidFileName(path.clone()));
        }

        let mut set = Self::new();
        for (name, up_path) in ups {
            let up = fs::read_to_string(&up_path)?;
            let down = downs.get(&name).map(fs::read_to_string).transpose()?;
            debug!(migration = %name, reversible = down.is_some(), "Discovered migration");
            set.register(SqlMigration::new(name, up, down))?;
        }
        Ok(set)
    }

    /// Returns the migration named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Migration> {
        self.migrations.get(name).map(AsRef::as_ref)
    }

    /// Iterates migrations in name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.values().map(AsRef::as_ref)
    }

    /// Returns the names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.migrations.keys().map(String::as_str).collect()
    }

    /// Returns the number of migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

/// Writes empty `<timestamp>_<name>.up.sql` and `.down.sql` files in `dir`,
/// creating it if needed, and returns their paths.
///
/// # Errors
///
/// Fails on an empty or non `[a-z0-9_]` name, an existing file or an IO
/// error.
pub fn create_migration_files(
    dir: &Path,
    name: &str,
    now: NaiveDateTime,
) -> Result<(PathBuf, PathBuf)> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid {
        return Err(MigrateError::InvalidFileName(PathBuf::from(name)));
    }

    let stem = format!("{}_{name}", now.format("%Y_%m_%d_%H%M%S"));
    let up = dir.join(format!("{stem}{UP_SUFFIX}"));
    let down = dir.join(format!("{stem}{DOWN_SUFFIX}"));
    for path in [&up, &down] {
        if path.exists() {
            return Err(MigrateError::MigrationExists(path.clone()));
        }
    }

    fs::create_dir_all(dir)?;
    fs::write(&up, format!("-- {stem}: apply\n"))?;
    fs::write(&down, format!("-- {stem}: revert\n"))?;
    Ok((up, down))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use sqlweave::Database;

    struct Named(&'static str);

    #[async_trait]
    impl Migration for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn up(&self, _db: &mut Database) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_orders_by_name() {
        let set = MigrationSet::new()
            .with(Named("0002_posts"))
            .unwrap()
            .with(Named("0001_users"))
            .unwrap();
        assert_eq!(set.names(), vec!["0001_users", "0002_posts"]);
        assert_eq!(set.len(), 2);
        assert!(set.get("0002_posts").is_some());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = MigrationSet::new()
            .with(Named("0001_users"))
            .unwrap()
            .with(Named("0001_users"))
            .err()
            .unwrap();
        assert!(matches!(err, MigrateError::DuplicateMigration(name) if name == "0001_users"));
    }

    #[test]
    fn test_from_dir_pairs_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0002_b.up.sql"), "CREATE TABLE b (x INT);").unwrap();
        fs::write(dir.path().join("0001_a.up.sql"), "CREATE TABLE a (x INT);").unwrap();
        fs::write(dir.path().join("0001_a.down.sql"), "DROP TABLE a;").unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let set = MigrationSet::from_dir(dir.path()).unwrap();
        assert_eq!(set.names(), vec!["0001_a", "0002_b"]);
    }

    #[test]
    fn test_from_dir_rejects_stray_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0001_a.sql"), "SELECT 1").unwrap();
        let err = MigrationSet::from_dir(dir.path()).err().unwrap();
        assert!(matches!(err, MigrateError::InvalidFileName(_)));

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0001_a.down.sql"), "DROP TABLE a").unwrap();
        let err = MigrationSet::from_dir(dir.path()).err().unwrap();
        assert!(matches!(err, MigrateError::InvalidFileName(_)));
    }

    #[test]
    fn test_from_dir_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = MigrationSet::from_dir(&missing).err().unwrap();
        assert!(matches!(err, MigrateError::DirectoryNotFound(path) if path == missing));
    }

    #[test]
    fn test_create_migration_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("migrations");
        let now = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 9)
            .unwrap();

        let (up, down) = create_migration_files(&target, "create_users", now).unwrap();
        assert_eq!(
            up.file_name().unwrap(),
            "2024_03_05_140709_create_users.up.sql"
        );
        assert!(down.exists());

        let set = MigrationSet::from_dir(&target).unwrap();
        assert_eq!(set.names(), vec!["2024_03_05_140709_create_users"]);

        let err = create_migration_files(&target, "create_users", now).unwrap_err();
        assert!(matches!(err, MigrateError::MigrationExists(_)));
        let err = create_migration_files(&target, "Bad Name", now).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidFileName(_)));
    }
}
