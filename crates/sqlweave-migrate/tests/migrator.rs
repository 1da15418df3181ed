//! End-to-end migration runs against an in-memory SQLite database.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use sqlweave::{Database, Options, Where};
use sqlweave_migrate::prelude::*;
use tempfile::TempDir;

async fn database() -> Database {
    Database::connect(&Options::sqlite_memory().prefix("app_"))
        .await
        .expect("Failed to create in-memory SQLite database")
}

fn write(dir: &Path, name: &str, up: &str, down: Option<&str>) {
    fs::write(dir.join(format!("{name}.up.sql")), up).unwrap();
    if let Some(down) = down {
        fs::write(dir.join(format!("{name}.down.sql")), down).unwrap();
    }
}

fn three_tables() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, table) in [
        ("0001_create_users", "users"),
        ("0002_create_posts", "posts"),
        ("0003_create_tags", "tags"),
    ] {
        write(
            dir.path(),
            name,
            &format!("CREATE TABLE <{table}> (<id> INTEGER PRIMARY KEY);"),
            Some(&format!("DROP TABLE <{table}>;")),
        );
    }
    dir
}

fn migrator(dir: &Path) -> Migrator {
    Migrator::new(MigrationSet::from_dir(dir).unwrap())
}

#[tokio::test]
async fn test_migrate_is_idempotent() {
    let dir = three_tables();
    let mut db = database().await;
    let migrator = migrator(dir.path());

    let applied = migrator.migrate(&mut db).await.unwrap();
    assert_eq!(
        applied,
        vec!["0001_create_users", "0002_create_posts", "0003_create_tags"]
    );
    assert!(db.has_table("posts").await.unwrap());
    assert!(migrator.migrate(&mut db).await.unwrap().is_empty());

    let history = migrator.history().get_applied(&mut db).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|m| m.batch == 1));
}

#[tokio::test]
async fn test_rollback_reverts_last_batch_in_reverse_order() {
    let dir = three_tables();
    let mut db = database().await;
    migrator(dir.path()).migrate(&mut db).await.unwrap();

    write(
        dir.path(),
        "0004_seed_users",
        "INSERT INTO <users> (<id>) VALUES (1); INSERT INTO <users> (<id>) VALUES (2);",
        Some("DELETE FROM <users>;"),
    );
    let migrator = migrator(dir.path());
    assert_eq!(
        migrator.migrate(&mut db).await.unwrap(),
        vec!["0004_seed_users"]
    );
    assert_eq!(db.count("users", &Where::new()).await, 2);

    let reverted = migrator.rollback(&mut db, 1).await.unwrap();
    assert_eq!(reverted, vec!["0004_seed_users"]);
    assert_eq!(db.count("users", &Where::new()).await, 0);

    let reverted = migrator.rollback(&mut db, 1).await.unwrap();
    assert_eq!(
        reverted,
        vec!["0003_create_tags", "0002_create_posts", "0001_create_users"]
    );
    assert!(!db.has_table("users").await.unwrap());
    assert!(migrator.history().get_applied(&mut db).await.unwrap().is_empty());
    assert!(migrator.rollback(&mut db, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_uses_a_newer_batch() {
    let dir = three_tables();
    let mut db = database().await;
    let migrator = migrator(dir.path());
    migrator.migrate(&mut db).await.unwrap();

    let applied = migrator.refresh(&mut db).await.unwrap();
    assert_eq!(applied.len(), 3);
    let history = migrator.history().get_applied(&mut db).await.unwrap();
    let names: Vec<&str> = history.iter().map(|m| m.migration.as_str()).collect();
    assert_eq!(
        names,
        vec!["0001_create_users", "0002_create_posts", "0003_create_tags"]
    );
    assert!(history.iter().all(|m| m.batch == 2));
}

#[tokio::test]
async fn test_failed_batch_is_rolled_back() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "0001_create_users",
        "CREATE TABLE <users> (<id> INTEGER PRIMARY KEY);",
        None,
    );
    write(dir.path(), "0002_broken", "CREATE TABLE <users> (<id> INTEGER);", None);

    let mut db = database().await;
    let migrator = migrator(dir.path());
    let err = migrator.migrate(&mut db).await.unwrap_err();
    assert!(matches!(err, MigrateError::Database(_)));

    assert!(!db.in_transaction());
    assert!(!db.has_table("users").await.unwrap());
    assert!(migrator.history().get_applied(&mut db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_commit_is_rolled_back() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "0001_orphan_child",
        "PRAGMA defer_foreign_keys = ON;
         CREATE TABLE <parent> (<id> INTEGER PRIMARY KEY);
         CREATE TABLE <child> (<id> INTEGER PRIMARY KEY, <parent_id> INTEGER REFERENCES <parent> (<id>));
         INSERT INTO <child> (<id>, <parent_id>) VALUES (1, 99);",
        None,
    );

    let mut db = Database::connect(&Options::sqlite_memory()).await.unwrap();
    let migrator = migrator(dir.path());
    let err = migrator.migrate(&mut db).await.unwrap_err();
    assert!(matches!(err, MigrateError::Database(_)));

    assert!(!db.in_transaction());
    assert!(!db.has_table("child").await.unwrap());
    assert!(migrator.history().get_applied(&mut db).await.unwrap().is_empty());
    assert!(migrator.migrate(&mut db).await.is_err());
}

#[tokio::test]
async fn test_failed_rollback_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "0001_early_commit",
        "CREATE TABLE <users> (<id> INTEGER); COMMIT; CREATE TABLE <users> (<id> INTEGER);",
        None,
    );

    let mut db = database().await;
    let err = migrator(dir.path()).migrate(&mut db).await.unwrap_err();
    match err {
        MigrateError::RollbackFailed { error, .. } => {
            assert!(matches!(*error, MigrateError::Database(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!db.in_transaction());
}

#[tokio::test]
async fn test_irreversible_migration_blocks_rollback() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "0001_create_users",
        "CREATE TABLE <users> (<id> INTEGER PRIMARY KEY);",
        Some("DROP TABLE <users>;"),
    );
    write(
        dir.path(),
        "0002_create_posts",
        "CREATE TABLE <posts> (<id> INTEGER PRIMARY KEY);",
        None,
    );

    let mut db = database().await;
    let migrator = migrator(dir.path());
    migrator.migrate(&mut db).await.unwrap();

    let err = migrator.reset(&mut db).await.unwrap_err();
    assert!(matches!(err, MigrateError::NotReversible(name) if name == "0002_create_posts"));
    assert!(db.has_table("users").await.unwrap());
    assert_eq!(migrator.history().get_applied(&mut db).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unregistered_applied_migration() {
    let dir = three_tables();
    let mut db = database().await;
    migrator(dir.path()).migrate(&mut db).await.unwrap();

    fs::remove_file(dir.path().join("0003_create_tags.up.sql")).unwrap();
    fs::remove_file(dir.path().join("0003_create_tags.down.sql")).unwrap();
    let migrator = migrator(dir.path());

    let status = migrator.status(&mut db).await.unwrap();
    assert_eq!(status.len(), 3);
    assert_eq!(
        status[2],
        MigrationStatus {
            name: String::from("0003_create_tags"),
            batch: Some(1),
            registered: false,
        }
    );

    let err = migrator.rollback(&mut db, 1).await.unwrap_err();
    assert!(matches!(err, MigrateError::MissingMigration(name) if name == "0003_create_tags"));
    assert!(db.has_table("users").await.unwrap());
}

struct CreateAccounts;

#[async_trait]
impl Migration for CreateAccounts {
    fn name(&self) -> &str {
        "0001_create_accounts"
    }

    async fn up(&self, db: &mut Database) -> Result<()> {
        db.create_table("accounts", |table| {
            table.id();
            table.string("email", 255).unique();
            table.integer("credits").default(0);
        })
        .await?;
        Ok(())
    }

    async fn down(&self, db: &mut Database) -> Result<()> {
        db.drop_table("accounts").await?;
        Ok(())
    }
}

struct AddNickname;

#[async_trait]
impl Migration for AddNickname {
    fn name(&self) -> &str {
        "0002_add_nickname"
    }

    async fn up(&self, db: &mut Database) -> Result<()> {
        db.alter_table("accounts", |table| {
            table.string("nickname", 50).nullable();
        })
        .await?;
        Ok(())
    }
}

#[tokio::test]
async fn test_code_migrations_and_status() {
    let set = MigrationSet::new()
        .with(AddNickname)
        .unwrap()
        .with(CreateAccounts)
        .unwrap();
    let migrator = Migrator::new(set).with_table("schema_log");
    let mut db = database().await;

    let status = migrator.status(&mut db).await.unwrap();
    assert!(status.iter().all(|s| s.batch.is_none() && s.registered));
    assert_eq!(status[0].name, "0001_create_accounts");

    assert_eq!(migrator.migrate(&mut db).await.unwrap().len(), 2);
    assert!(db.has_table("schema_log").await.unwrap());
    assert!(!db.has_table("migrations").await.unwrap());

    let status = migrator.status(&mut db).await.unwrap();
    assert!(status.iter().all(|s| s.batch == Some(1)));
}

#[tokio::test]
async fn test_database_extension() {
    let dir = three_tables();
    let mut db = database().await;

    assert_eq!(db.migrate(dir.path()).await.unwrap().len(), 3);
    assert!(db.migrate(dir.path()).await.unwrap().is_empty());
    assert_eq!(db.refresh(dir.path()).await.unwrap().len(), 3);
    assert_eq!(
        db.rollback_migrations(dir.path(), 1).await.unwrap().len(),
        3
    );
    assert!(MigrateExt::reset(&mut db, dir.path()).await.unwrap().is_empty());

    let missing = dir.path().join("missing");
    let err = db.migrate(&missing).await.unwrap_err();
    assert!(matches!(err, MigrateError::DirectoryNotFound(_)));
}
