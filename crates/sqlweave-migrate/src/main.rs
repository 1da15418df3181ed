//! sqlweave-migrate CLI
//!
//! Command-line tool for managing SQL-file migrations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlweave::{Database, Options};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sqlweave_migrate::prelude::*;
use sqlweave_migrate::create_migration_files;

/// Batch-tracked database migrations.
#[derive(Parser)]
#[command(name = "sqlweave-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Migrations directory.
    #[arg(short = 'm', long, default_value = "migrations")]
    dir: PathBuf,

    /// Table prefix.
    #[arg(long, default_value = "")]
    prefix: String,

    /// Bookkeeping table.
    #[arg(long, default_value = sqlweave_migrate::DEFAULT_TABLE)]
    table: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations.
    Migrate,

    /// Revert the most recent batches.
    Rollback {
        /// Number of batches to revert.
        #[arg(short, long, default_value_t = 1)]
        steps: usize,
    },

    /// Revert every applied migration.
    Reset,

    /// Revert everything, then migrate again.
    Refresh,

    /// Show migration status.
    Status,

    /// Create empty up/down migration files.
    Make {
        /// Migration name, lowercase with underscores.
        name: String,
    },
}

fn report(verb: &str, names: &[String]) {
    if names.is_empty() {
        info!("Nothing to do.");
    }
    for name in names {
        info!("{verb}: {name}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Make { name } = &cli.command {
        let now = chrono::Local::now().naive_local();
        let (up, down) = create_migration_files(&cli.dir, name, now)?;
        info!("Created migration: {}", up.display());
        info!("Created migration: {}", down.display());
        return Ok(());
    }

    let options = Options::new("sqlite")
        .database(&cli.database)
        .prefix(&cli.prefix);
    let mut db = Database::connect(&options).await?;
    let migrator = Migrator::new(MigrationSet::from_dir(&cli.dir)?).with_table(&cli.table);

    match cli.command {
        Commands::Migrate => report("Applied", &migrator.migrate(&mut db).await?),
        Commands::Rollback { steps } => {
            report("Rolled back", &migrator.rollback(&mut db, steps).await?);
        }
        Commands::Reset => report("Rolled back", &migrator.reset(&mut db).await?),
        Commands::Refresh => report("Applied", &migrator.refresh(&mut db).await?),
        Commands::Status => {
            let status = migrator.status(&mut db).await?;
            if status.is_empty() {
                info!("No migrations found.");
            } else {
                println!("\nMigrations:");
                println!("{:-<60}", "");
                for entry in &status {
                    let mark = if entry.batch.is_some() { "X" } else { " " };
                    let batch = entry
                        .batch
                        .map_or_else(String::new, |batch| format!(" (batch {batch})"));
                    let missing = if entry.registered { "" } else { " [missing]" };
                    println!(" [{mark}] {}{batch}{missing}", entry.name);
                }
                println!();
            }
        }
        Commands::Make { .. } => {}
    }

    Ok(())
}
