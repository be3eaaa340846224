//! drift-migrate CLI
//!
//! Command-line tool for syncing SQLite tables with model manifests.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use drift_core::{ModelSchema, Store};
use drift_sqlite::{to_script, Migrator, SqliteStore};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use drift_migrate::Manifest;

/// Keep SQLite tables in line with declared models.
#[derive(Parser)]
#[command(name = "drift-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Model manifest (JSON).
    #[arg(short, long, default_value = "models.json")]
    models: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the plan of every model as JSON.
    Plan {
        /// Only this model.
        #[arg(long)]
        model: Option<String>,
    },

    /// Print the SQL that would be executed.
    Sql {
        /// Only this model.
        #[arg(long)]
        model: Option<String>,
    },

    /// Apply the plans.
    Migrate {
        /// Only this model.
        #[arg(long)]
        model: Option<String>,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,

        /// Refuse plans that drop columns.
        #[arg(long)]
        no_drop: bool,
    },

    /// Print the live columns of a table as JSON.
    Inspect {
        /// Table name.
        table: String,
    },
}

fn select(schemas: Vec<ModelSchema>, model: Option<&str>) -> anyhow::Result<Vec<ModelSchema>> {
    let Some(name) = model else {
        return Ok(schemas);
    };
    let selected: Vec<ModelSchema> = schemas
        .into_iter()
        .filter(|s| s.model_name() == name)
        .collect();
    if selected.is_empty() {
        anyhow::bail!("Model '{name}' is not in the manifest");
    }
    Ok(selected)
}

fn load_models(cli: &Cli, model: Option<&str>) -> anyhow::Result<Vec<ModelSchema>> {
    let manifest = Manifest::load(&cli.models)?;
    select(manifest.schemas()?, model)
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

    let store = SqliteStore::connect(&cli.database).await?;

    match &cli.command {
        Commands::Plan { model } => {
            let migrator = Migrator::new(store.clone());
            for schema in load_models(&cli, model.as_deref())? {
                let plan = migrator.plan_for(&schema).await?;
                println!("{}", serde_json::to_string_pretty(&plan)?);
            }
        }

        Commands::Sql { model } => {
            let migrator = Migrator::new(store.clone());
            for schema in load_models(&cli, model.as_deref())? {
                let plan = migrator.plan_for(&schema).await?;
                let statements = migrator.dialect().render(&schema, &plan);
                if statements.is_empty() {
                    println!("-- {}: up to date", schema.table_name());
                } else {
                    println!("-- {}", schema.table_name());
                    println!("{}", to_script(&statements));
                }
            }
        }

        Commands::Migrate {
            model,
            dry_run,
            no_drop,
        } => {
            let migrator = Migrator::new(store.clone())
                .dry_run(*dry_run)
                .allow_drops(!*no_drop);

            let mut applied = 0;
            for schema in load_models(&cli, model.as_deref())? {
                let outcome = migrator.sync_schema(&schema).await?;
                if outcome.plan.is_empty() {
                    info!(table = schema.table_name(), "Up to date");
                    continue;
                }
                if outcome.plan.has_destructive_changes() {
                    warn!(table = schema.table_name(), "Plan drops columns");
                }
                for change in outcome.plan.changes() {
                    info!(table = schema.table_name(), "{}", change.describe());
                }
                if *dry_run {
                    println!("{}", to_script(&outcome.statements));
                } else {
                    applied += 1;
                }
            }

            if !*dry_run {
                info!(tables = applied, "Migration complete");
            }
        }

        Commands::Inspect { table } => {
            let columns = store.column_info(table).await?;
            if columns.is_empty() {
                anyhow::bail!("Table '{table}' does not exist");
            }
            println!("{}", serde_json::to_string_pretty(&columns)?);
        }
    }

    store.close().await;
    Ok(())
}
