use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use estate_import::{residents, seed, stands};

/// Bulk loaders for the estate portal database.
#[derive(Parser, Debug)]
#[command(name = "estate-import")]
#[command(about = "Import stands and residents, or seed demo reports")]
struct Cli {
    /// Validate and report per-record outcomes without writing
    #[arg(long, global = true, default_value_t = false)]
    dry_run: bool,

    /// SQLite database path
    #[arg(long, env = "ESTATE_DB_PATH", default_value = "estate.db")]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upsert stands from a GeoJSON feature collection, keyed on stand number
    Stands { file: PathBuf },
    /// Insert residents from cleaned JSON, one per stand
    Residents { file: PathBuf },
    /// Generate dummy reports inside a community boundary polygon
    SeedReports {
        file: PathBuf,
        /// How many reports to generate
        #[arg(long, default_value_t = 500)]
        count: usize,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let db = estate_db::Database::open(&cli.db_path)?;

    match &cli.command {
        Command::Stands { file } => {
            let raw = read_file(file)?;
            let collection = stands::parse(&raw)?;
            let stats = stands::import(&db, &collection, cli.dry_run)?;
            println!("Stands: {}", stats);
        }
        Command::Residents { file } => {
            let raw = read_file(file)?;
            let parsed = residents::parse(&raw)?;
            let stats = residents::import(&db, &parsed, cli.dry_run)?;
            println!("Residents: {}", stats);
        }
        Command::SeedReports { file, count } => {
            let raw = read_file(file)?;
            let created = seed::seed_reports(&db, &raw, *count, cli.dry_run)?;
            println!("Seeded {} reports", created);
        }
    }

    Ok(())
}

fn read_file(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}
