//! Command line front end for the MBlog store maintenance operations.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use mblog_store::domain::content::ContentKind;
use mblog_store::models::config::StoreConfig;
use mblog_store::repository::StoreRepository;
use mblog_store::services::{import_export, maintenance};
use mblog_store::storage::SqliteStore;
use mblog_store::storage::keys::StoreDocument;

#[derive(Parser)]
#[command(name = "mblog-admin")]
#[command(about = "Inspect, back up and repair an MBlog store")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "MBLOG_CONFIG", default_value = "config/default.yaml")]
    config: String,

    /// SQLite database (overrides the configuration file)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report the health of a collection
    Health {
        #[arg(value_parser = parse_kind)]
        kind: ContentKind,
    },
    /// Check a collection for duplicate ids, broken order and stale references
    Validate {
        #[arg(value_parser = parse_kind)]
        kind: ContentKind,
    },
    /// Store a manual backup of a collection
    Backup {
        #[arg(value_parser = parse_kind)]
        kind: ContentKind,
    },
    /// Replace a collection with its newest valid backup
    Restore {
        #[arg(value_parser = parse_kind)]
        kind: ContentKind,
    },
    /// Replace categories, the profile or a site setting with its newest valid backup
    RestoreDocument {
        #[arg(value_parser = parse_document)]
        document: StoreDocument,
    },
    /// Remove manual and restored backups of a collection
    Cleanup {
        #[arg(value_parser = parse_kind)]
        kind: ContentKind,
    },
    /// Measure used and available storage
    Probe,
    /// Write a collection to a JSON export file
    Export {
        #[arg(value_parser = parse_kind)]
        kind: ContentKind,
        /// Output file; defaults to a dated name in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace a collection with the records of an export file
    Import {
        #[arg(value_parser = parse_kind)]
        kind: ContentKind,
        file: PathBuf,
    },
    /// Zero all counters of a collection and clear its like flags
    ResetStats {
        #[arg(value_parser = parse_kind)]
        kind: ContentKind,
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn parse_kind(value: &str) -> Result<ContentKind, String> {
    ContentKind::try_from(value).map_err(|e| e.to_string())
}

fn parse_document(value: &str) -> Result<StoreDocument, String> {
    StoreDocument::try_from(value).map_err(|e| e.to_string())
}

fn load_config(path: &str) -> Result<StoreConfig, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(config::Environment::with_prefix("MBLOG").separator("__"))
        .build()?
        .try_deserialize()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut store_config = load_config(&cli.config)?;
    if let Some(database_url) = cli.database_url {
        store_config.database_url = database_url;
    }
    log::debug!("using database {}", store_config.database_url);

    let store = SqliteStore::open(&store_config.database_url, store_config.quota_bytes)?;
    let repo = StoreRepository::new(store, &store_config);

    match cli.command {
        Command::Health { kind } => print_json(&maintenance::health_check(&repo, kind)?)?,
        Command::Validate { kind } => {
            print_json(&maintenance::validate_integrity(&repo, kind)?)?
        }
        Command::Backup { kind } => {
            let bytes = maintenance::create_backup(&repo, kind)?;
            println!("backed up {kind} ({bytes} bytes)");
        }
        Command::Restore { kind } => {
            let restored = maintenance::restore_backup(&repo, kind)?;
            println!("restored {restored} {kind} record(s)");
        }
        Command::RestoreDocument { document } => {
            let restored = maintenance::restore_document_backup(&repo, document)?;
            println!("restored {document} ({restored} record(s))");
        }
        Command::Cleanup { kind } => {
            let removed = maintenance::cleanup_backups(&repo, kind)?;
            println!("removed {removed} backup(s) of {kind}");
        }
        Command::Probe => print_json(&maintenance::probe_storage(&repo)?)?,
        Command::Export { kind, output } => {
            let file =
                import_export::export_collection(&repo, kind, &store_config.export_version)?;
            let path = output.unwrap_or_else(|| PathBuf::from(&file.file_name));
            std::fs::write(&path, &file.bytes)?;
            println!("exported {kind} to {}", path.display());
        }
        Command::Import { kind, file } => {
            let json = std::fs::read_to_string(&file)?;
            print_json(&import_export::import_collection(&repo, kind, &json)?)?
        }
        Command::ResetStats { kind, yes } => {
            let reset = maintenance::reset_stats(&repo, kind, yes)?;
            println!("reset stats of {reset} {kind} record(s)");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
