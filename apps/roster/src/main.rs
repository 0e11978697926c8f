//! # Roster
//!
//! Personal registry: people, derived ages, statistics and exports.
//!
//! Runs either as an HTTP server (`roster serve`) or as one-shot CLI
//! commands against the same database file.

use clap::{Parser, Subcommand};
use roster::cli::{
    CliResult, cmd_add, cmd_delete, cmd_edit, cmd_export, cmd_init, cmd_list, cmd_seed,
    cmd_serve, cmd_show, cmd_stats,
};
use roster::roster_core::PersonForm;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "roster=info,tower_http=info";

#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Personal registry: people, ages, statistics and exports"
)]
struct Cli {
    /// Database path
    #[arg(long, global = true, default_value = "roster.db")]
    db: PathBuf,

    /// Storage backend: file or redb
    #[arg(long, global = true, default_value = "file")]
    backend: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty database
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },

    /// Start the HTTP server
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Requests per second across all clients (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        rate_limit: u32,

        /// Load the demo data set before serving
        #[arg(long)]
        seed: bool,
    },

    /// Load the demo data set
    Seed,

    /// Register a person
    Add {
        #[arg(long)]
        given_name: String,

        #[arg(long)]
        family_name: String,

        /// dd/mm/yyyy or yyyy-mm-dd
        #[arg(long)]
        birth_date: String,

        /// M or F
        #[arg(long)]
        sex: String,

        /// 11 digits, punctuation allowed
        #[arg(long)]
        national_id: String,
    },

    /// List people, optionally filtered by a name fragment or national ID
    List {
        #[arg(long, short)]
        query: Option<String>,
    },

    /// Show one person
    Show { id: u64 },

    /// Change one field of a person
    Edit {
        id: u64,
        /// given-name, family-name, birth-date, sex or national-id
        field: String,
        value: String,
    },

    /// Delete a person
    Delete { id: u64 },

    /// Print registry statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Export every record to a file
    Export {
        /// csv, json or xlsx
        #[arg(long, short, default_value = "csv")]
        format: String,

        #[arg(long, short)]
        output: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> CliResult {
    let db = cli.db.as_path();
    let backend = cli.backend.as_str();
    match cli.command {
        Commands::Init { force } => cmd_init(db, backend, force),
        Commands::Serve {
            host,
            port,
            rate_limit,
            seed,
        } => cmd_serve(db, backend, &host, port, rate_limit, seed).await,
        Commands::Seed => cmd_seed(db, backend),
        Commands::Add {
            given_name,
            family_name,
            birth_date,
            sex,
            national_id,
        } => {
            let form = PersonForm::new(&given_name, &family_name, &birth_date, &sex, &national_id);
            cmd_add(db, backend, &form)
        }
        Commands::List { query } => cmd_list(db, backend, query.as_deref()),
        Commands::Show { id } => cmd_show(db, backend, id),
        Commands::Edit { id, field, value } => cmd_edit(db, backend, id, &field, &value),
        Commands::Delete { id } => cmd_delete(db, backend, id),
        Commands::Stats { json } => cmd_stats(db, backend, json),
        Commands::Export { format, output } => cmd_export(db, backend, &output, &format),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
