//! CLI entry point for the `dindex` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use discovery_index::cli::commands;
use discovery_index::engine::{DiscoveryQuery, DiscoverySort};
use discovery_index::IndexConfig;

#[derive(Parser)]
#[command(
    name = "dindex",
    about = "Replay ledger content events into a discovery index and query it"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    /// Path to a TOML config file (falls back to DINDEX_CONFIG, then defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an event file and summarize the resulting index
    Replay {
        /// Path to the JSON-lines event file
        file: PathBuf,
        /// Write the full index as JSON to this path
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Show tag statistics
    Stats {
        /// Path to the JSON-lines event file
        file: PathBuf,
        /// Show only this tag or language
        #[arg(long)]
        tag: Option<String>,
        /// Maximum rows
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Run a discovery query
    Query {
        /// Path to the JSON-lines event file
        file: PathBuf,
        /// Comma-separated tags content must carry one of
        #[arg(long)]
        select_tags: Option<String>,
        /// Comma-separated tags content must not carry
        #[arg(long)]
        filter_tags: Option<String>,
        /// Comma-separated accepted languages
        #[arg(long)]
        select_languages: Option<String>,
        /// Comma-separated rejected languages
        #[arg(long)]
        filter_languages: Option<String>,
        /// Sort: hot, trending, created
        #[arg(long, default_value = "hot")]
        sort: String,
        /// Maximum results
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// Audit aggregates against entries
    Verify {
        /// Path to the JSON-lines event file
        file: PathBuf,
    },
}

fn split_names(value: Option<String>) -> std::collections::BTreeSet<String> {
    value
        .map(|s| s.split(',').map(|t| t.to_string()).collect())
        .unwrap_or_default()
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match IndexConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    };

    let result = match cli.command {
        Commands::Replay { file, snapshot } => {
            commands::cmd_replay(&file, &config, snapshot.as_deref(), json)
        }
        Commands::Stats { file, tag, limit } => {
            commands::cmd_stats(&file, &config, tag.as_deref(), limit, json)
        }
        Commands::Query {
            file,
            select_tags,
            filter_tags,
            select_languages,
            filter_languages,
            sort,
            limit,
        } => {
            let sort_by = match DiscoverySort::from_name(&sort) {
                Some(s) => s,
                None => {
                    eprintln!("Invalid sort: {}", sort);
                    process::exit(3);
                }
            };
            let query = DiscoveryQuery {
                select_tags: split_names(select_tags),
                filter_tags: split_names(filter_tags),
                select_languages: split_names(select_languages),
                filter_languages: split_names(filter_languages),
                limit,
            };
            commands::cmd_query(&file, &config, query, sort_by, json)
        }
        Commands::Verify { file } => match commands::cmd_verify(&file, &config, json) {
            Ok(true) => Ok(()),
            Ok(false) => process::exit(5),
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}
