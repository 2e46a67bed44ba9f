//! # Concordance CLI
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `write` - Write an aggregate from a JSON file
//! - `read` - Print the stored aggregate for a canonical id
//! - `count` - Count canonical concepts, optionally of one kind
//! - `check` - Verify the store is reachable

mod commands;

use crate::AppError;
use crate::config::{Backend, Overrides, Settings};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Concordance - canonical concept resolution
///
/// Keeps every source record of a concept mapped to exactly one canonical id.
#[derive(Parser, Debug)]
#[command(name = "concordance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the redb database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Requests per second, 0 to disable
        #[arg(long)]
        rate_limit: Option<u32>,
    },

    /// Write an aggregate concept from a JSON file
    Write {
        /// Path to the payload
        #[arg(short, long)]
        file: PathBuf,

        /// Transaction id stamped on the events (generated if absent)
        #[arg(short, long)]
        transaction_id: Option<String>,
    },

    /// Print the stored aggregate for a canonical id
    Read {
        /// Canonical id (prefUUID)
        uuid: String,
    },

    /// Count canonical concepts
    Count {
        /// Only count this type and its subtypes
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },

    /// Verify the store is reachable
    Check,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let mut overrides = Overrides {
        database: cli.database,
        backend: cli.backend,
        ..Overrides::default()
    };
    if let Commands::Server {
        host,
        port,
        rate_limit,
    } = &cli.command
    {
        overrides.host = host.clone();
        overrides.port = *port;
        overrides.rate_limit = *rate_limit;
    }

    let settings = Settings::load(overrides, cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Server { .. } => cmd_server(&settings).await,
        Commands::Write {
            file,
            transaction_id,
        } => cmd_write(&settings, json, &file, transaction_id),
        Commands::Read { uuid } => cmd_read(&settings, json, &uuid),
        Commands::Count { kind } => cmd_count(&settings, json, kind.as_deref()),
        Commands::Check => cmd_check(&settings, json),
    }
}
