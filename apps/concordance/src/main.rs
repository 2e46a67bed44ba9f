//! # Concordance
//!
//! The service binary for the concordance resolution engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │           apps/concordance (THE BINARY)      │
//! │                                              │
//! │     ┌─────────────┐      ┌─────────────┐     │
//! │     │    CLI      │      │  HTTP API   │     │
//! │     │   (clap)    │      │   (axum)    │     │
//! │     └──────┬──────┘      └──────┬──────┘     │
//! │            └─────────┬──────────┘            │
//! │                      ▼                       │
//! │             ┌──────────────────┐             │
//! │             │ concordance-core │             │
//! │             └──────────────────┘             │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! concordance server --host 0.0.0.0 --port 8080
//! concordance write -f organisation.json
//! concordance read 0eb0c8a5-1b5d-4e1a-8c2f-0d4d5e6f7a8b --json
//! concordance count --type Organisation
//! ```

use clap::Parser;
use concordance::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // CONCORDANCE_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("CONCORDANCE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "concordance=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
