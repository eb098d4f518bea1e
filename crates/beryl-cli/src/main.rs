//! Beryl unified CLI.
//!
//! A replicated in-memory message log: one primary, N replicas,
//! per-request write concern.
//!
//! # Quick Start
//!
//! ```bash
//! # Start two replicas (new terminal each)
//! PORT=8081 beryl replica
//! PORT=8082 beryl replica
//!
//! # Start the primary
//! PORT=8080 SECONDARIES=http://127.0.0.1:8081,http://127.0.0.1:8082 beryl primary
//!
//! # Append a message and read it back
//! beryl append "hello" -w 2
//! beryl messages
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Beryl - a replicated in-memory message log.
#[derive(Parser)]
#[command(name = "beryl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Start a primary node.
    Primary {
        /// Bind host; overrides HOST.
        #[arg(long)]
        host: Option<String>,

        /// Bind port; overrides PORT.
        #[arg(short, long)]
        port: Option<u16>,

        /// Comma-separated replica base URLs; overrides SECONDARIES.
        #[arg(short, long)]
        secondaries: Option<String>,
    },

    /// Start a replica node.
    Replica {
        /// Bind host; overrides HOST.
        #[arg(long)]
        host: Option<String>,

        /// Bind port; overrides PORT.
        #[arg(short, long)]
        port: Option<u16>,

        /// Artificial ingress delay in milliseconds; overrides DELAY_MS.
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Append a message through a primary.
    Append {
        /// The message payload.
        msg: String,

        /// Primary base URL.
        #[arg(short = 's', long, default_value = "http://127.0.0.1:8080")]
        server: String,

        /// Write concern; defaults to every node.
        #[arg(short, long)]
        w: Option<u32>,
    },

    /// Print a node's visible log.
    Messages {
        /// Node base URL (primary or replica).
        #[arg(short = 's', long, default_value = "http://127.0.0.1:8080")]
        server: String,
    },
}

/// Installs the fmt subscriber with the node's configured filter.
fn init_tracing(directive: &str) {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Primary {
            host,
            port,
            secondaries,
        } => commands::primary::run(host, port, secondaries).await,
        Commands::Replica {
            host,
            port,
            delay_ms,
        } => commands::replica::run(host, port, delay_ms).await,
        Commands::Append { msg, server, w } => commands::append::run(&msg, &server, w).await,
        Commands::Messages { server } => commands::messages::run(&server).await,
    }
}
