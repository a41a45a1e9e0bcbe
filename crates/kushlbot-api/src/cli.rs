//! CLI definitions for the `kushlbot` binary.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Multi-session AI chat server.
#[derive(Parser)]
#[command(name = "kushlbot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all log output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server.
    Serve {
        /// Host to bind to [default: server.host from config.toml, else 0.0.0.0].
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on; the PORT environment variable wins over this.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the database file and tables, then exit.
    InitDb,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
