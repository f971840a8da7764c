//! # Layerconf CLI Module
//!
//! This module implements the CLI interface for Layerconf.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show graph status
//! - `resolve` - Select options and print the merged configuration

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use layerconf_core::LayerConfError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Layerconf - layered configuration resolution
///
/// Pick one option per layer; the remaining options narrow to what is
/// compatible, and the picked options' parameters merge bottom to top.
#[derive(Parser, Debug)]
#[command(name = "layerconf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file (default: ./layerconf.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON file of node records, overriding `[graph] records`
    #[arg(short, long, global = true)]
    pub records: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to, overriding `[server] host`
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to, overriding `[server] port`
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show graph status
    Status,

    /// Select options in order and print the merged configuration
    Resolve {
        /// Node names, applied in the given order
        names: Vec<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and the loaded configuration.
pub async fn execute(cli: Cli, mut config: AppConfig) -> Result<(), LayerConfError> {
    if let Some(records) = cli.records {
        config.graph.records = Some(records);
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::Resolve { names }) => cmd_resolve(&config, json_mode, &names),
    }
}
