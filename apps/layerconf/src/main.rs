//! # Layerconf - Layered Configuration Server
//!
//! The main binary for the layered configuration engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for resolving selections
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │           apps/layerconf (THE BINARY)        │
//! │                                              │
//! │  ┌─────────────┐         ┌─────────────┐     │
//! │  │   CLI       │         │   HTTP API  │     │
//! │  │  (clap)     │         │   (axum)    │     │
//! │  └──────┬──────┘         └──────┬──────┘     │
//! │         └───────────┬───────────┘            │
//! │                     ▼                        │
//! │             ┌────────────────┐               │
//! │             │ layerconf-core │               │
//! │             │  (THE LOGIC)   │               │
//! │             └────────────────┘               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! layerconf --records nodes.json server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! layerconf --records nodes.json status
//! layerconf --records nodes.json resolve det_a fast cal1
//! ```

use clap::Parser;
use layerconf::cli;
use layerconf::config::{AppConfig, LOG_FORMAT_ENV, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match AppConfig::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // LAYERCONF_LOG_FORMAT=json overrides [log] format.
    let env_format = std::env::var(LOG_FORMAT_ENV).ok();
    init_tracing(config.effective_log_format(env_format.as_deref()));

    if !cli.quiet {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "layerconf=info,layerconf_core=info,tower_http=debug".into());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  layerconf v{}

  Layered configuration resolution
"#,
        env!("CARGO_PKG_VERSION")
    );
}
