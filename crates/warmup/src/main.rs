// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warmup - email domain warmup scheduler.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

/// Warmup - gradually ramp sending volume across campaigns and domains.
#[derive(Parser, Debug)]
#[command(name = "warmup", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single scheduler pass and exit.
    Run,
    /// Run scheduler passes on the configured interval until interrupted.
    Serve,
    /// Validate configuration and storage, then print today's plan.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => warmup_config::load_and_validate_path(path),
        None => warmup_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            warmup_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.scheduler.log_level);

    let result = match cli.command {
        Commands::Run => serve::run_once(&config).await,
        Commands::Serve => serve::run_serve(&config).await,
        Commands::Check => check::run_check(&config).await,
    };

    if let Err(e) = result {
        error!(error = %e, "warmup exited with an error");
        eprintln!("warmup: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warmup={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
