//! PlugHub - release sync and plugin repackaging service
//!
//! This is the main entry point for the PlugHub command-line interface.

mod cli;
mod commands;
mod output;
mod server;

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Parser;
use plughub_core::{ConfigLoader, RuntimeConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

// No #[tokio::main]: the blocking HTTP clients must be built and dropped
// outside the runtime, which only `serve` creates.
fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, config),
        Commands::CheckUpdate(args) => commands::check_update::run(args, config),
        Commands::Scan(args) => commands::scan::run(args, config),
    }
}

/// Initialize tracing with appropriate verbosity; `RUST_LOG` wins when set
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("info"),
                1 => EnvFilter::new("debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Utf8Path>) -> Result<RuntimeConfig> {
    let mut loader = ConfigLoader::new().context("Failed to locate the config directory")?;
    if let Some(path) = path {
        loader = loader.with_file(path.to_path_buf());
    }
    loader
        .load_runtime_config()
        .context("Failed to load configuration")
}
