//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// PlugHub - release sync and plugin repackaging service
#[derive(Parser, Debug)]
#[command(name = "plughub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config.yaml (defaults to ~/.plughub/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the release poller, the repository scan and the HTTP API
    Serve(ServeArgs),

    /// Run one self-update cycle and exit
    CheckUpdate(CheckUpdateArgs),

    /// Refresh the plugin repository and process its tags once
    Scan(ScanArgs),
}

// Serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Repository whose latest release is tracked for self-update
    #[arg(long, value_name = "URL")]
    pub self_repo: Option<String>,

    /// Repository whose tags are scanned for plugin bundles
    #[arg(long, value_name = "URL")]
    pub plugin_repo: Option<String>,

    /// Do not start the release poller
    #[arg(long)]
    pub no_poll: bool,

    /// Do not start the periodic repository scan
    #[arg(long)]
    pub no_scan: bool,
}

// Check-update command
#[derive(Args, Debug)]
pub struct CheckUpdateArgs {
    /// Repository whose latest release is tracked for self-update
    #[arg(long, value_name = "URL")]
    pub self_repo: Option<String>,
}

// Scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Repository whose tags are scanned for plugin bundles
    #[arg(long, value_name = "URL")]
    pub plugin_repo: Option<String>,

    /// Process only this tag
    #[arg(long)]
    pub tag: Option<String>,
}
