//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Cradle - ephemeral sandboxed process launcher
///
/// Prepares an OCI bundle in a per-user cache and launches a single
/// container through a runc-compatible runtime.
#[derive(Parser, Debug)]
#[command(name = "cradle")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CRADLE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the sandboxed process
    Run(RunArgs),

    /// Check runtime availability and cache state
    Status,

    /// Inspect or clear the per-user cache
    Cache(CacheArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Cache directory override
    #[arg(long, env = "CRADLE_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Assets directory override
    #[arg(long, env = "CRADLE_ASSETS_DIR")]
    pub assets: Option<PathBuf>,

    /// Use an existing runc-compatible binary instead of the bundled one
    #[arg(long)]
    pub runtime: Option<PathBuf>,

    /// Command to run inside the sandbox (default from config)
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print the cache directory path
    Dir,

    /// Remove the extracted rootfs, checksum record and bundle
    Clear,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the config file path
    Path,

    /// Print the effective configuration as TOML
    Show,
}
