//! Cradle - Ephemeral Sandboxed Process Launcher
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use cradle::cli::{Cli, Commands};
use cradle::config::ConfigManager;
use cradle::error::CradleResult;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CradleResult<()> {
    let cli = Cli::parse();

    // Load configuration first; [general] feeds the subscriber setup
    let manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug. The config's
    // verbose flag acts as a floor under the -v count.
    let verbosity = cli.verbose.max(u8::from(config.general.verbose));
    let filter = match verbosity {
        0 => EnvFilter::new("cradle=warn"),
        1 => EnvFilter::new("cradle=info"),
        _ => EnvFilter::new("cradle=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // One cancellation token threaded through every external-process
    // invocation; Ctrl-C cancels it.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling");
            signal_token.cancel();
        }
    });

    // Dispatch to command
    match cli.command {
        Commands::Run(args) => cradle::cli::commands::run(args, &config, cancel).await,
        Commands::Status => cradle::cli::commands::status(&config, cancel).await,
        Commands::Cache(args) => cradle::cli::commands::cache(args, &config).await,
        Commands::Config(args) => cradle::cli::commands::config(args, &config, &manager).await,
    }
}
