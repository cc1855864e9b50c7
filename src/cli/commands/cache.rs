//! Cache command - inspect or clear the per-user cache
//!
//! The cache is never garbage-collected automatically; `cache clear` is
//! the manual cleanup path.

use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::{Config, LaunchContext};
use crate::error::{CradleError, CradleResult};
use console::style;
use tokio::fs;
use tracing::info;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> CradleResult<()> {
    let ctx = LaunchContext::resolve(config, None, None, None)?;

    match args.action {
        CacheAction::Dir => {
            println!("{}", ctx.cache_dir.display());
            Ok(())
        }
        CacheAction::Clear => clear(&ctx).await,
    }
}

async fn clear(ctx: &LaunchContext) -> CradleResult<()> {
    let bundle = ctx.bundle_dir();
    if bundle.exists() {
        fs::remove_dir_all(&bundle)
            .await
            .map_err(|e| CradleError::io(format!("removing {}", bundle.display()), e))?;
        info!("Removed {}", bundle.display());
    }

    let record = ctx.digest_record_path();
    if record.exists() {
        fs::remove_file(&record)
            .await
            .map_err(|e| CradleError::io(format!("removing {}", record.display()), e))?;
        info!("Removed {}", record.display());
    }

    println!(
        "{} Cache cleared ({})",
        style("✓").green(),
        ctx.cache_dir.display()
    );
    Ok(())
}
