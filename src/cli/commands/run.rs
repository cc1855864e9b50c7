//! Run command - provision the bundle and launch the container

use crate::assets::{AssetStore, DirAssetStore};
use crate::bundle::BundleBuilder;
use crate::cli::args::RunArgs;
use crate::config::{Config, LaunchContext};
use crate::error::{CradleError, CradleResult};
use crate::rootfs::TarExtractor;
use crate::runtime::RuntimeDriver;
use crate::CONTAINER_ID;
use console::style;
use std::path::PathBuf;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config, cancel: CancellationToken) -> CradleResult<()> {
    let ctx = LaunchContext::resolve(config, args.cache_dir, args.assets, args.runtime)?;
    debug!(
        "Launch context: uid={} gid={} rootless={} cache={}",
        ctx.uid,
        ctx.gid,
        ctx.rootless,
        ctx.cache_dir.display()
    );

    fs::create_dir_all(&ctx.cache_dir)
        .await
        .map_err(|e| CradleError::CacheDirCreate {
            path: ctx.cache_dir.clone(),
            source: e,
        })?;

    let store = DirAssetStore::new(ctx.assets_dir.clone());
    let runtime_binary = resolve_runtime_binary(&ctx, &store).await?;

    let argv = if args.command.is_empty() {
        config.process.command.clone()
    } else {
        args.command
    };

    let builder = BundleBuilder::new(&ctx, &store, &TarExtractor);
    let bundle = builder.prepare(&argv, &cancel).await?;

    let driver = RuntimeDriver::new(runtime_binary, CONTAINER_ID);
    let pid = driver.launch(&bundle.path, &cancel).await?;

    info!("Container {} launched with pid {}", CONTAINER_ID, pid);
    println!(
        "{} Container {} running (pid {})",
        style("✓").green(),
        style(CONTAINER_ID).cyan(),
        pid
    );
    Ok(())
}

/// Use the configured runtime binary when given, otherwise install the
/// bundled one into the cache directory.
async fn resolve_runtime_binary(
    ctx: &LaunchContext,
    store: &dyn AssetStore,
) -> CradleResult<PathBuf> {
    if let Some(binary) = &ctx.runtime_binary {
        if !binary.exists() {
            return Err(CradleError::RuntimeNotFound(binary.clone()));
        }
        debug!("Using external runtime binary {}", binary.display());
        return Ok(binary.clone());
    }

    let dest = ctx.installed_runtime_path();
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| CradleError::CacheDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    store.materialize(&ctx.assets.runtime, &dest, 0o750).await?;
    debug!("Installed bundled runtime to {}", dest.display());
    Ok(dest)
}
