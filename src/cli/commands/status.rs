//! Status command - check runtime availability and cache state

use crate::assets::{AssetStore, DirAssetStore};
use crate::config::{Config, LaunchContext};
use crate::error::CradleResult;
use crate::rootfs::RootfsCache;
use crate::runtime::RuntimeDriver;
use crate::CONTAINER_ID;
use console::{style, Emoji};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config, cancel: CancellationToken) -> CradleResult<()> {
    let ctx = LaunchContext::resolve(config, None, None, None)?;
    let store = DirAssetStore::new(ctx.assets_dir.clone());

    println!("{}", style("Cradle System Status").bold().cyan());
    println!();

    println!("{}", style("Invoking user:").bold());
    println!(
        "  {} uid {} / gid {} ({})",
        CHECK,
        ctx.uid,
        ctx.gid,
        if ctx.rootless { "rootless" } else { "rooted" }
    );

    println!();
    println!("{}", style("Runtime:").bold());
    check_runtime(&ctx, &cancel).await;

    println!();
    println!("{}", style("Assets:").bold());
    check_assets(&ctx, &store).await;

    println!();
    println!("{}", style("Cache:").bold());
    check_cache(&ctx, &store).await;

    Ok(())
}

async fn check_runtime(ctx: &LaunchContext, cancel: &CancellationToken) {
    let binary = ctx
        .runtime_binary
        .clone()
        .unwrap_or_else(|| ctx.installed_runtime_path());

    if !binary.exists() {
        println!(
            "  {} {} not present (installed on first run)",
            WARN,
            binary.display()
        );
        return;
    }

    let driver = RuntimeDriver::new(binary.clone(), CONTAINER_ID);
    match driver.version(cancel).await {
        Ok(version) => println!("  {} {} ({})", CHECK, version, binary.display()),
        Err(e) => println!("  {} {} unusable: {}", CROSS, binary.display(), e),
    }
}

async fn check_assets(ctx: &LaunchContext, store: &dyn AssetStore) {
    // Distribution self-check: hash the bundled archive and compare to
    // the shipped digest record.
    let archive = store.read_all(&ctx.assets.rootfs_archive).await;
    let digest = store.read_all(&ctx.assets.rootfs_digest).await;

    match (archive, digest) {
        (Ok(archive), Ok(digest)) => {
            let actual = hex::encode(Sha256::digest(&archive));
            // digest records may carry a trailing filename, sha256sum style
            let recorded = String::from_utf8_lossy(&digest)
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            if actual == recorded {
                println!("  {} {} matches its digest record", CHECK, ctx.assets.rootfs_archive);
            } else {
                println!(
                    "  {} {} does not match its digest record (distribution corrupt?)",
                    CROSS, ctx.assets.rootfs_archive
                );
            }
        }
        _ => println!(
            "  {} assets missing under {} (reinstall or pass --assets)",
            CROSS,
            ctx.assets_dir.display()
        ),
    }
}

async fn check_cache(ctx: &LaunchContext, store: &dyn AssetStore) {
    println!("  {} {}", CHECK, ctx.cache_dir.display());

    let rootfs = ctx.bundle_dir().join("rootfs");
    match store.read_all(&ctx.assets.rootfs_digest).await {
        Ok(expected) => {
            if RootfsCache::is_valid(&rootfs, &ctx.digest_record_path(), &expected).await {
                println!("  {} extracted rootfs is current", CHECK);
            } else {
                println!("  {} rootfs will be extracted on next run", WARN);
            }
        }
        Err(_) => println!("  {} cannot validate cache without the digest asset", WARN),
    }
}
