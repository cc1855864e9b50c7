//! OCI bundle assembly
//!
//! Lays out `bundle/config.json` + `bundle/rootfs/` under the cache
//! directory. The config is rewritten on every run; rootfs population is
//! delegated to the cache, which skips extraction when the cached tree
//! is still valid. The config is deliberately written first: it is cheap
//! and must reflect the new argv even on a cache hit.

use crate::assets::AssetStore;
use crate::config::LaunchContext;
use crate::error::{CradleError, CradleResult};
use crate::oci;
use crate::rootfs::{Extractor, Provisioned, RootfsCache};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A bundle directory ready for the runtime.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub path: PathBuf,
    pub rootfs: PathBuf,
    pub provisioned: Provisioned,
}

/// Builds the bundle for one invocation.
pub struct BundleBuilder<'a> {
    ctx: &'a LaunchContext,
    store: &'a dyn AssetStore,
    extractor: &'a dyn Extractor,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(
        ctx: &'a LaunchContext,
        store: &'a dyn AssetStore,
        extractor: &'a dyn Extractor,
    ) -> Self {
        Self {
            ctx,
            store,
            extractor,
        }
    }

    /// Produce a bundle directory for the given target argv.
    pub async fn prepare(&self, argv: &[String], cancel: &CancellationToken) -> CradleResult<Bundle> {
        let bundle_dir = self.ctx.bundle_dir();
        let rootfs_dir = bundle_dir.join("rootfs");
        let config_path = bundle_dir.join("config.json");

        fs::create_dir_all(&bundle_dir)
            .await
            .map_err(|e| CradleError::CacheDirCreate {
                path: bundle_dir.clone(),
                source: e,
            })?;

        self.write_spec(&config_path, &rootfs_dir, argv).await?;

        let cache = RootfsCache::new(self.store, self.extractor);
        let provisioned = cache
            .ensure(
                &rootfs_dir,
                &self.ctx.digest_record_path(),
                &self.ctx.cache_dir,
                &self.ctx.assets,
                cancel,
            )
            .await
            .map_err(|e| match e {
                CradleError::Cancelled => e,
                other => CradleError::bundle_stage("rootfs provisioning", other),
            })?;

        info!("Bundle ready at {}", bundle_dir.display());
        Ok(Bundle {
            path: bundle_dir,
            rootfs: rootfs_dir,
            provisioned,
        })
    }

    /// Synthesize and persist the runtime configuration document.
    async fn write_spec(
        &self,
        config_path: &Path,
        rootfs_dir: &Path,
        argv: &[String],
    ) -> CradleResult<()> {
        let spec = oci::build(
            self.ctx.rootless,
            self.ctx.uid,
            self.ctx.gid,
            argv,
            rootfs_dir,
            &self.ctx.hostname,
        );
        debug!(
            "Writing runtime spec ({} mode) to {}",
            if self.ctx.rootless { "rootless" } else { "rooted" },
            config_path.display()
        );

        let blob = serde_json::to_vec_pretty(&spec).map_err(|e| CradleError::SpecWrite {
            path: config_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        fs::write(config_path, blob)
            .await
            .map_err(|e| CradleError::SpecWrite {
                path: config_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        fs::set_permissions(config_path, std::fs::Permissions::from_mode(0o660))
            .await
            .map_err(|e| CradleError::SpecWrite {
                path: config_path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
