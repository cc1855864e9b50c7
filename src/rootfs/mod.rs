//! Root filesystem provisioning and cache validation
//!
//! Extracting the compressed rootfs archive is the expensive step of a
//! launch, so the extracted tree is kept in the cache directory together
//! with a checksum record. The tree is reused only when the record's
//! bytes match the digest shipped with the current archive asset; there
//! is no re-hash of the extracted contents.

use crate::assets::{AssetNames, AssetStore};
use crate::error::{CradleError, CradleResult};
use crate::exec;
use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Outcome of [`RootfsCache::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// The cached tree was valid; extraction was skipped.
    CacheHit,
    /// The archive was extracted (cold cache or stale record).
    Extracted,
}

/// Decompression-and-extraction step, scoped to a destination directory.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> CradleResult<()>;
}

/// Production extractor shelling out to `tar`.
///
/// The decompression filter is chosen from the archive suffix; plain
/// `.tar` archives need none.
pub struct TarExtractor;

#[async_trait]
impl Extractor for TarExtractor {
    async fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> CradleResult<()> {
        let mut cmd = Command::new("tar");
        if archive.extension().is_some_and(|e| e == "zst") {
            cmd.arg("--zstd");
        }
        cmd.arg("-xf").arg(archive).arg("-C").arg(dest);

        let out = exec::run_captured(cmd, cancel).await?;
        if out.success {
            Ok(())
        } else {
            Err(CradleError::Extraction { stderr: out.stderr })
        }
    }
}

/// Decides whether a previously extracted rootfs can be reused and
/// re-provisions it when it cannot.
pub struct RootfsCache<'a> {
    store: &'a dyn AssetStore,
    extractor: &'a dyn Extractor,
}

impl<'a> RootfsCache<'a> {
    pub fn new(store: &'a dyn AssetStore, extractor: &'a dyn Extractor) -> Self {
        Self { store, extractor }
    }

    /// Whether extraction may be skipped.
    ///
    /// Valid iff the rootfs directory exists and the record file's raw
    /// bytes equal `expected`. Any read failure means invalid, never an
    /// error: the system degrades to a full re-extraction.
    pub async fn is_valid(rootfs_dir: &Path, record_path: &Path, expected: &[u8]) -> bool {
        if !rootfs_dir.is_dir() {
            return false;
        }
        match fs::read(record_path).await {
            Ok(recorded) => recorded == expected,
            Err(_) => false,
        }
    }

    /// Ensure `rootfs_dir` holds a tree matching the current archive.
    ///
    /// On a stale or absent cache: materialize the archive beside the
    /// cache root, extract into `rootfs_dir`, then write the checksum
    /// record. The record is written only after extraction succeeds, so
    /// a crash mid-extraction leaves the cache marked invalid. The
    /// temporary archive is removed on every exit path.
    pub async fn ensure(
        &self,
        rootfs_dir: &Path,
        record_path: &Path,
        scratch_dir: &Path,
        assets: &AssetNames,
        cancel: &CancellationToken,
    ) -> CradleResult<Provisioned> {
        let expected = self.store.read_all(&assets.rootfs_digest).await?;

        if Self::is_valid(rootfs_dir, record_path, &expected).await {
            debug!("Root filesystem cache valid, skipping extraction");
            return Ok(Provisioned::CacheHit);
        }

        info!("Provisioning root filesystem into {}", rootfs_dir.display());

        let archive_path = scratch_dir.join(&assets.rootfs_archive);
        self.store
            .materialize(&assets.rootfs_archive, &archive_path, 0o640)
            .await?;

        let result = self.extract_into(rootfs_dir, &archive_path, cancel).await;
        let _ = fs::remove_file(&archive_path).await;
        result?;

        fs::write(record_path, &expected)
            .await
            .map_err(|e| CradleError::io(format!("writing {}", record_path.display()), e))?;

        Ok(Provisioned::Extracted)
    }

    async fn extract_into(
        &self,
        rootfs_dir: &Path,
        archive_path: &Path,
        cancel: &CancellationToken,
    ) -> CradleResult<()> {
        // A stale tree must go first: extracting over it would keep
        // files that only existed in the previous archive.
        match fs::remove_dir_all(rootfs_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CradleError::CacheDirCreate {
                    path: rootfs_dir.to_path_buf(),
                    source: e,
                })
            }
        }

        fs::create_dir_all(rootfs_dir)
            .await
            .map_err(|e| CradleError::CacheDirCreate {
                path: rootfs_dir.to_path_buf(),
                source: e,
            })?;
        fs::set_permissions(rootfs_dir, std::fs::Permissions::from_mode(0o750))
            .await
            .map_err(|e| CradleError::CacheDirCreate {
                path: rootfs_dir.to_path_buf(),
                source: e,
            })?;

        self.extractor.extract(archive_path, rootfs_dir, cancel).await
    }
}
