//! Bundled asset access
//!
//! The launcher ships with three architecture-qualified payloads: the
//! runtime binary, the compressed root filesystem archive, and the
//! archive's digest record. Core logic only consumes the [`AssetStore`]
//! contract; the production store reads from a directory shipped next to
//! the executable.

use crate::config::Arch;
use crate::error::{CradleError, CradleResult};
use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Asset names for one architecture, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AssetNames {
    /// The runc-compatible runtime binary.
    pub runtime: String,
    /// The compressed root filesystem archive.
    pub rootfs_archive: String,
    /// Digest record for the archive.
    pub rootfs_digest: String,
}

impl AssetNames {
    pub fn for_arch(arch: Arch) -> Self {
        let tag = arch.tag();
        Self {
            runtime: format!("runc.{tag}"),
            rootfs_archive: format!("rootfs.{tag}.tar.zst"),
            rootfs_digest: format!("rootfs.{tag}.tar.zst.sha256"),
        }
    }
}

/// Opaque provider of named byte payloads.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Read the full payload of a named asset.
    async fn read_all(&self, name: &str) -> CradleResult<Vec<u8>>;

    /// Write a named asset to `dest` with the given permission bits.
    async fn materialize(&self, name: &str, dest: &Path, mode: u32) -> CradleResult<()>;
}

/// Asset store backed by a directory on disk.
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Default assets directory: `assets/` next to the executable.
    pub fn default_root() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("assets")
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl AssetStore for DirAssetStore {
    async fn read_all(&self, name: &str) -> CradleResult<Vec<u8>> {
        let path = self.path_of(name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CradleError::AssetNotFound(name.to_string()))
            }
            Err(e) => Err(CradleError::AssetRead {
                name: name.to_string(),
                source: e,
            }),
        }
    }

    async fn materialize(&self, name: &str, dest: &Path, mode: u32) -> CradleResult<()> {
        let bytes = self.read_all(name).await?;
        debug!("Materializing asset {} -> {}", name, dest.display());

        fs::write(dest, &bytes)
            .await
            .map_err(|e| CradleError::AssetWrite {
                name: name.to_string(),
                dest: dest.to_path_buf(),
                source: e,
            })?;

        fs::set_permissions(dest, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|e| CradleError::AssetWrite {
                name: name.to_string(),
                dest: dest.to_path_buf(),
                source: e,
            })
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory asset store for unit tests.

    use super::*;
    use std::collections::HashMap;

    pub struct MemAssetStore {
        assets: HashMap<String, Vec<u8>>,
    }

    impl MemAssetStore {
        pub fn new(entries: &[(&str, &[u8])]) -> Self {
            Self {
                assets: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_vec()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl AssetStore for MemAssetStore {
        async fn read_all(&self, name: &str) -> CradleResult<Vec<u8>> {
            self.assets
                .get(name)
                .cloned()
                .ok_or_else(|| CradleError::AssetNotFound(name.to_string()))
        }

        async fn materialize(&self, name: &str, dest: &Path, mode: u32) -> CradleResult<()> {
            let bytes = self.read_all(name).await?;
            fs::write(dest, &bytes)
                .await
                .map_err(|e| CradleError::AssetWrite {
                    name: name.to_string(),
                    dest: dest.to_path_buf(),
                    source: e,
                })?;
            fs::set_permissions(dest, std::fs::Permissions::from_mode(mode))
                .await
                .map_err(|e| CradleError::AssetWrite {
                    name: name.to_string(),
                    dest: dest.to_path_buf(),
                    source: e,
                })
        }
    }
}
