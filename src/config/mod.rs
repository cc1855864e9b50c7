//! Configuration management for cradle

pub mod schema;

pub use schema::Config;

use crate::assets::{AssetNames, DirAssetStore};
use crate::error::{CradleError, CradleResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the config file path this manager reads from
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cradle")
            .join("config.toml")
    }

    /// Get the per-user cache directory path
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cradle")
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> CradleResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            CradleError::io(
                format!("reading config from {}", self.config_path.display()),
                e,
            )
        })?;

        toml::from_str(&content).map_err(|e| CradleError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> CradleResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CradleError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CradleError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Host architectures the bundled assets cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    Arm64,
}

impl Arch {
    /// Detect from the compile-time target architecture
    pub fn detect() -> CradleResult<Self> {
        match std::env::consts::ARCH {
            "x86_64" => Ok(Self::Amd64),
            "aarch64" => Ok(Self::Arm64),
            other => Err(CradleError::UnsupportedArch(other.to_string())),
        }
    }

    /// Asset-name tag for this architecture
    pub fn tag(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

/// Everything the launch pipeline needs, resolved once at startup.
///
/// Core components take this by reference instead of doing ambient
/// lookups (current user, environment, working directory) themselves.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    /// Effective uid of the invoking user
    pub uid: u32,
    /// Effective gid of the invoking user
    pub gid: u32,
    /// True when not running as the superuser
    pub rootless: bool,
    /// Host architecture tag
    pub arch: Arch,
    /// Per-user cache directory (exclusively owned by this tool)
    pub cache_dir: PathBuf,
    /// Assets directory for the production store
    pub assets_dir: PathBuf,
    /// Externally provided runtime binary, if any
    pub runtime_binary: Option<PathBuf>,
    /// Hostname for the container
    pub hostname: String,
    /// Asset names for this architecture
    pub assets: AssetNames,
}

impl LaunchContext {
    /// Resolve the context from config plus command-line overrides.
    pub fn resolve(
        config: &Config,
        cache_dir: Option<PathBuf>,
        assets_dir: Option<PathBuf>,
        runtime_binary: Option<PathBuf>,
    ) -> CradleResult<Self> {
        let arch = Arch::detect()?;

        // geteuid/getegid cannot fail
        let uid = unsafe { libc::geteuid() };
        let gid = unsafe { libc::getegid() };

        let cache_dir = cache_dir
            .or_else(|| config.runtime.cache_dir.clone())
            .unwrap_or_else(ConfigManager::default_cache_dir);
        let assets_dir = assets_dir
            .or_else(|| config.runtime.assets_dir.clone())
            .unwrap_or_else(DirAssetStore::default_root);
        let runtime_binary = runtime_binary.or_else(|| config.runtime.binary.clone());

        Ok(Self {
            uid,
            gid,
            rootless: uid != 0,
            arch,
            cache_dir,
            assets_dir,
            runtime_binary,
            hostname: config.process.hostname.clone(),
            assets: AssetNames::for_arch(arch),
        })
    }

    /// Path of the checksum record beside the cache root
    pub fn digest_record_path(&self) -> PathBuf {
        self.cache_dir.join("rootfs.sha256")
    }

    /// Bundle directory under the cache
    pub fn bundle_dir(&self) -> PathBuf {
        self.cache_dir.join("bundle")
    }

    /// Where the bundled runtime binary gets installed
    pub fn installed_runtime_path(&self) -> PathBuf {
        self.cache_dir.join("bin").join("runc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn arch_tags() {
        assert_eq!(Arch::Amd64.tag(), "amd64");
        assert_eq!(Arch::Arm64.tag(), "arm64");
    }

    #[test]
    fn context_prefers_explicit_overrides() {
        let mut config = Config::default();
        config.runtime.cache_dir = Some(PathBuf::from("/from/config"));

        let ctx = LaunchContext::resolve(
            &config,
            Some(PathBuf::from("/from/flag")),
            None,
            Some(PathBuf::from("/usr/bin/runc")),
        )
        .unwrap();

        assert_eq!(ctx.cache_dir, PathBuf::from("/from/flag"));
        assert_eq!(ctx.runtime_binary, Some(PathBuf::from("/usr/bin/runc")));
        assert_eq!(ctx.bundle_dir(), PathBuf::from("/from/flag/bundle"));
        assert_eq!(
            ctx.digest_record_path(),
            PathBuf::from("/from/flag/rootfs.sha256")
        );
    }

    #[test]
    fn context_falls_back_to_config() {
        let mut config = Config::default();
        config.runtime.cache_dir = Some(PathBuf::from("/from/config"));

        let ctx = LaunchContext::resolve(&config, None, None, None).unwrap();
        assert_eq!(ctx.cache_dir, PathBuf::from("/from/config"));
        assert!(ctx.runtime_binary.is_none());
    }

    #[test]
    fn rootless_tracks_euid() {
        let ctx = LaunchContext::resolve(&Config::default(), None, None, None).unwrap();
        let uid = unsafe { libc::geteuid() };
        assert_eq!(ctx.uid, uid);
        assert_eq!(ctx.rootless, uid != 0);
    }

    #[tokio::test]
    async fn manager_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));
        let config = manager.load().await.unwrap();
        assert_eq!(config.process.command, vec!["sleep", "3"]);
    }

    #[tokio::test]
    async fn manager_save_then_load() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.toml"));

        let mut config = Config::default();
        config.process.command = vec!["id".to_string()];
        manager.save(&config).await.unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.process.command, vec!["id"]);
    }

    #[tokio::test]
    async fn manager_invalid_toml_is_config_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let manager = ConfigManager::with_path(path);
        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, CradleError::ConfigInvalid { .. }));
    }
}
