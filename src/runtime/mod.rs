//! External runtime lifecycle sequencing
//!
//! Drives a runc-compatible binary through a fixed delete-then-create
//! lifecycle for the single container identity. Delete is always
//! attempted first with `--force` so a leftover instance from a crashed
//! run never blocks creation; a "does not exist" outcome counts as
//! success. The driver's responsibility ends at launch confirmation.

use crate::error::{CradleError, CradleResult};
use crate::exec;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Drives the external runtime binary for one container identity.
pub struct RuntimeDriver {
    binary: PathBuf,
    id: String,
}

impl RuntimeDriver {
    pub fn new(binary: PathBuf, id: impl Into<String>) -> Self {
        Self {
            binary,
            id: id.into(),
        }
    }

    /// Query the runtime's version string (preflight check).
    pub async fn version(&self, cancel: &CancellationToken) -> CradleResult<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--version");

        let out = exec::run_captured(cmd, cancel).await?;
        if out.success {
            Ok(out.stdout.lines().next().unwrap_or_default().to_string())
        } else {
            Err(CradleError::command_exec(
                format!("{} --version", self.binary.display()),
                out.stderr,
            ))
        }
    }

    /// Ensure exactly one instance of the identity is running the bundle.
    ///
    /// Returns the container process id reported by the runtime.
    pub async fn launch(&self, bundle: &Path, cancel: &CancellationToken) -> CradleResult<u32> {
        self.delete(cancel).await?;
        self.create(bundle, cancel).await
    }

    /// Forcibly delete any stale instance of the identity.
    async fn delete(&self, cancel: &CancellationToken) -> CradleResult<()> {
        debug!("Deleting container {}", self.id);

        let mut cmd = Command::new(&self.binary);
        cmd.args(["delete", "--force", &self.id]);

        let out = exec::run_captured(cmd, cancel).await?;
        if out.success {
            info!("Container {} deleted", self.id);
            return Ok(());
        }

        // Nothing to delete is fine; anything else is a runtime anomaly.
        let stderr = out.stderr.trim().to_string();
        if stderr.contains("does not exist") || stderr.contains("not found") {
            debug!("Container {} not present, nothing to delete", self.id);
            Ok(())
        } else {
            Err(CradleError::RuntimeDelete {
                id: self.id.clone(),
                stderr,
            })
        }
    }

    /// Create a fresh instance against the bundle with standard streams
    /// attached to this process.
    async fn create(&self, bundle: &Path, cancel: &CancellationToken) -> CradleResult<u32> {
        info!("Creating container {}", self.id);

        let pid_file = bundle.join("pid");
        let _ = fs::remove_file(&pid_file).await;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("create")
            .arg("--pid-file")
            .arg(&pid_file)
            .arg(&self.id)
            .arg(bundle);

        let success = exec::run_attached(cmd, cancel).await?;
        if !success {
            return Err(CradleError::RuntimeCreate {
                id: self.id.clone(),
                stderr: "runtime create exited with non-zero status".to_string(),
            });
        }

        self.read_pid(&pid_file).await
    }

    async fn read_pid(&self, pid_file: &Path) -> CradleResult<u32> {
        let content = fs::read_to_string(pid_file)
            .await
            .map_err(|_| CradleError::RuntimePid(self.id.clone()))?;
        content
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|pid| *pid > 0)
            .ok_or_else(|| CradleError::RuntimePid(self.id.clone()))
    }
}
