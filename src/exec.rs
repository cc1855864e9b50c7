//! Cancellable external-process invocation
//!
//! Every external call (archive extraction, runtime delete/create) goes
//! through these helpers so that Ctrl-C terminates the child process and
//! the caller sees a structured result instead of raw process plumbing.

use crate::error::{CradleError, CradleResult};
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Structured outcome of an external command.
#[derive(Debug)]
pub struct ExecOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command to completion with stdout/stderr captured.
///
/// Cancellation kills the child and returns `CradleError::Cancelled`.
pub async fn run_captured(mut cmd: Command, cancel: &CancellationToken) -> CradleResult<ExecOutput> {
    let label = command_label(&cmd);
    debug!("Executing: {}", label);

    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CradleError::command_failed(label.clone(), e))?;

    // Dropping the wait future on cancellation kills the child (kill_on_drop).
    tokio::select! {
        result = child.wait_with_output() => {
            let output = result.map_err(|e| CradleError::command_failed(label, e))?;
            Ok(ExecOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
        _ = cancel.cancelled() => {
            debug!("Cancelled: {}", label);
            Err(CradleError::Cancelled)
        }
    }
}

/// Run a command with standard streams inherited from this process.
///
/// Used for runtime `create`, where the container's stdio should land on
/// the caller's terminal. Returns the exit success flag.
pub async fn run_attached(mut cmd: Command, cancel: &CancellationToken) -> CradleResult<bool> {
    let label = command_label(&cmd);
    debug!("Executing (attached): {}", label);

    let mut child = cmd
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CradleError::command_failed(label.clone(), e))?;

    let waited = tokio::select! {
        result = child.wait() => Some(result),
        _ = cancel.cancelled() => None,
    };

    match waited {
        Some(result) => {
            let status = result.map_err(|e| CradleError::command_failed(label, e))?;
            Ok(status.success())
        }
        None => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            debug!("Cancelled: {}", label);
            Err(CradleError::Cancelled)
        }
    }
}

fn command_label(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    let mut label = std_cmd.get_program().to_string_lossy().to_string();
    for arg in std_cmd.get_args() {
        label.push(' ');
        label.push_str(&arg.to_string_lossy());
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_status() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo hello"]);
        let out = run_captured(cmd, &CancellationToken::new()).await.unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn captures_stderr_on_failure() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo oops >&2; exit 3"]);
        let out = run_captured(cmd, &CancellationToken::new()).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn cancellation_kills_child() {
        let token = CancellationToken::new();
        token.cancel();
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let err = run_captured(cmd, &token).await.unwrap_err();
        assert!(matches!(err, CradleError::Cancelled));
    }

    #[tokio::test]
    async fn missing_binary_is_command_failed() {
        let cmd = Command::new("/nonexistent/cradle-test-binary");
        let err = run_captured(cmd, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CradleError::CommandFailed { .. }));
    }
}
