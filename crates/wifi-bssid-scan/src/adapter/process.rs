//! [`CommandRunner`] backed by `tokio::process`.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::WifiScanError;
use crate::port::{CommandOutput, CommandRunner};

/// Runs scan tools as real subprocesses on the host.
///
/// Availability is resolved with `which`, so a missing tool is detected
/// without spawning anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, WifiScanError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program, ?args, ?timeout, "spawning scan tool");

        let pending = cmd.output();
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                WifiScanError::Timeout {
                    tool: program.to_owned(),
                    secs: limit.as_secs(),
                }
            })?,
            None => pending.await,
        };

        let output = result.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => WifiScanError::ToolMissing {
                tool: program.to_owned(),
            },
            _ => WifiScanError::ProcessError(format!("failed to run {program}: {e}")),
        })?;

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_tool_missing() {
        let runner = SystemCommandRunner::new();
        let name = "wifi-bssid-definitely-not-installed";
        assert!(!runner.is_available(name));
        let err = runner.run(name, &[], None).await.unwrap_err();
        assert!(matches!(err, WifiScanError::ToolMissing { .. }), "{err}");
        assert!(err.is_capability_failure());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_exit_status() {
        let runner = SystemCommandRunner::new();
        let out = runner.run("sh", &["-c", "echo hello; exit 3"], None).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.stdout.trim(), "hello");
        assert!(out.status.contains('3'), "{}", out.status);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_slow_process() {
        let runner = SystemCommandRunner::new();
        let err = runner
            .run("sleep", &["5"], Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, WifiScanError::Timeout { .. }), "{err}");
    }
}
