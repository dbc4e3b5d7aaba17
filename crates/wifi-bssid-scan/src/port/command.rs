//! The driven port for running external scan tools.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::WifiScanError;

/// Captured result of one finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Human-readable exit status (e.g. `"exit status: 1"`).
    pub status: String,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

#[cfg(test)]
impl CommandOutput {
    /// A successful run that printed `stdout`.
    pub(crate) fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            status: "exit status: 0".to_owned(),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr.
    pub(crate) fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            status: format!("exit status: {code}"),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl CommandOutput {
    /// Turn a non-zero exit into [`WifiScanError::CommandFailed`].
    pub fn into_success(self, tool: &str) -> Result<Self, WifiScanError> {
        if self.success {
            Ok(self)
        } else {
            Err(WifiScanError::CommandFailed {
                tool: tool.to_owned(),
                status: self.status,
                stderr: self.stderr.trim().to_owned(),
            })
        }
    }
}

/// Port that runs an external program and captures its output.
///
/// Implementations include:
/// - [`crate::adapter::SystemCommandRunner`] -- `tokio::process` on the host.
/// - Scripted fakes in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Whether `program` can be found on this host.
    fn is_available(&self, program: &str) -> bool;

    /// Run `program args...` to completion.
    ///
    /// With `timeout` set, a process still running after the deadline is
    /// killed and [`WifiScanError::Timeout`] is returned. A non-zero exit is
    /// reported through [`CommandOutput::success`], not as an error.
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, WifiScanError>;
}
