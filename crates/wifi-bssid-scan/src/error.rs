//! Error types for the wifi-bssid-scan crate.

use thiserror::Error;

/// Errors that can occur while scanning, parsing, or publishing BSSIDs.
#[derive(Debug, Clone, Error)]
pub enum WifiScanError {
    /// Failed to parse a MAC address string (expected `aa:bb:cc:dd:ee:ff`).
    #[error("failed to parse MAC address from '{input}': expected aa:bb:cc:dd:ee:ff")]
    MacParseFailed {
        /// The input string that could not be parsed.
        input: String,
    },

    /// The external scan tool is not installed or not on `$PATH`.
    #[error("{tool} not found")]
    ToolMissing {
        /// Program name that was looked up.
        tool: String,
    },

    /// Failed to spawn or communicate with the scan subprocess.
    #[error("scan process error: {0}")]
    ProcessError(String),

    /// The scan tool ran but exited unsuccessfully.
    #[error("{tool} exited with {status}: {stderr}")]
    CommandFailed {
        /// Program name.
        tool: String,
        /// Human-readable exit status.
        status: String,
        /// Trimmed stderr of the process.
        stderr: String,
    },

    /// The scan tool did not finish within its time budget.
    #[error("{tool} timed out after {secs}s")]
    Timeout {
        /// Program name.
        tool: String,
        /// Timeout that elapsed, in seconds.
        secs: u64,
    },

    /// The tool reported an error object instead of scan data.
    #[error("{tool} reported an error: {message}")]
    ToolError {
        /// Program name.
        tool: String,
        /// Message carried by the tool's error object.
        message: String,
    },

    /// The tool's top-level output could not be parsed.
    #[error("scan output parse error: {0}")]
    ParseError(String),

    /// No candidate scanning tool is installed.
    #[error("no WiFi scanning tool available{}", format_attempts(.attempts))]
    NoCapability {
        /// One diagnostic line per candidate that was tried.
        attempts: Vec<String>,
    },

    /// At least one scanning tool is installed, but every installed one
    /// failed to produce a scan.
    #[error("WiFi scan failed{}", format_attempts(.attempts))]
    ScanFailed {
        /// One diagnostic line per candidate, carrying the tool's own error.
        attempts: Vec<String>,
    },

    /// The publish channel could not connect or deliver.
    #[error("publish channel error: {0}")]
    Publish(String),
}

impl WifiScanError {
    /// Whether this failure means the capability itself is unusable, so the
    /// scanner should fall through to the next candidate.
    ///
    /// Structural failures (`ToolError`, `ParseError`) return `false`: the
    /// tool ran and answered, the answer just was not a scan.
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            Self::ToolMissing { .. }
                | Self::ProcessError(_)
                | Self::CommandFailed { .. }
                | Self::Timeout { .. }
        )
    }
}

fn format_attempts(attempts: &[String]) -> String {
    if attempts.is_empty() {
        String::new()
    } else {
        format!(" ({})", attempts.join("; "))
    }
}
