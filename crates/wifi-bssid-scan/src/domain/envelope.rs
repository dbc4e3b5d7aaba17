//! Publish envelope and the platform identity stamped into it.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::record::ScanResult;
use crate::error::WifiScanError;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// The host platform a scan was produced on.
///
/// Serialized as the `device` field of a [`PublishEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Desktop/server Linux (NetworkManager or wireless-tools).
    #[serde(rename = "linux")]
    Linux,
    /// Windows (`netsh`).
    #[serde(rename = "windows")]
    Windows,
    /// Android via the Termux:API bridge.
    #[serde(rename = "android-termux")]
    AndroidTermux,
}

impl Platform {
    /// Detect the platform of the running process.
    pub fn detect() -> Self {
        Self::detect_with(
            cfg!(target_os = "windows"),
            std::env::var("TERMUX_VERSION").ok(),
            std::env::var("PREFIX").ok(),
        )
    }

    /// Platform detection from explicit inputs.
    ///
    /// Termux is recognised by its `TERMUX_VERSION` variable or by a
    /// `PREFIX` inside the `com.termux` app directory.
    pub fn detect_with(
        is_windows: bool,
        termux_version: Option<String>,
        prefix: Option<String>,
    ) -> Self {
        if is_windows {
            return Self::Windows;
        }
        let in_termux = termux_version.is_some()
            || prefix.is_some_and(|p| p.contains("com.termux"));
        if in_termux {
            Self::AndroidTermux
        } else {
            Self::Linux
        }
    }

    /// The device identifier used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::AndroidTermux => "android-termux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PublishEnvelope
// ---------------------------------------------------------------------------

/// One cycle's outbound payload.
///
/// Built fresh for every cycle and serialized immediately; it has no
/// mutating methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishEnvelope {
    /// UTC capture time, ISO-8601 with seconds precision.
    #[serde(with = "iso_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Platform that produced the scan.
    pub device: Platform,
    /// Number of entries in `networks`.
    pub count: usize,
    /// The scan itself, in scan-tool order.
    pub networks: ScanResult,
}

impl PublishEnvelope {
    /// Wrap a scan taken now.
    pub fn new(device: Platform, networks: ScanResult) -> Self {
        Self::at(Utc::now(), device, networks)
    }

    /// Wrap a scan taken at `timestamp` (sub-second precision is dropped).
    pub fn at(timestamp: DateTime<Utc>, device: Platform, networks: ScanResult) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(0),
            device,
            count: networks.len(),
            networks,
        }
    }

    /// Encode as the JSON document published on the wire.
    pub fn to_json(&self) -> Result<String, WifiScanError> {
        serde_json::to_string(self)
            .map_err(|e| WifiScanError::Publish(format!("failed to encode envelope: {e}")))
    }
}

mod iso_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
