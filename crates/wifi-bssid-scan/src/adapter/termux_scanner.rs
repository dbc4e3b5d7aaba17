//! Adapter that scans WiFi BSSIDs on Android through the Termux:API bridge
//! (`termux-wifi-scaninfo`).
//!
//! The bridge prints a JSON array of access points:
//!
//! ```json
//! [{"bssid":"aa:bb:cc:dd:ee:ff","frequency_mhz":2437,"rssi":-52,"ssid":"HomeNet","timestamp":1234}]
//! ```
//!
//! When the Termux:API app lacks the location permission it prints an error
//! object (`{"API_ERROR": ...}` or `{"error": ...}`) instead; that is a
//! failed scan, not an empty one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::bssid::BssidId;
use crate::domain::record::{NetworkRecord, ScanResult};
use crate::error::WifiScanError;
use crate::normalize::{dbm_to_percent, frequency_to_channel};
use crate::port::{CommandRunner, WlanScanPort};

const TERMUX_SCANINFO: &str = "termux-wifi-scaninfo";

/// The bridge round-trips through an Android service; give it time.
const SCAN_TIMEOUT: Duration = Duration::from_secs(30);

/// RSSI assumed when an entry carries none, so quality normalizes to 0.
const MISSING_RSSI_DBM: i32 = -100;

// ---------------------------------------------------------------------------
// TermuxScanner
// ---------------------------------------------------------------------------

/// Scanner backed by `termux-wifi-scaninfo`.
pub struct TermuxScanner {
    runner: Arc<dyn CommandRunner>,
}

impl TermuxScanner {
    /// Create a scanner that runs the Termux:API helper through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl WlanScanPort for TermuxScanner {
    fn name(&self) -> String {
        TERMUX_SCANINFO.to_owned()
    }

    fn is_installed(&self) -> bool {
        self.runner.is_available(TERMUX_SCANINFO)
    }

    async fn scan(&self) -> Result<ScanResult, WifiScanError> {
        let output = self
            .runner
            .run(TERMUX_SCANINFO, &[], Some(SCAN_TIMEOUT))
            .await?
            .into_success(TERMUX_SCANINFO)?;
        parse_termux_scaninfo(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse the JSON printed by `termux-wifi-scaninfo`.
///
/// Each array element is read field by field: a missing or mistyped field
/// is absent on that record only, and an element without a usable `bssid`
/// is dropped. Blank output is an empty scan.
///
/// # Errors
///
/// - [`WifiScanError::ToolError`] when the top-level value is an object.
/// - [`WifiScanError::ParseError`] when the output is not JSON or is neither
///   an array nor an object.
pub fn parse_termux_scaninfo(output: &str) -> Result<ScanResult, WifiScanError> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(output)
        .map_err(|e| WifiScanError::ParseError(format!("failed to parse scan results: {e}")))?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(obj) => {
            return Err(WifiScanError::ToolError {
                tool: TERMUX_SCANINFO.to_owned(),
                message: error_message(&obj),
            })
        }
        other => {
            return Err(WifiScanError::ParseError(format!(
                "expected a JSON array of access points, got {other}"
            )))
        }
    };

    let records: ScanResult = entries.iter().filter_map(parse_entry).collect();
    tracing::debug!(
        count = records.len(),
        dropped = entries.len() - records.len(),
        "parsed termux scaninfo"
    );
    Ok(records)
}

fn parse_entry(entry: &Value) -> Option<NetworkRecord> {
    let obj = entry.as_object()?;
    let bssid = BssidId::parse(obj.get("bssid")?.as_str()?).ok()?;

    let ssid = obj.get("ssid").and_then(Value::as_str).unwrap_or("");
    let rssi_dbm = obj
        .get("rssi")
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok());
    let frequency_mhz = obj
        .get("frequency_mhz")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok());

    let mut record = NetworkRecord::new(ssid, bssid)
        .with_signal(Some(dbm_to_percent(rssi_dbm.unwrap_or(MISSING_RSSI_DBM))))
        .with_channel(frequency_mhz.and_then(frequency_to_channel));
    record.rssi_dbm = rssi_dbm;
    record.frequency_mhz = frequency_mhz;
    Some(record)
}

/// Pull a human-readable message out of an error object.
fn error_message(obj: &Map<String, Value>) -> String {
    ["error", "API_ERROR", "message"]
        .iter()
        .find_map(|key| obj.get(*key))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| Value::Object(obj.clone()).to_string())
}
