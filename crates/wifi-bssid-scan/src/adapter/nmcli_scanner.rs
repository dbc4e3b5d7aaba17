//! Adapter that scans WiFi BSSIDs through NetworkManager's `nmcli` in terse
//! mode and parses its colon-delimited output.
//!
//! # Output format
//!
//! `nmcli -t -f SSID,BSSID,SIGNAL,CHAN dev wifi list` prints one access
//! point per line. Fields are separated by `:`; a literal colon inside a
//! field (every BSSID, and some SSIDs) is escaped as `\:`, and a literal
//! backslash as `\\`:
//!
//! ```text
//! HomeNet:AA\:BB\:CC\:DD\:EE\:FF:82:36
//! My\:Cafe:11\:22\:33\:44\:55\:66:40:6
//! :22\:22\:22\:22\:22\:22:17:11
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::bssid::BssidId;
use crate::domain::record::{NetworkRecord, ScanResult};
use crate::error::WifiScanError;
use crate::normalize::{parse_percent, parse_unsigned};
use crate::port::{CommandRunner, WlanScanPort};

const NMCLI: &str = "nmcli";

/// Budget for the best-effort rescan trigger.
const RESCAN_TIMEOUT: Duration = Duration::from_secs(10);

const LIST_ARGS: [&str; 6] = ["-t", "-f", "SSID,BSSID,SIGNAL,CHAN", "dev", "wifi", "list"];

// ---------------------------------------------------------------------------
// NmcliScanner
// ---------------------------------------------------------------------------

/// Scanner that asks NetworkManager for its access-point list.
pub struct NmcliScanner {
    runner: Arc<dyn CommandRunner>,
}

impl NmcliScanner {
    /// Create a scanner that runs `nmcli` through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Ask NetworkManager for a fresh scan.
    ///
    /// Usually needs elevated privileges; any failure is ignored because the
    /// list command still returns the last known results.
    async fn trigger_rescan(&self) {
        match self
            .runner
            .run(NMCLI, &["dev", "wifi", "rescan"], Some(RESCAN_TIMEOUT))
            .await
        {
            Ok(out) if !out.success => {
                tracing::debug!(status = %out.status, stderr = out.stderr.trim(), "nmcli rescan refused");
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("nmcli rescan skipped: {e}"),
        }
    }
}

#[async_trait]
impl WlanScanPort for NmcliScanner {
    fn name(&self) -> String {
        NMCLI.to_owned()
    }

    fn is_installed(&self) -> bool {
        self.runner.is_available(NMCLI)
    }

    async fn scan(&self) -> Result<ScanResult, WifiScanError> {
        self.trigger_rescan().await;
        let output = self
            .runner
            .run(NMCLI, &LIST_ARGS, None)
            .await?
            .into_success(NMCLI)?;
        parse_nmcli_terse_output(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse `nmcli -t -f SSID,BSSID,SIGNAL,CHAN dev wifi list` output.
///
/// Blank lines and lines with fewer than four fields are skipped. A
/// non-numeric signal or channel leaves just that field absent; a line whose
/// BSSID does not parse is dropped.
pub fn parse_nmcli_terse_output(output: &str) -> Result<ScanResult, WifiScanError> {
    let mut results = Vec::new();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_terse_fields(line);
        if fields.len() < 4 {
            tracing::debug!(line, "skipping short nmcli line");
            continue;
        }

        let Ok(bssid) = BssidId::parse(&fields[1]) else {
            tracing::debug!(bssid = %fields[1], "skipping nmcli line with unparseable BSSID");
            continue;
        };

        results.push(
            NetworkRecord::new(&fields[0], bssid)
                .with_signal(parse_percent(&fields[2]))
                .with_channel(parse_unsigned(&fields[3])),
        );
    }

    tracing::debug!(count = results.len(), "parsed nmcli output");
    Ok(results)
}

/// Split one terse line on unescaped colons, un-escaping `\:` and `\\`.
fn split_terse_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
