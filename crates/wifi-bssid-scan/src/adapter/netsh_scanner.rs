//! Windows scan capability: `netsh wlan show networks mode=bssid`.
//!
//! netsh reports what the WLAN service has cached from its last background
//! scan, so results can lag a few seconds behind the air. Labels are
//! translated on non-English installs, so fields are recognised by key
//! fragments (`Signal`/`Intensit…`, `Channel`/`Canal`) instead of exact text.

use std::sync::Arc;

use async_trait::async_trait;

use super::cell_block::{BlockAccumulator, BlockEvent};
use crate::domain::bssid::BssidId;
use crate::domain::record::ScanResult;
use crate::error::WifiScanError;
use crate::normalize::{parse_percent, parse_unsigned};
use crate::port::{CommandRunner, WlanScanPort};

const NETSH: &str = "netsh";

// ---------------------------------------------------------------------------
// NetshScanner
// ---------------------------------------------------------------------------

/// Scanner that shells out to `netsh wlan show networks mode=bssid`.
///
/// # Platform
///
/// Windows only. Elsewhere [`is_installed`](WlanScanPort::is_installed) reports `false`.
pub struct NetshScanner {
    runner: Arc<dyn CommandRunner>,
}

impl NetshScanner {
    /// Create a scanner that runs `netsh` through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl WlanScanPort for NetshScanner {
    fn name(&self) -> String {
        NETSH.to_owned()
    }

    fn is_installed(&self) -> bool {
        self.runner.is_available(NETSH)
    }

    async fn scan(&self) -> Result<ScanResult, WifiScanError> {
        let output = self
            .runner
            .run(NETSH, &["wlan", "show", "networks", "mode=bssid"], None)
            .await?
            .into_success(NETSH)?;
        parse_netsh_output(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse the text output of `netsh wlan show networks mode=bssid`.
///
/// An `SSID n : name` header names every `BSSID n : mac` entry listed under
/// it, and each BSSID entry opens a new record. Anything that is not a
/// recognised `key : value` pair (the interface banner, counts, localised
/// notices) is ignored.
///
/// ```text
/// SSID 3 : Workshop
///     Authentication          : WPA3-Personal
///     BSSID 1                 : 5c:e9:31:0a:77:10
///          Signal             : 62%
///          Channel            : 100
/// ```
pub fn parse_netsh_output(output: &str) -> Result<ScanResult, WifiScanError> {
    let records = output
        .lines()
        .filter_map(classify_line)
        .fold(BlockAccumulator::default(), BlockAccumulator::step)
        .finish();

    tracing::debug!(count = records.len(), "parsed netsh output");
    Ok(records)
}

fn classify_line(line: &str) -> Option<BlockEvent> {
    let (key, value) = split_kv(line.trim())?;
    let upper = key.to_ascii_uppercase();

    if upper.starts_with("BSSID") {
        return Some(BlockEvent::Identifier(BssidId::parse(value).ok()));
    }
    if upper.starts_with("SSID") {
        return Some(BlockEvent::NewBlock {
            ssid: Some(value.to_owned()),
        });
    }

    let lower = key.to_lowercase();
    if lower.contains("signal") || lower.contains("intensit") {
        return parse_percent(value).map(BlockEvent::Signal);
    }
    if (lower.contains("channel") || lower.contains("canal")) && !lower.contains("utili") {
        return parse_unsigned(value).map(BlockEvent::Channel);
    }
    None
}

/// Break a `key : value` line at its first `" : "`.
///
/// MAC addresses and some SSIDs contain bare colons, so only the padded
/// separator counts. A header with nothing after `" :"` has an empty value.
fn split_kv(line: &str) -> Option<(&str, &str)> {
    match line.split_once(" : ") {
        Some((key, value)) => Some((key.trim(), value.trim())),
        None => line.strip_suffix(" :").map(|key| (key.trim(), "")),
    }
}
