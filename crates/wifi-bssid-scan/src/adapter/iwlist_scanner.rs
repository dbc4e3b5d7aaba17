//! Adapter that scans WiFi BSSIDs with the legacy wireless-tools
//! `iwlist <iface> scan` command.
//!
//! This is the Linux fallback when NetworkManager is absent. It needs root
//! on most distributions and an explicit interface name, so the scanner
//! facade tries it once per conventional interface name.
//!
//! # Output format
//!
//! ```text
//! wlan0     Scan completed :
//!           Cell 01 - Address: AA:BB:CC:DD:EE:FF
//!                     Channel:6
//!                     Frequency:2.437 GHz (Channel 6)
//!                     Quality=70/70  Signal level=-40 dBm
//!                     Encryption key:on
//!                     ESSID:"HomeNet"
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use super::cell_block::{BlockAccumulator, BlockEvent};
use crate::domain::bssid::BssidId;
use crate::domain::record::ScanResult;
use crate::error::WifiScanError;
use crate::normalize::{dbm_to_percent, parse_unsigned, percent_from_ratio};
use crate::port::{CommandRunner, WlanScanPort};

const IWLIST: &str = "iwlist";

/// Interface names tried in order when no interface is configured.
pub const DEFAULT_INTERFACES: [&str; 4] = ["wlan0", "wlp2s0", "wlp3s0", "wifi0"];

// ---------------------------------------------------------------------------
// IwlistScanner
// ---------------------------------------------------------------------------

/// Scanner bound to one wireless interface.
pub struct IwlistScanner {
    runner: Arc<dyn CommandRunner>,
    /// Wireless interface name (e.g. `"wlan0"`, `"wlp2s0"`).
    interface: String,
}

impl IwlistScanner {
    /// Create a scanner for `interface`.
    pub fn new(runner: Arc<dyn CommandRunner>, interface: impl Into<String>) -> Self {
        Self {
            runner,
            interface: interface.into(),
        }
    }
}

#[async_trait]
impl WlanScanPort for IwlistScanner {
    fn name(&self) -> String {
        format!("{IWLIST} {}", self.interface)
    }

    fn is_installed(&self) -> bool {
        self.runner.is_available(IWLIST)
    }

    async fn scan(&self) -> Result<ScanResult, WifiScanError> {
        let output = self
            .runner
            .run(IWLIST, &[self.interface.as_str(), "scan"], None)
            .await?
            .into_success(IWLIST)?;
        parse_iwlist_output(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse the text output of `iwlist <iface> scan`.
///
/// Every `Cell` line opens a new access point. Unknown lines are skipped.
pub fn parse_iwlist_output(output: &str) -> Result<ScanResult, WifiScanError> {
    let records = output
        .lines()
        .flat_map(classify_line)
        .fold(BlockAccumulator::default(), BlockAccumulator::step)
        .finish();

    tracing::debug!(count = records.len(), "parsed iwlist output");
    Ok(records)
}

fn classify_line(line: &str) -> Vec<BlockEvent> {
    let line = line.trim();

    if line.starts_with("Cell") {
        let mut events = vec![BlockEvent::NewBlock { ssid: None }];
        if let Some(rest) = value_after(line, "Address:") {
            events.push(BlockEvent::Identifier(parse_address(rest)));
        }
        return events;
    }

    if let Some(rest) = line.strip_prefix("Address:") {
        return vec![BlockEvent::Identifier(parse_address(rest))];
    }

    if let Some(rest) = value_after(line, "ESSID:") {
        return parse_essid(rest).map(BlockEvent::Ssid).into_iter().collect();
    }

    if let Some(rest) = line.strip_prefix("Channel:") {
        return parse_unsigned(rest).map(BlockEvent::Channel).into_iter().collect();
    }

    if let Some(rest) = line.strip_prefix("Frequency:") {
        return parse_frequency_mhz(rest)
            .map(BlockEvent::Frequency)
            .into_iter()
            .collect();
    }

    if let Some(rest) = value_after(line, "Signal level") {
        return parse_signal_level(rest);
    }

    Vec::new()
}

/// Return the text following the first occurrence of `label`.
fn value_after<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.find(label).map(|idx| &line[idx + label.len()..])
}

fn parse_address(rest: &str) -> Option<BssidId> {
    let mac = rest.split_whitespace().next()?;
    BssidId::parse(mac).ok()
}

/// Extract the quoted network name from `"HomeNet"`.
fn parse_essid(rest: &str) -> Option<String> {
    let start = rest.find('"')?;
    let end = rest.rfind('"')?;
    if end <= start {
        return None;
    }
    Some(rest[start + 1..end].to_owned())
}

/// Parse `2.437 GHz (Channel 6)` into MHz.
fn parse_frequency_mhz(rest: &str) -> Option<u32> {
    let mut parts = rest.split_whitespace();
    let value: f64 = parts.next()?.parse().ok()?;
    let scale = match parts.next() {
        Some(unit) if unit.eq_ignore_ascii_case("MHz") => 1.0,
        _ => 1000.0,
    };
    let mhz = (value * scale).round();
    (mhz > 0.0).then_some(mhz as u32)
}

/// Parse the part after `Signal level`, e.g. `=-40 dBm` or `:61/100`.
fn parse_signal_level(rest: &str) -> Vec<BlockEvent> {
    let rest = rest.trim_start_matches(['=', ':']).trim_start();
    let Some(token) = rest.split_whitespace().next() else {
        return Vec::new();
    };

    if rest.contains("dBm") {
        return match token.trim_end_matches("dBm").parse::<i32>() {
            Ok(dbm) => vec![BlockEvent::Signal(dbm_to_percent(dbm)), BlockEvent::RssiDbm(dbm)],
            Err(_) => Vec::new(),
        };
    }

    if let Some((num, den)) = token.split_once('/') {
        let pct = num
            .parse::<u32>()
            .ok()
            .zip(den.parse::<u32>().ok())
            .and_then(|(n, d)| percent_from_ratio(n, d));
        return pct.map(BlockEvent::Signal).into_iter().collect();
    }

    Vec::new()
}
