//! Console rendering of scan results.
//!
//! Both renderers return text and leave printing to the caller. They sort a
//! borrowed view of the records by descending signal; the [`ScanResult`]
//! itself is never reordered, so the same scan can still be published in
//! tool order.

use tabled::{settings::Style, Table, Tabled};

use crate::domain::record::{sorted_by_signal, NetworkRecord};

/// Longest network name shown before truncation.
pub const SSID_DISPLAY_WIDTH: usize = 31;

/// Number of entries listed by the publish-loop summary.
pub const SUMMARY_LIMIT: usize = 5;

const NOT_AVAILABLE: &str = "N/A";
const NO_FREQUENCY: &str = "--";

/// Display row for the scan table.
#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "SSID")]
    ssid: String,
    #[tabled(rename = "BSSID")]
    bssid: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Ch")]
    channel: String,
    #[tabled(rename = "Freq")]
    frequency: String,
}

impl From<&NetworkRecord> for NetworkRow {
    fn from(rec: &NetworkRecord) -> Self {
        Self {
            ssid: truncate_ssid(&rec.ssid),
            bssid: rec.bssid.to_string(),
            signal: format_signal(rec.signal),
            channel: rec
                .channel
                .map_or_else(|| NOT_AVAILABLE.to_owned(), |c| c.to_string()),
            frequency: rec
                .frequency_mhz
                .map_or_else(|| NO_FREQUENCY.to_owned(), |f| format!("{f} MHz")),
        }
    }
}

/// Render `records` as an aligned table, strongest signal first, followed by
/// a `Total:` line.
pub fn render_table(records: &[NetworkRecord]) -> String {
    if records.is_empty() {
        return "No WiFi networks found.".to_owned();
    }

    let rows: Vec<NetworkRow> = sorted_by_signal(records)
        .into_iter()
        .map(NetworkRow::from)
        .collect();
    let table = Table::new(rows).with(Style::blank()).to_string();

    format!("{table}\n\nTotal: {} access point(s)", records.len())
}

/// Render the top `limit` records as `  <ssid>: <bssid> (<signal>)` lines,
/// plus an `... and K more` line when records were left out.
pub fn render_summary(records: &[NetworkRecord], limit: usize) -> String {
    let sorted = sorted_by_signal(records);
    let mut lines: Vec<String> = sorted
        .iter()
        .take(limit)
        .map(|rec| format!("  {}: {} ({})", rec.ssid, rec.bssid, format_signal(rec.signal)))
        .collect();

    let rest = sorted.len().saturating_sub(limit);
    if rest > 0 {
        lines.push(format!("  ... and {rest} more"));
    }
    lines.join("\n")
}

fn format_signal(signal: Option<u8>) -> String {
    signal.map_or_else(|| NOT_AVAILABLE.to_owned(), |s| format!("{s}%"))
}

fn truncate_ssid(ssid: &str) -> String {
    ssid.chars().take(SSID_DISPLAY_WIDTH).collect()
}
