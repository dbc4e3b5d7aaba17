//! The normalized access-point observation shared by every platform parser.

use serde::{Deserialize, Serialize};

use super::bssid::BssidId;

/// Sentinel used in place of an empty or missing network name.
pub const HIDDEN_SSID: &str = "<Hidden>";

/// One complete scan: records in scan-tool order.
///
/// Duplicate BSSIDs reported by the tool are kept as separate entries.
pub type ScanResult = Vec<NetworkRecord>;

/// A single access point as observed by one scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Network name; never empty (hidden networks carry [`HIDDEN_SSID`]).
    pub ssid: String,
    /// Access-point MAC address.
    pub bssid: BssidId,
    /// Signal quality in `[0, 100]`, absent when the tool gave nothing usable.
    pub signal: Option<u8>,
    /// 802.11 channel number, absent when unknown.
    pub channel: Option<u16>,
    /// Raw RSSI in dBm, when the tool reports radio units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi_dbm: Option<i32>,
    /// Raw centre frequency in MHz, when the tool reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_mhz: Option<u32>,
}

impl NetworkRecord {
    /// Create a record with only its identity fields set.
    pub fn new(ssid: &str, bssid: BssidId) -> Self {
        Self {
            ssid: normalize_ssid(ssid),
            bssid,
            signal: None,
            channel: None,
            rssi_dbm: None,
            frequency_mhz: None,
        }
    }

    /// Set the signal quality, clamping it into `[0, 100]`.
    pub fn with_signal(mut self, signal: Option<u8>) -> Self {
        self.signal = signal.map(|s| s.min(100));
        self
    }

    /// Set the channel number.
    pub fn with_channel(mut self, channel: Option<u16>) -> Self {
        self.channel = channel;
        self
    }

    /// Signal used for ordering; an absent signal sorts as 0.
    pub fn signal_or_zero(&self) -> u8 {
        self.signal.unwrap_or(0)
    }
}

/// Replace an empty network name with [`HIDDEN_SSID`].
///
/// A name made only of spaces is a valid SSID and is kept as broadcast.
pub fn normalize_ssid(ssid: &str) -> String {
    if ssid.is_empty() {
        HIDDEN_SSID.to_owned()
    } else {
        ssid.to_owned()
    }
}

/// Return a copy of `records` sorted by descending signal.
///
/// The sort is stable, so equal signals keep scan order. The input is left
/// untouched.
pub fn sorted_by_signal(records: &[NetworkRecord]) -> Vec<&NetworkRecord> {
    let mut sorted: Vec<&NetworkRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.signal_or_zero().cmp(&a.signal_or_zero()));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(last: u8) -> BssidId {
        BssidId([0x02, 0, 0, 0, 0, last])
    }

    #[test]
    fn empty_ssid_becomes_hidden() {
        assert_eq!(NetworkRecord::new("", mac(1)).ssid, HIDDEN_SSID);
        assert_eq!(NetworkRecord::new("Cafe", mac(1)).ssid, "Cafe");
    }

    #[test]
    fn space_only_ssid_is_kept() {
        assert_eq!(NetworkRecord::new("   ", mac(1)).ssid, "   ");
        assert_eq!(NetworkRecord::new(" ", mac(2)).ssid, " ");
    }

    #[test]
    fn signal_is_clamped() {
        let rec = NetworkRecord::new("x", mac(1)).with_signal(Some(250));
        assert_eq!(rec.signal, Some(100));
    }

    #[test]
    fn absent_fields_serialize_as_null_and_extras_are_omitted() {
        let rec = NetworkRecord::new("Net", mac(7));
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["bssid"], "02:00:00:00:00:07");
        assert!(value["signal"].is_null());
        assert!(value["channel"].is_null());
        assert!(value.get("rssi_dbm").is_none());
        assert!(value.get("frequency_mhz").is_none());
    }

    #[test]
    fn sorted_by_signal_is_stable_and_non_mutating() {
        let records = vec![
            NetworkRecord::new("a", mac(1)).with_signal(Some(40)),
            NetworkRecord::new("b", mac(2)),
            NetworkRecord::new("c", mac(3)).with_signal(Some(90)),
            NetworkRecord::new("d", mac(4)).with_signal(Some(40)),
            NetworkRecord::new("e", mac(5)).with_signal(Some(0)),
        ];
        let order: Vec<&str> = sorted_by_signal(&records)
            .iter()
            .map(|r| r.ssid.as_str())
            .collect();
        assert_eq!(order, ["c", "a", "d", "b", "e"]);
        assert_eq!(records[0].ssid, "a");
    }
}
