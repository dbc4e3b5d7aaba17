//! Signal-strength and frequency normalizers.
//!
//! Every platform parser maps its raw radio units through these functions so
//! that records from different tools are directly comparable. They are total:
//! out-of-range input clamps or yields `None`, never an error.

/// RSSI at or above which quality is reported as 100%.
pub const RSSI_EXCELLENT_DBM: i32 = -30;

/// RSSI at or below which quality is reported as 0%.
pub const RSSI_UNUSABLE_DBM: i32 = -90;

/// Convert an RSSI in dBm to a signal quality in `[0, 100]`.
///
/// Linear between -90 dBm (0%) and -30 dBm (100%), truncated toward zero.
pub fn dbm_to_percent(rssi_dbm: i32) -> u8 {
    if rssi_dbm >= RSSI_EXCELLENT_DBM {
        100
    } else if rssi_dbm <= RSSI_UNUSABLE_DBM {
        0
    } else {
        let span = RSSI_EXCELLENT_DBM - RSSI_UNUSABLE_DBM;
        (100 * (rssi_dbm - RSSI_UNUSABLE_DBM) / span) as u8
    }
}

/// Convert a `numerator/denominator` quality ratio (e.g. `"45/70"`) to a
/// rounded percentage in `[0, 100]`.
///
/// Returns `None` for a zero denominator.
pub fn percent_from_ratio(numerator: u32, denominator: u32) -> Option<u8> {
    if denominator == 0 {
        return None;
    }
    let (n, d) = (u64::from(numerator), u64::from(denominator));
    // round(100 * n / d), halves rounded up.
    let pct = (200 * n + d) / (2 * d);
    Some(pct.min(100) as u8)
}

/// Convert a centre frequency in MHz to an 802.11 channel number.
///
/// Covers 2.4 GHz (1-14), 5 GHz (34-165) and 6 GHz (1-233). Frequencies
/// outside these bands return `None`.
pub fn frequency_to_channel(freq_mhz: u32) -> Option<u16> {
    let channel = match freq_mhz {
        2484 => 14,
        2412..=2483 => (freq_mhz - 2412) / 5 + 1,
        5170..=5825 => (freq_mhz - 5170) / 5 + 34,
        5955..=7115 => (freq_mhz - 5955) / 5 + 1,
        _ => return None,
    };
    Some(channel as u16)
}

/// Parse a quality value that is already a percentage, such as `"84"` or
/// `"84%"`. Values above 100 are clamped.
pub fn parse_percent(s: &str) -> Option<u8> {
    let digits = s.trim().trim_end_matches('%').trim_end();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    Some(value.min(100) as u8)
}

/// Parse a non-negative integer field such as a channel number.
pub fn parse_unsigned(s: &str) -> Option<u16> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
