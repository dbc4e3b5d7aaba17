//! Accumulator for multi-line, one-attribute-per-line scan dumps.
//!
//! `iwlist` and `netsh` both print a block of labelled lines per access
//! point. Each dialect classifies its lines into [`BlockEvent`]s and folds
//! them through a [`BlockAccumulator`]:
//!
//! ```text
//! lines ─▶ classify ─▶ BlockEvent* ─▶ fold(BlockAccumulator::step) ─▶ finish()
//! ```
//!
//! Two transitions emit a record: a second identifier inside the current
//! block (another access point under the same name) and end of input.

use crate::domain::bssid::BssidId;
use crate::domain::record::{NetworkRecord, ScanResult};
use crate::normalize::frequency_to_channel;

/// One recognised line (or part of a line) of a block-structured dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BlockEvent {
    /// A block marker. Carries the network name when the marker is a
    /// network header that applies to every access point beneath it.
    NewBlock { ssid: Option<String> },
    /// An access-point identifier line; `None` when the MAC did not parse.
    Identifier(Option<BssidId>),
    /// Network name for the current access point.
    Ssid(String),
    /// Signal quality already normalized to `[0, 100]`.
    Signal(u8),
    /// Raw RSSI in dBm.
    RssiDbm(i32),
    /// Channel number.
    Channel(u16),
    /// Centre frequency in MHz.
    Frequency(u32),
}

/// Fields gathered for the access point currently being read.
#[derive(Debug, Default)]
struct PartialRecord {
    ssid: Option<String>,
    bssid: Option<BssidId>,
    seen_identifier: bool,
    signal: Option<u8>,
    rssi_dbm: Option<i32>,
    channel: Option<u16>,
    frequency_mhz: Option<u32>,
}

impl PartialRecord {
    fn with_ssid(ssid: Option<String>) -> Self {
        Self {
            ssid,
            ..Default::default()
        }
    }

    /// Convert into a record; `None` when no BSSID was resolved.
    fn into_record(self) -> Option<NetworkRecord> {
        let bssid = self.bssid?;
        let channel = self
            .channel
            .or_else(|| self.frequency_mhz.and_then(frequency_to_channel));
        let mut record = NetworkRecord::new(self.ssid.as_deref().unwrap_or(""), bssid)
            .with_signal(self.signal)
            .with_channel(channel);
        record.rssi_dbm = self.rssi_dbm;
        record.frequency_mhz = self.frequency_mhz;
        Some(record)
    }
}

/// Fold state for block-structured parsing.
#[derive(Debug, Default)]
pub(crate) struct BlockAccumulator {
    /// Network name inherited by every access point under a header.
    context_ssid: Option<String>,
    current: Option<PartialRecord>,
    records: ScanResult,
}

impl BlockAccumulator {
    /// Apply one event and return the next state.
    pub(crate) fn step(mut self, event: BlockEvent) -> Self {
        match event {
            BlockEvent::NewBlock { ssid } => {
                self.flush();
                self.context_ssid = ssid;
                self.current = Some(PartialRecord::with_ssid(self.context_ssid.clone()));
            }
            BlockEvent::Identifier(bssid) => {
                let repeated = self.current.as_ref().is_some_and(|c| c.seen_identifier);
                if repeated || self.current.is_none() {
                    self.flush();
                    self.current = Some(PartialRecord::with_ssid(self.context_ssid.clone()));
                }
                if let Some(current) = self.current.as_mut() {
                    current.bssid = bssid;
                    current.seen_identifier = true;
                }
            }
            BlockEvent::Ssid(name) => {
                if let Some(current) = self.current.as_mut() {
                    current.ssid = Some(name);
                }
            }
            BlockEvent::Signal(pct) => {
                if let Some(current) = self.current.as_mut() {
                    current.signal = Some(pct);
                }
            }
            BlockEvent::RssiDbm(dbm) => {
                if let Some(current) = self.current.as_mut() {
                    current.rssi_dbm = Some(dbm);
                }
            }
            BlockEvent::Channel(ch) => {
                if let Some(current) = self.current.as_mut() {
                    current.channel = Some(ch);
                }
            }
            BlockEvent::Frequency(mhz) => {
                if let Some(current) = self.current.as_mut() {
                    current.frequency_mhz = Some(mhz);
                }
            }
        }
        self
    }

    /// Flush the final block and return all records in input order.
    pub(crate) fn finish(mut self) -> ScanResult {
        self.flush();
        self.records
    }

    fn flush(&mut self) {
        if let Some(record) = self.current.take().and_then(PartialRecord::into_record) {
            self.records.push(record);
        }
    }
}
