//! Domain types for BSSID scanning: identity, records, and the publish envelope.

pub mod bssid;
pub mod envelope;
pub mod record;

pub use bssid::BssidId;
pub use envelope::{Platform, PublishEnvelope};
pub use record::{normalize_ssid, sorted_by_signal, NetworkRecord, ScanResult, HIDDEN_SSID};
