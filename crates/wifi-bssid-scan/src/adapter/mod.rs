//! Adapter implementations for the crate's ports.
//!
//! Scan adapters ([`WlanScanPort`](crate::port::WlanScanPort)):
//! - [`NmcliScanner`]: NetworkManager terse output (Linux, preferred).
//! - [`IwlistScanner`]: wireless-tools `iwlist <iface> scan` (Linux fallback).
//! - [`NetshScanner`]: `netsh wlan show networks mode=bssid` (Windows).
//! - [`TermuxScanner`]: `termux-wifi-scaninfo` JSON (Android via Termux:API).
//!
//! Infrastructure adapters:
//! - [`SystemCommandRunner`]: runs the tools above as real subprocesses.
//! - [`MqttChannel`]: publishes envelopes to an MQTT broker (feature `mqtt`).

mod cell_block;
pub mod iwlist_scanner;
pub mod netsh_scanner;
pub mod nmcli_scanner;
pub mod process;
pub mod termux_scanner;

#[cfg(feature = "mqtt")]
pub mod mqtt_channel;

pub use iwlist_scanner::{parse_iwlist_output, IwlistScanner, DEFAULT_INTERFACES};
pub use netsh_scanner::{parse_netsh_output, NetshScanner};
pub use nmcli_scanner::{parse_nmcli_terse_output, NmcliScanner};
pub use process::SystemCommandRunner;
pub use termux_scanner::{parse_termux_scaninfo, TermuxScanner};

#[cfg(feature = "mqtt")]
pub use mqtt_channel::MqttChannel;
