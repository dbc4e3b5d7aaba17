//! # wifi-bssid-scan
//!
//! Multi-platform WiFi BSSID scanning.
//!
//! Scanning itself is delegated to the platform's own tool; this crate
//! invokes the right one, parses its output into one canonical record shape,
//! and drives single-shot or continuous scan/publish cycles:
//!
//! - **Domain types**: [`BssidId`], [`NetworkRecord`], [`PublishEnvelope`], [`Platform`]
//! - **Normalizers**: [`normalize`] -- dBm/ratio to percent, frequency to channel
//! - **Ports**: [`WlanScanPort`], [`CommandRunner`], [`PublishChannel`]
//! - **Adapters**: [`NmcliScanner`], [`IwlistScanner`], [`NetshScanner`],
//!   [`TermuxScanner`], [`SystemCommandRunner`], and `MqttChannel`
//!   (feature `mqtt`)
//! - **Facade**: [`Scanner`] -- first usable tool wins, with fallback
//! - **Output**: [`presenter`] tables and the [`PublishLoop`]
//!
//! ```no_run
//! use std::sync::Arc;
//! use wifi_bssid_scan::{presenter, Platform, Scanner, SystemCommandRunner};
//!
//! # async fn demo() -> Result<(), wifi_bssid_scan::WifiScanError> {
//! let scanner = Scanner::for_platform(Platform::detect(), Arc::new(SystemCommandRunner::new()));
//! let records = scanner.scan().await?;
//! println!("{}", presenter::render_table(&records));
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod port;
pub mod presenter;
pub mod publish;
pub mod scanner;

// Re-export key types at the crate root for convenience.
pub use adapter::{
    parse_iwlist_output, parse_netsh_output, parse_nmcli_terse_output, parse_termux_scaninfo,
    IwlistScanner, NetshScanner, NmcliScanner, SystemCommandRunner, TermuxScanner,
};
pub use domain::{BssidId, NetworkRecord, Platform, PublishEnvelope, ScanResult, HIDDEN_SSID};
pub use error::WifiScanError;
pub use port::{CommandOutput, CommandRunner, PublishChannel, Qos, WlanScanPort};
pub use publish::{LoopReport, PublishConfig, PublishLoop};
pub use scanner::Scanner;

#[cfg(feature = "mqtt")]
pub use adapter::MqttChannel;
