//! The primary port (driving side) for WiFi BSSID scanning.

use async_trait::async_trait;

use crate::domain::record::ScanResult;
use crate::error::WifiScanError;

/// Port that abstracts one platform scanning capability.
///
/// Implementations include:
/// - [`crate::adapter::NmcliScanner`] -- NetworkManager terse output.
/// - [`crate::adapter::IwlistScanner`] -- wireless-tools cell blocks.
/// - [`crate::adapter::NetshScanner`] -- `netsh wlan` blocks (Windows).
/// - [`crate::adapter::TermuxScanner`] -- Termux:API JSON (Android).
#[async_trait]
pub trait WlanScanPort: Send + Sync {
    /// Short label used in logs and failure diagnostics (e.g. `"iwlist wlan0"`).
    fn name(&self) -> String;

    /// Whether the backing tool is installed on this host.
    fn is_installed(&self) -> bool;

    /// Perform a scan and return all currently visible access points.
    ///
    /// An empty result is a successful scan.
    async fn scan(&self) -> Result<ScanResult, WifiScanError>;
}
