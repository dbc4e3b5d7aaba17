//! WiFi BSSID scanner CLI
//!
//! Scans nearby access points with the platform's own tool and either prints
//! them once or publishes them to an MQTT broker on a fixed interval.
//!
//! # Usage
//!
//! ```bash
//! # Scan once and print a table
//! wifi-bssid
//!
//! # Scan once and print the publish envelope as JSON
//! wifi-bssid --json
//!
//! # Publish every 10 seconds to a local broker
//! wifi-bssid --mqtt -b localhost -i 10
//!
//! # Publish a single scan to a custom topic
//! wifi-bssid --mqtt -t home/wifi/bssids --once
//! ```

use std::time::Duration;

use clap::{Parser, ValueEnum};
use wifi_bssid_scan::publish::{DEFAULT_BROKER, DEFAULT_PORT, DEFAULT_TOPIC};
use wifi_bssid_scan::{Platform, PublishConfig};

/// WiFi BSSID scanner with optional MQTT publishing
#[derive(Parser, Debug)]
#[command(name = "wifi-bssid")]
#[command(author, version, about = "Scan WiFi BSSIDs and optionally publish them over MQTT")]
pub struct Cli {
    /// Publish scans to an MQTT broker instead of printing a table
    #[arg(long)]
    pub mqtt: bool,

    /// MQTT broker host
    #[arg(short, long, default_value = DEFAULT_BROKER)]
    pub broker: String,

    /// MQTT broker port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// MQTT topic
    #[arg(short, long, default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// Seconds between scans in publish mode
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Publish a single scan, then exit
    #[arg(short, long)]
    pub once: bool,

    /// Scan backend to use instead of detecting the host platform
    #[arg(long, value_enum, default_value_t = PlatformArg::Auto)]
    pub platform: PlatformArg,

    /// Print the scan as a JSON envelope instead of a table
    #[arg(long, conflicts_with = "mqtt")]
    pub json: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The platform whose tools will be used.
    pub fn platform(&self) -> Platform {
        self.platform.resolve()
    }

    /// Publish settings taken from the command line.
    pub fn publish_config(&self) -> PublishConfig {
        PublishConfig {
            broker: self.broker.clone(),
            port: self.port,
            topic: self.topic.clone(),
            interval: Duration::from_secs(self.interval),
            once: self.once,
            ..PublishConfig::default()
        }
    }
}

/// Platform selection on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    /// Detect from the running host
    Auto,
    /// nmcli, falling back to iwlist
    Linux,
    /// netsh
    Windows,
    /// termux-wifi-scaninfo (Android)
    Termux,
}

impl PlatformArg {
    /// Map to a concrete platform, detecting the host for `Auto`.
    pub fn resolve(self) -> Platform {
        match self {
            Self::Auto => Platform::detect(),
            Self::Linux => Platform::Linux,
            Self::Windows => Platform::Windows,
            Self::Termux => Platform::AndroidTermux,
        }
    }
}
