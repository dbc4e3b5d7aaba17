//! Scan/publish cycle: scan, wrap in a [`PublishEnvelope`], hand it to a
//! [`PublishChannel`], print a short summary, wait, repeat.
//!
//! ```text
//!   ┌──────── once ────────┐
//!   │                      ▼
//! cycle ──▶ wait(interval) ──▶ cycle ...      shutdown ──▶ disconnect
//! ```
//!
//! A failed scan is reported and the loop carries on with its fixed interval.
//! The channel is disconnected exactly once on every exit path, including
//! a shutdown that lands in the middle of a cycle.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use crate::domain::envelope::PublishEnvelope;
use crate::error::WifiScanError;
use crate::port::{PublishChannel, Qos};
use crate::presenter::{render_summary, SUMMARY_LIMIT};
use crate::scanner::Scanner;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default public broker.
pub const DEFAULT_BROKER: &str = "test.mosquitto.org";
/// Default MQTT port.
pub const DEFAULT_PORT: u16 = 1883;
/// Default publish topic.
pub const DEFAULT_TOPIC: &str = "geoloc/wifi/bssids";
/// Default wait between cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Publish settings, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    /// Broker host name or address.
    pub broker: String,
    /// Broker TCP port.
    pub port: u16,
    /// Topic every envelope is published on.
    pub topic: String,
    /// Wait between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Run a single cycle, then stop.
    pub once: bool,
    /// MQTT client identifier.
    pub client_id: String,
    /// MQTT keep-alive period.
    pub keep_alive: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            broker: DEFAULT_BROKER.to_owned(),
            port: DEFAULT_PORT,
            topic: DEFAULT_TOPIC.to_owned(),
            interval: DEFAULT_INTERVAL,
            once: false,
            client_id: format!("wifi-bssid-{}", std::process::id()),
            keep_alive: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// PublishLoop
// ---------------------------------------------------------------------------

/// Counters describing a finished loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Cycles started (an interrupted cycle counts).
    pub cycles: u64,
    /// Cycles whose envelope was handed to the channel.
    pub published: u64,
    /// Cycles that failed to scan or to publish.
    pub failed: u64,
}

impl LoopReport {
    /// `true` when no cycle failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Drives scan/publish cycles against a connected channel.
pub struct PublishLoop<C: PublishChannel> {
    scanner: Scanner,
    channel: C,
    config: PublishConfig,
    console: Box<dyn Write + Send>,
}

impl<C: PublishChannel> PublishLoop<C> {
    /// Create a loop that prints progress to stdout.
    pub fn new(scanner: Scanner, channel: C, config: PublishConfig) -> Self {
        Self {
            scanner,
            channel,
            config,
            console: Box::new(std::io::stdout()),
        }
    }

    /// Send progress lines to `console` instead of stdout.
    pub fn with_console(mut self, console: Box<dyn Write + Send>) -> Self {
        self.console = console;
        self
    }

    /// The channel this loop publishes on.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Run cycles until `shutdown` resolves (or after one cycle in
    /// single-shot mode), then disconnect the channel.
    pub async fn run<F: Future>(&mut self, shutdown: F) -> LoopReport {
        tokio::pin!(shutdown);
        let mut report = LoopReport::default();

        let interrupted = loop {
            let interrupted = tokio::select! {
                _ = &mut shutdown => true,
                () = self.cycle(&mut report) => false,
            };
            if interrupted {
                break true;
            }
            if self.config.once {
                break false;
            }

            self.say(&format!(
                "\nNext scan in {}s... (Ctrl+C to stop)",
                self.config.interval.as_secs()
            ));
            let interrupted = tokio::select! {
                _ = &mut shutdown => true,
                () = tokio::time::sleep(self.config.interval) => false,
            };
            if interrupted {
                break true;
            }
        };

        if interrupted {
            tracing::info!("shutdown requested");
            self.say("\nStopping...");
        }

        match self.channel.disconnect().await {
            Ok(()) => self.say("Disconnected"),
            Err(e) => tracing::warn!("disconnect failed: {e}"),
        }

        tracing::info!(
            cycles = report.cycles,
            published = report.published,
            failed = report.failed,
            "publish loop finished"
        );
        report
    }

    async fn cycle(&mut self, report: &mut LoopReport) {
        report.cycles += 1;
        self.say("\nScanning for WiFi networks...");

        let networks = match self.scanner.scan().await {
            Ok(networks) => networks,
            Err(e) => {
                tracing::warn!(cycle = report.cycles, "scan failed: {e}");
                self.say(&format!("Scan error: {e}"));
                report.failed += 1;
                return;
            }
        };

        let envelope = PublishEnvelope::new(self.scanner.platform(), networks);
        match self.publish(&envelope).await {
            Ok(()) => {
                report.published += 1;
                self.say(&format!(
                    "Published {} networks to: {}",
                    envelope.count, self.config.topic
                ));
                let summary = render_summary(&envelope.networks, SUMMARY_LIMIT);
                if !summary.is_empty() {
                    self.say(&summary);
                }
            }
            Err(e) => {
                tracing::warn!(cycle = report.cycles, "publish failed: {e}");
                self.say(&format!("Publish error: {e}"));
                report.failed += 1;
            }
        }
    }

    async fn publish(&mut self, envelope: &PublishEnvelope) -> Result<(), WifiScanError> {
        let payload = envelope.to_json()?;
        self.channel
            .publish(&self.config.topic, payload.into_bytes(), Qos::AtLeastOnce)
            .await
    }

    fn say(&mut self, line: &str) {
        // Console output is best effort; a closed stdout must not stop publishing.
        let _ = writeln!(self.console, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::bssid::BssidId;
    use crate::domain::envelope::Platform;
    use crate::domain::record::{NetworkRecord, ScanResult};
    use crate::port::WlanScanPort;

    // -- doubles ---------------------------------------------------------------

    /// Scan port that returns a fixed result after an optional delay.
    struct FixedPort {
        result: Result<ScanResult, WifiScanError>,
        delay: Duration,
    }

    #[async_trait]
    impl WlanScanPort for FixedPort {
        fn name(&self) -> String {
            "fixed".into()
        }

        fn is_installed(&self) -> bool {
            true
        }

        async fn scan(&self) -> Result<ScanResult, WifiScanError> {
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct RecordingChannel {
        published: Vec<(String, Vec<u8>, Qos)>,
        disconnects: usize,
        fail_publish: bool,
    }

    #[async_trait]
    impl PublishChannel for RecordingChannel {
        async fn publish(
            &mut self,
            topic: &str,
            payload: Vec<u8>,
            qos: Qos,
        ) -> Result<(), WifiScanError> {
            if self.fail_publish {
                return Err(WifiScanError::Publish("broker went away".into()));
            }
            self.published.push((topic.to_owned(), payload, qos));
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), WifiScanError> {
            self.disconnects += 1;
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    // -- helpers ---------------------------------------------------------------

    fn networks(n: u8) -> ScanResult {
        (1..=n)
            .map(|i| {
                NetworkRecord::new(&format!("net{i}"), BssidId([0x02, 0, 0, 0, 0, i]))
                    .with_signal(Some(i * 10))
            })
            .collect()
    }

    fn build(
        result: Result<ScanResult, WifiScanError>,
        delay: Duration,
        channel: RecordingChannel,
        once: bool,
    ) -> (PublishLoop<RecordingChannel>, SharedBuf) {
        let scanner = Scanner::new(
            Platform::Linux,
            vec![Box::new(FixedPort { result, delay })],
        );
        let config = PublishConfig {
            once,
            ..PublishConfig::default()
        };
        let console = SharedBuf::default();
        let publish_loop =
            PublishLoop::new(scanner, channel, config).with_console(Box::new(console.clone()));
        (publish_loop, console)
    }

    // -- tests -----------------------------------------------------------------

    #[test]
    fn config_defaults() {
        let config = PublishConfig::default();
        assert_eq!(config.broker, "test.mosquitto.org");
        assert_eq!(config.port, 1883);
        assert_eq!(config.topic, "geoloc/wifi/bssids");
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(!config.once);
        assert!(config.client_id.starts_with("wifi-bssid-"));
    }

    #[tokio::test(start_paused = true)]
    async fn single_shot_publishes_once_and_disconnects() {
        let (mut publish_loop, console) =
            build(Ok(networks(7)), Duration::ZERO, RecordingChannel::default(), true);

        let report = publish_loop.run(std::future::pending::<()>()).await;
        assert_eq!(
            report,
            LoopReport {
                cycles: 1,
                published: 1,
                failed: 0
            }
        );
        assert!(report.is_clean());

        let channel = publish_loop.channel();
        assert_eq!(channel.disconnects, 1);
        assert_eq!(channel.published.len(), 1);

        let (topic, payload, qos) = &channel.published[0];
        assert_eq!(topic, DEFAULT_TOPIC);
        assert_eq!(*qos, Qos::AtLeastOnce);
        let envelope: PublishEnvelope = serde_json::from_slice(payload).unwrap();
        assert_eq!(envelope.device, Platform::Linux);
        assert_eq!(envelope.count, 7);
        // Published in scan order, not display order.
        assert_eq!(envelope.networks[0].ssid, "net1");

        let out = console.text();
        assert!(out.contains("Published 7 networks to: geoloc/wifi/bssids"), "{out}");
        assert!(out.contains("  net7: 02:00:00:00:00:07 (70%)"), "{out}");
        assert!(out.contains("  ... and 2 more"), "{out}");
        assert!(out.ends_with("Disconnected\n"), "{out}");
    }

    #[tokio::test(start_paused = true)]
    async fn scan_failure_is_reported_and_counted() {
        let (mut publish_loop, console) = build(
            Err(WifiScanError::NoCapability { attempts: vec![] }),
            Duration::ZERO,
            RecordingChannel::default(),
            true,
        );

        let report = publish_loop.run(std::future::pending::<()>()).await;
        assert_eq!(report.failed, 1);
        assert!(!report.is_clean());
        assert!(publish_loop.channel().published.is_empty());
        assert_eq!(publish_loop.channel().disconnects, 1);
        assert!(console
            .text()
            .contains("Scan error: no WiFi scanning tool available"));
    }

    #[tokio::test(start_paused = true)]
    async fn continuous_mode_runs_until_shutdown() {
        let (mut publish_loop, console) =
            build(Ok(networks(1)), Duration::ZERO, RecordingChannel::default(), false);

        // Cycles start at t=0, 5 and 10; shutdown lands during the third wait.
        let report = publish_loop
            .run(tokio::time::sleep(Duration::from_secs(12)))
            .await;
        assert_eq!(report.cycles, 3);
        assert_eq!(report.published, 3);
        assert_eq!(publish_loop.channel().disconnects, 1);

        let out = console.text();
        assert!(out.contains("Next scan in 5s... (Ctrl+C to stop)"), "{out}");
        assert!(out.contains("Stopping..."), "{out}");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_scans_do_not_stop_the_loop() {
        let (mut publish_loop, _) = build(
            Err(WifiScanError::ParseError("garbage".into())),
            Duration::ZERO,
            RecordingChannel::default(),
            false,
        );

        let report = publish_loop
            .run(tokio::time::sleep(Duration::from_secs(7)))
            .await;
        assert_eq!(report.cycles, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(publish_loop.channel().disconnects, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_cycle_still_disconnects() {
        let (mut publish_loop, _) = build(
            Ok(networks(1)),
            Duration::from_secs(60),
            RecordingChannel::default(),
            true,
        );

        let report = publish_loop
            .run(tokio::time::sleep(Duration::from_secs(1)))
            .await;
        assert_eq!(report.cycles, 1);
        assert_eq!(report.published, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(publish_loop.channel().disconnects, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_failure_counts_as_failed_cycle() {
        let channel = RecordingChannel {
            fail_publish: true,
            ..RecordingChannel::default()
        };
        let (mut publish_loop, console) = build(Ok(networks(2)), Duration::ZERO, channel, true);

        let report = publish_loop.run(std::future::pending::<()>()).await;
        assert_eq!(report.published, 0);
        assert_eq!(report.failed, 1);
        assert!(console.text().contains("Publish error: publish channel error: broker went away"));
    }
}
