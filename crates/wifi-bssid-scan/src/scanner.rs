//! Scanner facade: picks the first usable platform capability and returns
//! one unified [`ScanResult`].
//!
//! Candidates are tried in a fixed priority order. The first successful scan
//! wins, even when it is empty. A capability failure (tool missing, spawn
//! error, non-zero exit, timeout) falls through to the next candidate; a
//! structural failure (the tool answered with something that is not a scan)
//! is returned immediately. Once the candidates are exhausted, a missing
//! toolset and an installed tool that failed are reported differently.

use std::sync::Arc;

use crate::adapter::{IwlistScanner, NetshScanner, NmcliScanner, TermuxScanner, DEFAULT_INTERFACES};
use crate::domain::envelope::Platform;
use crate::domain::record::ScanResult;
use crate::error::WifiScanError;
use crate::port::{CommandRunner, WlanScanPort};

/// Ordered list of scan capabilities for one platform.
pub struct Scanner {
    platform: Platform,
    candidates: Vec<Box<dyn WlanScanPort>>,
}

impl Scanner {
    /// Build a scanner from an explicit candidate list, highest priority first.
    pub fn new(platform: Platform, candidates: Vec<Box<dyn WlanScanPort>>) -> Self {
        Self {
            platform,
            candidates,
        }
    }

    /// Build the standard candidate list for `platform`.
    ///
    /// - Linux: `nmcli`, then `iwlist` on each of [`DEFAULT_INTERFACES`].
    /// - Windows: `netsh`.
    /// - Android (Termux): `termux-wifi-scaninfo`.
    pub fn for_platform(platform: Platform, runner: Arc<dyn CommandRunner>) -> Self {
        let candidates: Vec<Box<dyn WlanScanPort>> = match platform {
            Platform::Linux => std::iter::once(
                Box::new(NmcliScanner::new(Arc::clone(&runner))) as Box<dyn WlanScanPort>
            )
            .chain(DEFAULT_INTERFACES.iter().map(|iface| {
                Box::new(IwlistScanner::new(Arc::clone(&runner), *iface)) as Box<dyn WlanScanPort>
            }))
            .collect(),
            Platform::Windows => vec![Box::new(NetshScanner::new(runner))],
            Platform::AndroidTermux => vec![Box::new(TermuxScanner::new(runner))],
        };
        Self::new(platform, candidates)
    }

    /// The platform this scanner was built for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Names of the candidates, in priority order.
    pub fn candidate_names(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.name()).collect()
    }

    /// Whether at least one candidate's tool is installed.
    pub fn has_capability(&self) -> bool {
        self.candidates.iter().any(|c| c.is_installed())
    }

    /// Run one scan cycle.
    ///
    /// # Errors
    ///
    /// - [`WifiScanError::NoCapability`] when no candidate is installed.
    /// - [`WifiScanError::ScanFailed`] when at least one candidate is
    ///   installed but none produced a scan; `attempts` carries one
    ///   diagnostic per candidate, including the tool's own error text.
    /// - A structural failure ([`WifiScanError::ToolError`],
    ///   [`WifiScanError::ParseError`]) as soon as one occurs.
    pub async fn scan(&self) -> Result<ScanResult, WifiScanError> {
        let mut attempts = Vec::new();
        let mut any_installed = false;

        for candidate in &self.candidates {
            let name = candidate.name();
            if !candidate.is_installed() {
                tracing::debug!(candidate = %name, "scan tool not installed");
                attempts.push(format!("{name}: not installed"));
                continue;
            }
            any_installed = true;

            match candidate.scan().await {
                Ok(records) => {
                    tracing::debug!(candidate = %name, count = records.len(), "scan complete");
                    return Ok(records);
                }
                Err(e) if e.is_capability_failure() => {
                    tracing::warn!(candidate = %name, "scan failed, trying next candidate: {e}");
                    attempts.push(format!("{name}: {e}"));
                }
                Err(e) => return Err(e),
            }
        }

        if any_installed {
            Err(WifiScanError::ScanFailed { attempts })
        } else {
            Err(WifiScanError::NoCapability { attempts })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::port::CommandOutput;

    /// Scripted [`CommandRunner`]: responses are keyed by the full command
    /// line; every invocation is recorded with the timeout it was given.
    #[derive(Default)]
    struct FakeRunner {
        installed: Vec<&'static str>,
        responses: HashMap<String, Result<CommandOutput, WifiScanError>>,
        calls: Mutex<Vec<(String, Option<Duration>)>>,
    }

    impl FakeRunner {
        fn installed(mut self, program: &'static str) -> Self {
            self.installed.push(program);
            self
        }

        fn respond(mut self, cmdline: &str, result: Result<CommandOutput, WifiScanError>) -> Self {
            self.responses.insert(cmdline.to_owned(), result);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.invocations().into_iter().map(|(cmdline, _)| cmdline).collect()
        }

        fn invocations(&self) -> Vec<(String, Option<Duration>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        fn is_available(&self, program: &str) -> bool {
            self.installed.contains(&program)
        }

        async fn run(
            &self,
            program: &str,
            args: &[&str],
            timeout: Option<Duration>,
        ) -> Result<CommandOutput, WifiScanError> {
            let cmdline = std::iter::once(program)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls.lock().unwrap().push((cmdline.clone(), timeout));
            self.responses
                .get(&cmdline)
                .cloned()
                .unwrap_or_else(|| Ok(CommandOutput::failed(1, "no such device")))
        }
    }

    const NMCLI_LIST: &str = "nmcli -t -f SSID,BSSID,SIGNAL,CHAN dev wifi list";

    fn build(platform: Platform, runner: FakeRunner) -> (Scanner, Arc<FakeRunner>) {
        let runner = Arc::new(runner);
        (Scanner::for_platform(platform, runner.clone()), runner)
    }

    #[test]
    fn linux_candidate_order() {
        let (scanner, _) = build(Platform::Linux, FakeRunner::default());
        assert_eq!(
            scanner.candidate_names(),
            ["nmcli", "iwlist wlan0", "iwlist wlp2s0", "iwlist wlp3s0", "iwlist wifi0"]
        );
        assert_eq!(scanner.platform(), Platform::Linux);
    }

    #[tokio::test]
    async fn nmcli_success_short_circuits() {
        let runner = FakeRunner::default()
            .installed("nmcli")
            .installed("iwlist")
            .respond(
                NMCLI_LIST,
                Ok(CommandOutput::ok("Home:aa\\:bb\\:cc\\:dd\\:ee\\:ff:70:6\n")),
            );
        let (scanner, runner) = build(Platform::Linux, runner);

        let records = scanner.scan().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ssid, "Home");

        // Rescan trigger first (its failure is ignored), then the list.
        assert_eq!(runner.calls(), ["nmcli dev wifi rescan", NMCLI_LIST]);
    }

    #[tokio::test]
    async fn empty_scan_is_success_not_fallthrough() {
        let runner = FakeRunner::default()
            .installed("nmcli")
            .installed("iwlist")
            .respond(NMCLI_LIST, Ok(CommandOutput::ok("")));
        let (scanner, runner) = build(Platform::Linux, runner);

        assert!(scanner.scan().await.unwrap().is_empty());
        assert!(!runner.calls().iter().any(|c| c.starts_with("iwlist")));
    }

    #[tokio::test]
    async fn falls_back_through_iwlist_interfaces() {
        let runner = FakeRunner::default()
            .installed("nmcli")
            .installed("iwlist")
            .respond(NMCLI_LIST, Ok(CommandOutput::failed(10, "NetworkManager is not running")))
            .respond(
                "iwlist wlp2s0 scan",
                Ok(CommandOutput::ok(
                    "wlp2s0  Scan completed :\n  Cell 01 - Address: 01:02:03:04:05:06\n    ESSID:\"Lab\"\n",
                )),
            );
        let (scanner, runner) = build(Platform::Linux, runner);

        let records = scanner.scan().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ssid, "Lab");
        assert_eq!(
            runner.calls(),
            ["nmcli dev wifi rescan", NMCLI_LIST, "iwlist wlan0 scan", "iwlist wlp2s0 scan"]
        );
    }

    #[tokio::test]
    async fn nothing_installed_is_no_capability() {
        let (scanner, runner) = build(Platform::Linux, FakeRunner::default());
        assert!(!scanner.has_capability());

        match scanner.scan().await.unwrap_err() {
            WifiScanError::NoCapability { attempts } => {
                assert_eq!(attempts.len(), 5);
                assert_eq!(attempts[0], "nmcli: not installed");
            }
            other => panic!("expected NoCapability, got {other:?}"),
        }
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn installed_tool_that_fails_is_a_scan_failure() {
        let runner = FakeRunner::default()
            .installed("netsh")
            .respond(
                "netsh wlan show networks mode=bssid",
                Ok(CommandOutput::failed(1, "The Wireless AutoConfig Service (wlansvc) is not running.")),
            );
        let (scanner, _) = build(Platform::Windows, runner);
        assert!(scanner.has_capability());

        let err = scanner.scan().await.unwrap_err();
        assert!(err.to_string().starts_with("WiFi scan failed"), "{err}");
        match err {
            WifiScanError::ScanFailed { attempts } => {
                assert_eq!(attempts.len(), 1);
                assert!(attempts[0].starts_with("netsh: netsh exited with"), "{}", attempts[0]);
                assert!(attempts[0].contains("wlansvc"));
            }
            other => panic!("expected ScanFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_and_failing_candidates_mix_into_a_scan_failure() {
        let runner = FakeRunner::default().installed("iwlist");
        let (scanner, runner) = build(Platform::Linux, runner);

        match scanner.scan().await.unwrap_err() {
            WifiScanError::ScanFailed { attempts } => {
                assert_eq!(attempts.len(), 5);
                assert_eq!(attempts[0], "nmcli: not installed");
                assert!(attempts[1].starts_with("iwlist wlan0: iwlist exited with"), "{}", attempts[1]);
                assert!(attempts[4].contains("no such device"));
            }
            other => panic!("expected ScanFailed, got {other:?}"),
        }
        assert_eq!(runner.calls().len(), 4);
    }

    #[tokio::test]
    async fn structural_failure_is_not_masked_by_fallback() {
        let runner = FakeRunner::default()
            .installed("termux-wifi-scaninfo")
            .respond(
                "termux-wifi-scaninfo",
                Ok(CommandOutput::ok(r#"{"error": "permission denied"}"#)),
            );
        let (scanner, _) = build(Platform::AndroidTermux, runner);

        let err = scanner.scan().await.unwrap_err();
        assert!(matches!(err, WifiScanError::ToolError { .. }), "{err}");
    }

    #[tokio::test]
    async fn timeout_falls_through() {
        let runner = FakeRunner::default()
            .installed("nmcli")
            .installed("iwlist")
            .respond(
                NMCLI_LIST,
                Err(WifiScanError::Timeout { tool: "nmcli".into(), secs: 10 }),
            )
            .respond(
                "iwlist wlan0 scan",
                Ok(CommandOutput::ok("  Cell 01 - Address: 0a:0b:0c:0d:0e:0f\n")),
            );
        let (scanner, _) = build(Platform::Linux, runner);

        let records = scanner.scan().await.unwrap();
        assert_eq!(records[0].bssid.to_string(), "0a:0b:0c:0d:0e:0f");
    }

    #[tokio::test]
    async fn nmcli_rescan_is_bounded_but_list_is_not() {
        let runner = FakeRunner::default()
            .installed("nmcli")
            .respond(NMCLI_LIST, Ok(CommandOutput::ok("")));
        let (scanner, runner) = build(Platform::Linux, runner);

        scanner.scan().await.unwrap();
        assert_eq!(
            runner.invocations(),
            [
                ("nmcli dev wifi rescan".to_owned(), Some(Duration::from_secs(10))),
                (NMCLI_LIST.to_owned(), None),
            ]
        );
    }

    #[tokio::test]
    async fn rescan_timeout_still_returns_the_list() {
        let runner = FakeRunner::default()
            .installed("nmcli")
            .respond(
                "nmcli dev wifi rescan",
                Err(WifiScanError::Timeout { tool: "nmcli".into(), secs: 10 }),
            )
            .respond(
                NMCLI_LIST,
                Ok(CommandOutput::ok("Attic:12\\:34\\:56\\:78\\:9a\\:bc:41:11\n")),
            );
        let (scanner, runner) = build(Platform::Linux, runner);

        let records = scanner.scan().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ssid, "Attic");
        assert_eq!(records[0].bssid.to_string(), "12:34:56:78:9a:bc");
        assert_eq!(runner.calls(), ["nmcli dev wifi rescan", NMCLI_LIST]);
    }

    #[tokio::test]
    async fn iwlist_and_netsh_run_without_a_timeout() {
        let (linux, runner) = build(Platform::Linux, FakeRunner::default().installed("iwlist"));
        linux.scan().await.unwrap_err();
        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 4);
        assert!(invocations.iter().all(|(_, timeout)| timeout.is_none()), "{invocations:?}");

        let (windows, runner) = build(Platform::Windows, FakeRunner::default().installed("netsh"));
        windows.scan().await.unwrap_err();
        assert_eq!(
            runner.invocations(),
            [("netsh wlan show networks mode=bssid".to_owned(), None)]
        );
    }

    #[tokio::test]
    async fn termux_scan_is_bounded_to_thirty_seconds() {
        let runner = FakeRunner::default()
            .installed("termux-wifi-scaninfo")
            .respond("termux-wifi-scaninfo", Ok(CommandOutput::ok("[]")));
        let (scanner, runner) = build(Platform::AndroidTermux, runner);

        assert!(scanner.scan().await.unwrap().is_empty());
        assert_eq!(
            runner.invocations(),
            [("termux-wifi-scaninfo".to_owned(), Some(Duration::from_secs(30)))]
        );
    }
}
