//! WiFi BSSID scanner entry point.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wifi_bssid_cli::Cli;
use wifi_bssid_scan::{
    presenter, MqttChannel, Platform, PublishEnvelope, PublishLoop, Scanner, SystemCommandRunner,
    WifiScanError,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the table, JSON and publish summaries.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let platform = cli.platform();
    let scanner = Scanner::for_platform(platform, Arc::new(SystemCommandRunner::new()));
    tracing::debug!(%platform, candidates = ?scanner.candidate_names(), "scanner ready");

    if !scanner.has_capability() {
        report_error(&format!(
            "no WiFi scanning tool found for {platform} (tried: {})",
            scanner.candidate_names().join(", ")
        ));
        return Ok(ExitCode::FAILURE);
    }

    if cli.mqtt {
        run_publish(&cli, scanner).await
    } else {
        scan_once(&cli, &scanner).await
    }
}

async fn scan_once(cli: &Cli, scanner: &Scanner) -> anyhow::Result<ExitCode> {
    if !cli.json {
        println!("Scanning for WiFi networks...");
    }

    let records = match scanner.scan().await {
        Ok(records) => records,
        Err(e) => {
            report_error(&e.to_string());
            if let Some(hint) = privilege_hint(scanner.platform(), &e) {
                eprintln!("{hint}");
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.json {
        let envelope = PublishEnvelope::new(scanner.platform(), records);
        let json = serde_json::to_string_pretty(&envelope).context("failed to encode scan")?;
        println!("{json}");
    } else {
        println!("\n{}", presenter::render_table(&records));
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_publish(cli: &Cli, scanner: Scanner) -> anyhow::Result<ExitCode> {
    let config = cli.publish_config();

    println!("Connecting to {}:{}...", config.broker, config.port);
    let channel = match MqttChannel::connect(&config).await {
        Ok(channel) => channel,
        Err(e) => {
            report_error(&format!("failed to connect: {e}"));
            return Ok(ExitCode::FAILURE);
        }
    };
    println!(
        "{} {}",
        "Connected to MQTT broker:".green(),
        config.broker
    );

    let once = config.once;
    let mut publish_loop = PublishLoop::new(scanner, channel, config);
    let report = publish_loop.run(shutdown_signal()).await;

    if once && !report.is_clean() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Resolves on Ctrl+C. Never resolves when the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
}

fn report_error(message: &str) {
    eprintln!("{} {message}", "Error:".red().bold());
}

/// Suggest elevated privileges when a Linux tool was refused.
fn privilege_hint(platform: Platform, err: &WifiScanError) -> Option<&'static str> {
    let text = err.to_string().to_lowercase();
    let refused = text.contains("not permitted") || text.contains("permission denied");
    (platform == Platform::Linux && refused)
        .then_some("Scanning with iwlist usually needs root. Try running with: sudo wifi-bssid")
}
