//! WalletSentry CLI
//!
//! Analyze one wallet-interaction request from a JSON file or stdin
//! and print the verdict.
//!
//! Usage:
//!   wallet_sentry [OPTIONS] [REQUEST_JSON_PATH]
//!
//! Options:
//!   --mode <off|relaxed|balanced|strict>   Protection mode for this run
//!   --offline                              Skip the intel refresh
//!
//! Environment:
//!   SENTRY_MODE     - Default protection mode
//!   SENTRY_DATA_DIR - Intel snapshot directory (default: ./sentry_data)

use std::io::Read;

use eyre::{eyre, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use wallet_sentry::{
    FileSnapshotStore, HttpFeedFetch, Mode, SentryEngine, SentrySettings, SkippedSimulation,
    WalletRequest,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the verdict
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut mode_override: Option<Mode> = None;
    let mut offline = false;
    let mut path: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mode" => {
                let value = args.next().ok_or_else(|| eyre!("--mode needs a value"))?;
                mode_override = Some(Mode::parse_lenient(&value));
            }
            "--offline" => offline = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other if other.starts_with('-') => {
                return Err(eyre!("Unknown flag: {} (try --help)", other));
            }
            other => path = Some(other.to_string()),
        }
    }

    print_banner();

    let raw = match &path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| eyre!("Cannot read {}: {}", path, e))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let request: WalletRequest =
        serde_json::from_str(&raw).map_err(|e| eyre!("Request JSON is invalid: {}", e))?;

    let mut settings = SentrySettings::from_env();
    if let Some(mode) = mode_override {
        settings.mode = mode;
    }

    let data_dir =
        std::env::var("SENTRY_DATA_DIR").unwrap_or_else(|_| "./sentry_data".to_string());
    let engine = SentryEngine::new(
        HttpFeedFetch::new(),
        FileSnapshotStore::new(&data_dir),
        SkippedSimulation,
    );

    if !offline {
        // Respects the TTL: a fresh snapshot skips the network entirely
        engine.refresh_intel(false).await;
    }

    let result = engine.analyze(&request, &settings).await;

    println!("{}", result.summary());
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn print_banner() {
    eprintln!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║          W A L L E T   S E N T R Y           ║
    ║        Request Risk Engine  v0.1.0           ║
    ╚══════════════════════════════════════════════╝
    "#
    );
}

fn print_usage() {
    println!("wallet_sentry [OPTIONS] [REQUEST_JSON_PATH]");
    println!();
    println!("Reads a wallet-interaction request as JSON from the given path");
    println!("(or stdin) and prints the verdict summary plus the full JSON result.");
    println!();
    println!("Options:");
    println!("  --mode <off|relaxed|balanced|strict>   Protection mode for this run");
    println!("  --offline                              Skip the intel refresh");
    println!();
    println!("Environment:");
    println!("  SENTRY_MODE     - Default protection mode");
    println!("  SENTRY_DATA_DIR - Intel snapshot directory (default: ./sentry_data)");
}
