//! WalletSentry Cloud API Server
//!
//! REST API over the request analysis engine
//!
//! Usage:
//!   cargo run --bin sentry_api
//!
//! Environment:
//!   PORT / SENTRY_PORT - Server port (default: 8080)
//!   SENTRY_HOST        - Bind host (default: 0.0.0.0)
//!   SENTRY_DATA_DIR    - Intel snapshot directory (default: ./sentry_data)
//!   SENTRY_MODE        - Default protection mode (default: balanced)
//!   RUST_LOG           - Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use wallet_sentry::api::{create_router, handlers::AppState, start_cleanup_task};
use wallet_sentry::utils::{DEFAULT_API_PORT, REFRESH_JITTER_MAX_SECS, REFRESH_TICK_SECS};
use wallet_sentry::{
    FileSnapshotStore, HttpFeedFetch, SentryEngine, SentrySettings, SkippedSimulation,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let settings = SentrySettings::from_env();
    let data_dir =
        std::env::var("SENTRY_DATA_DIR").unwrap_or_else(|_| "./sentry_data".to_string());

    let engine = Arc::new(SentryEngine::new(
        HttpFeedFetch::new(),
        FileSnapshotStore::new(&data_dir),
        SkippedSimulation,
    ));

    // First refresh before serving. The persisted snapshot (or seed)
    // already answers queries while this runs.
    info!(
        "🛡️ Intel warming up (mode: {}, snapshots in {})",
        settings.mode.as_str(),
        data_dir
    );
    engine.refresh_intel(false).await;

    // Background scheduler: periodic staleness check with jitter so a
    // fleet of instances does not hit the feeds in lockstep
    let scheduler_engine = engine.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(REFRESH_TICK_SECS));
        interval.tick().await; // first tick fires immediately, skip it
        loop {
            interval.tick().await;
            let jitter = rand::thread_rng().gen_range(0..=REFRESH_JITTER_MAX_SECS);
            tokio::time::sleep(Duration::from_secs(jitter)).await;
            scheduler_engine.refresh_intel(false).await;
        }
    });

    // Background cleanup task for the rate limiter
    start_cleanup_task();

    let state = Arc::new(AppState::new(engine.clone(), settings));
    let app = create_router(state);

    let host = std::env::var("SENTRY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("SENTRY_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_API_PORT);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("🚀 WalletSentry API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/analyze        - Evaluate a wallet request");
    info!("  GET  /v1/intel/status   - Intel source health");
    info!("  POST /v1/intel/refresh  - Force an intel refresh");
    info!("  GET  /v1/health         - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");
    info!("");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");

    let stats = engine.get_stats();
    info!(
        "📊 Final stats: {} analyzed, {} warned, {} blocked",
        stats.analyzed, stats.warned, stats.blocked
    );

    info!("👋 WalletSentry API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║          W A L L E T   S E N T R Y           ║
    ║          C L O U D   A P I  v0.1.0           ║
    ║        Request Risk Analysis Engine          ║
    ╚══════════════════════════════════════════════╝
    "#
    );
}
