//! Request Verdict Demo
//!
//! Walks a gallery of wallet-interaction requests through the analysis
//! engine and prints each verdict. Runs entirely on the bundled seed
//! data, so no network access is needed.
//!
//! Run with: cargo run --example verdict_demo

use serde_json::json;
use std::time::Instant;

use wallet_sentry::{
    HttpFeedFetch, MemorySnapshotStore, Mode, SentryEngine, SentrySettings, SkippedSimulation,
    WalletRequest,
};

fn request(value: serde_json::Value) -> WalletRequest {
    serde_json::from_value(value).unwrap()
}

#[tokio::main]
async fn main() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════════════════╗
    ║                                                              ║
    ║   🛡️ REQUEST VERDICT DEMO                                    ║
    ║   Evaluates wallet requests against the built-in seed data   ║
    ║                                                              ║
    ╚══════════════════════════════════════════════════════════════╝
    "#
    );

    // Seed-only engine: no refresh is ever triggered, so the demo is
    // deterministic and fully offline
    let engine = SentryEngine::new(
        HttpFeedFetch::new(),
        MemorySnapshotStore::new(),
        SkippedSimulation,
    );
    let settings = SentrySettings::default();

    println!("🔬 Configuration:");
    println!("   Mode: {}", settings.mode.as_str());
    println!("   Intel: bundled seed only (no refresh)");
    println!();

    // ============================================
    // TEST CASE GALLERY
    // ============================================

    let swap_on_trusted = request(json!({
        "url": "https://app.uniswap.org/swap",
        "request": {
            "method": "eth_sendTransaction",
            "params": [{
                "from": "0xab5801a7d398351b8be11c439e05c5b3259aec9b",
                "to": "0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad",
                "value": "0x6f05b59d3b20000"
            }]
        }
    }));

    let unlimited_approval = request(json!({
        "url": "https://app.yieldfarm.exchange",
        "request": {
            "method": "eth_sendTransaction",
            "params": [{
                "from": "0xab5801a7d398351b8be11c439e05c5b3259aec9b",
                "to": "0x6b175474e89094c44da98b954eedeac495271d0f",
                "data": "0x095ea7b30000000000000000000000001111111254eeb25477b68fb85ed929f73a960582ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
            }]
        }
    }));

    let sanctioned_payment = request(json!({
        "url": "https://quickmix.cash",
        "request": {
            "method": "eth_sendTransaction",
            "params": [{
                "from": "0xab5801a7d398351b8be11c439e05c5b3259aec9b",
                "to": "0x722122df12d4e14e13ac3b6895a86e84145b6967",
                "value": "0xde0b6b3a7640000"
            }]
        }
    }));

    let lookalike_connect = request(json!({
        "url": "https://metamask-wallet.xyz/claim",
        "request": { "method": "eth_requestAccounts", "params": [] }
    }));

    let operator_grant = request(json!({
        "url": "https://rare-mints.art",
        "request": {
            "method": "eth_sendTransaction",
            "params": [{
                "from": "0xab5801a7d398351b8be11c439e05c5b3259aec9b",
                "to": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d",
                "data": "0xa22cb46500000000000000000000000022222222222222222222222222222222222222220000000000000000000000000000000000000000000000000000000000000001"
            }]
        }
    }));

    let gallery = [
        ("Swap on a seed-trusted domain", &swap_on_trusted),
        ("Unlimited ERC-20 approval", &unlimited_approval),
        ("Payment to a sanctioned mixer", &sanctioned_payment),
        ("Lookalike wallet domain connect", &lookalike_connect),
        ("NFT operator grant", &operator_grant),
    ];

    for (index, (name, req)) in gallery.iter().enumerate() {
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("📋 TEST {}: {}", index + 1, name);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let start = Instant::now();
        let result = engine.analyze(req, &settings).await;
        println!("{}", result.summary());
        println!("   Detection Time: {:?}", start.elapsed());
        println!();
    }

    // ============================================
    // MODE SWEEP
    // ============================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📊 MODE SWEEP: Unlimited approval under every mode");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for mode in [Mode::Off, Mode::Relaxed, Mode::Balanced, Mode::Strict] {
        let swept = SentrySettings {
            mode,
            ..SentrySettings::default()
        };
        let result = engine.analyze(&unlimited_approval, &swept).await;
        println!(
            "   {:8} → {} {} (score {})",
            mode.as_str(),
            result.recommend.emoji(),
            result.recommend.as_str(),
            result.score
        );
    }
    println!();

    // ============================================
    // USER OVERRIDE
    // ============================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🚫 USER OVERRIDE: Block a domain at runtime");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let drainer_connect = request(json!({
        "url": "https://drainer.app/connect",
        "request": { "method": "eth_requestAccounts", "params": [] }
    }));

    let before = engine.analyze(&drainer_connect, &settings).await;
    println!(
        "   Before override: {} {}",
        before.recommend.emoji(),
        before.recommend.as_str()
    );

    engine.threat_store().add_user_blocked_domain("drainer.app");

    let after = engine.analyze(&drainer_connect, &settings).await;
    println!(
        "   After override:  {} {}",
        after.recommend.emoji(),
        after.recommend.as_str()
    );
    println!();

    // ============================================
    // PERFORMANCE BENCHMARK
    // ============================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📊 PERFORMANCE BENCHMARK (100 iterations)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let iterations = 100u32;
    let bench_start = Instant::now();
    let mut total_latency_us = 0u128;
    let mut min_latency_us = u128::MAX;
    let mut max_latency_us = 0u128;

    for _ in 0..iterations {
        let iter_start = Instant::now();
        let _ = engine.analyze(&swap_on_trusted, &settings).await;
        let latency = iter_start.elapsed().as_micros();

        total_latency_us += latency;
        min_latency_us = min_latency_us.min(latency);
        max_latency_us = max_latency_us.max(latency);
    }

    let total_time = bench_start.elapsed();
    let avg_latency = total_latency_us as f64 / iterations as f64;

    println!("   Iterations: {}", iterations);
    println!("   Total Time: {:?}", total_time);
    println!("   Avg Latency: {:.1}µs", avg_latency);
    println!("   Min Latency: {}µs", min_latency_us);
    println!("   Max Latency: {}µs", max_latency_us);
    println!(
        "   Throughput: {:.0} verdicts/sec",
        iterations as f64 / total_time.as_secs_f64()
    );
    println!();

    // ============================================
    // SESSION STATS
    // ============================================
    let stats = engine.get_stats();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "📈 Session: {} analyzed, {} warned, {} blocked, avg {}ms",
        stats.analyzed, stats.warned, stats.blocked, stats.avg_latency_ms
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ DEMO COMPLETE");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
