//! Engine Module - Request Analysis Orchestration
//!
//! Wires a full evaluation together: decode the request payload, judge
//! the origin domain, hold every counterparty against the intel caches,
//! run the optional simulation, then let the policy layer fold the
//! signals into one verdict.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use alloy_primitives::U256;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{decoder, domain_trust, policy, typed_data};
use crate::intel::{
    AddressIntelStore, FeedFetch, SnapshotStore, ThreatIntelCache, ThreatIntelStore,
};
use crate::models::{
    AddressIntelHit, AnalysisResult, DecodedAction, Recommendation, RequestKind, SentrySettings,
    SimulationOutcome, TrustVerdict, TxParams, VerificationLevel, WalletRequest, WatchAssetParams,
};
use crate::providers::{Simulation, SimulationRequest};
use crate::utils::{normalize_address, wei_to_eth_display, BRAND_SEEDS, CHAIN_ID_ETHEREUM};

// ============================================
// ENGINE STATS
// ============================================

/// Lifetime counters, updated lock-free from every evaluation
#[derive(Debug, Default)]
pub struct EngineStats {
    pub analyzed: AtomicU64,
    pub warned: AtomicU64,
    pub blocked: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// Point-in-time stats view for the health endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatsSnapshot {
    pub analyzed: u64,
    pub warned: u64,
    pub blocked: u64,
    pub avg_latency_ms: u64,
}

// ============================================
// SENTRY ENGINE
// ============================================

/// The analysis engine. Owns both intel stores, the simulation
/// provider, and the lifetime counters. Cheap to share behind an Arc.
pub struct SentryEngine<F: FeedFetch, S: SnapshotStore, M: Simulation> {
    threat: ThreatIntelStore<F, S>,
    address: AddressIntelStore<F, S>,
    simulation: M,
    stats: EngineStats,
}

impl<F, S, M> SentryEngine<F, S, M>
where
    F: FeedFetch + Clone,
    S: SnapshotStore + Clone,
    M: Simulation,
{
    /// Build an engine. Both intel stores get their own fetcher and
    /// storage handle; clones of the storage share one backing area.
    pub fn new(fetcher: F, storage: S, simulation: M) -> Self {
        Self {
            threat: ThreatIntelStore::new(fetcher.clone(), storage.clone()),
            address: AddressIntelStore::new(fetcher, storage),
            simulation,
            stats: EngineStats::default(),
        }
    }
}

impl<F: FeedFetch, S: SnapshotStore, M: Simulation> SentryEngine<F, S, M> {
    /// Evaluate one wallet-interaction request.
    ///
    /// Settings are read once here; a settings change mid-flight never
    /// affects an evaluation already in progress. Never fails: unknown
    /// methods and malformed payloads still produce a verdict.
    pub async fn analyze(
        &self,
        request: &WalletRequest,
        settings: &SentrySettings,
    ) -> AnalysisResult {
        let start = Instant::now();
        let host = request.host();
        let kind = request.kind();

        let threat_cache = self.threat.get_cached();
        let address_cache = self.address.get_cached();

        // Typed intent out of the raw payload
        let tx = tx_params(request);
        let decoded = decode_intent(request, kind, tx.as_ref());

        if let Some(tx) = tx.as_ref() {
            if let Some(raw) = tx.value.as_deref() {
                if let Ok(wei) = U256::from_str(raw) {
                    if !wei.is_zero() {
                        debug!("💸 Transaction value: {} ETH", wei_to_eth_display(wei));
                    }
                }
            }
        }

        // Origin domain signals
        let (trust, risk_delta, domain_block_hit) = if settings.domain_checks_enabled {
            let trust = domain_trust::evaluate(&host, &threat_cache.trusted_domains);
            let (delta, delta_reasons) = domain_trust::risk_delta(&host, BRAND_SEEDS);
            if delta > 0 {
                debug!(
                    "⚠️ Domain risk delta +{} for {} ({} signals)",
                    delta,
                    host,
                    delta_reasons.len()
                );
            }
            let block_hit = threat_cache.blocked_domain_match(&host);
            (trust, delta, block_hit)
        } else {
            (TrustVerdict::unknown(Vec::new()), 0, None)
        };

        // Counterparty signals
        let mut address_hits: Vec<AddressIntelHit> = Vec::new();
        let mut blocked_address_hit: Option<String> = None;
        if settings.address_intel_enabled {
            for candidate in counterparty_addresses(tx.as_ref(), decoded.as_ref()) {
                if let Some(hit) = address_cache.hit_for(&candidate) {
                    if !address_hits.iter().any(|known| known.address == hit.address) {
                        address_hits.push(hit);
                    }
                }
                if blocked_address_hit.is_none() && threat_cache.has_blocked_address(&candidate) {
                    blocked_address_hit = Some(candidate);
                }
            }
        }

        let scam_token_hit = scam_token_match(request, kind, &threat_cache);

        // Simulation runs for transactions only, and is advisory
        let simulation = self.run_simulation(request, kind, tx.as_ref()).await;

        let input = policy::PolicyInput {
            decoded: decoded.as_ref(),
            trust: &trust,
            domain_block_hit: domain_block_hit.as_deref(),
            blocked_address_hit: blocked_address_hit.as_deref(),
            address_hits: &address_hits,
            scam_token_hit: scam_token_hit
                .as_ref()
                .map(|(chain_id, address)| (*chain_id, address.as_str())),
            risk_delta,
            simulation: &simulation,
        };
        let mut outcome = policy::apply(&input, settings.mode);

        // Hardened presentation: HIGH shown as BLOCK, reasons untouched
        if settings.block_high_risk_as_block && outcome.recommend == Recommendation::High {
            outcome.recommend = Recommendation::Block;
        }

        let verification_level = self.verification_level();

        self.record(&outcome, start);

        let mut result = AnalysisResult {
            recommend: outcome.recommend,
            score: outcome.score,
            reasons: outcome.reasons,
            decoded_action: decoded,
            trust,
            address_intel_hit: pick_reported_hit(&address_hits),
            verification_level,
            request_kind: kind,
            host,
            latency_ms: 0,
            timestamp: Utc::now().timestamp(),
        };
        result.set_latency(start);

        info!(
            "{} {} | {} | {} | score {} | {}ms",
            result.recommend.emoji(),
            result.recommend.as_str(),
            result.request_kind.as_str(),
            if result.host.is_empty() { "<no host>" } else { &result.host },
            result.score,
            result.latency_ms
        );

        result
    }

    /// Refresh both intel stores, respecting each store's TTL unless forced
    pub async fn refresh_intel(&self, force: bool) {
        let _ = tokio::join!(self.threat.refresh(force), self.address.refresh(force));
    }

    pub fn threat_store(&self) -> &ThreatIntelStore<F, S> {
        &self.threat
    }

    pub fn address_store(&self) -> &AddressIntelStore<F, S> {
        &self.address
    }

    /// Overall confidence: whichever store is further behind wins
    pub fn verification_level(&self) -> VerificationLevel {
        min_level(
            self.threat.verification_level(),
            self.address.verification_level(),
        )
    }

    pub fn get_stats(&self) -> EngineStatsSnapshot {
        let analyzed = self.stats.analyzed.load(Ordering::Relaxed);
        let total_latency_ms = self.stats.total_latency_ms.load(Ordering::Relaxed);
        EngineStatsSnapshot {
            analyzed,
            warned: self.stats.warned.load(Ordering::Relaxed),
            blocked: self.stats.blocked.load(Ordering::Relaxed),
            avg_latency_ms: if analyzed > 0 { total_latency_ms / analyzed } else { 0 },
        }
    }

    async fn run_simulation(
        &self,
        request: &WalletRequest,
        kind: RequestKind,
        tx: Option<&TxParams>,
    ) -> SimulationOutcome {
        if kind != RequestKind::SendTransaction {
            return SimulationOutcome::skipped();
        }
        let tx = match tx {
            Some(tx) => tx,
            None => return SimulationOutcome::skipped(),
        };
        let to = match tx.to.as_deref().and_then(normalize_address) {
            Some(to) => to,
            None => return SimulationOutcome::skipped(),
        };
        let sim_request = SimulationRequest {
            network_id: request.meta.chain_id.unwrap_or(CHAIN_ID_ETHEREUM),
            from: tx.from.clone().unwrap_or_default(),
            to,
            input_hex: tx.data.clone().unwrap_or_else(|| "0x".to_string()),
            value_hex: tx.value.clone().unwrap_or_else(|| "0x0".to_string()),
            gas: tx.gas.as_deref().and_then(parse_quantity),
        };
        self.simulation.simulate(&sim_request).await
    }

    fn record(&self, outcome: &policy::PolicyOutcome, start: Instant) {
        self.stats.analyzed.fetch_add(1, Ordering::Relaxed);
        self.stats
            .total_latency_ms
            .fetch_add(start.elapsed().as_millis() as u64, Ordering::Relaxed);
        match outcome.recommend {
            Recommendation::Warn | Recommendation::High => {
                self.stats.warned.fetch_add(1, Ordering::Relaxed);
            }
            Recommendation::Block => {
                self.stats.blocked.fetch_add(1, Ordering::Relaxed);
            }
            Recommendation::Allow => {}
        }
    }
}

// ============================================
// PAYLOAD EXTRACTION
// ============================================

fn tx_params(request: &WalletRequest) -> Option<TxParams> {
    if request.kind() != RequestKind::SendTransaction {
        return None;
    }
    let first = request.request.params.get(0)?;
    serde_json::from_value(first.clone()).ok()
}

fn decode_intent(
    request: &WalletRequest,
    kind: RequestKind,
    tx: Option<&TxParams>,
) -> Option<DecodedAction> {
    match kind {
        RequestKind::SendTransaction => {
            let tx = tx?;
            let data = tx.data.as_deref()?;
            let to = tx.to.as_deref().unwrap_or("");
            decoder::decode(data, to)
        }
        RequestKind::SignTypedData => typed_data::permit_from_params(&request.request.params),
        _ => None,
    }
}

/// Addresses worth holding against the intel sets, deduped in order.
/// The transaction target first, then whatever the decoder surfaced.
fn counterparty_addresses(tx: Option<&TxParams>, decoded: Option<&DecodedAction>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |raw: &str| {
        if let Some(address) = normalize_address(raw) {
            if !out.contains(&address) {
                out.push(address);
            }
        }
    };
    if let Some(tx) = tx {
        if let Some(to) = tx.to.as_deref() {
            push(to);
        }
    }
    if let Some(action) = decoded {
        for counterparty in action.counterparties() {
            push(counterparty);
        }
    }
    out
}

/// Hold a watch-asset token against the scam token registry.
/// Accepts both the bare-object and array-wrapped param shapes.
fn scam_token_match(
    request: &WalletRequest,
    kind: RequestKind,
    threat: &ThreatIntelCache,
) -> Option<(u64, String)> {
    if kind != RequestKind::WatchAsset {
        return None;
    }
    let raw = &request.request.params;
    let params: WatchAssetParams = serde_json::from_value(raw.clone())
        .or_else(|_| serde_json::from_value(raw.get(0).cloned().unwrap_or(Value::Null)))
        .ok()?;
    let address = normalize_address(params.options.address.as_deref()?)?;
    let chain_id = request.meta.chain_id.unwrap_or(CHAIN_ID_ETHEREUM);
    if threat.is_scam_token(chain_id, &address) {
        Some((chain_id, address))
    } else {
        None
    }
}

/// Parse an EVM quantity: `0x`-prefixed hex or plain decimal
fn parse_quantity(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Some(hex_part) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        u64::from_str_radix(hex_part, 16).ok()
    } else {
        trimmed.parse::<u64>().ok()
    }
}

/// Sanctioned hit wins the report slot, otherwise the first hit found
fn pick_reported_hit(hits: &[AddressIntelHit]) -> Option<AddressIntelHit> {
    hits.iter()
        .find(|hit| hit.is_sanctioned())
        .or_else(|| hits.first())
        .cloned()
}

fn min_level(a: VerificationLevel, b: VerificationLevel) -> VerificationLevel {
    if (a as u8) <= (b as u8) {
        a
    } else {
        b
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::testing::ScriptedFetch;
    use crate::intel::MemorySnapshotStore;
    use crate::models::{AmountKind, Mode, Reason, RpcCall, RequestMeta};
    use crate::providers::SkippedSimulation;
    use serde_json::json;

    const TOKEN: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const SPENDER: &str = "0x1111111254eeb25477b68fb85ed929f73a960582";
    const TORNADO_ROUTER: &str = "0x722122df12d4e14e13ac3b6895a86e84145b6967";
    const MAX_WORD: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

    fn engine() -> SentryEngine<ScriptedFetch, MemorySnapshotStore, SkippedSimulation> {
        SentryEngine::new(
            ScriptedFetch::new(),
            MemorySnapshotStore::new(),
            SkippedSimulation,
        )
    }

    fn request(url: &str, method: &str, params: Value) -> WalletRequest {
        WalletRequest {
            url: url.to_string(),
            request: RpcCall { method: method.to_string(), params },
            meta: RequestMeta::default(),
            provider_hint: None,
        }
    }

    fn addr_word(addr: &str) -> String {
        format!("{:0>64}", addr.trim_start_matches("0x"))
    }

    fn approve_calldata(spender: &str, amount_word: &str) -> String {
        format!("0x095ea7b3{}{}", addr_word(spender), amount_word)
    }

    #[tokio::test]
    async fn test_clean_connect_allows() {
        let engine = engine();
        let req = request("https://example-dapp.com", "eth_requestAccounts", json!([]));
        let result = engine.analyze(&req, &SentrySettings::default()).await;
        assert_eq!(result.recommend, Recommendation::Allow);
        assert!(result.reasons.is_empty());
        assert_eq!(result.request_kind, RequestKind::Connect);
        // No refresh has ever succeeded, so verification stays at floor
        assert_eq!(result.verification_level, VerificationLevel::Basic);
    }

    #[tokio::test]
    async fn test_sanctioned_counterparty_blocked_offline() {
        let engine = engine();
        let req = request(
            "https://example-dapp.com",
            "eth_sendTransaction",
            json!([{"from": "0x00a329c0648769a73afac7f9381e08fb43dbea72", "to": TORNADO_ROUTER, "value": "0xde0b6b3a7640000"}]),
        );
        let result = engine.analyze(&req, &SentrySettings::default()).await;
        assert_eq!(result.recommend, Recommendation::Block);
        assert!(matches!(result.reasons[0], Reason::AddressSanctioned { .. }));
        let hit = result.address_intel_hit.expect("sanctioned hit reported");
        assert_eq!(hit.address, TORNADO_ROUTER);
        assert!(hit.is_sanctioned());
    }

    #[tokio::test]
    async fn test_unlimited_approve_scales_with_mode() {
        let engine = engine();
        let req = request(
            "https://example-dapp.com",
            "eth_sendTransaction",
            json!([{"to": TOKEN, "data": approve_calldata(SPENDER, MAX_WORD)}]),
        );

        let strict = SentrySettings { mode: Mode::Strict, ..SentrySettings::default() };
        let result = engine.analyze(&req, &strict).await;
        assert_eq!(result.recommend, Recommendation::Block);
        assert!(matches!(result.reasons[0], Reason::UnlimitedApproval { .. }));

        let result = engine.analyze(&req, &SentrySettings::default()).await;
        assert_eq!(result.recommend, Recommendation::High);
        assert_eq!(result.score, 70);
        match &result.decoded_action {
            Some(DecodedAction::ApproveErc20 { spender, amount_kind, .. }) => {
                assert_eq!(spender, SPENDER);
                assert_eq!(*amount_kind, AmountKind::Unlimited);
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_kill_switch_overrides_user_blocklist() {
        let engine = engine();
        engine.threat_store().add_user_blocked_domain("evil-dapp.io");

        let req = request("https://evil-dapp.io", "eth_requestAccounts", json!([]));
        let off = SentrySettings { mode: Mode::Off, ..SentrySettings::default() };
        let result = engine.analyze(&req, &off).await;
        assert_eq!(result.recommend, Recommendation::Allow);
        assert_eq!(result.reasons, vec![Reason::ProtectionOff]);

        // Same request with protection on blocks immediately
        let result = engine.analyze(&req, &SentrySettings::default()).await;
        assert_eq!(result.recommend, Recommendation::Block);
        assert!(matches!(result.reasons[0], Reason::DomainBlocklisted { .. }));
    }

    #[tokio::test]
    async fn test_high_upgraded_to_block_by_setting() {
        let engine = engine();
        let req = request(
            "https://example-dapp.com",
            "eth_sendTransaction",
            json!([{"to": TOKEN, "data": approve_calldata(SPENDER, MAX_WORD)}]),
        );
        let hardened = SentrySettings {
            block_high_risk_as_block: true,
            ..SentrySettings::default()
        };
        let result = engine.analyze(&req, &hardened).await;
        assert_eq!(result.recommend, Recommendation::Block);
        // The reason list still tells the true story
        assert!(matches!(result.reasons[0], Reason::UnlimitedApproval { .. }));
    }

    #[tokio::test]
    async fn test_typed_data_permit_matches_calldata_severity() {
        let engine = engine();
        let settings = SentrySettings::default();

        let calldata = format!(
            "0xd505accf{}{}{}{}{}{}{}",
            addr_word("0x00a329c0648769a73afac7f9381e08fb43dbea72"),
            addr_word(SPENDER),
            MAX_WORD,
            addr_word("0x0"),
            addr_word("0x0"),
            addr_word("0x0"),
            addr_word("0x0"),
        );
        let via_calldata = request(
            "https://example-dapp.com",
            "eth_sendTransaction",
            json!([{"to": TOKEN, "data": calldata}]),
        );

        let payload = json!({
            "primaryType": "Permit",
            "domain": {"name": "USD Coin", "verifyingContract": TOKEN},
            "message": {
                "owner": "0x00a329c0648769a73afac7f9381e08fb43dbea72",
                "spender": SPENDER,
                "value": format!("0x{}", MAX_WORD),
                "deadline": "99999999999"
            }
        });
        let via_typed_data = request(
            "https://example-dapp.com",
            "eth_signTypedData_v4",
            json!(["0x00a329c0648769a73afac7f9381e08fb43dbea72", payload.to_string()]),
        );

        let from_calldata = engine.analyze(&via_calldata, &settings).await;
        let from_typed = engine.analyze(&via_typed_data, &settings).await;

        assert_eq!(from_calldata.recommend, from_typed.recommend);
        assert_eq!(from_calldata.score, from_typed.score);
        assert!(matches!(from_typed.reasons[0], Reason::UnlimitedPermit { .. }));
        assert!(matches!(from_calldata.reasons[0], Reason::UnlimitedPermit { .. }));
    }

    #[tokio::test]
    async fn test_watch_asset_scam_token() {
        let scam_json = format!(r#"[{{"chainId": 1, "address": "{}"}}]"#, TOKEN);
        let fetch = ScriptedFetch::new()
            .serve("https://intel.walletsentry.io/v1/scam-tokens.json", &scam_json);
        let engine = SentryEngine::new(fetch, MemorySnapshotStore::new(), SkippedSimulation);
        engine.refresh_intel(true).await;

        let req = request(
            "https://example-dapp.com",
            "wallet_watchAsset",
            json!({"type": "ERC20", "options": {"address": TOKEN, "symbol": "USDC", "decimals": 6}}),
        );
        let result = engine.analyze(&req, &SentrySettings::default()).await;
        assert_eq!(result.recommend, Recommendation::High);
        assert!(matches!(result.reasons[0], Reason::ScamToken { chain_id: 1, .. }));

        // A token nobody has flagged sails through
        let req = request(
            "https://example-dapp.com",
            "wallet_watchAsset",
            json!({"type": "ERC20", "options": {"address": SPENDER, "symbol": "OK", "decimals": 18}}),
        );
        let result = engine.analyze(&req, &SentrySettings::default()).await;
        assert_eq!(result.recommend, Recommendation::Allow);
    }

    #[tokio::test]
    async fn test_domain_checks_disabled_skips_blocklist() {
        let engine = engine();
        engine.threat_store().add_user_blocked_domain("evil-dapp.io");

        let req = request("https://evil-dapp.io", "eth_requestAccounts", json!([]));
        let settings = SentrySettings {
            domain_checks_enabled: false,
            ..SentrySettings::default()
        };
        let result = engine.analyze(&req, &settings).await;
        assert_eq!(result.recommend, Recommendation::Allow);
    }

    #[tokio::test]
    async fn test_stats_track_outcomes() {
        let engine = engine();
        let clean = request("https://example-dapp.com", "eth_requestAccounts", json!([]));
        let sanctioned = request(
            "https://example-dapp.com",
            "eth_sendTransaction",
            json!([{"to": TORNADO_ROUTER}]),
        );
        let settings = SentrySettings::default();
        engine.analyze(&clean, &settings).await;
        engine.analyze(&sanctioned, &settings).await;

        let stats = engine.get_stats();
        assert_eq!(stats.analyzed, 2);
        assert_eq!(stats.blocked, 1);
        assert_eq!(stats.warned, 0);
    }

    #[test]
    fn test_parse_quantity_forms() {
        assert_eq!(parse_quantity("0x5208"), Some(21000));
        assert_eq!(parse_quantity("21000"), Some(21000));
        assert_eq!(parse_quantity("0xZZ"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn test_min_level() {
        assert_eq!(
            min_level(VerificationLevel::Full, VerificationLevel::Basic),
            VerificationLevel::Basic
        );
        assert_eq!(
            min_level(VerificationLevel::Local, VerificationLevel::Full),
            VerificationLevel::Local
        );
    }
}
