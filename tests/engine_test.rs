//! End-to-end engine tests: a wallet request goes in, a verdict comes out

use std::collections::HashMap;

use serde_json::{json, Value};

use wallet_sentry::intel::{FeedBody, FeedFetch};
use wallet_sentry::models::{
    DecodedAction, Reason, RequestKind, RpcCall, RequestMeta, TrustLevel,
};
use wallet_sentry::{
    MemorySnapshotStore, Mode, Recommendation, SentryEngine, SentrySettings, SkippedSimulation,
    VerificationLevel, WalletRequest,
};

const TOKEN: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
const SPENDER: &str = "0x1111111254eeb25477b68fb85ed929f73a960582";
const OPERATOR: &str = "0x1e0049783f008a0085193e00003d00cd54003c71";
const TORNADO_ROUTER: &str = "0x722122df12d4e14e13ac3b6895a86e84145b6967";
const MAX_WORD: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

const SCAMSNIFFER_DOMAINS_URL: &str =
    "https://raw.githubusercontent.com/scamsniffer/scam-database/main/blacklist/domains.json";

/// Serves fixed bodies per URL; anything unlisted fails its fetch
#[derive(Clone, Default)]
struct ScriptedFeeds {
    bodies: HashMap<&'static str, String>,
}

impl ScriptedFeeds {
    fn new() -> Self {
        Self::default()
    }

    fn serve(mut self, url: &'static str, body: &str) -> Self {
        self.bodies.insert(url, body.to_string());
        self
    }
}

impl FeedFetch for ScriptedFeeds {
    async fn fetch(&self, url: &str, _etag: Option<&str>) -> Option<FeedBody> {
        self.bodies.get(url).map(|body| FeedBody {
            body: body.clone(),
            etag: None,
        })
    }
}

fn offline_engine() -> SentryEngine<ScriptedFeeds, MemorySnapshotStore, SkippedSimulation> {
    SentryEngine::new(
        ScriptedFeeds::new(),
        MemorySnapshotStore::new(),
        SkippedSimulation,
    )
}

fn request(url: &str, method: &str, params: Value) -> WalletRequest {
    WalletRequest {
        url: url.to_string(),
        request: RpcCall {
            method: method.to_string(),
            params,
        },
        meta: RequestMeta::default(),
        provider_hint: None,
    }
}

fn tx_request(url: &str, to: &str, data: &str) -> WalletRequest {
    request(
        url,
        "eth_sendTransaction",
        json!([{"from": "0x00a329c0648769a73afac7f9381e08fb43dbea72", "to": to, "data": data}]),
    )
}

fn addr_word(addr: &str) -> String {
    format!("{:0>64}", addr.trim_start_matches("0x"))
}

fn settings(mode: Mode) -> SentrySettings {
    SentrySettings {
        mode,
        ..SentrySettings::default()
    }
}

#[tokio::test]
async fn test_unlimited_approve_blocked_in_strict() {
    let engine = offline_engine();
    let calldata = format!("0x095ea7b3{}{}", addr_word(SPENDER), MAX_WORD);
    let req = tx_request("https://example-dapp.com", TOKEN, &calldata);

    let result = engine.analyze(&req, &settings(Mode::Strict)).await;

    assert_eq!(result.recommend, Recommendation::Block);
    assert!(result.score >= 70);
    assert!(
        matches!(result.reasons[0], Reason::UnlimitedApproval { .. }),
        "leading reason should be the unlimited approval, got {:?}",
        result.reasons
    );
    match result.decoded_action {
        Some(DecodedAction::ApproveErc20 { ref spender, .. }) => assert_eq!(spender, SPENDER),
        ref other => panic!("expected decoded approve, got {:?}", other),
    }
}

#[tokio::test]
async fn test_set_approval_for_all_high_in_balanced() {
    let engine = offline_engine();
    let calldata = format!(
        "0xa22cb465{}{:0>64}",
        addr_word(OPERATOR),
        "1" // approved = true
    );
    let req = tx_request("https://example-dapp.com", TOKEN, &calldata);

    let result = engine.analyze(&req, &settings(Mode::Balanced)).await;

    assert_eq!(result.recommend, Recommendation::High, "balanced mode warns, never blocks here");
    assert!(matches!(result.reasons[0], Reason::ApprovalForAll { .. }));

    // Revoking (approved = false) carries no risk
    let revoke = format!("0xa22cb465{}{:0>64}", addr_word(OPERATOR), "0");
    let req = tx_request("https://example-dapp.com", TOKEN, &revoke);
    let result = engine.analyze(&req, &settings(Mode::Balanced)).await;
    assert_eq!(result.recommend, Recommendation::Allow);
}

#[tokio::test]
async fn test_mode_off_allows_blocklisted_domain() {
    let feeds = ScriptedFeeds::new().serve(SCAMSNIFFER_DOMAINS_URL, r#"["evil-dapp.io"]"#);
    let engine = SentryEngine::new(feeds, MemorySnapshotStore::new(), SkippedSimulation);
    engine.refresh_intel(true).await;

    let req = request("https://evil-dapp.io/claim", "eth_requestAccounts", json!([]));

    // Protection off: nothing runs, not even the blocklist
    let result = engine.analyze(&req, &settings(Mode::Off)).await;
    assert_eq!(result.recommend, Recommendation::Allow);
    assert_eq!(result.reasons, vec![Reason::ProtectionOff]);

    // Any active mode blocks the same request
    for mode in [Mode::Relaxed, Mode::Balanced, Mode::Strict] {
        let result = engine.analyze(&req, &settings(mode)).await;
        assert_eq!(result.recommend, Recommendation::Block);
        assert!(matches!(result.reasons[0], Reason::DomainBlocklisted { .. }));
    }
}

#[tokio::test]
async fn test_sanctioned_address_never_below_block() {
    let engine = offline_engine();

    // A plain transfer, an approve, and a connect-with-tx all hit the
    // same sanctioned counterparty
    let plain = tx_request("https://example-dapp.com", TORNADO_ROUTER, "0x");
    let approve = tx_request(
        "https://example-dapp.com",
        TOKEN,
        &format!("0x095ea7b3{}{}", addr_word(TORNADO_ROUTER), MAX_WORD),
    );

    for req in [&plain, &approve] {
        for mode in [Mode::Relaxed, Mode::Balanced, Mode::Strict] {
            let result = engine.analyze(req, &settings(mode)).await;
            assert_eq!(
                result.recommend,
                Recommendation::Block,
                "sanctioned counterparty must block in {:?}",
                mode
            );
            assert!(result
                .reasons
                .iter()
                .any(|r| matches!(r, Reason::AddressSanctioned { .. })));
        }
    }
}

#[tokio::test]
async fn test_trusted_domain_scores_official() {
    let engine = offline_engine();
    let req = request("https://app.uniswap.org/swap", "eth_requestAccounts", json!([]));

    let result = engine.analyze(&req, &settings(Mode::Balanced)).await;

    assert_eq!(result.recommend, Recommendation::Allow);
    assert_eq!(result.trust.level, TrustLevel::LikelyOfficial);
    assert_eq!(result.trust.score, 92);
    assert!(result.trust.reasons.is_empty());
}

#[tokio::test]
async fn test_suspicious_host_warns_on_any_method() {
    let engine = offline_engine();
    // Unrecognized method still gets domain scrutiny
    let req = request(
        "http://metamask-login-verify.xyz",
        "eth_somethingNew",
        json!([]),
    );

    let result = engine.analyze(&req, &settings(Mode::Balanced)).await;

    assert_eq!(result.request_kind, RequestKind::Other);
    assert_eq!(result.recommend, Recommendation::Warn);
    assert!(result
        .reasons
        .iter()
        .any(|r| matches!(r, Reason::DomainSuspicious { .. })));
}

#[tokio::test]
async fn test_high_to_block_upgrade_keeps_reasons() {
    let engine = offline_engine();
    let calldata = format!("0x095ea7b3{}{}", addr_word(SPENDER), MAX_WORD);
    let req = tx_request("https://example-dapp.com", TOKEN, &calldata);

    let hardened = SentrySettings {
        block_high_risk_as_block: true,
        ..SentrySettings::default()
    };
    let result = engine.analyze(&req, &hardened).await;

    assert_eq!(result.recommend, Recommendation::Block);
    assert!(matches!(result.reasons[0], Reason::UnlimitedApproval { .. }));
    assert_eq!(result.score, 70, "presentation upgrade must not inflate the score");
}

#[tokio::test]
async fn test_plain_transfer_to_clean_address_allows() {
    let engine = offline_engine();
    let req = request(
        "https://example-dapp.com",
        "eth_sendTransaction",
        json!([{
            "from": "0x00a329c0648769a73afac7f9381e08fb43dbea72",
            "to": SPENDER,
            "value": "0xde0b6b3a7640000"
        }]),
    );

    let result = engine.analyze(&req, &settings(Mode::Strict)).await;

    assert_eq!(result.recommend, Recommendation::Allow);
    assert!(result.reasons.is_empty());
    assert!(result.decoded_action.is_none(), "no calldata, nothing to decode");
}

#[tokio::test]
async fn test_verification_level_reflects_refresh() {
    // Nothing scripted: every feed fails, confidence stays at floor
    let engine = offline_engine();
    let req = request("https://example-dapp.com", "eth_requestAccounts", json!([]));
    let result = engine.analyze(&req, &settings(Mode::Balanced)).await;
    assert_eq!(result.verification_level, VerificationLevel::Basic);

    // One live source per store is enough for a full refresh
    let feeds = ScriptedFeeds::new()
        .serve(SCAMSNIFFER_DOMAINS_URL, r#"["evil-dapp.io"]"#)
        .serve(
            "https://raw.githubusercontent.com/MyEtherWallet/ethereum-lists/master/src/addresses/addresses-darklist.json",
            "[]",
        );
    let engine = SentryEngine::new(feeds, MemorySnapshotStore::new(), SkippedSimulation);
    engine.refresh_intel(true).await;

    let result = engine.analyze(&req, &settings(Mode::Balanced)).await;
    assert_eq!(result.verification_level, VerificationLevel::Full);
}

#[tokio::test]
async fn test_malformed_params_still_produce_verdict() {
    let engine = offline_engine();

    // params is a string where an array of tx objects is expected
    let req = request(
        "https://example-dapp.com",
        "eth_sendTransaction",
        json!("garbage"),
    );
    let result = engine.analyze(&req, &settings(Mode::Strict)).await;
    assert_eq!(result.recommend, Recommendation::Allow);
    assert!(result.decoded_action.is_none());

    // Empty URL: no host to judge, the rest still runs
    let req = request("", "eth_requestAccounts", json!([]));
    let result = engine.analyze(&req, &settings(Mode::Strict)).await;
    assert_eq!(result.recommend, Recommendation::Allow);
    assert_eq!(result.host, "");
}

#[tokio::test]
async fn test_watch_asset_scam_token_escalates() {
    let feeds = ScriptedFeeds::new().serve(
        "https://intel.walletsentry.io/v1/scam-tokens.json",
        r#"[{"chainId": 56, "address": "0x1ab4973a48dc892cd9971ece8e01dcc7688f8f23"}]"#,
    );
    let engine = SentryEngine::new(feeds, MemorySnapshotStore::new(), SkippedSimulation);
    engine.refresh_intel(true).await;

    let mut req = request(
        "https://token-gallery.net",
        "wallet_watchAsset",
        json!({
            "type": "ERC20",
            "options": {
                "address": "0x1AB4973a48dc892Cd9971ECE8e01DcC7688f8F23",
                "symbol": "WIN",
                "decimals": 18
            }
        }),
    );
    req.meta.chain_id = Some(56);

    let result = engine.analyze(&req, &settings(Mode::Balanced)).await;

    assert_eq!(result.recommend, Recommendation::High);
    assert_eq!(result.request_kind, RequestKind::WatchAsset);
    assert_eq!(
        result.reasons[0],
        Reason::ScamToken {
            chain_id: 56,
            address: "0x1ab4973a48dc892cd9971ece8e01dcc7688f8f23".to_string(),
        }
    );

    // Same token on a different chain is not a hit
    let mut other_chain = request(
        "https://token-gallery.net",
        "wallet_watchAsset",
        json!({
            "type": "ERC20",
            "options": { "address": "0x1ab4973a48dc892cd9971ece8e01dcc7688f8f23" }
        }),
    );
    other_chain.meta.chain_id = Some(1);
    let result = engine.analyze(&other_chain, &settings(Mode::Balanced)).await;
    assert_eq!(result.recommend, Recommendation::Allow);
}

#[tokio::test]
async fn test_typed_data_permit_matches_calldata_permit() {
    let engine = offline_engine();
    let owner = "0x2222222222222222222222222222222222222222";

    // The same unlimited permit, once as a signTypedData payload and
    // once as permit() calldata
    let payload = json!({
        "primaryType": "Permit",
        "domain": { "name": "USD Coin", "chainId": 1, "verifyingContract": TOKEN },
        "message": {
            "owner": owner,
            "spender": SPENDER,
            "value": "115792089237316195423570985008687907853269984665640564039457584007913129639935",
            "nonce": "0",
            "deadline": "1755000000"
        }
    });
    let signed = request(
        "https://example-dapp.com",
        "eth_signTypedData_v4",
        json!([owner, payload.to_string()]),
    );

    let calldata = format!(
        "0xd505accf{}{}{}{}{}{}{}",
        addr_word(owner),
        addr_word(SPENDER),
        MAX_WORD,
        format!("{:064x}", 1_755_000_000u64),
        format!("{:064x}", 27u64),
        "11".repeat(32),
        "22".repeat(32),
    );
    let onchain = tx_request("https://example-dapp.com", TOKEN, &calldata);

    for req in [&signed, &onchain] {
        let result = engine.analyze(req, &settings(Mode::Strict)).await;
        assert_eq!(result.recommend, Recommendation::Block);
        assert!(matches!(result.reasons[0], Reason::UnlimitedPermit { .. }));
        assert!(matches!(
            result.decoded_action,
            Some(DecodedAction::PermitEip2612 { .. })
        ));
    }
}
