//! Type definitions for WalletSentry
//! All core data structures for request analysis

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::utils::normalize_host;

// ============================================
// SEVERITY & CONFIDENCE
// ============================================

/// Final recommendation for a wallet request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    /// No signal found, let the request through
    Allow,
    /// Something is off, the user should look twice
    Warn,
    /// Likely to lose funds if approved
    High,
    /// Known-malicious, should not reach the wallet
    Block,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Allow => "ALLOW",
            Recommendation::Warn => "WARN",
            Recommendation::High => "HIGH",
            Recommendation::Block => "BLOCK",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Recommendation::Allow => "✅",
            Recommendation::Warn => "🟡",
            Recommendation::High => "🔴",
            Recommendation::Block => "⛔",
        }
    }
}

/// How much intel backed a verdict: fresh feeds, a stale local
/// snapshot, or nothing beyond the bundled seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationLevel {
    Basic,
    Local,
    Full,
}

impl VerificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationLevel::Basic => "BASIC",
            VerificationLevel::Local => "LOCAL",
            VerificationLevel::Full => "FULL",
        }
    }
}

// ============================================
// DECODED ACTIONS
// ============================================

/// Whether an approval/permit amount is bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmountKind {
    Limited,
    Unlimited,
}

/// NFT contract standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NftStandard {
    Erc721,
    Erc1155,
}

/// Typed intent decoded from raw calldata.
///
/// Closed set: decoding is total, an unrecognized selector becomes
/// `Unknown`, never an error. Addresses are lowercase `0x` + 40 hex.
/// Amounts stay `U256`; they are never narrowed or floated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DecodedAction {
    ApproveErc20 {
        token: String,
        spender: String,
        amount_kind: AmountKind,
        amount_raw: U256,
    },
    TransferErc20 {
        token: String,
        to: String,
        amount_raw: U256,
    },
    TransferFromErc20 {
        token: String,
        from: String,
        to: String,
        amount_raw: U256,
    },
    SetApprovalForAll {
        token: String,
        operator: String,
        approved: bool,
    },
    TransferNft {
        token: String,
        to: String,
        from: Option<String>,
        token_id_raw: Option<U256>,
        amount_raw: Option<U256>,
        standard: NftStandard,
        batch: bool,
    },
    PermitEip2612 {
        token: String,
        spender: String,
        value_kind: AmountKind,
        value_raw: U256,
        deadline_raw: U256,
    },
    Unknown {
        selector: String,
    },
}

impl DecodedAction {
    /// Short tag for logs
    pub fn kind_str(&self) -> &'static str {
        match self {
            DecodedAction::ApproveErc20 { .. } => "approve",
            DecodedAction::TransferErc20 { .. } => "transfer",
            DecodedAction::TransferFromErc20 { .. } => "transferFrom",
            DecodedAction::SetApprovalForAll { .. } => "setApprovalForAll",
            DecodedAction::TransferNft { batch: false, .. } => "nftTransfer",
            DecodedAction::TransferNft { batch: true, .. } => "nftBatchTransfer",
            DecodedAction::PermitEip2612 { .. } => "permit",
            DecodedAction::Unknown { .. } => "unknown",
        }
    }

    /// Addresses granted power or receiving assets by this action.
    /// These are the ones worth holding against the address intel sets.
    pub fn counterparties(&self) -> Vec<&str> {
        match self {
            DecodedAction::ApproveErc20 { spender, .. } => vec![spender],
            DecodedAction::TransferErc20 { to, .. } => vec![to],
            DecodedAction::TransferFromErc20 { from, to, .. } => vec![from, to],
            DecodedAction::SetApprovalForAll { operator, .. } => vec![operator],
            DecodedAction::TransferNft { to, from, .. } => {
                let mut out = vec![to.as_str()];
                if let Some(f) = from {
                    out.push(f.as_str());
                }
                out
            }
            DecodedAction::PermitEip2612 { spender, .. } => vec![spender],
            DecodedAction::Unknown { .. } => vec![],
        }
    }
}

// ============================================
// DOMAIN TRUST
// ============================================

/// How much a hostname looks like the real thing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustLevel {
    LikelyOfficial,
    Suspicious,
    Unknown,
}

impl TrustLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::LikelyOfficial => "LIKELY_OFFICIAL",
            TrustLevel::Suspicious => "SUSPICIOUS",
            TrustLevel::Unknown => "UNKNOWN",
        }
    }
}

/// Individual findings from the domain heuristics.
/// Emitted in a fixed scan order so reason lists are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TrustReason {
    NoHost,
    Punycode,
    DoubleHyphen,
    ManyDigits,
    ManyHyphens,
    PhishingKeyword { keyword: String },
    BrandImpersonation { brand: String },
    DeepSubdomain,
    AllowlistedVariant,
    BrandInSubdomain { brand: String },
    Typosquat { brand: String },
    AbuseTld { tld: String },
}

impl TrustReason {
    pub fn key(&self) -> &'static str {
        match self {
            TrustReason::NoHost => "no_host",
            TrustReason::Punycode => "punycode",
            TrustReason::DoubleHyphen => "double_hyphen",
            TrustReason::ManyDigits => "many_digits",
            TrustReason::ManyHyphens => "many_hyphens",
            TrustReason::PhishingKeyword { .. } => "phishing_keyword",
            TrustReason::BrandImpersonation { .. } => "brand_impersonation",
            TrustReason::DeepSubdomain => "deep_subdomain",
            TrustReason::AllowlistedVariant => "allowlisted_variant",
            TrustReason::BrandInSubdomain { .. } => "brand_in_subdomain",
            TrustReason::Typosquat { .. } => "typosquat",
            TrustReason::AbuseTld { .. } => "abuse_tld",
        }
    }

    pub fn description(&self) -> String {
        match self {
            TrustReason::NoHost => "No host present in request URL".to_string(),
            TrustReason::Punycode => "Punycode label (homograph risk)".to_string(),
            TrustReason::DoubleHyphen => "Double hyphen in hostname".to_string(),
            TrustReason::ManyDigits => "Unusually many digits in hostname".to_string(),
            TrustReason::ManyHyphens => "Unusually many hyphens in hostname".to_string(),
            TrustReason::PhishingKeyword { keyword } => {
                format!("Phishing keyword in hostname: {}", keyword)
            }
            TrustReason::BrandImpersonation { brand } => {
                format!("Mentions {} but is not the official domain", brand)
            }
            TrustReason::DeepSubdomain => "Deeply nested subdomain".to_string(),
            TrustReason::AllowlistedVariant => "Loose match against the allowlist".to_string(),
            TrustReason::BrandInSubdomain { brand } => {
                format!("Brand {} only appears in a subdomain label", brand)
            }
            TrustReason::Typosquat { brand } => {
                format!("Registrable label is a near-miss of {}", brand)
            }
            TrustReason::AbuseTld { tld } => format!("Abuse-prone TLD: .{}", tld),
        }
    }
}

/// Verdict from the domain trust evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustVerdict {
    pub level: TrustLevel,
    /// 0..=100, clamped
    pub score: u8,
    /// Deterministic order: heuristic scan order
    pub reasons: Vec<TrustReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_allowlist_domain: Option<String>,
}

impl TrustVerdict {
    pub fn unknown(reasons: Vec<TrustReason>) -> Self {
        Self {
            level: TrustLevel::Unknown,
            score: crate::utils::TRUST_SCORE_UNKNOWN,
            reasons,
            matched_allowlist_domain: None,
        }
    }
}

impl Default for TrustVerdict {
    fn default() -> Self {
        Self::unknown(Vec::new())
    }
}

// ============================================
// ADDRESS INTEL
// ============================================

/// Abuse labels attached to an address by intel feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressLabel {
    ScamReported,
    PhishingReported,
    Sanctioned,
    MaliciousContract,
}

impl AddressLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressLabel::ScamReported => "SCAM_REPORTED",
            AddressLabel::PhishingReported => "PHISHING_REPORTED",
            AddressLabel::Sanctioned => "SANCTIONED",
            AddressLabel::MaliciousContract => "MALICIOUS_CONTRACT",
        }
    }
}

/// A flagged address found among a request's counterparties.
/// Labels keep their source-merge order, most specific first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressIntelHit {
    pub address: String,
    pub labels: Vec<AddressLabel>,
}

impl AddressIntelHit {
    pub fn is_sanctioned(&self) -> bool {
        self.labels.contains(&AddressLabel::Sanctioned)
    }
}

// ============================================
// POLICY REASONS
// ============================================

/// Why the policy engine settled on a recommendation.
/// Accumulated in firing order; the first entry set the final severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Reason {
    ProtectionOff,
    DomainBlocklisted { host: String },
    AddressSanctioned { address: String },
    UnlimitedApproval { token: String, spender: String },
    ApprovalForAll { token: String, operator: String },
    UnlimitedPermit { token: String, spender: String },
    AddressFlagged { address: String, label: AddressLabel },
    ScamToken { chain_id: u64, address: String },
    SimulationRisk,
    SimulationRevert,
    DomainSuspicious { score: u8 },
    DomainRiskElevated { delta: u8 },
}

impl Reason {
    pub fn key(&self) -> &'static str {
        match self {
            Reason::ProtectionOff => "protection_off",
            Reason::DomainBlocklisted { .. } => "domain_blocklisted",
            Reason::AddressSanctioned { .. } => "address_sanctioned",
            Reason::UnlimitedApproval { .. } => "unlimited_approval",
            Reason::ApprovalForAll { .. } => "approval_for_all",
            Reason::UnlimitedPermit { .. } => "unlimited_permit",
            Reason::AddressFlagged { .. } => "address_flagged",
            Reason::ScamToken { .. } => "scam_token",
            Reason::SimulationRisk => "simulation_risk",
            Reason::SimulationRevert => "simulation_revert",
            Reason::DomainSuspicious { .. } => "domain_suspicious",
            Reason::DomainRiskElevated { .. } => "domain_risk_elevated",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Reason::ProtectionOff => "Protection is turned off".to_string(),
            Reason::DomainBlocklisted { host } => {
                format!("Domain is on a phishing blocklist: {}", host)
            }
            Reason::AddressSanctioned { address } => {
                format!("Sanctioned address involved: {}", address)
            }
            Reason::UnlimitedApproval { token, spender } => {
                format!("Unlimited token approval on {} to {}", token, spender)
            }
            Reason::ApprovalForAll { token, operator } => {
                format!("Collection-wide approval on {} to {}", token, operator)
            }
            Reason::UnlimitedPermit { token, spender } => {
                format!("Unlimited permit signature on {} for {}", token, spender)
            }
            Reason::AddressFlagged { address, label } => {
                format!("Address {} flagged as {}", address, label.as_str())
            }
            Reason::ScamToken { chain_id, address } => {
                format!(
                    "Token reported as scam on {}: {}",
                    crate::utils::get_chain_name(*chain_id),
                    address
                )
            }
            Reason::SimulationRisk => "Simulation flagged a risky outcome".to_string(),
            Reason::SimulationRevert => "Simulation reverted".to_string(),
            Reason::DomainSuspicious { score } => {
                format!("Domain looks suspicious (trust score {})", score)
            }
            Reason::DomainRiskElevated { delta } => {
                format!("Domain impersonation signals (+{})", delta)
            }
        }
    }
}

// ============================================
// INBOUND REQUEST
// ============================================

/// What kind of wallet interaction a request method maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    Connect,
    SignMessage,
    SignTypedData,
    SendTransaction,
    SwitchChain,
    AddChain,
    WatchAsset,
    Other,
}

impl RequestKind {
    /// Map a raw JSON-RPC method name to a request kind
    pub fn from_method(method: &str) -> Self {
        match method {
            "eth_requestAccounts" | "wallet_requestPermissions" => RequestKind::Connect,
            "personal_sign" | "eth_sign" => RequestKind::SignMessage,
            "eth_signTypedData" | "eth_signTypedData_v3" | "eth_signTypedData_v4" => {
                RequestKind::SignTypedData
            }
            "eth_sendTransaction" => RequestKind::SendTransaction,
            "wallet_switchEthereumChain" => RequestKind::SwitchChain,
            "wallet_addEthereumChain" => RequestKind::AddChain,
            "wallet_watchAsset" => RequestKind::WatchAsset,
            _ => RequestKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Connect => "CONNECT",
            RequestKind::SignMessage => "SIGN_MESSAGE",
            RequestKind::SignTypedData => "SIGN_TYPED_DATA",
            RequestKind::SendTransaction => "SEND_TRANSACTION",
            RequestKind::SwitchChain => "SWITCH_CHAIN",
            RequestKind::AddChain => "ADD_CHAIN",
            RequestKind::WatchAsset => "WATCH_ASSET",
            RequestKind::Other => "OTHER",
        }
    }
}

/// The raw JSON-RPC call observed on the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcCall {
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Request metadata from the observing side
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    #[serde(default)]
    pub chain_id: Option<u64>,
}

/// A wallet-interaction request as observed in the page context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRequest {
    pub url: String,
    pub request: RpcCall,
    #[serde(default)]
    pub meta: RequestMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_hint: Option<String>,
}

impl WalletRequest {
    /// Extract the normalized hostname from the page URL.
    /// Tolerates missing scheme, userinfo, ports and paths.
    pub fn host(&self) -> String {
        let url = self.url.trim();
        let after_scheme = match url.find("://") {
            Some(idx) => &url[idx + 3..],
            None => url,
        };
        let end = after_scheme
            .find(['/', '?', '#'])
            .unwrap_or(after_scheme.len());
        let authority = &after_scheme[..end];
        let host_port = authority.rsplit('@').next().unwrap_or(authority);
        let host = host_port.split(':').next().unwrap_or(host_port);
        normalize_host(host)
    }

    pub fn kind(&self) -> RequestKind {
        RequestKind::from_method(&self.request.method)
    }
}

/// `eth_sendTransaction` params[0], the fields we care about
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxParams {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub gas: Option<String>,
}

/// `wallet_watchAsset` params
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchAssetParams {
    #[serde(rename = "type", default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub options: WatchAssetOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchAssetOptions {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

// ============================================
// SIMULATION CONTRACT
// ============================================

/// Simulation verdict from the external simulation collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationStatus {
    Success,
    Revert,
    Risk,
    /// No backend configured; explicitly "no additional signal"
    Skipped,
}

/// One balance delta predicted by simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetChange {
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Raw amount as decimal string, direction in `outgoing`
    pub raw_amount: String,
    pub outgoing: bool,
}

/// Result of the simulation collaborator call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutcome {
    pub status: SimulationStatus,
    #[serde(default)]
    pub asset_changes: Vec<AssetChange>,
    #[serde(default)]
    pub gas_used: Option<u64>,
}

impl SimulationOutcome {
    pub fn skipped() -> Self {
        Self {
            status: SimulationStatus::Skipped,
            asset_changes: Vec::new(),
            gas_used: None,
        }
    }
}

// ============================================
// ANALYSIS RESULT
// ============================================

/// Result of request analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Final recommendation
    pub recommend: Recommendation,
    /// Additive risk score, 0..=100
    pub score: u8,
    /// Firing-order reasons, most severe first
    pub reasons: Vec<Reason>,
    /// Typed intent, when the request carried decodable calldata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_action: Option<DecodedAction>,
    /// Domain trust verdict for the request origin
    pub trust: TrustVerdict,
    /// First flagged counterparty, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_intel_hit: Option<AddressIntelHit>,
    /// Confidence backing: fresh intel, stale snapshot, or seed only
    pub verification_level: VerificationLevel,
    /// What kind of interaction this was
    pub request_kind: RequestKind,
    /// Request origin host (normalized)
    pub host: String,
    /// Analysis latency in milliseconds
    pub latency_ms: u64,
    /// Unix timestamp of the analysis
    pub timestamp: i64,
}

impl AnalysisResult {
    /// Set the analysis latency
    pub fn set_latency(&mut self, start: Instant) {
        self.latency_ms = start.elapsed().as_millis() as u64;
    }

    /// Pretty print the verdict for CLI output
    pub fn summary(&self) -> String {
        let mut output = format!(
            "\n{} {} | score {} | {} | {}\n",
            self.recommend.emoji(),
            self.recommend.as_str(),
            self.score,
            self.request_kind.as_str(),
            if self.host.is_empty() { "<no host>" } else { &self.host },
        );
        if let Some(action) = &self.decoded_action {
            output.push_str(&format!("   Action: {}\n", action.kind_str()));
        }
        output.push_str(&format!(
            "   Trust: {} ({}) | Verification: {}\n",
            self.trust.level.as_str(),
            self.trust.score,
            self.verification_level.as_str()
        ));
        if !self.reasons.is_empty() {
            output.push_str("   Reasons:\n");
            for reason in &self.reasons {
                output.push_str(&format!("     - {}\n", reason.description()));
            }
        }
        output.push_str(&format!("   Latency: {}ms\n", self.latency_ms));
        output
    }
}

// ============================================
// HELPERS
// ============================================

/// The unlimited sentinel: 2^256 - 1
pub fn unlimited_amount() -> U256 {
    U256::MAX
}
