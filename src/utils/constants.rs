//! Constants Module - Single Source of Truth
//!
//! Every constant, tuning knob, and lookup table used across the engine
//! is defined here. No hardcoded values in other modules!

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "WalletSentry";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for feed downloads
pub const USER_AGENT: &str = "WalletSentry/1.0.0";

/// Default API port when PORT is unset
pub const DEFAULT_API_PORT: u16 = 8080;

// ============================================
// TIMING CONSTANTS
// ============================================

/// Per-feed fetch timeout (seconds); a slow feed never delays the others
pub const FEED_TIMEOUT_SECS: u64 = 6;

/// Intel snapshot TTL (seconds); controls refresh scheduling, never usability
pub const INTEL_TTL_SECS: i64 = 86_400;

/// Scheduler tick between staleness checks (seconds)
pub const REFRESH_TICK_SECS: u64 = 3_600;

/// Max random jitter added to a scheduled refresh (seconds)
pub const REFRESH_JITTER_MAX_SECS: u64 = 300;

// ============================================
// CALLDATA SELECTORS
// ============================================

/// ERC-20 `approve(address,uint256)`
pub const SEL_ERC20_APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
/// ERC-20 `transfer(address,uint256)`
pub const SEL_ERC20_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
/// ERC-20 `transferFrom(address,address,uint256)`
pub const SEL_ERC20_TRANSFER_FROM: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];
/// ERC-721/1155 `setApprovalForAll(address,bool)`
pub const SEL_SET_APPROVAL_FOR_ALL: [u8; 4] = [0xa2, 0x2c, 0xb4, 0x65];
/// ERC-721 `safeTransferFrom(address,address,uint256)`
pub const SEL_ERC721_SAFE_TRANSFER: [u8; 4] = [0x42, 0x84, 0x2e, 0x0e];
/// ERC-721 `safeTransferFrom(address,address,uint256,bytes)`
pub const SEL_ERC721_SAFE_TRANSFER_DATA: [u8; 4] = [0xb8, 0x8d, 0x4f, 0xde];
/// ERC-1155 `safeTransferFrom(address,address,uint256,uint256,bytes)`
pub const SEL_ERC1155_SAFE_TRANSFER: [u8; 4] = [0xf2, 0x42, 0x43, 0x2a];
/// ERC-1155 `safeBatchTransferFrom(address,address,uint256[],uint256[],bytes)`
pub const SEL_ERC1155_BATCH_TRANSFER: [u8; 4] = [0x2e, 0xb2, 0xc2, 0xd6];
/// EIP-2612 `permit(address,address,uint256,uint256,uint8,bytes32,bytes32)`
pub const SEL_EIP2612_PERMIT: [u8; 4] = [0xd5, 0x05, 0xac, 0xcf];

/// ABI word size in bytes
pub const WORD_BYTES: usize = 32;

/// Selector size in bytes
pub const SELECTOR_BYTES: usize = 4;

// ============================================
// DOMAIN HEURISTIC TABLES
// ============================================

/// Phishing keywords scanned as substrings of the full host.
/// Closed list; order matters for deterministic reason output.
pub const PHISHING_KEYWORDS: [&str; 9] = [
    "login", "secure", "verify", "account", "wallet", "airdrop", "claim", "support", "auth",
];

/// Brand seeds: (brand token, official registrable domain).
/// Used for impersonation checks; a host ending in the official domain is exempt.
pub const BRAND_SEEDS: &[(&str, &str)] = &[
    ("metamask", "metamask.io"),
    ("opensea", "opensea.io"),
    ("uniswap", "uniswap.org"),
    ("pancakeswap", "pancakeswap.finance"),
    ("coinbase", "coinbase.com"),
    ("binance", "binance.com"),
    ("ledger", "ledger.com"),
    ("trezor", "trezor.io"),
    ("phantom", "phantom.app"),
    ("etherscan", "etherscan.io"),
];

/// TLDs with disproportionate abuse rates in phishing feeds
pub const ABUSE_TLDS: [&str; 8] = ["xyz", "top", "tk", "ml", "cf", "gq", "icu", "rest"];

// ============================================
// TRUST SCORES
// ============================================

/// Score for an allowlisted host
pub const TRUST_SCORE_OFFICIAL: u8 = 92;
/// Score once any heuristic fires
pub const TRUST_SCORE_SUSPICIOUS: u8 = 22;
/// Score when nothing is known either way
pub const TRUST_SCORE_UNKNOWN: u8 = 55;
/// Floor applied for a loose allowlist-variant match
pub const TRUST_SCORE_VARIANT_FLOOR: u8 = 70;
/// At most this many heuristic reasons are reported
pub const MAX_TRUST_REASONS: usize = 4;

// Heuristic firing thresholds
pub const SUSPICIOUS_DIGIT_COUNT: usize = 4;
pub const SUSPICIOUS_HYPHEN_COUNT: usize = 3;
pub const SUSPICIOUS_LABEL_DEPTH: usize = 3;
pub const SUSPICIOUS_DOT_COUNT: usize = 4;

// ============================================
// DOMAIN RISK DELTA WEIGHTS
// ============================================

/// Punycode label present
pub const DELTA_PUNYCODE: u8 = 30;
/// Brand appears only in a subdomain label
pub const DELTA_BRAND_SUBDOMAIN: u8 = 35;
/// Registrable label is a near-miss of a brand
pub const DELTA_TYPOSQUAT: u8 = 40;
/// Abuse-prone TLD
pub const DELTA_ABUSE_TLD: u8 = 10;
/// Risk delta ceiling
pub const DELTA_MAX: u8 = 80;
/// Levenshtein distance at or below which a label counts as a typosquat
pub const TYPOSQUAT_MAX_DISTANCE: usize = 2;

// ============================================
// POLICY SCORE WEIGHTS
// ============================================

pub const WEIGHT_DOMAIN_BLOCKLIST: u8 = 90;
pub const WEIGHT_ADDRESS_SANCTIONED: u8 = 95;
pub const WEIGHT_UNLIMITED_APPROVAL: u8 = 70;
pub const WEIGHT_APPROVAL_FOR_ALL: u8 = 65;
pub const WEIGHT_UNLIMITED_PERMIT: u8 = 70;
pub const WEIGHT_ADDRESS_FLAGGED: u8 = 60;
pub const WEIGHT_SCAM_TOKEN: u8 = 55;
pub const WEIGHT_SIMULATION_RISK: u8 = 50;
pub const WEIGHT_SIMULATION_REVERT: u8 = 25;
pub const WEIGHT_DOMAIN_SUSPICIOUS: u8 = 30;

/// Risk delta at or above this contributes a WARN
pub const RISK_DELTA_WARN_THRESHOLD: u8 = 35;

// ============================================
// CHAIN IDS
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// BNB Smart Chain
pub const CHAIN_ID_BSC: u64 = 56;
/// Polygon
pub const CHAIN_ID_POLYGON: u64 = 137;
/// Arbitrum One
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
/// Optimism
pub const CHAIN_ID_OPTIMISM: u64 = 10;
/// Avalanche C-Chain
pub const CHAIN_ID_AVALANCHE: u64 = 43114;
/// Base
pub const CHAIN_ID_BASE: u64 = 8453;

/// Get chain name for logs and API output
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_BSC => "BNB Smart Chain",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_ARBITRUM => "Arbitrum One",
        CHAIN_ID_OPTIMISM => "Optimism",
        CHAIN_ID_AVALANCHE => "Avalanche C-Chain",
        CHAIN_ID_BASE => "Base",
        _ => "Unknown",
    }
}

// ============================================
// PERSISTENCE
// ============================================

/// Bumped whenever a persisted cache layout changes shape
pub const INTEL_SCHEMA_VERSION: u32 = 1;

/// Storage key stem for the threat intel snapshot
pub const STORE_KEY_THREAT_INTEL: &str = "threat_intel";

/// Storage key stem for the address intel snapshot
pub const STORE_KEY_ADDRESS_INTEL: &str = "address_intel";

// ============================================
// NORMALIZATION UTILITIES
// ============================================

/// Normalize an EVM address to lowercase `0x` + 40 hex chars.
/// Returns None for anything that is not shaped like an address.
pub fn normalize_address(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let rest = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))?;
    if rest.len() != 40 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", rest.to_lowercase()))
}

/// Normalize a hostname: lowercase, trim whitespace, strip one trailing dot
pub fn normalize_host(raw: &str) -> String {
    let mut host = raw.trim().to_lowercase();
    if host.ends_with('.') {
        host.pop();
    }
    host
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_bytes() {
        assert_eq!(hex::encode(SEL_ERC20_APPROVE), "095ea7b3");
        assert_eq!(hex::encode(SEL_SET_APPROVAL_FOR_ALL), "a22cb465");
        assert_eq!(hex::encode(SEL_EIP2612_PERMIT), "d505accf");
        assert_eq!(hex::encode(SEL_ERC1155_BATCH_TRANSFER), "2eb2c2d6");
    }

    #[test]
    fn test_normalize_address() {
        let addr = normalize_address("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        assert_eq!(
            addr.as_deref(),
            Some("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2")
        );
        assert!(normalize_address("0x1234").is_none());
        assert!(normalize_address("not-an-address").is_none());
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("  App.UniSwap.ORG. "), "app.uniswap.org");
        assert_eq!(normalize_host("opensea.io"), "opensea.io");
    }

    #[test]
    fn test_chain_names() {
        assert_eq!(get_chain_name(1), "Ethereum");
        assert_eq!(get_chain_name(999), "Unknown");
    }
}
