//! Intel feed registry and format parsers
//!
//! Every source is declared here once: where it lives, what it
//! contributes, and how its body is laid out. Parsers are tolerant at
//! the entry level (bad rows are skipped) but strict at the envelope
//! level, so a feed that changes shape fails loudly instead of
//! silently contributing nothing.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::models::{AddressLabel, AppError, AppResult};
use crate::utils::{normalize_address, normalize_host, FEED_TIMEOUT_SECS};

// ============================================
// TRANSPORT SEAM
// ============================================

/// One feed download. The etag is whatever validator the server sent.
#[derive(Debug, Clone)]
pub struct FeedBody {
    pub body: String,
    pub etag: Option<String>,
}

impl FeedBody {
    /// A 304 response: empty body, prior contribution stays current
    pub fn not_modified(etag: Option<String>) -> Self {
        Self {
            body: String::new(),
            etag,
        }
    }
}

/// Transport seam for feed downloads. `None` means the fetch failed
/// outright; a 304 comes back as `Some` with an empty body so callers
/// can tell "nothing changed" apart from "nothing arrived".
pub trait FeedFetch: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
    ) -> impl Future<Output = Option<FeedBody>> + Send;
}

// ============================================
// FEED REGISTRY
// ============================================

/// What a feed contributes to the union
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Blocklist,
    Allowlist,
}

/// How a feed's body is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    /// Newline-delimited hosts; `0.0.0.0` prefixes and `#` comments tolerated
    HostsFile,
    /// JSON array of host or address strings
    JsonArray,
    /// JSON object carrying the named array of host strings
    JsonField(&'static str),
    /// JSON array of objects with an `address` field
    AddressObjects,
    /// JSON array of `{chainId, address}` objects
    ScamTokenObjects,
    /// JSON object mapping address to an array of label strings
    LabelMap,
}

/// Static descriptor of one independent intel source
#[derive(Debug, Clone, Copy)]
pub struct FeedDescriptor {
    pub id: &'static str,
    pub kind: FeedKind,
    pub url: &'static str,
    pub format: FeedFormat,
}

/// Domain and address sets for the threat store
pub const THREAT_FEEDS: &[FeedDescriptor] = &[
    FeedDescriptor {
        id: "eth-phishing-blocklist",
        kind: FeedKind::Blocklist,
        url: "https://raw.githubusercontent.com/MetaMask/eth-phishing-detect/main/src/config.json",
        format: FeedFormat::JsonField("blacklist"),
    },
    FeedDescriptor {
        id: "eth-phishing-allowlist",
        kind: FeedKind::Allowlist,
        url: "https://raw.githubusercontent.com/MetaMask/eth-phishing-detect/main/src/config.json",
        format: FeedFormat::JsonField("whitelist"),
    },
    FeedDescriptor {
        id: "scamsniffer-domains",
        kind: FeedKind::Blocklist,
        url: "https://raw.githubusercontent.com/scamsniffer/scam-database/main/blacklist/domains.json",
        format: FeedFormat::JsonArray,
    },
    FeedDescriptor {
        id: "scamsniffer-addresses",
        kind: FeedKind::Blocklist,
        url: "https://raw.githubusercontent.com/scamsniffer/scam-database/main/blacklist/address.json",
        format: FeedFormat::JsonArray,
    },
    FeedDescriptor {
        id: "phishing-filter",
        kind: FeedKind::Blocklist,
        url: "https://malware-filter.gitlab.io/malware-filter/phishing-filter-hosts.txt",
        format: FeedFormat::HostsFile,
    },
    FeedDescriptor {
        id: "scam-tokens",
        kind: FeedKind::Blocklist,
        url: "https://intel.walletsentry.io/v1/scam-tokens.json",
        format: FeedFormat::ScamTokenObjects,
    },
];

/// Label sources for the address store, with the label to attach when
/// the feed only lists bare addresses
pub const ADDRESS_FEEDS: &[(FeedDescriptor, AddressLabel)] = &[
    (
        FeedDescriptor {
            id: "mew-darklist",
            kind: FeedKind::Blocklist,
            url: "https://raw.githubusercontent.com/MyEtherWallet/ethereum-lists/master/src/addresses/addresses-darklist.json",
            format: FeedFormat::AddressObjects,
        },
        AddressLabel::ScamReported,
    ),
    (
        FeedDescriptor {
            id: "scamsniffer-wallets",
            kind: FeedKind::Blocklist,
            url: "https://raw.githubusercontent.com/scamsniffer/scam-database/main/blacklist/address.json",
            format: FeedFormat::JsonArray,
        },
        AddressLabel::PhishingReported,
    ),
    (
        FeedDescriptor {
            id: "sentry-labels",
            kind: FeedKind::Blocklist,
            url: "https://intel.walletsentry.io/v1/address-labels.json",
            format: FeedFormat::LabelMap,
        },
        AddressLabel::MaliciousContract,
    ),
];

// ============================================
// PARSING
// ============================================

/// Normalized entries out of one feed body
#[derive(Debug, Default, Clone)]
pub struct ParsedFeed {
    pub domains: HashSet<String>,
    pub addresses: HashSet<String>,
    pub scam_tokens: HashSet<(u64, String)>,
    pub labels: Vec<(String, AddressLabel)>,
}

impl ParsedFeed {
    pub fn entry_count(&self) -> usize {
        self.domains.len() + self.addresses.len() + self.scam_tokens.len() + self.labels.len()
    }
}

/// Parse a feed body according to its declared format
pub fn parse_feed(format: FeedFormat, body: &str) -> AppResult<ParsedFeed> {
    let mut parsed = ParsedFeed::default();
    match format {
        FeedFormat::HostsFile => parse_hosts_file(body, &mut parsed),
        FeedFormat::JsonArray => {
            let rows: Vec<Value> = serde_json::from_str(body)?;
            parse_string_array(&rows, &mut parsed);
        }
        FeedFormat::JsonField(field) => {
            let root: Value = serde_json::from_str(body)?;
            let rows = root.get(field).and_then(|v| v.as_array()).ok_or_else(|| {
                AppError::feed_parse_failed(format!("Missing array field '{}'", field))
            })?;
            parse_string_array(rows, &mut parsed);
        }
        FeedFormat::AddressObjects => {
            let rows: Vec<Value> = serde_json::from_str(body)?;
            for row in &rows {
                if let Some(raw) = row.get("address").and_then(|v| v.as_str()) {
                    if let Some(address) = normalize_address(raw) {
                        parsed.addresses.insert(address);
                    }
                }
            }
        }
        FeedFormat::ScamTokenObjects => {
            let rows: Vec<Value> = serde_json::from_str(body)?;
            for row in &rows {
                let chain_id = match row.get("chainId") {
                    Some(Value::Number(n)) => n.as_u64(),
                    Some(Value::String(s)) => s.parse::<u64>().ok(),
                    _ => None,
                };
                let address = row
                    .get("address")
                    .and_then(|v| v.as_str())
                    .and_then(normalize_address);
                if let (Some(chain_id), Some(address)) = (chain_id, address) {
                    parsed.scam_tokens.insert((chain_id, address));
                }
            }
        }
        FeedFormat::LabelMap => {
            let root: Value = serde_json::from_str(body)?;
            let map = root
                .as_object()
                .ok_or_else(|| AppError::feed_parse_failed("Label feed root is not an object"))?;
            for (raw, value) in map {
                if let Some(address) = normalize_address(raw) {
                    if let Some(rows) = value.as_array() {
                        for row in rows {
                            if let Some(label) = row.as_str().and_then(parse_label) {
                                parsed.labels.push((address.clone(), label));
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(parsed)
}

fn parse_hosts_file(body: &str, out: &mut ParsedFeed) {
    for line in body.lines() {
        // inline comments too: "0.0.0.0 evil.com # seen 2024-11"
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let candidate = line.split_whitespace().last().unwrap_or("");
        let host = normalize_host(candidate);
        if host == "localhost" || host == "0.0.0.0" || !looks_like_host(&host) {
            continue;
        }
        out.domains.insert(host);
    }
}

fn parse_string_array(rows: &[Value], out: &mut ParsedFeed) {
    for row in rows {
        if let Some(raw) = row.as_str() {
            push_entry(raw, out);
        }
    }
}

/// Classify one bare string entry as an address or a host
fn push_entry(raw: &str, out: &mut ParsedFeed) {
    if let Some(address) = normalize_address(raw) {
        out.addresses.insert(address);
        return;
    }
    let host = normalize_host(raw);
    if looks_like_host(&host) {
        out.domains.insert(host);
    }
}

fn looks_like_host(host: &str) -> bool {
    host.len() >= 4 && host.contains('.') && !host.contains(char::is_whitespace)
}

/// Map a feed's label vocabulary onto ours; unknown labels are skipped
pub fn parse_label(raw: &str) -> Option<AddressLabel> {
    match raw.to_ascii_uppercase().as_str() {
        "SCAM" | "SCAMMING" | "SCAM_REPORTED" => Some(AddressLabel::ScamReported),
        "PHISH" | "PHISHING" | "PHISHING_REPORTED" => Some(AddressLabel::PhishingReported),
        "SANCTIONED" | "OFAC" => Some(AddressLabel::Sanctioned),
        "MALICIOUS" | "EXPLOIT" | "MALICIOUS_CONTRACT" => Some(AddressLabel::MaliciousContract),
        _ => None,
    }
}

// ============================================
// FETCH CYCLE
// ============================================

/// Last-known health of one source, persisted with the snapshot so a
/// restart can report it before the first refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub ok: bool,
    /// Entries this source contributed on its last successful parse
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one conditional fetch and parse cycle
#[derive(Debug)]
pub enum FeedOutcome {
    Fresh(ParsedFeed),
    NotModified,
    Failed(String),
}

/// Fetch one feed under its own timeout budget, remember the etag it
/// returned, and parse the body. A failure here never touches state;
/// the caller decides what a failed source means for the union.
pub async fn fetch_feed<F: FeedFetch>(
    fetcher: &F,
    etags: &DashMap<String, String>,
    feed: &FeedDescriptor,
) -> FeedOutcome {
    let etag = etags.get(feed.url).map(|e| e.value().clone());
    let fetched = tokio::time::timeout(
        Duration::from_secs(FEED_TIMEOUT_SECS),
        fetcher.fetch(feed.url, etag.as_deref()),
    )
    .await;

    let body = match fetched {
        Err(_) => return FeedOutcome::Failed(AppError::feed_timeout(feed.id).to_string()),
        Ok(None) => {
            return FeedOutcome::Failed(
                AppError::feed_fetch_failed(format!("Feed fetch failed: {}", feed.id)).to_string(),
            )
        }
        Ok(Some(body)) => body,
    };

    if let Some(tag) = &body.etag {
        etags.insert(feed.url.to_string(), tag.clone());
    }
    if body.body.is_empty() {
        return FeedOutcome::NotModified;
    }
    match parse_feed(feed.format, &body.body) {
        Ok(parsed) => FeedOutcome::Fresh(parsed),
        Err(e) => FeedOutcome::Failed(e.to_string()),
    }
}
