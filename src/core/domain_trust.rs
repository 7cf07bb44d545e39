//! Domain Trust Evaluator - hostname heuristics
//!
//! Two deliberately separate signals come out of this module: the
//! `TrustVerdict` (allowlist + lookalike heuristics, fixed scan order)
//! and an additive `risk_delta` used further down the pipeline. They
//! feed different policy stages and are never collapsed into one number.

use std::collections::HashSet;

use crate::models::{TrustLevel, TrustReason, TrustVerdict};
use crate::utils::{
    normalize_host, ABUSE_TLDS, BRAND_SEEDS, DELTA_ABUSE_TLD, DELTA_BRAND_SUBDOMAIN, DELTA_MAX,
    DELTA_PUNYCODE, DELTA_TYPOSQUAT, MAX_TRUST_REASONS, PHISHING_KEYWORDS,
    SUSPICIOUS_DIGIT_COUNT, SUSPICIOUS_DOT_COUNT, SUSPICIOUS_HYPHEN_COUNT,
    SUSPICIOUS_LABEL_DEPTH, TRUST_SCORE_OFFICIAL, TRUST_SCORE_SUSPICIOUS,
    TRUST_SCORE_VARIANT_FLOOR, TYPOSQUAT_MAX_DISTANCE,
};

/// Evaluate how much a hostname looks like the real thing.
///
/// An allowlist match short-circuits: no heuristic runs once matched.
/// Heuristics fire in a fixed order; reason order is part of the contract.
/// Allowlist entries are expected pre-normalized (stores normalize on
/// insert); the loose pass tolerates scheme and path junk anyway.
pub fn evaluate(host: &str, allowlist: &HashSet<String>) -> TrustVerdict {
    let host = normalize_host(host);
    if host.is_empty() {
        return TrustVerdict::unknown(vec![TrustReason::NoHost]);
    }

    if let Some(entry) = allowlist_match(&host, allowlist, false) {
        return TrustVerdict {
            level: TrustLevel::LikelyOfficial,
            score: TRUST_SCORE_OFFICIAL,
            reasons: Vec::new(),
            matched_allowlist_domain: Some(entry),
        };
    }

    let mut fired: Vec<TrustReason> = Vec::new();
    if has_punycode_label(&host) {
        fired.push(TrustReason::Punycode);
    }
    if host.contains("--") {
        fired.push(TrustReason::DoubleHyphen);
    }
    if host.chars().filter(|c| c.is_ascii_digit()).count() >= SUSPICIOUS_DIGIT_COUNT {
        fired.push(TrustReason::ManyDigits);
    }
    if host.chars().filter(|c| *c == '-').count() >= SUSPICIOUS_HYPHEN_COUNT {
        fired.push(TrustReason::ManyHyphens);
    }
    if let Some(keyword) = PHISHING_KEYWORDS.iter().find(|k| host.contains(*k)) {
        fired.push(TrustReason::PhishingKeyword {
            keyword: (*keyword).to_string(),
        });
    }
    if let Some(brand) = impersonated_brand(&host) {
        fired.push(TrustReason::BrandImpersonation {
            brand: brand.to_string(),
        });
    }
    let labels = host.split('.').count();
    let dots = host.chars().filter(|c| *c == '.').count();
    if labels >= SUSPICIOUS_LABEL_DEPTH && dots >= SUSPICIOUS_DOT_COUNT {
        fired.push(TrustReason::DeepSubdomain);
    }

    if !fired.is_empty() {
        fired.truncate(MAX_TRUST_REASONS);
        return TrustVerdict {
            level: TrustLevel::Suspicious,
            score: TRUST_SCORE_SUSPICIOUS,
            reasons: fired,
            matched_allowlist_domain: None,
        };
    }

    // Nothing fired; a loose allowlist variant still raises the floor
    if allowlist_match(&host, allowlist, true).is_some() {
        return TrustVerdict {
            level: TrustLevel::Unknown,
            score: TRUST_SCORE_VARIANT_FLOOR,
            reasons: vec![TrustReason::AllowlistedVariant],
            matched_allowlist_domain: None,
        };
    }

    TrustVerdict::unknown(Vec::new())
}

/// Additive impersonation score fed to the policy stage, clamped 0..=80.
/// Kept independent of `evaluate`; the two must not be merged.
pub fn risk_delta(host: &str, brand_seeds: &[(&str, &str)]) -> (u8, Vec<TrustReason>) {
    let host = normalize_host(host);
    let mut reasons: Vec<TrustReason> = Vec::new();
    if host.is_empty() {
        return (0, reasons);
    }
    let mut delta: u32 = 0;

    if has_punycode_label(&host) {
        delta += DELTA_PUNYCODE as u32;
        reasons.push(TrustReason::Punycode);
    }

    let labels: Vec<&str> = host.split('.').collect();
    let (registrable, registrable_label) = registrable_parts(&host);
    let subdomain_labels: &[&str] = if labels.len() > 2 {
        &labels[..labels.len() - 2]
    } else {
        &[]
    };

    for &(brand, official) in brand_seeds {
        if is_official_host(&host, official) {
            continue;
        }
        if subdomain_labels.iter().any(|label| label.contains(brand))
            && !registrable.contains(brand)
        {
            delta += DELTA_BRAND_SUBDOMAIN as u32;
            reasons.push(TrustReason::BrandInSubdomain {
                brand: brand.to_string(),
            });
            break;
        }
    }

    for &(brand, official) in brand_seeds {
        if is_official_host(&host, official) {
            continue;
        }
        if is_near_miss(&registrable_label, brand) {
            delta += DELTA_TYPOSQUAT as u32;
            reasons.push(TrustReason::Typosquat {
                brand: brand.to_string(),
            });
            break;
        }
    }

    if let Some(tld) = labels.last() {
        if ABUSE_TLDS.contains(tld) {
            delta += DELTA_ABUSE_TLD as u32;
            reasons.push(TrustReason::AbuseTld {
                tld: (*tld).to_string(),
            });
        }
    }

    (delta.min(DELTA_MAX as u32) as u8, reasons)
}

/// Exact or dot-suffix match against the allowlist.
///
/// The strict pass is all set lookups: the host itself, then each parent
/// suffix down to the TLD. The loose pass walks the entries and strips
/// scheme and path junk first, for allowlists populated from full URLs.
fn allowlist_match(host: &str, allowlist: &HashSet<String>, loose: bool) -> Option<String> {
    if loose {
        for raw in allowlist {
            let entry = strip_scheme_and_path(raw);
            if entry.is_empty() {
                continue;
            }
            if host == entry || host.ends_with(&format!(".{}", entry)) {
                return Some(entry);
            }
        }
        return None;
    }

    if allowlist.contains(host) {
        return Some(host.to_string());
    }
    let labels: Vec<&str> = host.split('.').collect();
    for start in 1..labels.len() {
        let suffix = labels[start..].join(".");
        if allowlist.contains(&suffix) {
            return Some(suffix);
        }
    }
    None
}

fn strip_scheme_and_path(entry: &str) -> String {
    let entry = entry.trim();
    let after_scheme = match entry.find("://") {
        Some(idx) => &entry[idx + 3..],
        None => entry,
    };
    let end = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    normalize_host(&after_scheme[..end])
}

fn has_punycode_label(host: &str) -> bool {
    host.split('.').any(|label| label.starts_with("xn--"))
}

fn is_official_host(host: &str, official: &str) -> bool {
    host == official || host.ends_with(&format!(".{}", official))
}

/// First seeded brand appearing in the host while the host is not
/// (and is not under) that brand's official domain
fn impersonated_brand(host: &str) -> Option<&'static str> {
    BRAND_SEEDS
        .iter()
        .find(|(brand, official)| host.contains(brand) && !is_official_host(host, official))
        .map(|(brand, _)| *brand)
}

/// Naive registrable domain: the final two labels. Multi-part public
/// suffixes get mis-split, which only makes the brand checks fire more.
fn registrable_parts(host: &str) -> (String, String) {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() >= 2 {
        let registrable = labels[labels.len() - 2..].join(".");
        (registrable, labels[labels.len() - 2].to_string())
    } else {
        (host.to_string(), host.to_string())
    }
}

/// Substring-but-not-equal in either direction (length-guarded on the
/// short side) or within the edit-distance budget
fn is_near_miss(label: &str, brand: &str) -> bool {
    if label == brand {
        return false;
    }
    if label.contains(brand) {
        return true;
    }
    if brand.contains(label) && label.len() + TYPOSQUAT_MAX_DISTANCE >= brand.len() {
        return true;
    }
    levenshtein(label, brand) <= TYPOSQUAT_MAX_DISTANCE
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
