//! Threat intel store - domains, addresses, scam tokens
//!
//! Lookups never wait on the network: readers grab an `Arc` to an
//! immutable snapshot and the refresh cycle builds a whole replacement
//! before swapping it in. The union only grows across refreshes; a
//! failing source keeps whatever it contributed last time.

use chrono::Utc;
use dashmap::DashMap;
use futures_util::future::join_all;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::feeds::{fetch_feed, FeedFetch, FeedKind, FeedOutcome, SourceStatus, THREAT_FEEDS};
use super::persist::SnapshotStore;
use super::seed;
use crate::models::VerificationLevel;
use crate::utils::{
    normalize_address, normalize_host, INTEL_SCHEMA_VERSION, INTEL_TTL_SECS,
    STORE_KEY_THREAT_INTEL,
};

// ============================================
// SNAPSHOT
// ============================================

/// The full threat dataset at one point in time. Immutable once
/// published; each refresh swaps in a replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatIntelCache {
    pub schema_version: u32,
    /// Unix seconds of the last refresh with at least one live source;
    /// 0 means seed-only
    pub updated_at: i64,
    pub per_source_status: HashMap<String, SourceStatus>,
    pub blocked_domains: HashSet<String>,
    pub trusted_domains: HashSet<String>,
    pub blocked_addresses: HashSet<String>,
    /// `(chain_id, token_address)` pairs reported as scams
    pub scam_tokens: HashSet<(u64, String)>,
}

impl ThreatIntelCache {
    /// What a fresh install starts from: bundled seed, nothing else
    pub fn seeded() -> Self {
        Self {
            schema_version: INTEL_SCHEMA_VERSION,
            updated_at: 0,
            per_source_status: HashMap::new(),
            blocked_domains: HashSet::new(),
            trusted_domains: seed::TRUSTED_DOMAIN_SEED
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
            blocked_addresses: HashSet::new(),
            scam_tokens: HashSet::new(),
        }
    }

    pub fn is_stale(&self, now: i64) -> bool {
        now - self.updated_at > INTEL_TTL_SECS
    }

    /// Staleness shapes confidence reporting only, never severity
    pub fn verification_level(&self, now: i64) -> VerificationLevel {
        if self.updated_at == 0 {
            VerificationLevel::Basic
        } else if self.is_stale(now) {
            VerificationLevel::Local
        } else {
            VerificationLevel::Full
        }
    }

    /// Exact or parent-domain match against the blocklist
    pub fn blocked_domain_match(&self, host: &str) -> Option<String> {
        domain_or_parent(&self.blocked_domains, host)
    }

    pub fn has_blocked_address(&self, address: &str) -> bool {
        self.blocked_addresses.contains(address)
    }

    pub fn is_scam_token(&self, chain_id: u64, address: &str) -> bool {
        self.scam_tokens.contains(&(chain_id, address.to_string()))
    }
}

/// Walk the host and each parent suffix against the set
fn domain_or_parent(set: &HashSet<String>, host: &str) -> Option<String> {
    if host.is_empty() {
        return None;
    }
    if set.contains(host) {
        return Some(host.to_string());
    }
    let labels: Vec<&str> = host.split('.').collect();
    for start in 1..labels.len() {
        let suffix = labels[start..].join(".");
        if set.contains(&suffix) {
            return Some(suffix);
        }
    }
    None
}

// ============================================
// STORE
// ============================================

/// Owns the published snapshot and the refresh machinery
pub struct ThreatIntelStore<F: FeedFetch, S: SnapshotStore> {
    fetcher: F,
    storage: S,
    snapshot: RwLock<Arc<ThreatIntelCache>>,
    refreshing: AtomicBool,
    etags: DashMap<String, String>,
    user_blocked_domains: Mutex<HashSet<String>>,
    user_trusted_domains: Mutex<HashSet<String>>,
    user_blocked_addresses: Mutex<HashSet<String>>,
}

impl<F: FeedFetch, S: SnapshotStore> ThreatIntelStore<F, S> {
    /// Start from the persisted snapshot when one exists, seed otherwise
    pub fn new(fetcher: F, storage: S) -> Self {
        let initial = load_snapshot(&storage).unwrap_or_else(ThreatIntelCache::seeded);
        Self {
            fetcher,
            storage,
            snapshot: RwLock::new(Arc::new(initial)),
            refreshing: AtomicBool::new(false),
            etags: DashMap::new(),
            user_blocked_domains: Mutex::new(HashSet::new()),
            user_trusted_domains: Mutex::new(HashSet::new()),
            user_blocked_addresses: Mutex::new(HashSet::new()),
        }
    }

    /// The current snapshot. Cheap, lock held only for the Arc clone.
    pub fn get_cached(&self) -> Arc<ThreatIntelCache> {
        self.snapshot.read().clone()
    }

    pub fn verification_level(&self) -> VerificationLevel {
        self.get_cached().verification_level(Utc::now().timestamp())
    }

    /// Refresh from all sources. `force` ignores the TTL. Concurrent
    /// callers fold into the flight already running and get the current
    /// snapshot back immediately.
    pub async fn refresh(&self, force: bool) -> Arc<ThreatIntelCache> {
        let current = self.get_cached();
        if !force && !current.is_stale(Utc::now().timestamp()) {
            return current;
        }
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            debug!("Threat intel refresh already in flight");
            return current;
        }
        let next = self.run_refresh(&current).await;
        self.refreshing.store(false, Ordering::Release);
        next
    }

    async fn run_refresh(&self, previous: &ThreatIntelCache) -> Arc<ThreatIntelCache> {
        let started = Instant::now();
        let outcomes = join_all(THREAT_FEEDS.iter().map(|feed| async move {
            (feed, fetch_feed(&self.fetcher, &self.etags, feed).await)
        }))
        .await;

        let mut next = previous.clone();
        next.schema_version = INTEL_SCHEMA_VERSION;

        let mut live = 0usize;
        let mut failed = 0usize;
        for (feed, outcome) in outcomes {
            let prior_count = previous
                .per_source_status
                .get(feed.id)
                .map(|s| s.count)
                .unwrap_or(0);
            let status = match outcome {
                FeedOutcome::Fresh(parsed) => {
                    let count = parsed.entry_count();
                    match feed.kind {
                        FeedKind::Blocklist => {
                            next.blocked_domains.extend(parsed.domains);
                            next.blocked_addresses.extend(parsed.addresses);
                            next.scam_tokens.extend(parsed.scam_tokens);
                        }
                        FeedKind::Allowlist => {
                            next.trusted_domains.extend(parsed.domains);
                        }
                    }
                    live += 1;
                    SourceStatus {
                        ok: true,
                        count,
                        error: None,
                    }
                }
                FeedOutcome::NotModified => {
                    live += 1;
                    SourceStatus {
                        ok: true,
                        count: prior_count,
                        error: None,
                    }
                }
                FeedOutcome::Failed(error) => {
                    failed += 1;
                    warn!("⚠️ Feed {} failed: {}", feed.id, error);
                    SourceStatus {
                        ok: false,
                        count: prior_count,
                        error: Some(error),
                    }
                }
            };
            next.per_source_status.insert(feed.id.to_string(), status);
        }

        // A cycle with zero live sources does not count as an update;
        // the TTL keeps it eligible for the next tick
        if live > 0 {
            next.updated_at = Utc::now().timestamp();
        }

        // Seed and user overrides are layered on top of every refresh
        for domain in seed::TRUSTED_DOMAIN_SEED {
            next.trusted_domains.insert((*domain).to_string());
        }
        self.apply_user_overrides(&mut next);

        info!(
            "🛡️ Threat intel refreshed: {} ok / {} failed | {} blocked domains, {} blocked addresses, {} scam tokens ({}ms)",
            live,
            failed,
            next.blocked_domains.len(),
            next.blocked_addresses.len(),
            next.scam_tokens.len(),
            started.elapsed().as_millis()
        );

        let arc = Arc::new(next);
        *self.snapshot.write() = arc.clone();
        self.persist(&arc);
        arc
    }

    // ============================================
    // USER OVERRIDES
    // ============================================

    /// Block a domain locally. Takes effect immediately and survives
    /// every later refresh.
    pub fn add_user_blocked_domain(&self, host: &str) {
        let host = normalize_host(host);
        if host.is_empty() {
            return;
        }
        self.user_blocked_domains.lock().insert(host.clone());
        self.republish(|cache| {
            cache.blocked_domains.insert(host.clone());
        });
        info!("🚫 User blocked domain: {}", host);
    }

    /// Trust a domain locally
    pub fn add_user_trusted_domain(&self, host: &str) {
        let host = normalize_host(host);
        if host.is_empty() {
            return;
        }
        self.user_trusted_domains.lock().insert(host.clone());
        self.republish(|cache| {
            cache.trusted_domains.insert(host.clone());
        });
        info!("✅ User trusted domain: {}", host);
    }

    /// Block an address locally
    pub fn add_user_blocked_address(&self, address: &str) {
        let address = match normalize_address(address) {
            Some(a) => a,
            None => {
                warn!("⚠️ Ignoring malformed user-blocked address: {}", address);
                return;
            }
        };
        self.user_blocked_addresses.lock().insert(address.clone());
        self.republish(|cache| {
            cache.blocked_addresses.insert(address.clone());
        });
        info!("🚫 User blocked address: {}", address);
    }

    fn apply_user_overrides(&self, cache: &mut ThreatIntelCache) {
        for domain in self.user_blocked_domains.lock().iter() {
            cache.blocked_domains.insert(domain.clone());
        }
        for domain in self.user_trusted_domains.lock().iter() {
            cache.trusted_domains.insert(domain.clone());
        }
        for address in self.user_blocked_addresses.lock().iter() {
            cache.blocked_addresses.insert(address.clone());
        }
    }

    /// Clone, mutate, swap. Writers never touch the published snapshot
    /// in place.
    fn republish(&self, mutate: impl FnOnce(&mut ThreatIntelCache)) {
        let next = {
            let mut guard = self.snapshot.write();
            let mut cache = (**guard).clone();
            mutate(&mut cache);
            let arc = Arc::new(cache);
            *guard = arc.clone();
            arc
        };
        self.persist(&next);
    }

    fn persist(&self, cache: &ThreatIntelCache) {
        match serde_json::to_string(cache) {
            Ok(json) => {
                if let Err(e) = self.storage.save(&snapshot_key(), &json) {
                    warn!("⚠️ Threat snapshot not persisted: {}", e);
                }
            }
            Err(e) => warn!("⚠️ Threat snapshot not serializable: {}", e),
        }
    }
}

fn snapshot_key() -> String {
    format!("{}.v{}", STORE_KEY_THREAT_INTEL, INTEL_SCHEMA_VERSION)
}

fn load_snapshot<S: SnapshotStore>(storage: &S) -> Option<ThreatIntelCache> {
    let raw = match storage.load(&snapshot_key()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("⚠️ Threat snapshot unreadable: {}", e);
            return None;
        }
    };
    match serde_json::from_str::<ThreatIntelCache>(&raw) {
        Ok(cache) if cache.schema_version == INTEL_SCHEMA_VERSION => {
            info!(
                "📦 Threat intel restored: {} blocked domains, {} blocked addresses",
                cache.blocked_domains.len(),
                cache.blocked_addresses.len()
            );
            Some(cache)
        }
        Ok(cache) => {
            warn!(
                "⚠️ Threat snapshot schema {} != {}, starting from seed",
                cache.schema_version, INTEL_SCHEMA_VERSION
            );
            None
        }
        Err(e) => {
            warn!("⚠️ Threat snapshot corrupt, starting from seed: {}", e);
            None
        }
    }
}
