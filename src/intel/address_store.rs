//! Address intel store - abuse labels per address
//!
//! Same lifecycle as the threat store, but the payload is a label map:
//! address -> ordered label set. The bundled sanctions seed merges
//! ahead of every feed, so SANCTIONED sits first on addresses that
//! carry it and the check works with no network at all.

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

use super::feeds::{fetch_feed, FeedFetch, FeedOutcome, SourceStatus, ADDRESS_FEEDS};
use super::persist::SnapshotStore;
use super::seed;
use crate::models::{AddressIntelHit, AddressLabel, VerificationLevel};
use crate::utils::{
    normalize_address, INTEL_SCHEMA_VERSION, INTEL_TTL_SECS, STORE_KEY_ADDRESS_INTEL,
};

// ============================================
// SNAPSHOT
// ============================================

/// Published address-label dataset. Labels keep merge order: seed
/// sanctions first, then feeds in registry order, then user entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressIntel {
    pub schema_version: u32,
    /// Unix seconds of the last refresh with at least one live source;
    /// 0 means seed-only
    pub updated_at: i64,
    pub per_source_status: HashMap<String, SourceStatus>,
    pub labels_by_address: HashMap<String, Vec<AddressLabel>>,
}

impl AddressIntel {
    pub fn seeded() -> Self {
        let mut labels_by_address = HashMap::new();
        for address in seed::SANCTIONED_ADDRESS_SEED {
            labels_by_address.insert((*address).to_string(), vec![AddressLabel::Sanctioned]);
        }
        Self {
            schema_version: INTEL_SCHEMA_VERSION,
            updated_at: 0,
            per_source_status: HashMap::new(),
            labels_by_address,
        }
    }

    pub fn is_stale(&self, now: i64) -> bool {
        now - self.updated_at > INTEL_TTL_SECS
    }

    pub fn verification_level(&self, now: i64) -> VerificationLevel {
        if self.updated_at == 0 {
            VerificationLevel::Basic
        } else if self.is_stale(now) {
            VerificationLevel::Local
        } else {
            VerificationLevel::Full
        }
    }

    pub fn lookup(&self, address: &str) -> Option<&[AddressLabel]> {
        self.labels_by_address.get(address).map(|v| v.as_slice())
    }

    /// Lookup shaped for the policy engine
    pub fn hit_for(&self, address: &str) -> Option<AddressIntelHit> {
        self.lookup(address).map(|labels| AddressIntelHit {
            address: address.to_string(),
            labels: labels.to_vec(),
        })
    }
}

/// Append a label, keeping the per-address list an ordered set
fn push_unique(map: &mut HashMap<String, Vec<AddressLabel>>, address: &str, label: AddressLabel) {
    let labels = map.entry(address.to_string()).or_default();
    if !labels.contains(&label) {
        labels.push(label);
    }
}

// ============================================
// STORE
// ============================================

pub struct AddressIntelStore<F: FeedFetch, S: SnapshotStore> {
    fetcher: F,
    storage: S,
    snapshot: RwLock<Arc<AddressIntel>>,
    refreshing: AtomicBool,
    etags: DashMap<String, String>,
    user_flagged: Mutex<HashSet<(String, AddressLabel)>>,
}

impl<F: FeedFetch, S: SnapshotStore> AddressIntelStore<F, S> {
    pub fn new(fetcher: F, storage: S) -> Self {
        let initial = load_snapshot(&storage).unwrap_or_else(AddressIntel::seeded);
        Self {
            fetcher,
            storage,
            snapshot: RwLock::new(Arc::new(initial)),
            refreshing: AtomicBool::new(false),
            etags: DashMap::new(),
            user_flagged: Mutex::new(HashSet::new()),
        }
    }

    pub fn get_cached(&self) -> Arc<AddressIntel> {
        self.snapshot.read().clone()
    }

    pub fn verification_level(&self) -> VerificationLevel {
        self.get_cached().verification_level(Utc::now().timestamp())
    }

    /// Refresh from all label sources, single-flight like the threat
    /// store
    pub async fn refresh(&self, force: bool) -> Arc<AddressIntel> {
        let current = self.get_cached();
        if !force && !current.is_stale(Utc::now().timestamp()) {
            return current;
        }
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            debug!("Address intel refresh already in flight");
            return current;
        }
        let next = self.run_refresh(&current).await;
        self.refreshing.store(false, Ordering::Release);
        next
    }

    async fn run_refresh(&self, previous: &AddressIntel) -> Arc<AddressIntel> {
        let started = Instant::now();
        let outcomes = join_all(ADDRESS_FEEDS.iter().map(|(feed, default_label)| async move {
            (
                feed,
                *default_label,
                fetch_feed(&self.fetcher, &self.etags, feed).await,
            )
        }))
        .await;

        let mut next = previous.clone();
        next.schema_version = INTEL_SCHEMA_VERSION;

        // Sanctions seed first so its label leads on fresh addresses
        for address in seed::SANCTIONED_ADDRESS_SEED {
            push_unique(
                &mut next.labels_by_address,
                address,
                AddressLabel::Sanctioned,
            );
        }

        let mut live = 0usize;
        let mut failed = 0usize;
        for (feed, default_label, outcome) in outcomes {
            let prior_count = previous
                .per_source_status
                .get(feed.id)
                .map(|s| s.count)
                .unwrap_or(0);
            let status = match outcome {
                FeedOutcome::Fresh(parsed) => {
                    let count = parsed.entry_count();
                    for address in &parsed.addresses {
                        push_unique(&mut next.labels_by_address, address, default_label);
                    }
                    for (address, label) in &parsed.labels {
                        push_unique(&mut next.labels_by_address, address, *label);
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

        if live > 0 {
            next.updated_at = Utc::now().timestamp();
        }

        for (address, label) in self.user_flagged.lock().iter() {
            push_unique(&mut next.labels_by_address, address, *label);
        }

        info!(
            "🏷️ Address intel refreshed: {} ok / {} failed | {} labeled addresses ({}ms)",
            live,
            failed,
            next.labels_by_address.len(),
            started.elapsed().as_millis()
        );

        let arc = Arc::new(next);
        *self.snapshot.write() = arc.clone();
        self.persist(&arc);
        arc
    }

    /// Flag an address locally. Takes effect immediately and survives
    /// every later refresh.
    pub fn add_user_flagged_address(&self, address: &str, label: AddressLabel) {
        let address = match normalize_address(address) {
            Some(a) => a,
            None => {
                warn!("⚠️ Ignoring malformed user-flagged address: {}", address);
                return;
            }
        };
        self.user_flagged.lock().insert((address.clone(), label));
        let next = {
            let mut guard = self.snapshot.write();
            let mut cache = (**guard).clone();
            push_unique(&mut cache.labels_by_address, &address, label);
            let arc = Arc::new(cache);
            *guard = arc.clone();
            arc
        };
        self.persist(&next);
        info!("🏷️ User flagged address: {} as {}", address, label.as_str());
    }

    fn persist(&self, cache: &AddressIntel) {
        match serde_json::to_string(cache) {
            Ok(json) => {
                if let Err(e) = self.storage.save(&snapshot_key(), &json) {
                    warn!("⚠️ Address snapshot not persisted: {}", e);
                }
            }
            Err(e) => warn!("⚠️ Address snapshot not serializable: {}", e),
        }
    }
}

fn snapshot_key() -> String {
    format!("{}.v{}", STORE_KEY_ADDRESS_INTEL, INTEL_SCHEMA_VERSION)
}

fn load_snapshot<S: SnapshotStore>(storage: &S) -> Option<AddressIntel> {
    let raw = match storage.load(&snapshot_key()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("⚠️ Address snapshot unreadable: {}", e);
            return None;
        }
    };
    match serde_json::from_str::<AddressIntel>(&raw) {
        Ok(cache) if cache.schema_version == INTEL_SCHEMA_VERSION => {
            info!(
                "📦 Address intel restored: {} labeled addresses",
                cache.labels_by_address.len()
            );
            Some(cache)
        }
        Ok(cache) => {
            warn!(
                "⚠️ Address snapshot schema {} != {}, starting from seed",
                cache.schema_version, INTEL_SCHEMA_VERSION
            );
            None
        }
        Err(e) => {
            warn!("⚠️ Address snapshot corrupt, starting from seed: {}", e);
            None
        }
    }
}
