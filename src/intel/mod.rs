//! Threat intel subsystem
//!
//! Two independent stores with the same lifecycle: start from the
//! persisted snapshot (seed if none), serve lock-free reads from an
//! immutable `Arc` snapshot, refresh all sources concurrently with
//! per-source isolation, and persist after every publish.

pub mod address_store;
pub mod feeds;
pub mod persist;
pub mod seed;
pub mod threat_store;

pub use address_store::{AddressIntel, AddressIntelStore};
pub use feeds::{
    FeedBody, FeedDescriptor, FeedFetch, FeedFormat, FeedKind, ParsedFeed, SourceStatus,
    ADDRESS_FEEDS, THREAT_FEEDS,
};
pub use persist::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use threat_store::{ThreatIntelCache, ThreatIntelStore};

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport shared by the store unit tests

    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::feeds::{FeedBody, FeedFetch};

    /// Per-URL scripted responses: a body (optionally behind an etag
    /// with 304 behavior), a hard failure, or nothing at all.
    /// Clones share the call counter.
    #[derive(Clone, Default)]
    pub struct ScriptedFetch {
        bodies: HashMap<&'static str, (Option<&'static str>, String)>,
        fail: HashSet<&'static str>,
        delay_ms: u64,
        pub calls: Arc<AtomicUsize>,
    }

    impl ScriptedFetch {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn serve(mut self, url: &'static str, body: &str) -> Self {
            self.bodies.insert(url, (None, body.to_string()));
            self
        }

        pub fn serve_with_etag(
            mut self,
            url: &'static str,
            etag: &'static str,
            body: &str,
        ) -> Self {
            self.bodies.insert(url, (Some(etag), body.to_string()));
            self
        }

        pub fn failing(mut self, url: &'static str) -> Self {
            self.bodies.remove(url);
            self.fail.insert(url);
            self
        }

        pub fn delayed(mut self, ms: u64) -> Self {
            self.delay_ms = ms;
            self
        }
    }

    impl FeedFetch for ScriptedFetch {
        async fn fetch(&self, url: &str, etag: Option<&str>) -> Option<FeedBody> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail.contains(url) {
                return None;
            }
            let (served_etag, body) = self.bodies.get(url)?;
            if let (Some(request_etag), Some(served)) = (etag, served_etag) {
                if request_etag == *served {
                    return Some(FeedBody::not_modified(Some((*served).to_string())));
                }
            }
            Some(FeedBody {
                body: body.clone(),
                etag: served_etag.map(|e| e.to_string()),
            })
        }
    }
}
