//! TTL memoization of resolve results.
//!
//! Both successes and failures are stored so a repository that recently
//! lacked identity data is not re-queried on every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::ResolveResult;

/// Default time-to-live for cached results (5 minutes).
pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

/// Largest accepted TTL (one year).
pub const MAX_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Source of the current time, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Build the composite cache key: `repo_url|identity_filter`.
pub fn cache_key(repo_url: &str, identity_filter: Option<&str>) -> String {
    format!("{}|{}", repo_url, identity_filter.unwrap_or(""))
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: ResolveResult,
    expires_at: DateTime<Utc>,
}

/// Process-wide store of resolve results keyed by [`cache_key`].
///
/// The map sits behind a single `Mutex`, so a reader never sees a partially
/// written entry and writers for distinct keys serialize cleanly.
pub struct ResolveCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResolveCache {
    /// Create a cache with the default 5-minute TTL and the system clock.
    pub fn new() -> Self {
        Self::with_clock(Duration::seconds(DEFAULT_TTL_SECS), Arc::new(SystemClock))
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the stored result if it has not expired; expired entries are
    /// evicted and reported as a miss.
    pub fn get(&self, key: &str) -> Option<ResolveResult> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if now <= entry.expires_at => {
                debug!(key, "cache hit");
                Some(entry.data.clone())
            }
            Some(_) => {
                debug!(key, "cache entry expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `result` under `key`, replacing any previous entry and
    /// restarting its TTL.
    pub fn set(&self, key: &str, result: ResolveResult) {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            CacheEntry {
                data: result,
                expires_at,
            },
        );
        debug!(key, %expires_at, "cached resolve result");
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Number of stored entries, including any not yet evicted after expiry.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResolveCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentityBundle;

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(start),
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn sample_bundle() -> ResolveResult {
        ResolveResult::success(IdentityBundle {
            identity_did: "did:key:z6Mk".into(),
            public_key_hex: "ab".repeat(32),
            attestation_chain: Vec::new(),
        })
    }

    fn manual_cache() -> (ResolveCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = ResolveCache::with_clock(Duration::seconds(DEFAULT_TTL_SECS), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("https://github.com/a/b", None), "https://github.com/a/b|");
        assert_eq!(
            cache_key("https://github.com/a/b", Some("did:key:z1")),
            "https://github.com/a/b|did:key:z1"
        );
    }

    #[test]
    fn test_get_after_set() {
        let (cache, _) = manual_cache();
        assert!(cache.get("k").is_none());
        cache.set("k", sample_bundle());
        assert_eq!(cache.get("k"), Some(sample_bundle()));
    }

    #[test]
    fn test_error_results_are_cached() {
        let (cache, _) = manual_cache();
        let failed = ResolveResult::failure("No auths refs found in this repository");
        cache.set("k", failed.clone());
        assert_eq!(cache.get("k"), Some(failed));
    }

    #[test]
    fn test_entry_valid_at_exact_expiry() {
        let (cache, clock) = manual_cache();
        cache.set("k", sample_bundle());
        clock.advance(Duration::seconds(DEFAULT_TTL_SECS));
        assert!(cache.get("k").is_some());
    }

    #[test]
    fn test_entry_expires_after_ttl_and_is_evicted() {
        let (cache, clock) = manual_cache();
        cache.set("k", sample_bundle());
        clock.advance(Duration::seconds(DEFAULT_TTL_SECS) + Duration::milliseconds(1));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_after_expiry_creates_fresh_entry() {
        let (cache, clock) = manual_cache();
        cache.set("k", ResolveResult::failure("old"));
        clock.advance(Duration::seconds(DEFAULT_TTL_SECS + 1));
        assert!(cache.get("k").is_none());

        cache.set("k", sample_bundle());
        clock.advance(Duration::seconds(DEFAULT_TTL_SECS - 1));
        assert_eq!(cache.get("k"), Some(sample_bundle()));
    }

    #[test]
    fn test_set_overwrites_and_restarts_ttl() {
        let (cache, clock) = manual_cache();
        cache.set("k", ResolveResult::failure("first"));
        clock.advance(Duration::seconds(200));
        cache.set("k", ResolveResult::failure("second"));
        clock.advance(Duration::seconds(200));
        assert_eq!(cache.get("k"), Some(ResolveResult::failure("second")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let (cache, _) = manual_cache();
        cache.set("a", sample_bundle());
        cache.set("b", sample_bundle());
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_concurrent_sets_for_distinct_keys() {
        let cache = Arc::new(ResolveCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    cache.set(&format!("key-{}", i), ResolveResult::failure(format!("e{}", i)));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
        for i in 0..8 {
            assert_eq!(
                cache.get(&format!("key-{}", i)),
                Some(ResolveResult::failure(format!("e{}", i)))
            );
        }
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_overflowing() {
        let cache = ResolveCache::with_ttl(Duration::max_value());
        cache.set("k", sample_bundle());
        assert_eq!(cache.get("k"), Some(sample_bundle()));
    }
}
