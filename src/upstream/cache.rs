// src/upstream/cache.rs
use moka::sync::Cache;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Cache keys that cover request-list data. Mutations invalidate by these
/// broad patterns rather than per key, trading precision for simplicity.
pub const REQUEST_LIST_PATTERNS: &[&str] = &["event-requests", "requests"];

/// ✅ **Upstream Response Cache Using `moka`** (TTL-bounded, keyed by the
/// upstream URL path + query).
///
/// The generation counter implements force-refresh cancellation: a fetch
/// started before the last `force_refresh` call is not allowed to store its
/// result, so a slow stale response can never overwrite fresher data.
pub struct ResponseCache {
    entries: Cache<String, Value>,
    generation: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .support_invalidation_closures()
                .build(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key)
    }

    /// Take a ticket before starting an upstream fetch.
    pub fn begin_fetch(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store a fetched body. Returns false (and stores nothing) when a
    /// force refresh happened after the ticket was taken.
    pub fn store(&self, ticket: u64, key: &str, body: Value) -> bool {
        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!(key, "dropping stale fetch result");
            return false;
        }
        self.entries.insert(key.to_string(), body);
        true
    }

    /// Invalidate every entry whose key contains one of the patterns.
    pub fn invalidate_matching(&self, patterns: &[&str]) {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        let _ = self
            .entries
            .invalidate_entries_if(move |key, _| patterns.iter().any(|p| key.contains(p.as_str())));
    }

    /// Force refresh: abandon in-flight fetches and clear the list entries.
    pub fn force_refresh(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.invalidate_matching(REQUEST_LIST_PATTERNS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stores_and_serves_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let ticket = cache.begin_fetch();
        assert!(cache.store(ticket, "/api/event-requests?limit=10", json!({"data": []})));
        assert!(cache.get("/api/event-requests?limit=10").is_some());
        assert!(cache.get("/api/event-requests?limit=20").is_none());
    }

    #[test]
    fn pattern_invalidation_clears_matching_keys_only() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let ticket = cache.begin_fetch();
        cache.store(ticket, "/api/event-requests?limit=10", json!(1));
        cache.store(ticket, "/api/stakeholders", json!(2));

        cache.invalidate_matching(REQUEST_LIST_PATTERNS);

        assert!(cache.get("/api/event-requests?limit=10").is_none());
        assert!(cache.get("/api/stakeholders").is_some());
    }

    #[test]
    fn force_refresh_cancels_in_flight_fetches() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let ticket = cache.begin_fetch();

        cache.force_refresh();

        // A fetch that started before the refresh must not land.
        assert!(!cache.store(ticket, "/api/event-requests", json!({"stale": true})));
        assert!(cache.get("/api/event-requests").is_none());

        // The next fetch generation stores normally.
        let ticket = cache.begin_fetch();
        assert!(cache.store(ticket, "/api/event-requests", json!({"fresh": true})));
    }
}
