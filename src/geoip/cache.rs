//! Time-bounded geolocation cache.
//!
//! Maps a host to its last successful lookup. Entries live for a fixed TTL and
//! are refreshed lazily on the next access after expiry. Failed lookups are
//! never stored, so the next call for the same host tries the provider again.
//!
//! Locking:
//! - `entries` is a `std::sync::Mutex`, only held for a map read or a map write,
//!   never across an `.await`.
//! - The provider call runs outside that lock, serialized per host through an
//!   async gate in `in_flight`, so two callers missing the same host produce
//!   one external lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::lookup::GeoLookupProvider;
use super::types::{GeoCacheEntry, GeoResult};
use crate::config::{GEO_CACHE_MAX_ENTRIES, GEO_CACHE_TTL, GEO_LOOKUP_TIMEOUT};
use crate::error_handling::{EventType, ExporterStats};

type HostGate = Arc<tokio::sync::Mutex<()>>;

/// Shared geolocation cache in front of a `GeoLookupProvider`.
pub struct GeoCache {
    provider: Arc<dyn GeoLookupProvider>,
    entries: Mutex<HashMap<String, GeoCacheEntry>>,
    in_flight: Mutex<HashMap<String, HostGate>>,
    ttl: Duration,
    lookup_timeout: Duration,
    max_entries: usize,
    stats: Option<Arc<ExporterStats>>,
}

impl GeoCache {
    /// Creates a cache with the default TTL (24h), lookup timeout (5s) and size bound.
    pub fn new(provider: Arc<dyn GeoLookupProvider>) -> Self {
        Self {
            provider,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            ttl: GEO_CACHE_TTL,
            lookup_timeout: GEO_LOOKUP_TIMEOUT,
            max_entries: GEO_CACHE_MAX_ENTRIES,
            stats: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Counts cache hits and lookup outcomes into `stats`.
    pub fn with_stats(mut self, stats: Arc<ExporterStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Returns the coordinates of `host`, looking them up on a miss.
    ///
    /// Never fails: an unavailable lookup yields an empty `GeoResult`.
    pub async fn resolve(&self, host: &str) -> GeoResult {
        self.resolve_at(host, Instant::now()).await
    }

    /// `resolve` against an explicit clock reading.
    ///
    /// Freshness is checked against `now` and a successful lookup expires at
    /// `now + ttl`.
    pub async fn resolve_at(&self, host: &str, now: Instant) -> GeoResult {
        if let Some(hit) = self.fresh(host, now) {
            log::debug!("Geo cache hit for {}", host);
            self.count(EventType::GeoCacheHit);
            return hit;
        }

        let gate = self.gate(host);
        let result = {
            let _guard = gate.lock().await;

            // Another caller may have filled the entry while we waited
            if let Some(hit) = self.fresh(host, now) {
                log::debug!("Geo cache hit for {} after waiting on lookup", host);
                self.count(EventType::GeoCacheHit);
                Some(hit)
            } else {
                self.lookup_and_store(host, now).await
            }
        };
        self.release_gate(host, gate);

        result.unwrap_or_default()
    }

    /// Returns the cached coordinates of `host` without any external call.
    ///
    /// Expired entries are returned as well; `None` means the host was never
    /// resolved successfully.
    pub fn peek(&self, host: &str) -> Option<GeoResult> {
        let entries = self.entries.lock().ok()?;
        entries.get(host).map(|entry| entry.result.clone())
    }

    /// Number of cached hosts, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fresh(&self, host: &str, now: Instant) -> Option<GeoResult> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(host)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.result.clone())
    }

    async fn lookup_and_store(&self, host: &str, now: Instant) -> Option<GeoResult> {
        let outcome = tokio::time::timeout(self.lookup_timeout, self.provider.lookup(host)).await;

        match outcome {
            Ok(Ok(result)) => {
                self.count(EventType::GeoLookupSucceeded);
                self.store(host, result.clone(), now);
                Some(result)
            }
            Ok(Err(e)) => {
                self.count(EventType::GeoLookupFailed);
                log::warn!(
                    "Failed to get geo data for {} from {}: {}",
                    host,
                    self.provider.name(),
                    e
                );
                None
            }
            Err(_) => {
                self.count(EventType::GeoLookupFailed);
                log::warn!(
                    "Geo lookup for {} from {} timed out after {:?}",
                    host,
                    self.provider.name(),
                    self.lookup_timeout
                );
                None
            }
        }
    }

    fn store(&self, host: &str, result: GeoResult, now: Instant) {
        let entry = GeoCacheEntry {
            result,
            expiry: now + self.ttl,
        };

        let Ok(mut entries) = self.entries.lock() else {
            log::error!("Geo cache lock poisoned, dropping entry for {}", host);
            return;
        };

        if entries.len() >= self.max_entries && !entries.contains_key(host) {
            entries.retain(|_, entry| entry.is_fresh(now));

            if entries.len() >= self.max_entries {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expiry)
                    .map(|(host, _)| host.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(host.to_string(), entry);
    }

    fn gate(&self, host: &str) -> HostGate {
        match self.in_flight.lock() {
            Ok(mut gates) => Arc::clone(gates.entry(host.to_string()).or_default()),
            // Without the shared gate we lose single-flight, not correctness
            Err(_) => Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn release_gate(&self, host: &str, gate: HostGate) {
        let Ok(mut gates) = self.in_flight.lock() else {
            return;
        };
        // Clones are taken and dropped under this lock, so a count of 1 left
        // after ours is gone means nobody else is waiting on the gate
        drop(gate);
        if gates.get(host).is_some_and(|current| Arc::strong_count(current) == 1) {
            gates.remove(host);
        }
    }

    fn count(&self, event: EventType) {
        if let Some(stats) = &self.stats {
            stats.increment(event);
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.lock().map(|g| g.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::GeoLookupError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider returning fixed coordinates, or failing, and counting calls.
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl CountingProvider {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
                delay: Duration::ZERO,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: true,
                delay: Duration::ZERO,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeoLookupProvider for CountingProvider {
        async fn lookup(&self, _host: &str) -> Result<GeoResult, GeoLookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                Err(GeoLookupError::Status(503))
            } else {
                Ok(GeoResult::from_coordinates(48.8566, 2.3522))
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let provider = CountingProvider::ok();
        let cache = GeoCache::new(provider.clone());

        let first = cache.resolve("1.2.3.4").await;
        let second = cache.resolve("1.2.3.4").await;

        assert_eq!(first, second);
        assert_eq!(first.latitude, "48.8566");
        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_entry_valid_until_ttl_then_refreshed() {
        let provider = CountingProvider::ok();
        let ttl = Duration::from_secs(24 * 60 * 60);
        let cache = GeoCache::new(provider.clone()).with_ttl(ttl);
        let t0 = Instant::now();
        let epsilon = Duration::from_secs(1);

        cache.resolve_at("1.2.3.4", t0).await;
        assert_eq!(provider.calls(), 1);

        // Just before expiry: served from cache
        cache.resolve_at("1.2.3.4", t0 + ttl - epsilon).await;
        assert_eq!(provider.calls(), 1);

        // Just after expiry: fresh lookup
        cache.resolve_at("1.2.3.4", t0 + ttl + epsilon).await;
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_cached() {
        let provider = CountingProvider::failing();
        let cache = GeoCache::new(provider.clone());

        let first = cache.resolve("1.2.3.4").await;
        let second = cache.resolve("1.2.3.4").await;

        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(provider.calls(), 2);
        assert!(cache.is_empty());
        assert!(cache.peek("1.2.3.4").is_none());
    }

    #[tokio::test]
    async fn test_lookup_timeout_yields_empty_and_is_not_cached() {
        let provider = CountingProvider::slow(Duration::from_secs(5));
        let cache = GeoCache::new(provider.clone()).with_lookup_timeout(Duration::from_millis(50));

        let result = cache.resolve("1.2.3.4").await;

        assert!(result.is_empty());
        assert!(cache.is_empty());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_peek_returns_expired_entry_without_lookup() {
        let provider = CountingProvider::ok();
        let cache = GeoCache::new(provider.clone()).with_ttl(Duration::from_secs(10));
        let t0 = Instant::now();

        cache.resolve_at("1.2.3.4", t0).await;
        assert_eq!(provider.calls(), 1);

        // peek ignores expiry and never calls out
        let peeked = cache.peek("1.2.3.4").unwrap();
        assert_eq!(peeked.longitude, "2.3522");
        assert_eq!(provider.calls(), 1);
        assert!(cache.peek("5.6.7.8").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_lookup() {
        let provider = CountingProvider::slow(Duration::from_millis(100));
        let cache = Arc::new(GeoCache::new(provider.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.resolve("1.2.3.4").await })
            })
            .collect();

        for task in tasks {
            let result = task.await.unwrap();
            assert_eq!(result.latitude, "48.8566");
        }

        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_different_hosts_are_looked_up_independently() {
        let provider = CountingProvider::ok();
        let cache = GeoCache::new(provider.clone());

        cache.resolve("1.2.3.4").await;
        cache.resolve("5.6.7.8").await;

        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_size_bound_evicts_oldest() {
        let provider = CountingProvider::ok();
        let cache = GeoCache::new(provider.clone()).with_max_entries(2);
        let t0 = Instant::now();

        cache.resolve_at("1.1.1.1", t0).await;
        cache.resolve_at("2.2.2.2", t0 + Duration::from_secs(1)).await;
        cache.resolve_at("3.3.3.3", t0 + Duration::from_secs(2)).await;

        assert_eq!(cache.len(), 2);
        assert!(cache.peek("1.1.1.1").is_none());
        assert!(cache.peek("3.3.3.3").is_some());
    }

    #[tokio::test]
    async fn test_stats_are_counted() {
        let stats = Arc::new(ExporterStats::new());
        let cache = GeoCache::new(CountingProvider::ok()).with_stats(stats.clone());

        cache.resolve("1.2.3.4").await;
        cache.resolve("1.2.3.4").await;

        assert_eq!(stats.get(EventType::GeoLookupSucceeded), 1);
        assert_eq!(stats.get(EventType::GeoCacheHit), 1);
        assert_eq!(stats.get(EventType::GeoLookupFailed), 0);
    }
}
