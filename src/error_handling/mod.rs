//! Error handling and exporter statistics.
//!
//! This module provides:
//! - Error type definitions for commands, geolocation lookups and cycles
//! - Event statistics reported on the `/status` endpoint
//!
//! Errors are categorized by how far they propagate:
//! - **Cycle-level**: the jail list is unavailable, the cycle is aborted
//! - **Jail-level**: one jail's ban list failed, only that jail is skipped
//! - **Enrichment**: a geolocation lookup failed, the host is published with
//!   empty coordinates

mod stats;
mod types;

// Re-export public API
pub use stats::ExporterStats;
pub use types::{
    CommandError, CycleError, EventType, GeoLookupError, InitializationError, MetricsError,
};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_exporter_stats_initialization() {
        let stats = ExporterStats::new();
        // All event types should be initialized to 0
        for event in EventType::iter() {
            assert_eq!(stats.get(event), 0);
        }
    }

    #[test]
    fn test_exporter_stats_increment() {
        let stats = ExporterStats::new();
        stats.increment(EventType::CycleCompleted);
        stats.increment(EventType::CycleCompleted);
        stats.increment(EventType::GeoLookupFailed);

        assert_eq!(stats.get(EventType::CycleCompleted), 2);
        assert_eq!(stats.get(EventType::GeoLookupFailed), 1);
        assert_eq!(stats.get(EventType::CycleAborted), 0);
    }

    #[test]
    fn test_exporter_stats_as_map() {
        let stats = ExporterStats::new();
        stats.increment(EventType::JailQueryFailed);

        let map = stats.as_map();
        assert_eq!(map.len(), EventType::iter().count());
        assert_eq!(map.get("jail_query_failed"), Some(&1));
        assert_eq!(map.get("cycle_completed"), Some(&0));
    }

    #[test]
    fn test_exporter_stats_concurrent_increments() {
        use std::sync::Arc;

        let stats = Arc::new(ExporterStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.increment(EventType::GeoCacheHit);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.get(EventType::GeoCacheHit), 800);
    }
}
