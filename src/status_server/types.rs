//! Status server data structures.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::error_handling::ExporterStats;
use crate::metrics::BanMetrics;
use crate::reconcile::{CycleRecord, Reconciler};

/// Shared state for the status server
#[derive(Clone)]
pub struct StatusState {
    pub metrics: Arc<BanMetrics>,
    pub reconciler: Arc<Reconciler>,
    pub stats: Arc<ExporterStats>,
    pub start_time: Arc<Instant>,
}

impl StatusState {
    pub fn new(
        metrics: Arc<BanMetrics>,
        reconciler: Arc<Reconciler>,
        stats: Arc<ExporterStats>,
    ) -> Self {
        Self {
            metrics,
            reconciler,
            stats,
            start_time: Arc::new(Instant::now()),
        }
    }
}

/// JSON response for `/status` endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub uptime_seconds: f64,
    pub cycles_completed: usize,
    pub cycles_aborted: usize,
    /// Keys in the snapshot of the last completed cycle
    pub snapshot_size: usize,
    /// Cached hosts, expired entries included
    pub geo_cache_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<CycleRecord>,
    pub events: HashMap<&'static str, usize>,
}

#[cfg(test)]
impl StatusState {
    pub(crate) fn for_tests() -> Self {
        use crate::error_handling::{CommandError, GeoLookupError};
        use crate::fail2ban::BanService;
        use crate::geoip::{GeoCache, GeoLookupProvider, GeoResult};
        use async_trait::async_trait;

        struct Idle;

        #[async_trait]
        impl BanService for Idle {
            async fn service_running(&self) -> bool {
                false
            }
            async fn list_jails(&self) -> Result<Vec<String>, CommandError> {
                Ok(Vec::new())
            }
            async fn list_banned_hosts(&self, _jail: &str) -> Result<Vec<String>, CommandError> {
                Ok(Vec::new())
            }
            async fn version(&self) -> Result<Option<String>, CommandError> {
                Ok(None)
            }
        }

        #[async_trait]
        impl GeoLookupProvider for Idle {
            async fn lookup(&self, _host: &str) -> Result<GeoResult, GeoLookupError> {
                Ok(GeoResult::empty())
            }
            fn name(&self) -> &str {
                "idle"
            }
        }

        let stats = Arc::new(ExporterStats::new());
        let metrics = Arc::new(BanMetrics::new().expect("metrics registry"));
        let geo = Arc::new(GeoCache::new(Arc::new(Idle)));
        let reconciler = Arc::new(Reconciler::new(
            Arc::new(Idle),
            geo,
            Arc::clone(&metrics),
            Arc::clone(&stats),
        ));
        Self::new(metrics, reconciler, stats)
    }
}
