//! One poll, diff and publish pass.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use super::snapshot::{diff, BanKey, Snapshot};
use crate::error_handling::{CycleError, EventType, ExporterStats};
use crate::fail2ban::{is_valid_ipv4, BanService};
use crate::geoip::GeoCache;
use crate::metrics::BanMetrics;

/// Summary of a completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Jails returned by the jail list.
    pub jails: usize,
    /// Jails whose ban list could not be read; their previous keys were kept.
    pub failed_jails: Vec<String>,
    pub newly_banned: usize,
    pub released: usize,
    /// Size of the snapshot stored at the end of the cycle.
    pub total_banned: usize,
}

/// How the last cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed(CycleReport),
    Aborted { error: String },
}

/// Outcome of the last cycle and when it finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleRecord {
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: CycleOutcome,
}

/// Owner of the previous snapshot.
///
/// The snapshot sits behind an async mutex held for the whole cycle, so two
/// cycles never overlap and a cycle never observes a half-replaced snapshot.
pub struct Reconciler {
    service: Arc<dyn BanService>,
    geo: Arc<GeoCache>,
    metrics: Arc<BanMetrics>,
    stats: Arc<ExporterStats>,
    previous: tokio::sync::Mutex<Snapshot>,
    snapshot_len: AtomicUsize,
    last_cycle: Mutex<Option<CycleRecord>>,
}

impl Reconciler {
    pub fn new(
        service: Arc<dyn BanService>,
        geo: Arc<GeoCache>,
        metrics: Arc<BanMetrics>,
        stats: Arc<ExporterStats>,
    ) -> Self {
        Self {
            service,
            geo,
            metrics,
            stats,
            previous: tokio::sync::Mutex::new(Snapshot::new()),
            snapshot_len: AtomicUsize::new(0),
            last_cycle: Mutex::new(None),
        }
    }

    /// Runs one reconciliation cycle.
    ///
    /// # Errors
    ///
    /// Returns a `CycleError` when the jail list is unavailable or every
    /// jail's ban list failed. The stored snapshot and the ban series are left
    /// untouched in that case.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let mut previous = self.previous.lock().await;

        self.refresh_service_info().await;
        let result = self.reconcile(&mut previous).await;

        match &result {
            Ok(_) => self.stats.increment(EventType::CycleCompleted),
            Err(_) => self.stats.increment(EventType::CycleAborted),
        }
        self.record(&result);
        result
    }

    /// Number of keys in the stored snapshot.
    ///
    /// Readable while a cycle is running; reflects the last completed cycle.
    pub fn snapshot_len(&self) -> usize {
        self.snapshot_len.load(Ordering::Relaxed)
    }

    /// Copy of the stored snapshot. Waits for a running cycle to finish.
    pub async fn snapshot(&self) -> Snapshot {
        self.previous.lock().await.clone()
    }

    pub fn last_cycle(&self) -> Option<CycleRecord> {
        self.last_cycle.lock().ok()?.clone()
    }

    pub fn geo_cache(&self) -> &GeoCache {
        &self.geo
    }

    async fn refresh_service_info(&self) {
        self.metrics.set_exporter_up(true);

        let (running, version) =
            tokio::join!(self.service.service_running(), self.service.version());
        self.metrics.set_service_up(running);

        match version {
            Ok(Some(version)) => self.metrics.set_version(&version),
            Ok(None) => {
                self.stats.increment(EventType::VersionProbeFailed);
                log::warn!("Unrecognised fail2ban version output, keeping previous version");
            }
            Err(e) => {
                self.stats.increment(EventType::VersionProbeFailed);
                log::warn!("Failed to get fail2ban version: {}", e);
            }
        }
    }

    async fn reconcile(&self, previous: &mut Snapshot) -> Result<CycleReport, CycleError> {
        let jails = self
            .service
            .list_jails()
            .await
            .map_err(CycleError::JailListUnavailable)?;

        let queries = jails.iter().map(|jail| async move {
            (jail.as_str(), self.service.list_banned_hosts(jail).await)
        });

        let mut current = Snapshot::new();
        let mut failed_jails = Vec::new();
        for (jail, result) in join_all(queries).await {
            match result {
                Ok(hosts) => {
                    current.extend(
                        hosts
                            .into_iter()
                            .filter(|host| is_valid_ipv4(host))
                            .map(|host| BanKey::new(jail, host)),
                    );
                }
                Err(e) => {
                    self.stats.increment(EventType::JailQueryFailed);
                    log::warn!("Failed to get banned IPs for jail {}: {}", jail, e);
                    failed_jails.push(jail.to_string());
                }
            }
        }

        if !jails.is_empty() && failed_jails.len() == jails.len() {
            return Err(CycleError::AllJailsFailed(jails.len()));
        }

        // A jail we could not read keeps what it had
        for jail in &failed_jails {
            current.extend(previous.keys_in_jail(jail).cloned());
        }

        let changes = diff(previous, &current);

        for key in &changes.newly_banned {
            // A returning key keeps the labels of its existing series
            let geo = match self.metrics.published_geo(key) {
                Some(geo) => geo,
                None => self.geo.resolve(&key.host).await,
            };
            log::debug!("Banned {} ({}, {})", key, geo.latitude, geo.longitude);
            self.metrics.mark_banned(key, &geo);
        }

        for key in &changes.released {
            log::debug!("Released {}", key);
            self.metrics
                .mark_released(key, || self.geo.peek(&key.host).unwrap_or_default());
        }

        self.metrics.set_total_banned(current.len());

        let report = CycleReport {
            jails: jails.len(),
            failed_jails,
            newly_banned: changes.newly_banned.len(),
            released: changes.released.len(),
            total_banned: current.len(),
        };

        self.snapshot_len.store(current.len(), Ordering::Relaxed);
        *previous = current;

        Ok(report)
    }

    fn record(&self, result: &Result<CycleReport, CycleError>) {
        let outcome = match result {
            Ok(report) => CycleOutcome::Completed(report.clone()),
            Err(e) => CycleOutcome::Aborted {
                error: e.to_string(),
            },
        };

        if let Ok(mut last) = self.last_cycle.lock() {
            *last = Some(CycleRecord {
                finished_at: Utc::now(),
                outcome,
            });
        }
    }
}
