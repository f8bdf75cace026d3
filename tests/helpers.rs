// Shared test fakes for the fail2ban and geolocation collaborators.
//
// This module provides in-process implementations of `BanService` and
// `GeoLookupProvider` whose answers can be changed between cycles.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use fail2ban_exporter::error_handling::{CommandError, ExporterStats, GeoLookupError};
use fail2ban_exporter::{BanMetrics, BanService, GeoCache, GeoLookupProvider, GeoResult, Reconciler};

#[allow(dead_code)]
fn command_failure(command: &str) -> CommandError {
    CommandError::Timeout {
        command: command.to_string(),
        timeout: Duration::from_secs(10),
    }
}

/// Ban service whose jails and ban lists are set by the test.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeBanService {
    jails: Mutex<Option<Vec<String>>>,
    bans: Mutex<HashMap<String, Option<Vec<String>>>>,
    version: Mutex<Option<String>>,
    running: Mutex<bool>,
}

#[allow(dead_code)] // Not every test file uses every helper
impl FakeBanService {
    pub fn new() -> Self {
        let service = Self::default();
        *service.jails.lock().unwrap() = Some(Vec::new());
        *service.running.lock().unwrap() = true;
        *service.version.lock().unwrap() = Some("1.0.2".to_string());
        service
    }

    /// Sets the ban list of `jail`, adding the jail if needed.
    pub fn set_bans(&self, jail: &str, hosts: &[&str]) {
        self.put(jail, Some(hosts.iter().map(|h| h.to_string()).collect()));
    }

    /// Makes the ban list query of `jail` fail.
    pub fn fail_jail(&self, jail: &str) {
        self.put(jail, None);
    }

    /// Makes the jail list query fail.
    pub fn fail_jail_list(&self) {
        *self.jails.lock().unwrap() = None;
    }

    pub fn set_version(&self, version: Option<&str>) {
        *self.version.lock().unwrap() = version.map(str::to_string);
    }

    pub fn set_running(&self, running: bool) {
        *self.running.lock().unwrap() = running;
    }

    fn put(&self, jail: &str, hosts: Option<Vec<String>>) {
        let mut jails = self.jails.lock().unwrap();
        let list = jails.get_or_insert_with(Vec::new);
        if !list.iter().any(|j| j == jail) {
            list.push(jail.to_string());
        }
        self.bans.lock().unwrap().insert(jail.to_string(), hosts);
    }
}

#[allow(dead_code)]
#[async_trait]
impl BanService for FakeBanService {
    async fn service_running(&self) -> bool {
        *self.running.lock().unwrap()
    }

    async fn list_jails(&self) -> Result<Vec<String>, CommandError> {
        self.jails
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| command_failure("fail2ban-client status"))
    }

    async fn list_banned_hosts(&self, jail: &str) -> Result<Vec<String>, CommandError> {
        self.bans
            .lock()
            .unwrap()
            .get(jail)
            .cloned()
            .flatten()
            .ok_or_else(|| command_failure(&format!("fail2ban-client get {} banip", jail)))
    }

    async fn version(&self) -> Result<Option<String>, CommandError> {
        Ok(self.version.lock().unwrap().clone())
    }
}

/// Geolocation provider with per-host answers and a call counter.
///
/// Hosts without a configured answer resolve to `0.0, 0.0`.
#[derive(Default)]
pub struct FakeGeoProvider {
    coordinates: Mutex<HashMap<String, (f64, f64)>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    calls_per_host: Mutex<HashMap<String, usize>>,
}

#[allow(dead_code)] // Not every test file uses every helper
impl FakeGeoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_coordinates(&self, host: &str, lat: f64, lon: f64) {
        self.coordinates
            .lock()
            .unwrap()
            .insert(host.to_string(), (lat, lon));
    }

    pub fn fail_host(&self, host: &str) {
        self.failing.lock().unwrap().insert(host.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, host: &str) -> usize {
        self.calls_per_host
            .lock()
            .unwrap()
            .get(host)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl GeoLookupProvider for FakeGeoProvider {
    async fn lookup(&self, host: &str) -> Result<GeoResult, GeoLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls_per_host
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_default() += 1;

        if self.failing.lock().unwrap().contains(host) {
            return Err(GeoLookupError::Status(503));
        }

        let (lat, lon) = self
            .coordinates
            .lock()
            .unwrap()
            .get(host)
            .copied()
            .unwrap_or((0.0, 0.0));
        Ok(GeoResult::from_coordinates(lat, lon))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Everything a cycle test needs, wired the way `run_exporter` wires it.
#[allow(dead_code)] // Not every test file uses every field
pub struct Harness {
    pub service: Arc<FakeBanService>,
    pub provider: Arc<FakeGeoProvider>,
    pub geo: Arc<GeoCache>,
    pub metrics: Arc<BanMetrics>,
    pub stats: Arc<ExporterStats>,
    pub reconciler: Arc<Reconciler>,
}

#[allow(dead_code)] // Used by other test files
pub fn harness() -> Harness {
    harness_with_geo_ttl(None)
}

/// `harness` with a custom geolocation cache TTL.
#[allow(dead_code)] // Used by other test files
pub fn harness_with_geo_ttl(ttl: Option<Duration>) -> Harness {
    let service = Arc::new(FakeBanService::new());
    let provider = Arc::new(FakeGeoProvider::new());
    let stats = Arc::new(ExporterStats::new());
    let mut cache = GeoCache::new(Arc::clone(&provider) as Arc<dyn GeoLookupProvider>)
        .with_stats(Arc::clone(&stats));
    if let Some(ttl) = ttl {
        cache = cache.with_ttl(ttl);
    }
    let geo = Arc::new(cache);
    let metrics = Arc::new(BanMetrics::new().expect("Failed to create metrics registry"));
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&service) as Arc<dyn BanService>,
        Arc::clone(&geo),
        Arc::clone(&metrics),
        Arc::clone(&stats),
    ));

    Harness {
        service,
        provider,
        geo,
        metrics,
        stats,
        reconciler,
    }
}
