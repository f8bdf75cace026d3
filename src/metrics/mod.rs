//! Prometheus gauges published by the exporter.
//!
//! `BanMetrics` owns its own `Registry` (no process-global default registry)
//! and the five gauge families:
//!
//! - `fail2ban_ip_banned{ip,jail,lat,lon}` - 1 while banned, 0 once released
//! - `fail2ban_total_banned_ips`
//! - `fail2ban_service_status`
//! - `fail2ban_version_info{version}`
//! - `fail2ban_exporter_status`
//!
//! Ban series are never removed. The label values each key was last published
//! with are remembered so a release toggles the same series to 0 instead of
//! creating a new one.

use std::collections::HashMap;
use std::sync::Mutex;

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::config::{
    METRIC_EXPORTER_STATUS, METRIC_IP_BANNED, METRIC_SERVICE_STATUS, METRIC_TOTAL_BANNED,
    METRIC_VERSION_INFO,
};
use crate::error_handling::MetricsError;
use crate::geoip::GeoResult;
use crate::reconcile::BanKey;

const BAN_LABELS: &[&str] = &["ip", "jail", "lat", "lon"];

/// Registry and gauges of the exporter.
///
/// Written only by the reconciliation cycle; the scrape handler only calls
/// [`BanMetrics::encode`].
pub struct BanMetrics {
    registry: Registry,
    ip_banned: GaugeVec,
    total_banned: Gauge,
    service_status: Gauge,
    version_info: GaugeVec,
    exporter_status: Gauge,
    published: Mutex<HashMap<BanKey, GeoResult>>,
    current_version: Mutex<Option<String>>,
}

impl BanMetrics {
    /// Creates the gauges and registers them in a fresh registry.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let ip_banned = GaugeVec::new(
            Opts::new(METRIC_IP_BANNED, "IP ban status (1 - banned, 0 - unbanned)"),
            BAN_LABELS,
        )?;
        let total_banned = Gauge::new(
            METRIC_TOTAL_BANNED,
            "Total number of banned IPs across all jails.",
        )?;
        let service_status = Gauge::new(
            METRIC_SERVICE_STATUS,
            "Status of the fail2ban service (1 if running, 0 otherwise).",
        )?;
        let version_info = GaugeVec::new(
            Opts::new(METRIC_VERSION_INFO, "Version of fail2ban as a string."),
            &["version"],
        )?;
        let exporter_status = Gauge::new(
            METRIC_EXPORTER_STATUS,
            "Status of the fail2ban exporter service (1 if running, 0 otherwise).",
        )?;

        registry.register(Box::new(ip_banned.clone()))?;
        registry.register(Box::new(total_banned.clone()))?;
        registry.register(Box::new(service_status.clone()))?;
        registry.register(Box::new(version_info.clone()))?;
        registry.register(Box::new(exporter_status.clone()))?;

        Ok(Self {
            registry,
            ip_banned,
            total_banned,
            service_status,
            version_info,
            exporter_status,
            published: Mutex::new(HashMap::new()),
            current_version: Mutex::new(None),
        })
    }

    /// Sets the ban series of `key` to 1.
    ///
    /// `geo` only labels a key published for the first time; a key banned
    /// again keeps the labels of its existing series.
    pub fn mark_banned(&self, key: &BanKey, geo: &GeoResult) {
        let geo = self.published_geo(key).unwrap_or_else(|| geo.clone());
        self.ip_banned
            .with_label_values(&ban_label_values(key, &geo))
            .set(1.0);

        if let Ok(mut published) = self.published.lock() {
            published.insert(key.clone(), geo);
        }
    }

    /// Sets the ban series of `key` to 0.
    ///
    /// Uses the labels `key` was published with; `fallback` is only consulted
    /// for a key this registry never published.
    pub fn mark_released(&self, key: &BanKey, fallback: impl FnOnce() -> GeoResult) {
        let geo = self.published_geo(key).unwrap_or_else(fallback);
        self.ip_banned
            .with_label_values(&ban_label_values(key, &geo))
            .set(0.0);

        if let Ok(mut published) = self.published.lock() {
            published.insert(key.clone(), geo);
        }
    }

    /// Location labels `key` was last published with.
    pub fn published_geo(&self, key: &BanKey) -> Option<GeoResult> {
        self.published.lock().ok()?.get(key).cloned()
    }

    /// Current value of the ban series of `key`, `None` if never published.
    pub fn ban_status(&self, key: &BanKey) -> Option<f64> {
        let geo = self.published_geo(key)?;
        self.ip_banned
            .get_metric_with_label_values(&ban_label_values(key, &geo))
            .ok()
            .map(|gauge| gauge.get())
    }

    /// Number of keys ever published.
    pub fn published_keys(&self) -> usize {
        self.published.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Number of `fail2ban_ip_banned` series in the registry.
    pub fn ban_series(&self) -> usize {
        self.registry
            .gather()
            .iter()
            .find(|family| family.get_name() == METRIC_IP_BANNED)
            .map(|family| family.get_metric().len())
            .unwrap_or(0)
    }

    pub fn set_total_banned(&self, total: usize) {
        self.total_banned.set(total as f64);
    }

    pub fn total_banned(&self) -> f64 {
        self.total_banned.get()
    }

    pub fn set_service_up(&self, running: bool) {
        self.service_status.set(if running { 1.0 } else { 0.0 });
    }

    pub fn set_exporter_up(&self, up: bool) {
        self.exporter_status.set(if up { 1.0 } else { 0.0 });
    }

    /// Publishes `version` as the only `fail2ban_version_info` series.
    pub fn set_version(&self, version: &str) {
        let Ok(mut current) = self.current_version.lock() else {
            return;
        };
        if current.as_deref() == Some(version) {
            return;
        }
        // Upgrades replace the old label instead of leaving it behind at 1
        self.version_info.reset();
        self.version_info.with_label_values(&[version]).set(1.0);
        *current = Some(version.to_string());
    }

    /// Renders every registered family in the Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn ban_label_values<'a>(key: &'a BanKey, geo: &'a GeoResult) -> [&'a str; 4] {
    [
        key.host.as_str(),
        key.jail.as_str(),
        geo.latitude.as_str(),
        geo.longitude.as_str(),
    ]
}
