//! Configuration constants.
//!
//! This module defines the constants used throughout the exporter, including
//! polling intervals, timeouts, cache lifetimes and metric names.

use std::time::Duration;

// Polling
/// Interval between two reconciliation cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

// Status server
/// Default port for the `/metrics` and `/status` endpoints
pub const DEFAULT_PORT: u16 = 9111;
/// Default listen address (all interfaces, so Prometheus can scrape remotely)
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";

// External commands
/// fail2ban client binary, resolved through `PATH` unless overridden
pub const DEFAULT_FAIL2BAN_CLIENT: &str = "fail2ban-client";
/// Systemd unit checked by the liveness probe
pub const FAIL2BAN_SERVICE_UNIT: &str = "fail2ban";
/// Process name used by the `pgrep` fallback of the liveness probe
pub const FAIL2BAN_SERVER_PROCESS: &str = "fail2ban-server";
/// Hard timeout for a single external command
/// fail2ban-client answers over a local socket, 10s only trips when the server hangs
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

// Geolocation
/// Base URL of the ip-api.com JSON endpoint (the host is appended as a path segment)
pub const DEFAULT_GEO_API_URL: &str = "http://ip-api.com/json";
/// Hard timeout for one geolocation lookup
pub const GEO_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
/// Lifetime of a successful geolocation lookup in the cache (24 hours)
pub const GEO_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Upper bound on cached hosts; expired entries are evicted first, then the oldest
pub const GEO_CACHE_MAX_ENTRIES: usize = 100_000;
/// Decimal places used when formatting coordinates into label values
pub const GEO_COORDINATE_PRECISION: usize = 4;

// Metric names
pub const METRIC_IP_BANNED: &str = "fail2ban_ip_banned";
pub const METRIC_TOTAL_BANNED: &str = "fail2ban_total_banned_ips";
pub const METRIC_SERVICE_STATUS: &str = "fail2ban_service_status";
pub const METRIC_VERSION_INFO: &str = "fail2ban_version_info";
pub const METRIC_EXPORTER_STATUS: &str = "fail2ban_exporter_status";
