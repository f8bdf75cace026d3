//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_FAIL2BAN_CLIENT, DEFAULT_GEO_API_URL,
    DEFAULT_LISTEN_ADDRESS, DEFAULT_POLL_INTERVAL, DEFAULT_PORT, GEO_LOOKUP_TIMEOUT,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Defaults: port 9111, poll every 30s
/// fail2ban_exporter
///
/// # Custom port and faster polling
/// fail2ban_exporter --port 9200 --interval-secs 10
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "fail2ban_exporter",
    about = "Exports fail2ban banned IPs with geolocation as Prometheus metrics.",
    version
)]
pub struct Opt {
    /// Port to serve metrics on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind the metrics server to
    #[arg(long, default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: IpAddr,

    /// Seconds between two polls of fail2ban
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    /// Base URL of the ip-api compatible geolocation endpoint
    #[arg(long, default_value = DEFAULT_GEO_API_URL)]
    pub geo_api_url: String,

    /// Timeout in seconds for a single geolocation lookup
    #[arg(long, default_value_t = GEO_LOOKUP_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    pub geo_timeout_secs: u64,

    /// Timeout in seconds for a single fail2ban-client/systemctl/pgrep call
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    pub command_timeout_secs: u64,

    /// Path to the fail2ban-client binary
    #[arg(long, default_value = DEFAULT_FAIL2BAN_CLIENT)]
    pub fail2ban_client: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// Library configuration (no CLI dependencies).
///
/// This is the core configuration struct used by the library. It can be
/// constructed programmatically without any CLI dependencies.
///
/// # Examples
///
/// ```no_run
/// use fail2ban_exporter::Config;
/// use std::time::Duration;
///
/// let config = Config {
///     port: 9200,
///     poll_interval: Duration::from_secs(10),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the status server binds to
    pub listen_address: IpAddr,

    /// Port the status server binds to
    pub port: u16,

    /// Interval between reconciliation cycles
    pub poll_interval: Duration,

    /// Base URL of the geolocation endpoint
    pub geo_api_url: String,

    /// Timeout for one geolocation lookup
    pub geo_timeout: Duration,

    /// Timeout for one external command
    pub command_timeout: Duration,

    /// fail2ban-client binary
    pub fail2ban_client: String,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Socket address for the status server.
    pub fn listen_socket(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            geo_api_url: DEFAULT_GEO_API_URL.to_string(),
            geo_timeout: GEO_LOOKUP_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            fail2ban_client: DEFAULT_FAIL2BAN_CLIENT.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        Self {
            listen_address: opt.listen_address,
            port: opt.port,
            poll_interval: Duration::from_secs(opt.interval_secs),
            geo_api_url: opt.geo_api_url,
            geo_timeout: Duration::from_secs(opt.geo_timeout_secs),
            command_timeout: Duration::from_secs(opt.command_timeout_secs),
            fail2ban_client: opt.fail2ban_client,
            log_level: opt.log_level,
            log_format: opt.log_format,
        }
    }
}
