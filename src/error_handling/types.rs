//! Error type definitions.
//!
//! This module defines the error types of every fallible collaborator call and
//! the event types counted for the `/status` endpoint.

use std::time::Duration;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error registering the Prometheus collectors.
    #[error("Metrics registry initialization error: {0}")]
    MetricsError(#[from] MetricsError),
}

/// Error types for external command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The process could not be spawned (binary missing, permission denied).
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process did not finish within the configured timeout.
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The process exited with a non-zero status.
    #[error("`{command}` exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// The process succeeded but its output is not in the expected format.
    #[error("`{command}` returned unexpected output: {output}")]
    UnexpectedOutput { command: String, output: String },
}

/// Error types for geolocation lookups.
///
/// None of these are fatal: the caller turns every variant into an empty
/// geolocation result that is not cached.
#[derive(Error, Debug)]
pub enum GeoLookupError {
    /// Transport-level failure (connect, DNS, body read).
    #[error("HTTP error: {0}")]
    Http(ReqwestError),

    /// The lookup did not complete within the hard timeout.
    #[error("Geolocation lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with a non-success status.
    #[error("Geolocation endpoint returned HTTP {0}")]
    Status(u16),

    /// The payload could not be decoded or lacks coordinates.
    #[error("Invalid geolocation response: {0}")]
    InvalidResponse(String),
}

impl From<ReqwestError> for GeoLookupError {
    fn from(e: ReqwestError) -> Self {
        if e.is_decode() {
            GeoLookupError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            GeoLookupError::Status(status.as_u16())
        } else {
            GeoLookupError::Http(e)
        }
    }
}

/// Reasons a reconciliation cycle is aborted before diffing.
///
/// An aborted cycle leaves the stored snapshot and every published series
/// untouched.
#[derive(Error, Debug)]
pub enum CycleError {
    /// The jail list could not be obtained.
    #[error("Failed to get jail list: {0}")]
    JailListUnavailable(#[source] CommandError),

    /// Every jail's ban list query failed.
    #[error("Failed to get banned IPs for all {0} jails")]
    AllJailsFailed(usize),
}

/// Error types for the Prometheus registry.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Collector creation or registration failed.
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The encoded exposition was not valid UTF-8.
    #[error("Metrics encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Events counted while the exporter runs.
///
/// Reported on the `/status` endpoint; they are not part of the Prometheus
/// exposition, which only carries the fail2ban state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum EventType {
    // Cycle outcomes
    CycleCompleted,
    CycleAborted,
    // Collaborator failures
    JailQueryFailed,
    VersionProbeFailed,
    // Geolocation
    GeoCacheHit,
    GeoLookupSucceeded,
    GeoLookupFailed,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::CycleCompleted => "cycle_completed",
            EventType::CycleAborted => "cycle_aborted",
            EventType::JailQueryFailed => "jail_query_failed",
            EventType::VersionProbeFailed => "version_probe_failed",
            EventType::GeoCacheHit => "geo_cache_hit",
            EventType::GeoLookupSucceeded => "geo_lookup_succeeded",
            EventType::GeoLookupFailed => "geo_lookup_failed",
        }
    }
}
