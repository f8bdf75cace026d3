//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources the
//! exporter builds once at startup:
//! - Logger (plain or JSON)
//! - HTTP client for geolocation lookups
//! - Prometheus metrics registry
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

use std::sync::Arc;

use crate::error_handling::InitializationError;
use crate::metrics::BanMetrics;

// Re-export public API
pub use client::init_geo_client;
pub use logger::init_logger_with;

/// Initializes the metrics registry and its gauges.
///
/// # Returns
///
/// An `Arc<BanMetrics>` shared by the reconciliation cycle (writer) and the
/// status server (reader).
///
/// # Errors
///
/// Returns `InitializationError::MetricsError` if a collector cannot be
/// registered.
pub fn init_metrics() -> Result<Arc<BanMetrics>, InitializationError> {
    let metrics = BanMetrics::new()?;
    // Up from the moment we can be scraped, before the first cycle finishes
    metrics.set_exporter_up(true);
    Ok(Arc::new(metrics))
}
