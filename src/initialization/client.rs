//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

/// Initializes the HTTP client used for geolocation lookups.
///
/// Creates a `reqwest::Client` configured with:
/// - A hard per-request timeout (the geolocation budget)
/// - A crate-specific User-Agent
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_geo_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
}
