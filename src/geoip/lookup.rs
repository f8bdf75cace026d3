//! Geolocation lookup providers.
//!
//! `IpApiProvider` queries an ip-api.com compatible JSON endpoint. The
//! provider performs exactly one request per call; caching and retry policy
//! belong to `GeoCache`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::types::GeoResult;
use crate::error_handling::GeoLookupError;

/// A single-attempt geolocation lookup.
#[async_trait]
pub trait GeoLookupProvider: Send + Sync {
    /// Looks up the coordinates of `host`.
    async fn lookup(&self, host: &str) -> Result<GeoResult, GeoLookupError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Response body for `?fields=lat,lon`.
///
/// Reserved or private ranges come back without coordinates, which is treated
/// as an invalid response so it is not cached as `0.0000,0.0000`.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// ip-api.com provider.
pub struct IpApiProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl IpApiProvider {
    /// Creates a provider for `base_url` (e.g. `http://ip-api.com/json`).
    ///
    /// `timeout` should match the one configured on `client`; it is only used
    /// to report `GeoLookupError::Timeout`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            timeout,
        }
    }

    fn lookup_url(&self, host: &str) -> String {
        format!("{}/{}?fields=lat,lon", self.base_url, host)
    }
}

#[async_trait]
impl GeoLookupProvider for IpApiProvider {
    async fn lookup(&self, host: &str) -> Result<GeoResult, GeoLookupError> {
        let url = self.lookup_url(host);
        log::debug!("Querying geolocation for {}", host);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                GeoLookupError::Timeout(self.timeout)
            } else {
                GeoLookupError::from(e)
            }
        })?;

        if !response.status().is_success() {
            return Err(GeoLookupError::Status(response.status().as_u16()));
        }

        let body: IpApiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GeoLookupError::Timeout(self.timeout)
            } else {
                GeoLookupError::InvalidResponse(format!("Failed to parse response: {}", e))
            }
        })?;

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(GeoResult::from_coordinates(lat, lon)),
            _ => Err(GeoLookupError::InvalidResponse(format!(
                "no coordinates for {}",
                host
            ))),
        }
    }

    fn name(&self) -> &str {
        "ip-api"
    }
}
