//! Geolocation data structures.

use std::time::Instant;

use serde::Serialize;

use crate::config::GEO_COORDINATE_PRECISION;

/// Coordinates of a host, pre-formatted as metric label values.
///
/// Both fields are empty when the lookup was unavailable; that value is still
/// published, just never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct GeoResult {
    pub latitude: String,
    pub longitude: String,
}

impl GeoResult {
    /// Formats raw coordinates with fixed precision (`%.4f`).
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: format!("{:.*}", GEO_COORDINATE_PRECISION, latitude),
            longitude: format!("{:.*}", GEO_COORDINATE_PRECISION, longitude),
        }
    }

    /// The "lookup unavailable" result.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.latitude.is_empty() && self.longitude.is_empty()
    }
}

/// One cached lookup. Replaced whole on refresh.
#[derive(Debug, Clone)]
pub(crate) struct GeoCacheEntry {
    pub result: GeoResult,
    pub expiry: Instant,
}

impl GeoCacheEntry {
    /// An entry is fresh strictly before its expiry instant.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_from_coordinates_fixed_precision() {
        let geo = GeoResult::from_coordinates(52.52, 13.405);
        assert_eq!(geo.latitude, "52.5200");
        assert_eq!(geo.longitude, "13.4050");

        let geo = GeoResult::from_coordinates(-33.868_82, 151.209_296);
        assert_eq!(geo.latitude, "-33.8688");
        assert_eq!(geo.longitude, "151.2093");
    }

    #[test]
    fn test_empty_result() {
        let geo = GeoResult::empty();
        assert!(geo.is_empty());
        assert_eq!(geo, GeoResult::default());
        assert!(!GeoResult::from_coordinates(0.0, 0.0).is_empty());
    }

    #[test]
    fn test_cache_entry_freshness() {
        let now = Instant::now();
        let entry = GeoCacheEntry {
            result: GeoResult::empty(),
            expiry: now + Duration::from_secs(60),
        };
        assert!(entry.is_fresh(now));
        assert!(entry.is_fresh(now + Duration::from_secs(59)));
        assert!(!entry.is_fresh(now + Duration::from_secs(60)));
        assert!(!entry.is_fresh(now + Duration::from_secs(61)));
    }
}
