//! Host geolocation with a 24 hour cache.
//!
//! `GeoCache` is what the reconciliation cycle talks to; `IpApiProvider` is the
//! HTTP lookup behind it.

mod cache;
mod lookup;
mod types;

// Re-export public API
pub use cache::GeoCache;
pub use lookup::{GeoLookupProvider, IpApiProvider};
pub use types::GeoResult;
