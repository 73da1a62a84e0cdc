//! Forward geocoding collaborator.

mod nominatim;

pub use nominatim::NominatimClient;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::GeoPoint;

/// Forward geocoding: free-text query string to coordinates.
///
/// Callers treat any failure as "no result"; an unreachable provider must
/// never abort a save.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn forward(&self, query: &str) -> Result<Option<GeoPoint>>;
}
