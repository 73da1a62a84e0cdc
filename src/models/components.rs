//! Normalizer input types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geographic point (lat/lon).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A flat mapping of named address components, as returned by a geocoder or
/// posted by the autocomplete widget. All fields are optional and default to
/// empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressComponents {
    pub raw: String,
    pub country: String,
    pub country_code: String,
    pub state: String,
    pub state_code: String,
    pub locality: String,
    pub city: String,
    /// Accepted for widget compatibility; participates in no resolution.
    pub city_code: String,
    pub sublocality: String,
    pub postal_code: String,
    pub street_number: String,
    pub route: String,
    pub formatted: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Input to the normalizer.
///
/// The original ad-hoc dispatch on value type is replaced with an explicit
/// sum type; an `Existing` id that does not resolve is rejected rather than
/// passed through.
#[derive(Debug, Clone)]
pub enum AddressInput {
    /// A free-text address stored as-is.
    Raw(String),
    /// Named components to reconcile against the hierarchy.
    Components(AddressComponents),
    /// A reference to an already stored address.
    Existing(Uuid),
}
