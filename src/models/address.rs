//! Address entities: the Country → State → Locality reference hierarchy and
//! the Address rows hanging off it.
//!
//! Ids are assigned by the store on create. An Address either links to a
//! fully resolved Locality chain or to none at all; addresses that could not
//! be decomposed keep only their `raw` string.

use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum stored length of a country code.
pub const COUNTRY_CODE_MAX_LEN: usize = 2;

/// Maximum stored length of a state code.
pub const STATE_CODE_MAX_LEN: usize = 3;

/// A country. Identity key: `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: Option<Uuid>,
    pub name: String,
    /// ISO-like code. Not unique, duplicates exist across territories.
    pub code: String,
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A state or province. Identity key: `(name, country)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub id: Option<Uuid>,
    pub name: String,
    pub code: String,
    pub country_id: Option<Uuid>,
}

/// The smallest named subdivision tracked (city/suburb), scoped to a postal
/// code and state. Identity key: `(name, postal_code, state)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locality {
    pub id: Option<Uuid>,
    pub name: String,
    pub postal_code: String,
    pub state_id: Option<Uuid>,
}

/// A postal address.
///
/// The free-text `city` / `state_name` / `neigh` / `extra` fields are kept
/// for display when structured data is unavailable; `location` is derived
/// from `latitude`/`longitude`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub id: Option<Uuid>,
    /// CEP, digits only.
    pub zip_code: String,
    pub street_number: String,
    /// Complement, e.g. "Bloco A, apto. 40".
    pub extra: String,
    /// Street name.
    pub route: String,
    /// Neighbourhood.
    pub neigh: String,
    pub city: String,
    pub state_name: String,
    pub locality_id: Option<Uuid>,
    pub raw: String,
    pub formatted: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Point<f64>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Address {
    /// An address holding only the raw input string.
    pub fn from_raw(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            ..Self::default()
        }
    }

    /// "number route" when either part is present.
    pub fn street_line(&self) -> Option<String> {
        let line = format!("{} {}", self.street_number, self.route);
        let line = line.trim();
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }

    /// A single free-text string suitable for forward geocoding.
    pub fn geocode_query(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let street = self.street_line();
        if let Some(ref s) = street {
            parts.push(s);
        }
        for part in [&self.city, &self.state_name] {
            if !part.is_empty() {
                parts.push(part);
            }
        }
        parts.join(", ")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(street) = self.street_line() {
            parts.push(street);
        }
        for part in [&self.neigh, &self.city, &self.state_name] {
            if !part.is_empty() {
                parts.push(part.clone());
            }
        }
        if !self.zip_code.is_empty() {
            parts.push(format!("CEP: {}", self.zip_code));
        }
        if !self.extra.is_empty() {
            parts.push(format!("Complemento: {}", self.extra));
        }
        write!(f, "{}", parts.join(", "))
    }
}
