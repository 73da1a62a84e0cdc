//! Validation of autocomplete-widget submissions.
//!
//! The browser-side widget posts a flat JSON mapping of string-valued
//! components. Coordinates are parsed leniently into floats; a missing
//! required component is reported with one fixed user-facing message rather
//! than per-field errors.

use serde::Deserialize;

use crate::error::SubmissionError;
use crate::models::AddressComponents;

/// User-facing rejection message, kept verbatim from the production form.
pub const MISSING_COMPONENTS_MESSAGE: &str = "Oops! Não conseguimos encontrar o seu endereço. \
É preciso selecioná-lo da lista que irá aparecer. Tente escrever primeiro o número da \
casa/prédio, seguido do nome da rua. Se continuar com problemas, escreve para a gente!";

/// Raw widget submission; every field arrives as a string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressSubmission {
    pub raw: String,
    pub country: String,
    pub country_code: String,
    pub state: String,
    pub state_code: String,
    pub locality: String,
    pub city: String,
    pub city_code: String,
    pub sublocality: String,
    pub postal_code: String,
    pub street_number: String,
    pub route: String,
    pub formatted: String,
    pub latitude: String,
    pub longitude: String,
}

impl AddressSubmission {
    /// Check the submission and convert it into normalizer components.
    ///
    /// Requires {country, state, street_number, route, latitude, longitude}
    /// plus (locality OR city) to be non-empty, and a non-empty raw string
    /// so the normalizer always has something to store.
    pub fn validate(self) -> Result<AddressComponents, SubmissionError> {
        let latitude = parse_coord("latitude", &self.latitude)?;
        let longitude = parse_coord("longitude", &self.longitude)?;

        let required = [
            &self.country,
            &self.state,
            &self.street_number,
            &self.route,
            &self.latitude,
            &self.longitude,
        ];
        if required.iter().any(|field| field.is_empty())
            || (self.locality.is_empty() && self.city.is_empty())
        {
            return Err(SubmissionError::MissingComponents(
                MISSING_COMPONENTS_MESSAGE,
            ));
        }
        if self.raw.is_empty() {
            return Err(SubmissionError::MissingRaw);
        }

        Ok(AddressComponents {
            raw: self.raw,
            country: self.country,
            country_code: self.country_code,
            state: self.state,
            state_code: self.state_code,
            locality: self.locality,
            city: self.city,
            city_code: self.city_code,
            sublocality: self.sublocality,
            postal_code: self.postal_code,
            street_number: self.street_number,
            route: self.route,
            formatted: self.formatted,
            latitude,
            longitude,
        })
    }
}

fn parse_coord(field: &'static str, value: &str) -> Result<Option<f64>, SubmissionError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| SubmissionError::InvalidLatLong { field })
}
