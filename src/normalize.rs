//! The address normalizer.
//!
//! Maps a geocoder-returned component mapping, a raw string or an existing
//! address id onto a canonical, deduplicated [`Address`] backed by the
//! Country → State → Locality reference hierarchy. Inputs whose hierarchy is
//! only partially populated fall back to raw-only storage; they never fail.

use std::sync::Arc;

use async_trait::async_trait;
use geo_types::Point;
use tracing::{debug, warn};

use crate::error::{AddressError, Result};
use crate::geocode::Geocoder;
use crate::models::{
    Address, AddressComponents, AddressInput, Country, Locality, State, COUNTRY_CODE_MAX_LEN,
    STATE_CODE_MAX_LEN,
};
use crate::storage::AddressStore;

/// Notified after every successful address save.
///
/// This is the explicit post-save event replacing the original design where
/// saving an address reached into the owning buyer record; wiring the
/// current-address propagation is now the caller's job.
#[async_trait]
pub trait SaveListener: Send + Sync {
    async fn address_saved(&self, address: &Address);
}

/// The Address Normalizer plus its save hook.
pub struct AddressNormalizer {
    store: Arc<dyn AddressStore>,
    geocoder: Arc<dyn Geocoder>,
    listeners: Vec<Arc<dyn SaveListener>>,
}

impl AddressNormalizer {
    pub fn new(store: Arc<dyn AddressStore>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            store,
            geocoder,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: Arc<dyn SaveListener>) {
        self.listeners.push(listener);
    }

    /// Normalize one input into a stored address.
    ///
    /// `None` stays `None`. An `Existing` id must resolve; unknown ids are
    /// rejected with [`AddressError::AddressNotFound`]. A raw string becomes
    /// a new address holding only the raw field. A component mapping runs
    /// the full reconciliation.
    pub async fn normalize(&self, input: Option<AddressInput>) -> Result<Option<Address>> {
        match input {
            None => Ok(None),
            Some(AddressInput::Existing(id)) => match self.store.get_address(id).await? {
                Some(address) => Ok(Some(address)),
                None => Err(AddressError::AddressNotFound(id)),
            },
            Some(AddressInput::Raw(raw)) => {
                debug!("Normalizing raw string input");
                let mut address = Address::from_raw(&raw);
                self.save(&mut address).await?;
                Ok(Some(address))
            }
            Some(AddressInput::Components(components)) => {
                self.normalize_components(&components).await
            }
        }
    }

    async fn normalize_components(&self, c: &AddressComponents) -> Result<Option<Address>> {
        let location = point_from_coords(c.latitude, c.longitude);

        if c.raw.is_empty() {
            return Ok(None);
        }

        // City-subdivision quirk: some providers put the city name in
        // `sublocality` and leave `locality` empty.
        let mut locality_name = c.locality.clone();
        if locality_name.is_empty() && !c.sublocality.is_empty() {
            locality_name = c.sublocality.clone();
        }
        if locality_name.is_empty() {
            locality_name = c.city.clone();
        }

        let any_level =
            !c.country.is_empty() || !c.state.is_empty() || !locality_name.is_empty();
        let all_levels =
            !c.country.is_empty() && !c.state.is_empty() && !locality_name.is_empty();
        if any_level && !all_levels {
            debug!(
                country = %c.country,
                state = %c.state,
                locality = %locality_name,
                "Inconsistent component set, storing raw only"
            );
            let mut address = Address::from_raw(&c.raw);
            self.save(&mut address).await?;
            return Ok(Some(address));
        }

        let country = self.resolve_country(&c.country, &c.country_code).await?;
        let state = self
            .resolve_state(&c.state, &c.state_code, country.as_ref())
            .await?;
        let locality = self
            .resolve_locality(&locality_name, &c.postal_code, state.as_ref())
            .await?;
        let locality_id = locality.as_ref().and_then(|l| l.id);

        // Dedupe by raw alone when there is no structured street data,
        // otherwise by street, locality and location.
        let existing = if c.street_number.is_empty() && c.route.is_empty() && locality.is_none() {
            self.store.get_address_by_raw(&c.raw).await?
        } else {
            self.store
                .find_address(&c.street_number, &c.route, locality_id, location)
                .await?
        };
        if let Some(address) = existing {
            debug!(id = ?address.id, "Reusing existing address");
            return Ok(Some(address));
        }

        let mut address = Address {
            street_number: c.street_number.clone(),
            route: c.route.clone(),
            raw: c.raw.clone(),
            locality_id,
            formatted: c.formatted.clone(),
            latitude: c.latitude,
            longitude: c.longitude,
            location,
            ..Address::default()
        };
        if address.formatted.is_empty() {
            address.formatted = address.to_string();
        }
        self.save(&mut address).await?;
        Ok(Some(address))
    }

    async fn resolve_country(&self, name: &str, code: &str) -> Result<Option<Country>> {
        if let Some(country) = self.store.get_country_by_name(name).await? {
            return Ok(Some(country));
        }
        if name.is_empty() {
            return Ok(None);
        }
        let code = checked_code("country", name, code, COUNTRY_CODE_MAX_LEN)?;
        let mut country = Country {
            id: None,
            name: name.to_string(),
            code,
        };
        match self.store.create_country(&mut country).await {
            Ok(()) => {
                debug!("Registered country {}", country);
                Ok(Some(country))
            }
            // Lost a get-or-create race: another writer holds the key now.
            Err(AddressError::Conflict { .. }) => self.store.get_country_by_name(name).await,
            Err(e) => Err(e),
        }
    }

    async fn resolve_state(
        &self,
        name: &str,
        code: &str,
        country: Option<&Country>,
    ) -> Result<Option<State>> {
        let country_id = country.and_then(|c| c.id);
        if let Some(state) = self.store.get_state_by_key(name, country_id).await? {
            return Ok(Some(state));
        }
        if name.is_empty() {
            return Ok(None);
        }
        let code = checked_code("state", name, code, STATE_CODE_MAX_LEN)?;
        let mut state = State {
            id: None,
            name: name.to_string(),
            code,
            country_id,
        };
        match self.store.create_state(&mut state).await {
            Ok(()) => Ok(Some(state)),
            Err(AddressError::Conflict { .. }) => {
                self.store.get_state_by_key(name, country_id).await
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_locality(
        &self,
        name: &str,
        postal_code: &str,
        state: Option<&State>,
    ) -> Result<Option<Locality>> {
        let state_id = state.and_then(|s| s.id);
        if let Some(locality) = self
            .store
            .get_locality_by_key(name, postal_code, state_id)
            .await?
        {
            return Ok(Some(locality));
        }
        if name.is_empty() {
            return Ok(None);
        }
        let mut locality = Locality {
            id: None,
            name: name.to_string(),
            postal_code: postal_code.to_string(),
            state_id,
        };
        match self.store.create_locality(&mut locality).await {
            Ok(()) => Ok(Some(locality)),
            Err(AddressError::Conflict { .. }) => {
                self.store.get_locality_by_key(name, postal_code, state_id).await
            }
            Err(e) => Err(e),
        }
    }

    /// Persist an address, refreshing its coordinates first.
    ///
    /// A geocoder result overwrites any previously supplied coordinates; an
    /// unreachable or empty-handed geocoder falls through to the existing
    /// values. The derived location is recomputed whenever both coordinates
    /// are present. Registered listeners run after the row is stored.
    pub async fn save(&self, address: &mut Address) -> Result<()> {
        let query = address.geocode_query();
        if query.is_empty() {
            debug!("Empty geocode query, keeping supplied coordinates");
        } else {
            match self.geocoder.forward(&query).await {
                Ok(Some(point)) => {
                    debug!(lat = point.lat, lon = point.lon, "Geocoder refreshed coordinates");
                    address.latitude = Some(point.lat);
                    address.longitude = Some(point.lon);
                }
                Ok(None) => debug!("Geocoder returned no result for {:?}", query),
                Err(e) => warn!("Geocoding failed for {:?}: {}", query, e),
            }
        }
        address.location = point_from_coords(address.latitude, address.longitude);

        self.store.save_address(address).await?;

        for listener in &self.listeners {
            listener.address_saved(address).await;
        }
        Ok(())
    }

    /// Rebuild the component mapping for a stored address, walking its
    /// locality chain. The walk stops at the first missing link.
    pub async fn components_of(&self, address: &Address) -> Result<AddressComponents> {
        let mut c = AddressComponents {
            street_number: address.street_number.clone(),
            route: address.route.clone(),
            raw: address.raw.clone(),
            formatted: address.formatted.clone(),
            latitude: address.latitude,
            longitude: address.longitude,
            ..AddressComponents::default()
        };

        let Some(locality_id) = address.locality_id else {
            return Ok(c);
        };
        let Some(locality) = self.store.get_locality(locality_id).await? else {
            return Ok(c);
        };
        c.locality = locality.name.clone();
        c.postal_code = locality.postal_code.clone();

        let Some(state_id) = locality.state_id else {
            return Ok(c);
        };
        let Some(state) = self.store.get_state(state_id).await? else {
            return Ok(c);
        };
        c.state = state.name.clone();
        c.state_code = state.code.clone();

        let Some(country_id) = state.country_id else {
            return Ok(c);
        };
        let Some(country) = self.store.get_country(country_id).await? else {
            return Ok(c);
        };
        c.country = country.name.clone();
        c.country_code = country.code.clone();
        Ok(c)
    }
}

/// Enforce the stored code length. A code equal to the full name means no
/// distinct code was supplied and is cleared; anything else over the limit
/// is a hard input error.
fn checked_code(kind: &'static str, name: &str, code: &str, max_len: usize) -> Result<String> {
    if code.chars().count() > max_len {
        if code != name {
            return Err(AddressError::InvalidCode {
                kind,
                code: code.to_string(),
            });
        }
        return Ok(String::new());
    }
    Ok(code.to_string())
}

/// Build the derived point when both coordinates are present and finite.
/// Construction failure is logged and treated as "no point".
fn point_from_coords(latitude: Option<f64>, longitude: Option<f64>) -> Option<Point<f64>> {
    let (lat, lon) = (latitude?, longitude?);
    if !lat.is_finite() || !lon.is_finite() {
        warn!("Cannot build point from lat {} lon {}", lat, lon);
        return None;
    }
    Some(Point::new(lon, lat))
}
