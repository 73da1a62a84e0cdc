//! In-memory store, used by the server binary and by tests.

use async_trait::async_trait;
use chrono::Utc;
use geo::Intersects;
use geo_types::Point;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

use super::AddressStore;
use crate::error::{AddressError, Result};
use crate::models::{Address, Country, Locality, State};

/// Mutex-guarded maps, one per entity kind. Creates enforce the identity
/// keys the relational schema would carry as unique constraints.
pub struct MemoryStore {
    countries: Arc<Mutex<HashMap<Uuid, Country>>>,
    states: Arc<Mutex<HashMap<Uuid, State>>>,
    localities: Arc<Mutex<HashMap<Uuid, Locality>>>,
    addresses: Arc<Mutex<HashMap<Uuid, Address>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            countries: Arc::new(Mutex::new(HashMap::new())),
            states: Arc::new(Mutex::new(HashMap::new())),
            localities: Arc::new(Mutex::new(HashMap::new())),
            addresses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn country_count(&self) -> usize {
        self.countries.lock().unwrap().len()
    }

    pub fn locality_count(&self) -> usize {
        self.localities.lock().unwrap().len()
    }

    pub fn address_count(&self) -> usize {
        self.addresses.lock().unwrap().len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-intersects predicate over optional locations. Two point geometries
/// intersect when they coincide; two absent locations also match.
fn location_matches(candidate: Option<&Point<f64>>, probe: Option<&Point<f64>>) -> bool {
    match (candidate, probe) {
        (None, None) => true,
        (Some(a), Some(b)) => a.intersects(b),
        _ => false,
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn get_country_by_name(&self, name: &str) -> Result<Option<Country>> {
        let countries = self.countries.lock().unwrap();
        Ok(countries.values().find(|c| c.name == name).cloned())
    }

    async fn get_country(&self, id: Uuid) -> Result<Option<Country>> {
        let countries = self.countries.lock().unwrap();
        Ok(countries.get(&id).cloned())
    }

    async fn create_country(&self, country: &mut Country) -> Result<()> {
        let mut countries = self.countries.lock().unwrap();
        if countries.values().any(|c| c.name == country.name) {
            return Err(AddressError::Conflict { entity: "country" });
        }
        let id = Uuid::new_v4();
        country.id = Some(id);
        countries.insert(id, country.clone());
        debug!("Created country {} with id {}", country.name, id);
        Ok(())
    }

    async fn get_state_by_key(
        &self,
        name: &str,
        country_id: Option<Uuid>,
    ) -> Result<Option<State>> {
        let states = self.states.lock().unwrap();
        Ok(states
            .values()
            .find(|s| s.name == name && s.country_id == country_id)
            .cloned())
    }

    async fn get_state(&self, id: Uuid) -> Result<Option<State>> {
        let states = self.states.lock().unwrap();
        Ok(states.get(&id).cloned())
    }

    async fn create_state(&self, state: &mut State) -> Result<()> {
        let mut states = self.states.lock().unwrap();
        if states
            .values()
            .any(|s| s.name == state.name && s.country_id == state.country_id)
        {
            return Err(AddressError::Conflict { entity: "state" });
        }
        let id = Uuid::new_v4();
        state.id = Some(id);
        states.insert(id, state.clone());
        debug!("Created state {} with id {}", state.name, id);
        Ok(())
    }

    async fn get_locality_by_key(
        &self,
        name: &str,
        postal_code: &str,
        state_id: Option<Uuid>,
    ) -> Result<Option<Locality>> {
        let localities = self.localities.lock().unwrap();
        Ok(localities
            .values()
            .find(|l| l.name == name && l.postal_code == postal_code && l.state_id == state_id)
            .cloned())
    }

    async fn get_locality(&self, id: Uuid) -> Result<Option<Locality>> {
        let localities = self.localities.lock().unwrap();
        Ok(localities.get(&id).cloned())
    }

    async fn create_locality(&self, locality: &mut Locality) -> Result<()> {
        let mut localities = self.localities.lock().unwrap();
        if localities.values().any(|l| {
            l.name == locality.name
                && l.postal_code == locality.postal_code
                && l.state_id == locality.state_id
        }) {
            return Err(AddressError::Conflict { entity: "locality" });
        }
        let id = Uuid::new_v4();
        locality.id = Some(id);
        localities.insert(id, locality.clone());
        debug!("Created locality {} with id {}", locality.name, id);
        Ok(())
    }

    async fn get_address(&self, id: Uuid) -> Result<Option<Address>> {
        let addresses = self.addresses.lock().unwrap();
        Ok(addresses.get(&id).cloned())
    }

    async fn get_address_by_raw(&self, raw: &str) -> Result<Option<Address>> {
        let addresses = self.addresses.lock().unwrap();
        Ok(addresses.values().find(|a| a.raw == raw).cloned())
    }

    async fn find_address(
        &self,
        street_number: &str,
        route: &str,
        locality_id: Option<Uuid>,
        location: Option<Point<f64>>,
    ) -> Result<Option<Address>> {
        let addresses = self.addresses.lock().unwrap();
        Ok(addresses
            .values()
            .find(|a| {
                a.street_number == street_number
                    && a.route == route
                    && a.locality_id == locality_id
                    && location_matches(a.location.as_ref(), location.as_ref())
            })
            .cloned())
    }

    async fn save_address(&self, address: &mut Address) -> Result<()> {
        let mut addresses = self.addresses.lock().unwrap();
        let now = Utc::now();
        let id = match address.id {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                address.id = Some(id);
                address.created_at = Some(now);
                id
            }
        };
        address.updated_at = Some(now);
        addresses.insert(id, address.clone());
        debug!("Saved address {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_country_conflict_on_duplicate_name() {
        let store = MemoryStore::new();
        let mut first = Country {
            id: None,
            name: "Brasil".into(),
            code: "BR".into(),
        };
        store.create_country(&mut first).await.unwrap();
        assert!(first.id.is_some());

        let mut second = Country {
            id: None,
            name: "Brasil".into(),
            code: "".into(),
        };
        match store.create_country(&mut second).await {
            Err(AddressError::Conflict { entity }) => assert_eq!(entity, "country"),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(store.country_count(), 1);
    }

    #[tokio::test]
    async fn test_state_identity_key_includes_country() {
        let store = MemoryStore::new();
        let mut br = Country {
            id: None,
            name: "Brasil".into(),
            code: "BR".into(),
        };
        store.create_country(&mut br).await.unwrap();

        let mut sp_br = State {
            id: None,
            name: "SP".into(),
            code: "".into(),
            country_id: br.id,
        };
        store.create_state(&mut sp_br).await.unwrap();

        // Same name under no country is a distinct key.
        let mut sp_orphan = State {
            id: None,
            name: "SP".into(),
            code: "".into(),
            country_id: None,
        };
        store.create_state(&mut sp_orphan).await.unwrap();

        let found = store.get_state_by_key("SP", br.id).await.unwrap().unwrap();
        assert_eq!(found.id, sp_br.id);
    }

    #[tokio::test]
    async fn test_find_address_matches_on_location() {
        let store = MemoryStore::new();
        let point = Point::new(-46.6, -23.5);
        let mut addr = Address {
            street_number: "10".into(),
            route: "R. A".into(),
            location: Some(point),
            ..Address::default()
        };
        store.save_address(&mut addr).await.unwrap();

        let hit = store
            .find_address("10", "R. A", None, Some(point))
            .await
            .unwrap();
        assert_eq!(hit.unwrap().id, addr.id);

        let miss = store
            .find_address("10", "R. A", None, Some(Point::new(0.0, 0.0)))
            .await
            .unwrap();
        assert!(miss.is_none());

        // A probe without a location must not match a located address.
        let miss = store.find_address("10", "R. A", None, None).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_save_address_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let mut addr = Address::from_raw("Rua X, 123");
        store.save_address(&mut addr).await.unwrap();
        assert!(addr.id.is_some());
        assert!(addr.created_at.is_some());
        assert!(addr.updated_at.is_some());

        let created_at = addr.created_at;
        store.save_address(&mut addr).await.unwrap();
        assert_eq!(addr.created_at, created_at);
        assert_eq!(store.address_count(), 1);
    }
}
