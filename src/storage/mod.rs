//! Persistent store for the address hierarchy.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use geo_types::Point;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Address, Country, Locality, State};

/// Storage collaborator for the normalizer: exact-match lookup by identity
/// key, conflict-detecting create, and a point-intersects address query.
///
/// `create_*` methods assign the entity id and must return
/// [`AddressError::Conflict`](crate::error::AddressError::Conflict) when the
/// identity key is already taken, so callers can re-fetch instead of
/// inserting duplicates under concurrent load.
#[async_trait]
pub trait AddressStore: Send + Sync {
    // Country operations
    async fn get_country_by_name(&self, name: &str) -> Result<Option<Country>>;
    async fn get_country(&self, id: Uuid) -> Result<Option<Country>>;
    async fn create_country(&self, country: &mut Country) -> Result<()>;

    // State operations
    async fn get_state_by_key(&self, name: &str, country_id: Option<Uuid>)
        -> Result<Option<State>>;
    async fn get_state(&self, id: Uuid) -> Result<Option<State>>;
    async fn create_state(&self, state: &mut State) -> Result<()>;

    // Locality operations
    async fn get_locality_by_key(
        &self,
        name: &str,
        postal_code: &str,
        state_id: Option<Uuid>,
    ) -> Result<Option<Locality>>;
    async fn get_locality(&self, id: Uuid) -> Result<Option<Locality>>;
    async fn create_locality(&self, locality: &mut Locality) -> Result<()>;

    // Address operations
    async fn get_address(&self, id: Uuid) -> Result<Option<Address>>;
    async fn get_address_by_raw(&self, raw: &str) -> Result<Option<Address>>;
    /// Find an address matching street data plus the locality link and
    /// location; two absent locations count as a match.
    async fn find_address(
        &self,
        street_number: &str,
        route: &str,
        locality_id: Option<Uuid>,
        location: Option<Point<f64>>,
    ) -> Result<Option<Address>>;
    /// Insert or replace, assigning an id and audit timestamps.
    async fn save_address(&self, address: &mut Address) -> Result<()>;
}
