//! Core data models for the address service.

pub mod address;
pub mod components;

pub use address::{Address, Country, Locality, State, COUNTRY_CODE_MAX_LEN, STATE_CODE_MAX_LEN};
pub use components::{AddressComponents, AddressInput, GeoPoint};
