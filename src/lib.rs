//! Quadra - address normalization backed by a geographic reference hierarchy
//!
//! Stores decomposed postal addresses behind a Country → State → Locality
//! hierarchy, deduplicating on natural keys, and resolves coordinates
//! through an external geocoding service.

pub mod config;
pub mod error;
pub mod geocode;
pub mod models;
pub mod normalize;
pub mod notify;
pub mod storage;
pub mod submission;

pub use error::{AddressError, Result};
pub use models::{Address, AddressComponents, AddressInput};
pub use normalize::{AddressNormalizer, SaveListener};
