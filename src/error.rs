use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the normalizer and the storage layer.
///
/// Inconsistent component sets never appear here: they are recovered locally
/// by falling back to raw-only storage. Geocoder and point-construction
/// failures are logged and tolerated.
#[derive(Error, Debug)]
pub enum AddressError {
    /// A country or state code exceeds its storage limit and is not simply
    /// the full name repeated.
    #[error("invalid {kind} code (too long): {code}")]
    InvalidCode { kind: &'static str, code: String },

    /// An `Existing` input referenced an address the store does not hold.
    #[error("address {0} not found")]
    AddressNotFound(Uuid),

    /// A create hit an identity key that already exists. The normalizer
    /// consumes this by re-fetching.
    #[error("{entity} already exists for this identity key")]
    Conflict { entity: &'static str },

    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, AddressError>;

/// Field-level rejection of a widget submission.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("invalid value for {field}")]
    InvalidLatLong { field: &'static str },

    /// The submission carried no raw address string at all.
    #[error("Nenhum endereço foi informado.")]
    MissingRaw,

    /// One generic user-facing message covering every missing required
    /// component, as the production form does.
    #[error("{0}")]
    MissingComponents(&'static str),
}
