//! Property listings: the document schema, payload validation, storage, and
//! the `/imoveis` HTTP surface.

pub mod domain;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    Listing, ListingDraft, ListingId, ListingPatch, Price, PropertyType, Purpose, PRICE_ON_REQUEST,
};
pub use import::{ListingImportError, ListingImporter};
pub use repository::{InMemoryListingRepository, ListingRepository};
pub use router::listing_router;
pub use service::{ListingService, ListingServiceError};
pub use validation::{validate, validate_create, validate_update, ValidationErrors, ValidationMode};
