use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::domain::{Listing, ListingDraft, ListingId};
use super::repository::ListingRepository;
use super::validation::{validate_create, validate_update, ValidationErrors};
use crate::clock::Clock;
use crate::error::RepositoryError;

/// Listing CRUD on top of a repository, with schema checks on every write.
pub struct ListingService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ListingService<R>
where
    R: ListingRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Every listing, newest first.
    pub fn list(&self) -> Result<Vec<Listing>, ListingServiceError> {
        Ok(self.repository.newest_first()?)
    }

    pub fn get(&self, id: &ListingId) -> Result<Listing, ListingServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| ListingServiceError::NotFound(id.clone()))
    }

    /// Validate a raw payload in create mode and persist it.
    pub fn create(&self, payload: &Value) -> Result<Listing, ListingServiceError> {
        let draft = validate_create(payload)?;
        self.create_draft(draft)
    }

    /// Persist an already validated draft with a fresh id and timestamps.
    pub fn create_draft(&self, draft: ListingDraft) -> Result<Listing, ListingServiceError> {
        let listing = Listing::from_draft(ListingId::generate(), draft, self.clock.now());
        let stored = self.repository.insert(listing)?;
        info!(listing_id = %stored.id, "listing created");
        Ok(stored)
    }

    /// Partial update: only the supplied fields change. Never creates a record.
    pub fn update(&self, id: &ListingId, payload: &Value) -> Result<Listing, ListingServiceError> {
        let patch = validate_update(payload)?;
        let now = self.clock.now();

        let updated = self
            .repository
            .modify(id, &mut |listing: &mut Listing| listing.apply(&patch, now))
            .map_err(|err| not_found_for(id, err))?;
        debug!(listing_id = %id, "listing updated");
        Ok(updated)
    }

    pub fn delete(&self, id: &ListingId) -> Result<Listing, ListingServiceError> {
        let removed = self
            .repository
            .remove(id)
            .map_err(|err| not_found_for(id, err))?;
        info!(listing_id = %id, "listing deleted");
        Ok(removed)
    }
}

fn not_found_for(id: &ListingId, err: RepositoryError) -> ListingServiceError {
    match err {
        RepositoryError::NotFound => ListingServiceError::NotFound(id.clone()),
        other => ListingServiceError::Repository(other),
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("listing {0} not found")]
    NotFound(ListingId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
