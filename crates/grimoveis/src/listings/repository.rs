use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{Listing, ListingId};
use crate::error::RepositoryError;

/// Storage abstraction for listing documents.
pub trait ListingRepository: Send + Sync {
    fn insert(&self, listing: Listing) -> Result<Listing, RepositoryError>;
    fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError>;
    /// All listings, most recently created first.
    fn newest_first(&self) -> Result<Vec<Listing>, RepositoryError>;
    /// Applies `change` to the stored listing atomically and returns the result.
    fn modify(
        &self,
        id: &ListingId,
        change: &mut dyn FnMut(&mut Listing),
    ) -> Result<Listing, RepositoryError>;
    fn remove(&self, id: &ListingId) -> Result<Listing, RepositoryError>;
}

#[derive(Debug)]
struct StoredListing {
    sequence: u64,
    listing: Listing,
}

#[derive(Debug, Default)]
struct ListingTable {
    next_sequence: u64,
    rows: HashMap<ListingId, StoredListing>,
}

/// In-process listing store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryListingRepository {
    table: Arc<Mutex<ListingTable>>,
}

impl InMemoryListingRepository {
    fn lock(&self) -> Result<MutexGuard<'_, ListingTable>, RepositoryError> {
        self.table
            .lock()
            .map_err(|_| RepositoryError::Unavailable("listing table lock poisoned".to_string()))
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.rows.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }
}

impl ListingRepository for InMemoryListingRepository {
    fn insert(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        let mut table = self.lock()?;
        if table.rows.contains_key(&listing.id) {
            return Err(RepositoryError::Conflict);
        }
        let sequence = table.next_sequence;
        table.next_sequence += 1;
        table.rows.insert(
            listing.id.clone(),
            StoredListing {
                sequence,
                listing: listing.clone(),
            },
        );
        Ok(listing)
    }

    fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        let table = self.lock()?;
        Ok(table.rows.get(id).map(|row| row.listing.clone()))
    }

    fn newest_first(&self) -> Result<Vec<Listing>, RepositoryError> {
        let table = self.lock()?;
        let mut rows: Vec<&StoredListing> = table.rows.values().collect();
        rows.sort_by(|a, b| {
            b.listing
                .created_at
                .cmp(&a.listing.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });
        Ok(rows.into_iter().map(|row| row.listing.clone()).collect())
    }

    fn modify(
        &self,
        id: &ListingId,
        change: &mut dyn FnMut(&mut Listing),
    ) -> Result<Listing, RepositoryError> {
        let mut table = self.lock()?;
        let row = table.rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        change(&mut row.listing);
        Ok(row.listing.clone())
    }

    fn remove(&self, id: &ListingId) -> Result<Listing, RepositoryError> {
        let mut table = self.lock()?;
        table
            .rows
            .remove(id)
            .map(|row| row.listing)
            .ok_or(RepositoryError::NotFound)
    }
}
