use tracing::{debug, warn};

use super::domain::{Listing, ListingId, ListingKind, ListingStatus};
use super::gateway::ListingGateway;

/// In-memory mirror of the three hosted tables, newest first.
#[derive(Debug, Clone, Default)]
pub struct ListingStore {
    properties: Vec<Listing>,
    jobs: Vec<Listing>,
    services: Vec<Listing>,
}

impl ListingStore {
    /// Load every collection. A table that cannot be read comes back empty.
    pub async fn load<G>(gateway: &G) -> Self
    where
        G: ListingGateway + ?Sized,
    {
        let mut store = Self::default();
        for kind in ListingKind::ALL {
            match gateway.select_all(kind).await {
                Ok(items) => {
                    debug!(table = kind.table(), count = items.len(), "loaded listings");
                    store.replace_all(kind, items);
                }
                Err(err) => {
                    warn!(table = kind.table(), error = %err, "listing table unavailable, showing none");
                }
            }
        }
        store
    }

    pub fn collection(&self, kind: ListingKind) -> &[Listing] {
        match kind {
            ListingKind::Property => &self.properties,
            ListingKind::Job => &self.jobs,
            ListingKind::Service => &self.services,
        }
    }

    fn collection_mut(&mut self, kind: ListingKind) -> &mut Vec<Listing> {
        match kind {
            ListingKind::Property => &mut self.properties,
            ListingKind::Job => &mut self.jobs,
            ListingKind::Service => &mut self.services,
        }
    }

    pub fn replace_all(&mut self, kind: ListingKind, items: Vec<Listing>) {
        *self.collection_mut(kind) = items;
    }

    pub fn find(&self, kind: ListingKind, id: &ListingId) -> Option<&Listing> {
        self.collection(kind).iter().find(|listing| &listing.id == id)
    }

    /// Swap in a copy of the matching listing carrying `status`.
    pub fn set_status(&mut self, kind: ListingKind, id: &ListingId, status: ListingStatus) -> bool {
        let collection = self.collection_mut(kind);
        match collection.iter().position(|listing| &listing.id == id) {
            Some(index) => {
                let updated = collection[index].with_status(status);
                collection[index] = updated;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, kind: ListingKind, id: &ListingId) -> Option<Listing> {
        let collection = self.collection_mut(kind);
        let index = collection.iter().position(|listing| &listing.id == id)?;
        Some(collection.remove(index))
    }

    /// Newly created listings go to the front, matching creation-descending order.
    pub fn prepend(&mut self, listing: Listing) {
        self.collection_mut(listing.kind()).insert(0, listing);
    }

    pub fn len(&self) -> usize {
        self.properties.len() + self.jobs.len() + self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
