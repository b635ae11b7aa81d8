use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::domain::{Listing, ListingId, ListingKind, ListingStatus, OwnerId};
use super::filter::{ListingFilter, PendingVisibility};
use super::gateway::{ListingGateway, ObjectStore};
use super::store::ListingStore;

/// Base of the deterministic placeholder written when a submission has no photos.
pub const DEFAULT_PLACEHOLDER_BASE: &str = "https://picsum.photos/seed";

/// Runtime knobs for the marketplace facade.
#[derive(Debug, Clone)]
pub struct MarketplaceSettings {
    pub pending_visibility: PendingVisibility,
    pub placeholder_base: String,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            pending_visibility: PendingVisibility::default(),
            placeholder_base: DEFAULT_PLACEHOLDER_BASE.to_string(),
        }
    }
}

/// Listing store plus the gateways that persist it. Moderation and
/// submission are implemented on this type in their own modules.
pub struct Marketplace<G, O> {
    pub(super) gateway: Arc<G>,
    pub(super) objects: Arc<O>,
    pub(super) store: RwLock<ListingStore>,
    pub(super) settings: MarketplaceSettings,
}

impl<G, O> Marketplace<G, O>
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    /// Facade with an empty store; call [`Marketplace::refresh`] to populate it.
    pub fn new(gateway: Arc<G>, objects: Arc<O>, settings: MarketplaceSettings) -> Self {
        Self {
            gateway,
            objects,
            store: RwLock::new(ListingStore::default()),
            settings,
        }
    }

    pub async fn load(gateway: Arc<G>, objects: Arc<O>, settings: MarketplaceSettings) -> Self {
        let marketplace = Self::new(gateway, objects, settings);
        marketplace.refresh().await;
        marketplace
    }

    /// Replace every collection wholesale from the gateway. Returns the number
    /// of listings held afterwards.
    pub async fn refresh(&self) -> usize {
        let fresh = ListingStore::load(self.gateway.as_ref()).await;
        let total = fresh.len();
        *self.store.write().await = fresh;
        info!(total, "listing store refreshed");
        total
    }

    pub fn settings(&self) -> &MarketplaceSettings {
        &self.settings
    }

    /// Public feed for one collection. The configured pending visibility
    /// overrides whatever the caller's filter carries.
    pub async fn feed(&self, kind: ListingKind, filter: &ListingFilter) -> Vec<Listing> {
        let filter = ListingFilter {
            pending_visibility: self.settings.pending_visibility,
            ..filter.clone()
        };
        let store = self.store.read().await;
        filter
            .apply(store.collection(kind))
            .into_iter()
            .cloned()
            .collect()
    }

    /// A single listing as a viewer may see it: approved, or their own while
    /// owners are allowed to see pending items.
    pub async fn get(
        &self,
        kind: ListingKind,
        id: &ListingId,
        viewer: Option<&OwnerId>,
    ) -> Option<Listing> {
        let store = self.store.read().await;
        let listing = store.find(kind, id)?;
        let owner_view = self.settings.pending_visibility == PendingVisibility::OwnerOnly
            && viewer.is_some_and(|viewer| listing.is_owned_by(viewer));
        (listing.is_approved() || owner_view).then(|| listing.clone())
    }

    /// Unfiltered lookup for moderators.
    pub async fn find(&self, kind: ListingKind, id: &ListingId) -> Option<Listing> {
        self.store.read().await.find(kind, id).cloned()
    }

    /// Moderation queue: every listing of `kind` currently in `status`.
    pub async fn queue(&self, kind: ListingKind, status: ListingStatus) -> Vec<Listing> {
        self.store
            .read()
            .await
            .collection(kind)
            .iter()
            .filter(|listing| listing.status == status)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}
