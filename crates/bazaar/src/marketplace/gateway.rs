use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::domain::{
    GeoPoint, Listing, ListingDetails, ListingId, ListingKind, ListingStatus, OwnerId,
};
use super::province::Province;

/// Row store holding one table per listing kind.
#[async_trait]
pub trait ListingGateway: Send + Sync {
    /// Every row of the table, newest first.
    async fn select_all(&self, kind: ListingKind) -> Result<Vec<Listing>, GatewayError>;
    async fn insert(&self, listing: NewListing) -> Result<Listing, GatewayError>;
    async fn update_status(
        &self,
        kind: ListingKind,
        id: &ListingId,
        status: ListingStatus,
    ) -> Result<(), GatewayError>;
    async fn delete(&self, kind: ListingKind, id: &ListingId) -> Result<(), GatewayError>;
}

/// Public object bucket for listing photos.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), GatewayError>;
    fn public_url(&self, key: &str) -> String;
    /// Best-effort removal used to clean up after a failed insert.
    async fn remove(&self, keys: &[String]) -> Result<(), GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("record not found")]
    NotFound,
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    #[error("gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected gateway payload: {0}")]
    Decode(String),
    #[error("hosted gateway is not configured")]
    NotConfigured,
}

/// Insert payload; the gateway assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub owner_id: OwnerId,
    pub title: String,
    pub city: String,
    pub province: Option<Province>,
    pub address: String,
    pub description: String,
    pub images: Vec<String>,
    pub phone_number: String,
    pub location: Option<GeoPoint>,
    pub status: ListingStatus,
    pub details: ListingDetails,
}

impl NewListing {
    pub fn kind(&self) -> ListingKind {
        self.details.kind()
    }

    pub fn into_listing(self, id: ListingId, created_at: chrono::DateTime<Utc>) -> Listing {
        Listing {
            id,
            owner_id: self.owner_id,
            title: self.title,
            city: self.city,
            province: self.province,
            address: self.address,
            description: self.description,
            images: self.images,
            phone_number: self.phone_number,
            location: self.location,
            status: self.status,
            created_at,
            details: self.details,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Process-local gateway used when no hosted store is configured, and in tests.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    tables: RwLock<HashMap<ListingKind, Vec<Listing>>>,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    inserts_rejected: AtomicBool,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway pre-populated with rows; each table keeps the given order.
    pub fn with_listings(listings: Vec<Listing>) -> Self {
        let mut tables: HashMap<ListingKind, Vec<Listing>> = HashMap::new();
        for listing in listings {
            tables.entry(listing.kind()).or_default().push(listing);
        }
        Self {
            tables: RwLock::new(tables),
            ..Self::default()
        }
    }

    /// Gateway seeded with the demo catalogue used when nothing is hosted.
    pub fn with_demo_listings() -> Self {
        Self::with_listings(super::seed::demo_listings())
    }

    /// Make every subsequent insert fail as if the hosted table were offline.
    pub fn reject_inserts(&self, reject: bool) {
        self.inserts_rejected.store(reject, Ordering::SeqCst);
    }

    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn object_keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ListingGateway for InMemoryGateway {
    async fn select_all(&self, kind: ListingKind) -> Result<Vec<Listing>, GatewayError> {
        let tables = self.tables.read().await;
        Ok(tables.get(&kind).cloned().unwrap_or_default())
    }

    async fn insert(&self, listing: NewListing) -> Result<Listing, GatewayError> {
        if self.inserts_rejected.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("inserts disabled".to_string()));
        }
        let id = ListingId(Uuid::new_v4().to_string());
        let stored = listing.into_listing(id, Utc::now());
        let mut tables = self.tables.write().await;
        tables.entry(stored.kind()).or_default().insert(0, stored.clone());
        Ok(stored)
    }

    async fn update_status(
        &self,
        kind: ListingKind,
        id: &ListingId,
        status: ListingStatus,
    ) -> Result<(), GatewayError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|row| &row.id == id))
            .ok_or(GatewayError::NotFound)?;
        row.status = status;
        Ok(())
    }

    async fn delete(&self, kind: ListingKind, id: &ListingId) -> Result<(), GatewayError> {
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(&kind).ok_or(GatewayError::NotFound)?;
        let index = rows
            .iter()
            .position(|row| &row.id == id)
            .ok_or(GatewayError::NotFound)?;
        rows.remove(index);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryGateway {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), GatewayError> {
        let mut objects = self.objects.write().await;
        if objects.contains_key(key) {
            return Err(GatewayError::Rejected {
                status: 409,
                body: format!("object {key} already exists"),
            });
        }
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://images/{key}")
    }

    async fn remove(&self, keys: &[String]) -> Result<(), GatewayError> {
        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}
