use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::marketplace::domain::{
    DealType, GeoPoint, JobDetails, JobType, Listing, ListingDetails, ListingId, ListingKind,
    ListingStatus, OwnerId, PropertyDetails, PropertyType,
};
use crate::marketplace::gateway::{
    GatewayError, InMemoryGateway, ListingGateway, NewListing, ObjectStore,
};
use crate::marketplace::province::Province;
use crate::marketplace::service::{Marketplace, MarketplaceSettings};
use crate::marketplace::submission::{ImageUpload, SubmissionFields, SubmissionForm};

pub(super) const ADMIN_TOKEN: &str = "moderator-token";

pub(super) fn property(
    id: &str,
    owner: &str,
    status: ListingStatus,
    title: &str,
    city: &str,
    deal_type: DealType,
) -> Listing {
    Listing {
        id: ListingId::new(id),
        owner_id: OwnerId::new(owner),
        title: title.to_string(),
        city: city.to_string(),
        province: Province::resolve(city),
        address: String::new(),
        description: String::new(),
        images: Vec::new(),
        phone_number: "0700112233".to_string(),
        location: Some(GeoPoint::new(34.53, 69.16)),
        status,
        created_at: Utc
            .with_ymd_and_hms(2025, 1, 15, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
        details: ListingDetails::Property(PropertyDetails {
            price: 500_000,
            currency: "AFN".to_string(),
            deal_type,
            property_type: PropertyType::Apartment,
            bedrooms: 2,
            area: 90,
            has_storage: false,
            features: Vec::new(),
        }),
    }
}

pub(super) fn approved(id: &str, owner: &str, title: &str) -> Listing {
    property(id, owner, ListingStatus::Approved, title, "کابل", DealType::Sale)
}

pub(super) fn pending(id: &str, owner: &str, title: &str) -> Listing {
    property(id, owner, ListingStatus::Pending, title, "کابل", DealType::Sale)
}

pub(super) fn job(id: &str, owner: &str, status: ListingStatus) -> Listing {
    Listing {
        details: ListingDetails::Job(JobDetails {
            company: "افغان سافت".to_string(),
            salary: 40_000,
            currency: "AFN".to_string(),
            job_type: JobType::FullTime,
            requirements: Vec::new(),
        }),
        ..property(id, owner, status, "برنامه‌نویس وب", "کابل", DealType::Sale)
    }
}

pub(super) fn ids(listings: &[&Listing]) -> Vec<String> {
    listings.iter().map(|listing| listing.id.0.clone()).collect()
}

pub(super) fn owned_ids(listings: &[Listing]) -> Vec<String> {
    listings.iter().map(|listing| listing.id.0.clone()).collect()
}

pub(super) type MemoryMarketplace = Marketplace<InMemoryGateway, InMemoryGateway>;

pub(super) async fn build_marketplace(
    listings: Vec<Listing>,
) -> (MemoryMarketplace, Arc<InMemoryGateway>) {
    let gateway = Arc::new(InMemoryGateway::with_listings(listings));
    let marketplace = Marketplace::load(
        gateway.clone(),
        gateway.clone(),
        MarketplaceSettings::default(),
    )
    .await;
    (marketplace, gateway)
}

pub(super) fn property_form() -> SubmissionForm {
    SubmissionForm {
        title: "آپارتمان نو در کارته سه".to_string(),
        city: "کابل".to_string(),
        address: "کارته سه".to_string(),
        description: "دو خوابه".to_string(),
        phone_number: "۰۷۰۰ ۱۱۲ ۲۳۳".to_string(),
        location: Some(GeoPoint::new(34.5, 69.1)),
        fields: SubmissionFields::Property {
            price: "۵۰۰٬۰۰۰".to_string(),
            deal_type: DealType::Rent,
            property_type: PropertyType::Apartment,
            bedrooms: "۲".to_string(),
            area: String::new(),
            has_storage: true,
            features: vec!["گراچ".to_string(), "  ".to_string()],
        },
    }
}

pub(super) fn job_form() -> SubmissionForm {
    SubmissionForm {
        title: "حسابدار".to_string(),
        city: "هرات".to_string(),
        address: String::new(),
        description: String::new(),
        phone_number: "0799333444".to_string(),
        location: Some(GeoPoint::new(34.34, 62.19)),
        fields: SubmissionFields::Job {
            company: "شرکت تجارتی".to_string(),
            salary: "25000".to_string(),
            job_type: JobType::PartTime,
            requirements: Vec::new(),
        },
    }
}

pub(super) fn jpeg(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
    }
}

/// Gateway whose every call fails as if the network were down.
pub(super) struct UnavailableGateway;

#[async_trait]
impl ListingGateway for UnavailableGateway {
    async fn select_all(&self, _kind: ListingKind) -> Result<Vec<Listing>, GatewayError> {
        Err(GatewayError::Unavailable("network down".to_string()))
    }

    async fn insert(&self, _listing: NewListing) -> Result<Listing, GatewayError> {
        Err(GatewayError::Unavailable("network down".to_string()))
    }

    async fn update_status(
        &self,
        _kind: ListingKind,
        _id: &ListingId,
        _status: ListingStatus,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("network down".to_string()))
    }

    async fn delete(&self, _kind: ListingKind, _id: &ListingId) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("network down".to_string()))
    }
}

/// Object store that records calls and can be told to fail after a number
/// of successful uploads.
#[derive(Default)]
pub(super) struct RecordingObjectStore {
    uploads: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    fail_after: Option<usize>,
}

impl RecordingObjectStore {
    pub(super) fn failing_after(successful_uploads: usize) -> Self {
        Self {
            fail_after: Some(successful_uploads),
            ..Self::default()
        }
    }

    pub(super) fn uploads(&self) -> Vec<String> {
        self.uploads.lock().expect("upload log poisoned").clone()
    }

    pub(super) fn removed(&self) -> Vec<String> {
        self.removed.lock().expect("removal log poisoned").clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn upload(&self, key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<(), GatewayError> {
        let mut uploads = self.uploads.lock().expect("upload log poisoned");
        if self.fail_after.is_some_and(|limit| uploads.len() >= limit) {
            return Err(GatewayError::Rejected {
                status: 413,
                body: "payload too large".to_string(),
            });
        }
        uploads.push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://cdn.test/images/{key}")
    }

    async fn remove(&self, keys: &[String]) -> Result<(), GatewayError> {
        self.removed
            .lock()
            .expect("removal log poisoned")
            .extend(keys.iter().cloned());
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
