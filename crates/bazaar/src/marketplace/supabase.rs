//! Hosted gateway speaking the PostgREST and Storage HTTP APIs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::GatewayConfig;

use super::domain::{
    GeoPoint, JobDetails, Listing, ListingDetails, ListingId, ListingKind, ListingStatus, OwnerId,
    PropertyDetails, ServiceDetails,
};
use super::gateway::{GatewayError, ListingGateway, NewListing, ObjectStore};
use super::province::Province;

const DEFAULT_CURRENCY: &str = "AFN";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SupabaseGateway {
    client: Client,
    base_url: String,
    bucket: String,
}

impl SupabaseGateway {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let (url, key) = config.hosted().ok_or(GatewayError::NotConfigured)?;
        Self::new(url, key, &config.storage_bucket)
    }

    pub fn new(base_url: &str, api_key: &str, bucket: &str) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|err| GatewayError::Unavailable(format!("invalid api key header: {err}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|err| GatewayError::Unavailable(format!("invalid api key header: {err}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|err| GatewayError::Unavailable(format!("http client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn table_url(&self, kind: ListingKind) -> String {
        format!("{}/rest/v1/{}", self.base_url, kind.table())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    async fn send(request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::Unavailable(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn rows(response: Response) -> Result<Vec<ListingRow>, GatewayError> {
        response
            .json::<Vec<ListingRow>>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ListingGateway for SupabaseGateway {
    async fn select_all(&self, kind: ListingKind) -> Result<Vec<Listing>, GatewayError> {
        let request = self
            .client
            .get(self.table_url(kind))
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let rows = Self::rows(Self::send(request).await?).await?;

        let listings = rows
            .into_iter()
            .filter_map(|row| match row.into_listing(kind) {
                Ok(listing) => Some(listing),
                Err(err) => {
                    warn!(table = kind.table(), error = %err, "skipping unreadable row");
                    None
                }
            })
            .collect();
        Ok(listings)
    }

    async fn insert(&self, listing: NewListing) -> Result<Listing, GatewayError> {
        let kind = listing.kind();
        let request = self
            .client
            .post(self.table_url(kind))
            .header("Prefer", "return=representation")
            .json(&json!([insert_payload(&listing)]));
        let rows = Self::rows(Self::send(request).await?).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Decode("insert returned no rows".to_string()))?;
        row.into_listing(kind)
    }

    async fn update_status(
        &self,
        kind: ListingKind,
        id: &ListingId,
        status: ListingStatus,
    ) -> Result<(), GatewayError> {
        let request = self
            .client
            .patch(self.table_url(kind))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&json!({ "status": status.label() }));
        let rows = Self::rows(Self::send(request).await?).await?;
        if rows.is_empty() {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, kind: ListingKind, id: &ListingId) -> Result<(), GatewayError> {
        let request = self
            .client
            .delete(self.table_url(kind))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation");
        let rows = Self::rows(Self::send(request).await?).await?;
        if rows.is_empty() {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for SupabaseGateway {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), GatewayError> {
        let request = self
            .client
            .post(self.object_url(key))
            .header(CONTENT_TYPE, content_type)
            .header("cache-control", "3600")
            .header("x-upsert", "false")
            .body(bytes);
        Self::send(request).await?;
        debug!(key = %key, "uploaded listing image");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }

    async fn remove(&self, keys: &[String]) -> Result<(), GatewayError> {
        if keys.is_empty() {
            return Ok(());
        }
        let request = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .json(&json!({ "prefixes": keys }));
        Self::send(request).await?;
        Ok(())
    }
}

fn insert_payload(listing: &NewListing) -> Value {
    let mut row = json!({
        "owner_id": listing.owner_id.as_str(),
        "title": listing.title,
        "city": listing.city,
        "province": listing.province.map(Province::code),
        "address": listing.address,
        "description": listing.description,
        "images": listing.images,
        "phone_number": listing.phone_number,
        "location": listing.location,
        "status": listing.status.label(),
    });

    let details = match &listing.details {
        ListingDetails::Property(details) => json!({
            "price": details.price,
            "currency": details.currency,
            "deal_type": details.deal_type.wire(),
            "property_type": details.property_type.wire(),
            "bedrooms": details.bedrooms,
            "area": details.area,
            "has_storage": details.has_storage,
            "features": details.features,
        }),
        ListingDetails::Job(details) => json!({
            "company": details.company,
            "salary": details.salary,
            "currency": details.currency,
            "job_type": details.job_type.wire(),
            "requirements": details.requirements,
        }),
        ListingDetails::Service(details) => json!({
            "provider_name": details.provider_name,
            "category": details.category.wire(),
            "experience": details.experience,
        }),
    };

    if let (Value::Object(row), Value::Object(details)) = (&mut row, details) {
        row.extend(details);
    }
    row
}

/// Hosted row shape. Columns are optional because rows written by older
/// clients lack some of them.
#[derive(Debug, Deserialize)]
pub(crate) struct ListingRow {
    id: Value,
    owner_id: Option<String>,
    title: Option<String>,
    city: Option<String>,
    province: Option<String>,
    address: Option<String>,
    description: Option<String>,
    images: Option<Vec<String>>,
    image: Option<String>,
    phone_number: Option<String>,
    location: Option<GeoPoint>,
    status: Option<String>,
    created_at: Option<DateTime<Utc>>,
    price: Option<f64>,
    currency: Option<String>,
    deal_type: Option<String>,
    property_type: Option<String>,
    #[serde(rename = "type")]
    legacy_type: Option<String>,
    bedrooms: Option<f64>,
    area: Option<f64>,
    has_storage: Option<bool>,
    features: Option<Vec<String>>,
    company: Option<String>,
    salary: Option<f64>,
    job_type: Option<String>,
    requirements: Option<Vec<String>>,
    provider_name: Option<String>,
    category: Option<String>,
    experience: Option<String>,
}

fn whole(value: Option<f64>) -> u64 {
    value
        .filter(|number| number.is_finite() && *number > 0.0)
        .map(|number| number.round().min(u64::MAX as f64) as u64)
        .unwrap_or(0)
}

fn parse_column<T>(column: &str, value: Option<String>) -> Result<T, GatewayError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = value.ok_or_else(|| GatewayError::Decode(format!("missing column {column}")))?;
    raw.parse::<T>()
        .map_err(|err| GatewayError::Decode(format!("{column}: {err}")))
}

impl ListingRow {
    pub(crate) fn into_listing(self, kind: ListingKind) -> Result<Listing, GatewayError> {
        let id = match self.id {
            Value::String(id) => id,
            Value::Number(id) => id.to_string(),
            other => return Err(GatewayError::Decode(format!("unusable id {other}"))),
        };

        let status = match self.status.as_deref() {
            Some(raw) => raw
                .parse::<ListingStatus>()
                .map_err(|err| GatewayError::Decode(err.to_string()))?,
            None => ListingStatus::Pending,
        };

        let images = match (self.images, self.image) {
            (Some(images), _) => images,
            (None, Some(image)) => vec![image],
            (None, None) => Vec::new(),
        };

        let city = self.city.unwrap_or_default();
        let province = self
            .province
            .as_deref()
            .and_then(Province::resolve)
            .or_else(|| Province::resolve(&city));

        let currency = self
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let details = match kind {
            ListingKind::Property => ListingDetails::Property(PropertyDetails {
                price: whole(self.price),
                currency,
                deal_type: parse_column("deal_type", self.deal_type)?,
                property_type: parse_column("property_type", self.property_type.or(self.legacy_type))?,
                bedrooms: whole(self.bedrooms).min(u32::MAX as u64) as u32,
                area: whole(self.area).min(u32::MAX as u64) as u32,
                has_storage: self.has_storage.unwrap_or(false),
                features: self.features.unwrap_or_default(),
            }),
            ListingKind::Job => ListingDetails::Job(JobDetails {
                company: self.company.unwrap_or_default(),
                salary: whole(self.salary),
                currency,
                job_type: parse_column("job_type", self.job_type)?,
                requirements: self.requirements.unwrap_or_default(),
            }),
            ListingKind::Service => ListingDetails::Service(ServiceDetails {
                provider_name: self.provider_name.unwrap_or_default(),
                category: parse_column("category", self.category)?,
                experience: self.experience.unwrap_or_default(),
            }),
        };

        Ok(Listing {
            id: ListingId(id),
            owner_id: self.owner_id.map(OwnerId).unwrap_or_else(OwnerId::guest),
            title: self.title.unwrap_or_default(),
            city,
            province,
            address: self.address.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            images,
            phone_number: self.phone_number.unwrap_or_default(),
            location: self.location,
            status,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::{DealType, JobType, PropertyType};

    fn row(value: Value) -> ListingRow {
        serde_json::from_value(value).expect("row decodes")
    }

    #[test]
    fn legacy_property_row_maps_single_image_and_missing_status() {
        let listing = row(json!({
            "id": 3,
            "owner_id": "other_user",
            "title": "زمین تجارتی در هرات",
            "price": 2000000,
            "deal_type": "فروشی",
            "type": "تجاری",
            "city": "هرات",
            "image": "https://picsum.photos/800/600?random=3",
            "created_at": "2025-01-05T10:00:00Z"
        }))
        .into_listing(ListingKind::Property)
        .expect("row maps");

        assert_eq!(listing.id, ListingId::new("3"));
        assert_eq!(listing.status, ListingStatus::Pending);
        assert_eq!(listing.images.len(), 1);
        assert_eq!(listing.province, Some(Province::Herat));
        let details = listing.property().expect("property details");
        assert_eq!(details.deal_type, DealType::Sale);
        assert_eq!(details.property_type, PropertyType::Commercial);
        assert_eq!(details.currency, "AFN");
        assert_eq!(details.price, 2_000_000);
    }

    #[test]
    fn job_row_requires_known_job_type() {
        let bad = row(json!({ "id": "j1", "job_type": "seasonal", "status": "APPROVED" }))
            .into_listing(ListingKind::Job);
        assert!(matches!(bad, Err(GatewayError::Decode(_))));

        let good = row(json!({ "id": "j1", "job_type": "دورکاری", "salary": 30000.4 }))
            .into_listing(ListingKind::Job)
            .expect("maps");
        match good.details {
            ListingDetails::Job(details) => {
                assert_eq!(details.job_type, JobType::Remote);
                assert_eq!(details.salary, 30_000);
            }
            other => panic!("expected job details, got {other:?}"),
        }
    }

    #[test]
    fn insert_payload_flattens_details_with_wire_values() {
        let payload = insert_payload(&NewListing {
            owner_id: OwnerId::new("0700112233"),
            title: "آپارتمان".to_string(),
            city: "کابل".to_string(),
            province: Some(Province::Kabul),
            address: String::new(),
            description: String::new(),
            images: vec!["https://example.test/a.jpg".to_string()],
            phone_number: "0700112233".to_string(),
            location: Some(GeoPoint::new(34.5, 69.1)),
            status: ListingStatus::Pending,
            details: ListingDetails::Property(PropertyDetails {
                price: 500_000,
                currency: "AFN".to_string(),
                deal_type: DealType::Mortgage,
                property_type: PropertyType::Apartment,
                bedrooms: 2,
                area: 90,
                has_storage: false,
                features: Vec::new(),
            }),
        });

        assert_eq!(payload["status"], "PENDING");
        assert_eq!(payload["province"], "kabul");
        assert_eq!(payload["deal_type"], "گروی");
        assert_eq!(payload["price"], 500_000);
        assert_eq!(payload["location"]["lat"], 34.5);
        assert!(payload.get("company").is_none());
    }

    #[test]
    fn plain_http_urls_are_not_configured() {
        let config = GatewayConfig {
            supabase_url: Some("http://localhost:54321".to_string()),
            supabase_key: Some("anon".to_string()),
            storage_bucket: "images".to_string(),
        };
        assert!(matches!(
            SupabaseGateway::from_config(&config),
            Err(GatewayError::NotConfigured)
        ));
    }

    #[test]
    fn public_urls_point_at_the_bucket() {
        let gateway = SupabaseGateway::new("https://demo.supabase.co/", "anon", "images")
            .expect("client builds");
        assert_eq!(
            gateway.public_url("1700000000000-ab12cd34.jpg"),
            "https://demo.supabase.co/storage/v1/object/public/images/1700000000000-ab12cd34.jpg"
        );
    }
}
