use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::province::Province;

/// Shown in place of a primary photo when a listing carries none.
pub const PLACEHOLDER_IMAGE: &str = "https://picsum.photos/800/600?grayscale";

/// Opaque identifier assigned by the gateway at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Submitting user: a normalized phone number, or the guest marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub const GUEST: &'static str = "guest";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn guest() -> Self {
        Self(Self::GUEST.to_string())
    }

    pub fn is_guest(&self) -> bool {
        self.0 == Self::GUEST
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The three listing collections, each backed by its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Property,
    Job,
    Service,
}

impl ListingKind {
    pub const ALL: [ListingKind; 3] = [ListingKind::Property, ListingKind::Job, ListingKind::Service];

    pub const fn table(self) -> &'static str {
        match self {
            ListingKind::Property => "properties",
            ListingKind::Job => "jobs",
            ListingKind::Service => "services",
        }
    }

    /// Prefix used when minting placeholder image seeds.
    pub const fn seed_prefix(self) -> &'static str {
        match self {
            ListingKind::Property => "",
            ListingKind::Job => "job-",
            ListingKind::Service => "service-",
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for ListingKind {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "properties" | "property" | "estate" => Ok(ListingKind::Property),
            "jobs" | "job" => Ok(ListingKind::Job),
            "services" | "service" => Ok(ListingKind::Service),
            _ => Err(UnknownValue::new("listing kind", value)),
        }
    }
}

/// Moderation lifecycle. New listings always start as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Pending => "PENDING",
            ListingStatus::Approved => "APPROVED",
            ListingStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ListingStatus::Pending),
            "APPROVED" => Ok(ListingStatus::Approved),
            "REJECTED" => Ok(ListingStatus::Rejected),
            _ => Err(UnknownValue::new("listing status", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} '{value}'")]
pub struct UnknownValue {
    pub what: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

macro_rules! localized_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($variant:ident => $wire:literal, $code:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire, alias = $code)]
                $variant,
            )+
        }

        impl $name {
            /// Value stored by the hosted tables.
            pub const fn wire(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub const fn code(self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                $(
                    if trimmed == $wire || trimmed.eq_ignore_ascii_case($code) {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownValue::new($what, value))
            }
        }
    };
}

localized_enum! {
    /// How a property is offered.
    DealType, "deal type" {
        Sale => "فروشی", "sale";
        Rent => "کرایی", "rent";
        Mortgage => "گروی", "mortgage";
    }
}

localized_enum! {
    PropertyType, "property type" {
        Apartment => "آپارتمان", "apartment";
        House => "حویلی", "house";
        Home => "خانه", "home";
        Land => "زمین", "land";
        Commercial => "تجاری", "commercial";
        Shop => "دکان", "shop";
    }
}

localized_enum! {
    JobType, "job type" {
        FullTime => "تمام وقت", "full_time";
        PartTime => "پاره وقت", "part_time";
        Remote => "دورکاری", "remote";
        Contract => "قراردادی", "contract";
    }
}

localized_enum! {
    ServiceCategory, "service category" {
        Repair => "ترمیمات", "repair";
        Cleaning => "نظافت و پاک‌کاری", "cleaning";
        Education => "آموزش و تدریس", "education";
        Technical => "فنی و مهندسی", "technical";
        Transport => "حمل و نقل", "transport";
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    pub price: u64,
    pub currency: String,
    pub deal_type: DealType,
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub area: u32,
    #[serde(default)]
    pub has_storage: bool,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub company: String,
    pub salary: u64,
    pub currency: String,
    pub job_type: JobType,
    #[serde(default)]
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetails {
    pub provider_name: String,
    pub category: ServiceCategory,
    pub experience: String,
}

/// Variant-specific fields; the variant also fixes the listing kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListingDetails {
    Property(PropertyDetails),
    Job(JobDetails),
    Service(ServiceDetails),
}

impl ListingDetails {
    pub fn kind(&self) -> ListingKind {
        match self {
            ListingDetails::Property(_) => ListingKind::Property,
            ListingDetails::Job(_) => ListingKind::Job,
            ListingDetails::Service(_) => ListingKind::Service,
        }
    }
}

/// A single classified ad as held by the listing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
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
    pub created_at: DateTime<Utc>,
    pub details: ListingDetails,
}

impl Listing {
    pub fn kind(&self) -> ListingKind {
        self.details.kind()
    }

    pub fn is_approved(&self) -> bool {
        self.status == ListingStatus::Approved
    }

    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        &self.owner_id == owner
    }

    /// First image, or the placeholder. Never persisted.
    pub fn primary_image(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    pub fn property(&self) -> Option<&PropertyDetails> {
        match &self.details {
            ListingDetails::Property(details) => Some(details),
            _ => None,
        }
    }

    /// Copy of this listing carrying a different status.
    pub fn with_status(&self, status: ListingStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
