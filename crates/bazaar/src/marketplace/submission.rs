use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::digits::{normalize_phone, parse_amount, parse_optional_amount, NumberError};
use super::domain::{
    DealType, GeoPoint, JobDetails, JobType, Listing, ListingDetails, ListingKind, ListingStatus,
    OwnerId, PropertyDetails, PropertyType, ServiceCategory, ServiceDetails,
};
use super::gateway::{GatewayError, ListingGateway, NewListing, ObjectStore};
use super::province::{Language, Province};
use super::service::Marketplace;

pub const MAX_IMAGES: usize = 10;
/// Largest photo accepted per upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const CURRENCY: &str = "AFN";

/// Numbers arrive as typed, possibly with local digits; plain JSON numbers
/// are accepted too.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected text or number, found {other}"
        ))),
    }
}

/// Listing form exactly as the submitter filled it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionForm {
    pub title: String,
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone_number: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub fields: SubmissionFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionFields {
    Property {
        #[serde(deserialize_with = "lenient_text")]
        price: String,
        deal_type: DealType,
        property_type: PropertyType,
        #[serde(default, deserialize_with = "lenient_text")]
        bedrooms: String,
        #[serde(default, deserialize_with = "lenient_text")]
        area: String,
        #[serde(default)]
        has_storage: bool,
        #[serde(default)]
        features: Vec<String>,
    },
    Job {
        company: String,
        #[serde(deserialize_with = "lenient_text")]
        salary: String,
        job_type: JobType,
        #[serde(default)]
        requirements: Vec<String>,
    },
    Service {
        provider_name: String,
        category: ServiceCategory,
        #[serde(default)]
        experience: String,
    },
}

impl SubmissionFields {
    pub fn kind(&self) -> ListingKind {
        match self {
            SubmissionFields::Property { .. } => ListingKind::Property,
            SubmissionFields::Job { .. } => ListingKind::Job,
            SubmissionFields::Service { .. } => ListingKind::Service,
        }
    }
}

/// A photo picked by the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn mime(&self) -> Option<mime::Mime> {
        self.content_type
            .parse::<mime::Mime>()
            .ok()
            .filter(|mime| mime.type_() == mime::IMAGE)
    }

    /// Extension used in the object key: the file name's, else one derived
    /// from the content type.
    fn extension(&self) -> String {
        let from_name = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|ch| ch.is_ascii_alphanumeric()));

        from_name.unwrap_or_else(|| match self.mime() {
            Some(mime) if mime.subtype() == mime::JPEG => "jpg".to_string(),
            Some(mime) => mime.subtype().as_str().to_ascii_lowercase(),
            None => "bin".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("form describes a {found} listing, expected {expected}")]
    KindMismatch {
        expected: ListingKind,
        found: ListingKind,
    },
    #[error("title is required")]
    MissingTitle,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("city '{0}' is not a known province")]
    UnknownProvince(String),
    #[error("{field} is invalid: {source}")]
    InvalidAmount {
        field: &'static str,
        source: NumberError,
    },
    #[error("phone number is invalid: {0}")]
    InvalidPhone(NumberError),
    #[error("location is required")]
    MissingLocation,
    #[error("location is outside valid coordinates")]
    InvalidLocation,
    #[error("at most {MAX_IMAGES} images are allowed (found {0})")]
    TooManyImages(usize),
    #[error("'{0}' is not an image")]
    NotAnImage(String),
    #[error("'{name}' is {bytes} bytes; photos may be at most {MAX_IMAGE_BYTES} bytes")]
    ImageTooLarge { name: String, bytes: usize },
}

impl ValidationError {
    pub fn localized(&self, language: Language) -> &'static str {
        use ValidationError::*;
        match (self, language) {
            (KindMismatch { .. }, Language::Dari) => "نوع آگهی با فورم مطابقت ندارد.",
            (KindMismatch { .. }, Language::Pashto) => "د اعلان ډول له فورمې سره سمون نه لري.",
            (MissingTitle, Language::Dari) => "لطفاً عنوان آگهی را وارد کنید.",
            (MissingTitle, Language::Pashto) => "مهرباني وکړئ د اعلان سرلیک ولیکئ.",
            (MissingField(_), Language::Dari) => "لطفاً تمام معلومات لازم را وارد کنید.",
            (MissingField(_), Language::Pashto) => "مهرباني وکړئ ټول اړین معلومات ولیکئ.",
            (UnknownProvince(_), Language::Dari) => "لطفاً ولایت را انتخاب کنید.",
            (UnknownProvince(_), Language::Pashto) => "مهرباني وکړئ ولایت وټاکئ.",
            (InvalidAmount { .. }, Language::Dari) => "لطفاً مقدار را به عدد وارد کنید.",
            (InvalidAmount { .. }, Language::Pashto) => "مهرباني وکړئ اندازه په عدد ولیکئ.",
            (InvalidPhone(_), Language::Dari) => "لطفاً شماره تماس معتبر وارد کنید.",
            (InvalidPhone(_), Language::Pashto) => "مهرباني وکړئ سم د اړیکې شمیره ولیکئ.",
            (MissingLocation, Language::Dari) | (InvalidLocation, Language::Dari) => {
                "موقعیت مکانی نامعتبر است. لطفا مجددا روی نقشه انتخاب کنید."
            }
            (MissingLocation, Language::Pashto) | (InvalidLocation, Language::Pashto) => {
                "ځای سم نه دی. مهرباني وکړئ بیا په نقشه کې وټاکئ."
            }
            (TooManyImages(_), Language::Dari) => "حداکثر ۱۰ عکس مجاز است.",
            (TooManyImages(_), Language::Pashto) => "تر ۱۰ انځورونو زیات نه شي.",
            (NotAnImage(_), Language::Dari) => "فقط فایل های عکس مجاز است.",
            (NotAnImage(_), Language::Pashto) => "یوازې انځورونه منل کیږي.",
            (ImageTooLarge { .. }, Language::Dari) => "حجم هر عکس حداکثر ۵ مگابایت مجاز است.",
            (ImageTooLarge { .. }, Language::Pashto) => "د هر انځور اندازه باید له ۵ میګابایټه زیاته نه وي.",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("image upload failed: {0}")]
    Upload(GatewayError),
    #[error("listing could not be saved: {0}")]
    Insert(GatewayError),
}

impl SubmissionError {
    pub fn localized(&self, language: Language) -> &'static str {
        match (self, language) {
            (SubmissionError::Validation(error), language) => error.localized(language),
            (SubmissionError::Upload(_), Language::Dari) => "خطا در بارگذاری عکس ها.",
            (SubmissionError::Upload(_), Language::Pashto) => "د انځورونو په پورته کولو کې ستونزه.",
            (SubmissionError::Insert(_), Language::Dari) => "خطا در ثبت آگهی.",
            (SubmissionError::Insert(_), Language::Pashto) => "د اعلان په ثبتولو کې ستونزه.",
        }
    }
}

/// Form content that passed validation, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub title: String,
    pub city: String,
    pub province: Province,
    pub address: String,
    pub description: String,
    pub phone_number: String,
    pub location: GeoPoint,
    pub details: ListingDetails,
}

impl ValidatedSubmission {
    pub fn into_new_listing(self, owner: OwnerId, images: Vec<String>) -> NewListing {
        NewListing {
            owner_id: owner,
            title: self.title,
            city: self.city,
            province: Some(self.province),
            address: self.address,
            description: self.description,
            images,
            phone_number: self.phone_number,
            location: Some(self.location),
            status: ListingStatus::Pending,
            details: self.details,
        }
    }
}

fn amount(field: &'static str, raw: &str) -> Result<u64, ValidationError> {
    parse_amount(raw).map_err(|source| ValidationError::InvalidAmount { field, source })
}

fn small_amount(field: &'static str, raw: &str) -> Result<u32, ValidationError> {
    let value = parse_optional_amount(raw)
        .map_err(|source| ValidationError::InvalidAmount { field, source })?;
    u32::try_from(value).map_err(|_| ValidationError::InvalidAmount {
        field,
        source: NumberError::Overflow(raw.trim().to_string()),
    })
}

fn required(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

impl SubmissionForm {
    pub fn kind(&self) -> ListingKind {
        self.fields.kind()
    }

    pub fn validate(self, expected: ListingKind) -> Result<ValidatedSubmission, ValidationError> {
        let found = self.kind();
        if found != expected {
            return Err(ValidationError::KindMismatch { expected, found });
        }

        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }

        let city = self.city.trim().to_string();
        let province =
            Province::resolve(&city).ok_or_else(|| ValidationError::UnknownProvince(city.clone()))?;

        let details = match self.fields {
            SubmissionFields::Property {
                price,
                deal_type,
                property_type,
                bedrooms,
                area,
                has_storage,
                features,
            } => ListingDetails::Property(PropertyDetails {
                price: amount("price", &price)?,
                currency: CURRENCY.to_string(),
                deal_type,
                property_type,
                bedrooms: small_amount("bedrooms", &bedrooms)?,
                area: small_amount("area", &area)?,
                has_storage,
                features: clean_list(features),
            }),
            SubmissionFields::Job {
                company,
                salary,
                job_type,
                requirements,
            } => ListingDetails::Job(JobDetails {
                company: required("company", &company)?,
                salary: amount("salary", &salary)?,
                currency: CURRENCY.to_string(),
                job_type,
                requirements: clean_list(requirements),
            }),
            SubmissionFields::Service {
                provider_name,
                category,
                experience,
            } => ListingDetails::Service(ServiceDetails {
                provider_name: required("provider_name", &provider_name)?,
                category,
                experience: experience.trim().to_string(),
            }),
        };

        let phone_number = normalize_phone(&self.phone_number).map_err(ValidationError::InvalidPhone)?;

        let location = self.location.ok_or(ValidationError::MissingLocation)?;
        if !location.is_valid() {
            return Err(ValidationError::InvalidLocation);
        }

        Ok(ValidatedSubmission {
            title,
            city,
            province,
            address: self.address.trim().to_string(),
            description: self.description.trim().to_string(),
            phone_number,
            location,
            details,
        })
    }
}

pub fn validate_images(images: &[ImageUpload]) -> Result<(), ValidationError> {
    if images.len() > MAX_IMAGES {
        return Err(ValidationError::TooManyImages(images.len()));
    }
    for image in images {
        if image.bytes.is_empty() || image.mime().is_none() {
            return Err(ValidationError::NotAnImage(image.file_name.clone()));
        }
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ValidationError::ImageTooLarge {
                name: image.file_name.clone(),
                bytes: image.bytes.len(),
            });
        }
    }
    Ok(())
}

/// Object key for an upload: creation millis plus a short random suffix.
fn object_key(millis: i64, image: &ImageUpload) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{millis}-{}.{}", &suffix[..8], image.extension())
}

impl<G, O> Marketplace<G, O>
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    /// Validate, upload photos, and insert a pending listing. Photos uploaded
    /// before a failed step are removed again. The stored listing stays out
    /// of the public feed until approved.
    pub async fn submit(
        &self,
        kind: ListingKind,
        form: SubmissionForm,
        images: Vec<ImageUpload>,
        owner: OwnerId,
    ) -> Result<Listing, SubmissionError> {
        let validated = form.validate(kind)?;
        validate_images(&images)?;

        let millis = Utc::now().timestamp_millis();
        let mut uploaded = Vec::with_capacity(images.len());
        let mut urls = Vec::with_capacity(images.len());

        for image in images {
            let key = object_key(millis, &image);
            if let Err(err) = self
                .objects
                .upload(&key, image.bytes, &image.content_type)
                .await
            {
                warn!(key = %key, error = %err, "image upload failed");
                self.discard_uploads(&uploaded).await;
                return Err(SubmissionError::Upload(err));
            }
            urls.push(self.objects.public_url(&key));
            uploaded.push(key);
        }

        if urls.is_empty() {
            urls.push(format!(
                "{}/{}{millis}/800/600",
                self.settings.placeholder_base.trim_end_matches('/'),
                kind.seed_prefix()
            ));
        }

        let pending = validated.into_new_listing(owner, urls);
        match self.gateway.insert(pending).await {
            Ok(listing) => {
                info!(table = kind.table(), id = %listing.id, images = uploaded.len(), "listing submitted for review");
                self.store.write().await.prepend(listing.clone());
                Ok(listing)
            }
            Err(err) => {
                warn!(table = kind.table(), error = %err, "listing insert failed");
                self.discard_uploads(&uploaded).await;
                Err(SubmissionError::Insert(err))
            }
        }
    }

    async fn discard_uploads(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        match self.objects.remove(keys).await {
            Ok(()) => warn!(count = keys.len(), "removed uploads of failed submission"),
            Err(err) => error!(?keys, error = %err, "orphaned uploads could not be removed"),
        }
    }
}
