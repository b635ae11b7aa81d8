use bazaar::config::{AppConfig, GatewayConfig};
use bazaar::error::AppError;
use bazaar::marketplace::{
    DealType, ImageUpload, InMemoryGateway, Language, Listing, ListingDetails, ListingKind,
    MarketplaceSettings, PropertyType, SupabaseGateway,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Listing persistence picked from the gateway configuration. Without hosted
/// credentials the demo catalogue is served from memory.
pub(crate) enum Backend {
    Hosted(Arc<SupabaseGateway>),
    Memory(Arc<InMemoryGateway>),
}

impl Backend {
    pub(crate) fn from_config(config: &GatewayConfig) -> Result<Self, AppError> {
        if config.hosted().is_none() {
            info!("hosted gateway not configured; serving demo listings from memory");
            return Ok(Backend::Memory(Arc::new(InMemoryGateway::with_demo_listings())));
        }

        let gateway = SupabaseGateway::from_config(config)?;
        info!(bucket = %config.storage_bucket, "using hosted listing gateway");
        Ok(Backend::Hosted(Arc::new(gateway)))
    }
}

pub(crate) fn marketplace_settings(config: &AppConfig) -> MarketplaceSettings {
    MarketplaceSettings {
        pending_visibility: config.moderation.pending_visibility,
        ..MarketplaceSettings::default()
    }
}

pub(crate) fn parse_kind(raw: &str) -> Result<ListingKind, String> {
    raw.parse().map_err(|err: bazaar::marketplace::UnknownValue| {
        format!("{err} (expected properties, jobs or services)")
    })
}

pub(crate) fn parse_language(raw: &str) -> Result<Language, String> {
    raw.parse()
        .map_err(|err: bazaar::marketplace::ProvinceParseError| err.to_string())
}

pub(crate) fn parse_deal_type(raw: &str) -> Result<DealType, String> {
    raw.parse()
        .map_err(|err: bazaar::marketplace::UnknownValue| err.to_string())
}

pub(crate) fn parse_property_type(raw: &str) -> Result<PropertyType, String> {
    raw.parse()
        .map_err(|err: bazaar::marketplace::UnknownValue| err.to_string())
}

/// One-line summary of a listing for terminal output.
pub(crate) fn describe(listing: &Listing, language: Language) -> String {
    let city = listing
        .province
        .map(|province| province.name(language))
        .unwrap_or(listing.city.as_str());
    let headline = match &listing.details {
        ListingDetails::Property(details) => format!(
            "{} {} ({}, {})",
            details.price,
            details.currency,
            details.deal_type.wire(),
            details.property_type.wire()
        ),
        ListingDetails::Job(details) => format!(
            "{}: {} {} ({})",
            details.company,
            details.salary,
            details.currency,
            details.job_type.wire()
        ),
        ListingDetails::Service(details) => {
            format!("{} ({})", details.provider_name, details.category.wire())
        }
    };

    format!(
        "{:<12} {:<8} {} | {} | {} | {}",
        listing.id,
        listing.status.label(),
        listing.title,
        city,
        headline,
        listing.created_at.format("%Y-%m-%d")
    )
}

/// Read a photo from disk, guessing its content type from the extension.
pub(crate) async fn image_from_path(path: &Path) -> Result<ImageUpload, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());

    Ok(ImageUpload {
        file_name,
        content_type,
        bytes,
    })
}
