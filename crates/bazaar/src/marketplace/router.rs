use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::digits::normalize_phone;
use super::domain::{
    DealType, Listing, ListingId, ListingKind, ListingStatus, OwnerId, PropertyType, UnknownValue,
};
use super::filter::{CityFilter, ListingFilter};
use super::gateway::{ListingGateway, ObjectStore};
use super::moderation::{AdminError, AdminGate, DeleteConfirmation, ModerationError};
use super::province::{Language, Province};
use super::service::Marketplace;
use super::submission::{
    ImageUpload, SubmissionError, SubmissionForm, ValidationError, MAX_IMAGES, MAX_IMAGE_BYTES,
};

/// Submission bodies carry photos as base64, which grows them by a third.
pub const SUBMISSION_BODY_LIMIT: usize = MAX_IMAGES * MAX_IMAGE_BYTES / 3 * 4 + 256 * 1024;

/// Shared state behind the marketplace routes.
pub struct MarketplaceState<G, O> {
    pub marketplace: Arc<Marketplace<G, O>>,
    pub admin: AdminGate,
}

/// Router exposing the public feed, submission and moderation endpoints.
pub fn marketplace_router<G, O>(marketplace: Arc<Marketplace<G, O>>, admin: AdminGate) -> Router
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    let state = Arc::new(MarketplaceState { marketplace, admin });
    Router::new()
        .route(
            "/api/v1/listings/:kind",
            get(feed_handler::<G, O>)
                .post(submit_handler::<G, O>)
                .layer(DefaultBodyLimit::max(SUBMISSION_BODY_LIMIT)),
        )
        .route("/api/v1/provinces", get(provinces_handler))
        .route("/api/v1/listings/:kind/:id", get(listing_handler::<G, O>))
        .route("/api/v1/admin/listings/:kind", get(queue_handler::<G, O>))
        .route(
            "/api/v1/admin/listings/:kind/:id/approve",
            post(approve_handler::<G, O>),
        )
        .route(
            "/api/v1/admin/listings/:kind/:id",
            delete(delete_handler::<G, O>),
        )
        .route("/api/v1/admin/refresh", post(refresh_handler::<G, O>))
        .with_state(state)
}

type SharedState<G, O> = State<Arc<MarketplaceState<G, O>>>;

/// Listing plus the image a card should show first.
#[derive(Debug, Serialize)]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: Listing,
    pub primary_image: String,
}

impl From<Listing> for ListingView {
    fn from(listing: Listing) -> Self {
        let primary_image = listing.primary_image().to_string();
        Self {
            listing,
            primary_image,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    pub deal_type: Option<String>,
    pub property_type: Option<String>,
    #[serde(default)]
    pub saved_only: bool,
    /// Comma separated listing ids bookmarked by the caller.
    pub saved: Option<String>,
    #[serde(default)]
    pub mine: bool,
    pub user: Option<String>,
    pub lang: Option<String>,
}

impl FeedQuery {
    pub fn into_filter(self) -> Result<ListingFilter, String> {
        let deal_type = self
            .deal_type
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| raw.parse::<DealType>())
            .transpose()
            .map_err(|err: UnknownValue| err.to_string())?;
        let property_type = self
            .property_type
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| raw.parse::<PropertyType>())
            .transpose()
            .map_err(|err: UnknownValue| err.to_string())?;

        let saved_ids: BTreeSet<ListingId> = self
            .saved
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ListingId::new)
            .collect();

        Ok(ListingFilter {
            query: self.q.unwrap_or_default(),
            city: self.city.as_deref().map(CityFilter::parse).unwrap_or_default(),
            deal_type,
            property_type,
            saved_only: self.saved_only,
            saved_ids,
            my_ads_only: self.mine,
            current_user: self.user.as_deref().map(caller_identity),
            ..ListingFilter::default()
        })
    }
}

fn caller_identity(raw: &str) -> OwnerId {
    normalize_phone(raw)
        .map(OwnerId::new)
        .unwrap_or_else(|_| OwnerId::new(raw.trim()))
}

fn language(raw: Option<&str>) -> Language {
    raw.and_then(|raw| raw.parse().ok()).unwrap_or_default()
}

fn error_response(status: StatusCode, error: impl Display, message: &str) -> Response {
    let payload = json!({
        "error": error.to_string(),
        "message": message,
    });
    (status, axum::Json(payload)).into_response()
}

fn unknown_kind(raw: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("unknown listing kind '{raw}'"),
        "صفحه پیدا نشد.",
    )
}

fn admin_rejection(error: AdminError) -> Response {
    error_response(StatusCode::UNAUTHORIZED, error, "دسترسی مدیر لازم است.")
}

fn moderation_failure(error: ModerationError, language: Language) -> Response {
    let status = match &error {
        ModerationError::Unconfirmed => StatusCode::BAD_REQUEST,
        ModerationError::NotFound => StatusCode::NOT_FOUND,
        ModerationError::Gateway(_) => StatusCode::BAD_GATEWAY,
    };
    let message = error.localized(language);
    error_response(status, error, message)
}

fn authorize<G, O>(state: &MarketplaceState<G, O>, headers: &HeaderMap) -> Result<(), Response> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.admin.authorize_header(header).map_err(admin_rejection)
}

pub(crate) async fn feed_handler<G, O>(
    State(state): SharedState<G, O>,
    Path(kind): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Response
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    let Ok(listing_kind) = kind.parse::<ListingKind>() else {
        return unknown_kind(&kind);
    };
    let lang = language(query.lang.as_deref());
    let filter = match query.into_filter() {
        Ok(filter) => filter,
        Err(error) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                error,
                "فیلتر نامعتبر است.",
            )
        }
    };

    let listings: Vec<ListingView> = state
        .marketplace
        .feed(listing_kind, &filter)
        .await
        .into_iter()
        .map(ListingView::from)
        .collect();

    let payload = json!({
        "kind": listing_kind.table(),
        "language": lang.code(),
        "count": listings.len(),
        "listings": listings,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    pub lang: Option<String>,
}

/// City selector entries for one display language, "all provinces" first.
pub(crate) async fn provinces_handler(Query(query): Query<LanguageQuery>) -> Response {
    let lang = language(query.lang.as_deref());
    let codes = std::iter::once("all").chain(Province::ALL.iter().map(|province| province.code()));
    let entries: Vec<_> = codes
        .zip(Province::selector_labels(lang))
        .map(|(code, label)| json!({ "code": code, "label": label }))
        .collect();
    let payload = json!({
        "language": lang.code(),
        "provinces": entries,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    pub user: Option<String>,
}

pub(crate) async fn listing_handler<G, O>(
    State(state): SharedState<G, O>,
    Path((kind, id)): Path<(String, String)>,
    Query(viewer): Query<ViewerQuery>,
) -> Response
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    let Ok(listing_kind) = kind.parse::<ListingKind>() else {
        return unknown_kind(&kind);
    };
    let viewer = viewer.user.as_deref().map(caller_identity);
    match state
        .marketplace
        .get(listing_kind, &ListingId(id), viewer.as_ref())
        .await
    {
        Some(listing) => (StatusCode::OK, axum::Json(ListingView::from(listing))).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "listing not found", "آگهی پیدا نشد."),
    }
}

#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    pub file_name: String,
    pub content_type: String,
    /// Base64 bytes, optionally as a `data:` URL.
    pub data: String,
}

impl ImagePayload {
    fn decode(self) -> Result<ImageUpload, String> {
        let encoded = match self.data.split_once(";base64,") {
            Some((_, rest)) => rest,
            None => self.data.as_str(),
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|err| format!("image '{}' is not valid base64: {err}", self.file_name))?;
        Ok(ImageUpload {
            file_name: self.file_name,
            content_type: self.content_type,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub form: SubmissionForm,
    #[serde(default)]
    pub images: Vec<ImagePayload>,
    /// Signed-in phone number; absent means a guest submission.
    pub owner: Option<String>,
    pub lang: Option<String>,
}

pub(crate) async fn submit_handler<G, O>(
    State(state): SharedState<G, O>,
    Path(kind): Path<String>,
    axum::Json(request): axum::Json<SubmissionRequest>,
) -> Response
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    let Ok(listing_kind) = kind.parse::<ListingKind>() else {
        return unknown_kind(&kind);
    };
    let lang = language(request.lang.as_deref());

    let images = match request
        .images
        .into_iter()
        .map(ImagePayload::decode)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(images) => images,
        Err(error) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                error,
                "فقط فایل های عکس مجاز است.",
            )
        }
    };

    let owner = match request.owner.as_deref().map(normalize_phone) {
        None => OwnerId::guest(),
        Some(Ok(phone)) => OwnerId::new(phone),
        Some(Err(source)) => {
            let error = ValidationError::InvalidPhone(source);
            let message = error.localized(lang);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, error, message);
        }
    };

    match state
        .marketplace
        .submit(listing_kind, request.form, images, owner)
        .await
    {
        Ok(listing) => (StatusCode::CREATED, axum::Json(ListingView::from(listing))).into_response(),
        Err(error) => {
            let status = match &error {
                SubmissionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SubmissionError::Upload(_) | SubmissionError::Insert(_) => StatusCode::BAD_GATEWAY,
            };
            let message = error.localized(lang);
            error_response(status, error, message)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct QueueQuery {
    pub status: Option<String>,
}

pub(crate) async fn queue_handler<G, O>(
    State(state): SharedState<G, O>,
    Path(kind): Path<String>,
    Query(query): Query<QueueQuery>,
    headers: HeaderMap,
) -> Response
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let Ok(listing_kind) = kind.parse::<ListingKind>() else {
        return unknown_kind(&kind);
    };
    let status = match query.status.as_deref().map(str::parse::<ListingStatus>) {
        None => ListingStatus::Pending,
        Some(Ok(status)) => status,
        Some(Err(error)) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                error,
                "وضعیت نامعتبر است.",
            )
        }
    };

    let listings: Vec<ListingView> = state
        .marketplace
        .queue(listing_kind, status)
        .await
        .into_iter()
        .map(ListingView::from)
        .collect();
    let payload = json!({
        "kind": listing_kind.table(),
        "status": status.label(),
        "count": listings.len(),
        "listings": listings,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct ModerationQuery {
    #[serde(default)]
    pub confirm: bool,
    pub lang: Option<String>,
}

pub(crate) async fn approve_handler<G, O>(
    State(state): SharedState<G, O>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<ModerationQuery>,
    headers: HeaderMap,
) -> Response
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let Ok(listing_kind) = kind.parse::<ListingKind>() else {
        return unknown_kind(&kind);
    };
    let id = ListingId(id);
    match state.marketplace.approve(listing_kind, &id).await {
        Ok(listing) => {
            let payload = json!({
                "id": id,
                "status": ListingStatus::Approved.label(),
                "listing": listing,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => moderation_failure(error, language(query.lang.as_deref())),
    }
}

pub(crate) async fn delete_handler<G, O>(
    State(state): SharedState<G, O>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<ModerationQuery>,
    headers: HeaderMap,
) -> Response
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let Ok(listing_kind) = kind.parse::<ListingKind>() else {
        return unknown_kind(&kind);
    };
    let id = ListingId(id);
    let confirmation = DeleteConfirmation::from_flag(query.confirm);
    match state.marketplace.delete(listing_kind, &id, confirmation).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => moderation_failure(error, language(query.lang.as_deref())),
    }
}

pub(crate) async fn refresh_handler<G, O>(
    State(state): SharedState<G, O>,
    headers: HeaderMap,
) -> Response
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let total = state.marketplace.refresh().await;
    (StatusCode::OK, axum::Json(json!({ "total": total }))).into_response()
}
