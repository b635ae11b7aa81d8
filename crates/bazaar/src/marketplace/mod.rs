//! Classified listings for properties, jobs and services: the filter behind
//! every feed, the moderation transition, the submission pipeline and the
//! gateways that persist listings and their photos.

pub mod digits;
pub mod domain;
pub mod filter;
pub mod gateway;
pub mod moderation;
pub mod province;
pub mod router;
pub mod seed;
pub mod service;
pub mod session;
pub mod store;
pub mod submission;
pub mod supabase;

#[cfg(test)]
mod tests;

pub use domain::{
    DealType, GeoPoint, JobDetails, JobType, Listing, ListingDetails, ListingId, ListingKind,
    ListingStatus, OwnerId, PropertyDetails, PropertyType, ServiceCategory, ServiceDetails,
    UnknownValue, PLACEHOLDER_IMAGE,
};
pub use filter::{CityFilter, ListingFilter, PendingVisibility};
pub use gateway::{GatewayError, InMemoryGateway, ListingGateway, NewListing, ObjectStore};
pub use moderation::{AdminError, AdminGate, DeleteConfirmation, ModerationError};
pub use province::{Language, Province, ProvinceParseError};
pub use router::marketplace_router;
pub use service::{Marketplace, MarketplaceSettings};
pub use session::{FileSessionStore, MemorySessionStore, SessionContext, SessionError, SessionStore};
pub use store::ListingStore;
pub use submission::{
    ImageUpload, SubmissionError, SubmissionFields, SubmissionForm, ValidatedSubmission,
    ValidationError,
};
pub use supabase::SupabaseGateway;
