use std::fmt;

use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::domain::{Listing, ListingId, ListingKind, ListingStatus};
use super::gateway::{GatewayError, ListingGateway, ObjectStore};
use super::province::Language;
use super::service::Marketplace;

/// Explicit acknowledgement required before a listing is removed for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteConfirmation {
    Confirmed,
    Unconfirmed,
}

impl DeleteConfirmation {
    pub fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Unconfirmed
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("deletion must be confirmed")]
    Unconfirmed,
    #[error("listing not found")]
    NotFound,
    #[error(transparent)]
    Gateway(GatewayError),
}

impl From<GatewayError> for ModerationError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound => ModerationError::NotFound,
            other => ModerationError::Gateway(other),
        }
    }
}

impl ModerationError {
    pub fn localized(&self, language: Language) -> &'static str {
        match (self, language) {
            (ModerationError::Unconfirmed, Language::Dari) => "لطفاً حذف آگهی را تایید کنید.",
            (ModerationError::Unconfirmed, Language::Pashto) => "مهرباني وکړئ د اعلان ړنګول تایید کړئ.",
            (ModerationError::NotFound, Language::Dari) => "آگهی پیدا نشد.",
            (ModerationError::NotFound, Language::Pashto) => "اعلان ونه موندل شو.",
            (ModerationError::Gateway(_), Language::Dari) => "خطا در ارتباط با سرور. دوباره تلاش کنید.",
            (ModerationError::Gateway(_), Language::Pashto) => "له سرور سره په اړیکه کې ستونزه. بیا هڅه وکړئ.",
        }
    }
}

impl<G, O> Marketplace<G, O>
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    /// Mark a listing approved in the gateway, then in the local store.
    /// Approving an approved listing succeeds. On gateway failure nothing
    /// changes locally.
    pub async fn approve(
        &self,
        kind: ListingKind,
        id: &ListingId,
    ) -> Result<Option<Listing>, ModerationError> {
        if let Err(err) = self
            .gateway
            .update_status(kind, id, ListingStatus::Approved)
            .await
        {
            warn!(table = kind.table(), %id, error = %err, "approval failed");
            return Err(err.into());
        }

        let mut store = self.store.write().await;
        if !store.set_status(kind, id, ListingStatus::Approved) {
            warn!(table = kind.table(), %id, "approved listing missing from local store");
        }
        info!(table = kind.table(), %id, "listing approved");
        Ok(store.find(kind, id).cloned())
    }

    /// Remove a listing from the gateway, then from the local store.
    pub async fn delete(
        &self,
        kind: ListingKind,
        id: &ListingId,
        confirmation: DeleteConfirmation,
    ) -> Result<Option<Listing>, ModerationError> {
        if confirmation != DeleteConfirmation::Confirmed {
            return Err(ModerationError::Unconfirmed);
        }

        if let Err(err) = self.gateway.delete(kind, id).await {
            warn!(table = kind.table(), %id, error = %err, "deletion failed");
            return Err(err.into());
        }

        let removed = self.store.write().await.remove(kind, id);
        info!(table = kind.table(), %id, "listing deleted");
        Ok(removed)
    }
}

/// Server-side check of the moderator bearer token. Without a configured
/// token every request is refused.
#[derive(Clone, Default)]
pub struct AdminGate {
    token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    #[error("moderation is disabled on this server")]
    Disabled,
    #[error("missing moderator credentials")]
    MissingCredentials,
    #[error("invalid moderator credentials")]
    InvalidCredentials,
}

impl AdminGate {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|token| !token.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn authorize(&self, presented: Option<&str>) -> Result<(), AdminError> {
        let expected = self.token.as_deref().ok_or(AdminError::Disabled)?;
        let presented = presented.ok_or(AdminError::MissingCredentials)?;
        if bool::from(expected.as_bytes().ct_eq(presented.as_bytes())) {
            Ok(())
        } else {
            Err(AdminError::InvalidCredentials)
        }
    }

    /// Check an `Authorization` header value of the form `Bearer <token>`.
    pub fn authorize_header(&self, header: Option<&str>) -> Result<(), AdminError> {
        let token = header.and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
                .map(str::trim)
        });
        self.authorize(token)
    }
}

impl fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
