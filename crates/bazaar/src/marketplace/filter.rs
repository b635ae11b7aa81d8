use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{DealType, Listing, ListingId, OwnerId, PropertyType};
use super::province::{fold, is_all_provinces, Province};
use super::session::SessionContext;

/// Whether a submitter sees their own listings that are still awaiting
/// moderation when browsing "my ads".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingVisibility {
    #[default]
    OwnerOnly,
    Hidden,
}

impl PendingVisibility {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "owner" | "owner_only" => Some(Self::OwnerOnly),
            "hidden" | "none" => Some(Self::Hidden),
            _ => None,
        }
    }
}

/// City selector. `Selected` keeps the raw text so listings whose city
/// never resolved to a province can still match it exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CityFilter {
    #[default]
    All,
    Selected {
        raw: String,
        province: Option<Province>,
    },
}

impl CityFilter {
    pub fn parse(raw: &str) -> Self {
        if is_all_provinces(raw) {
            return CityFilter::All;
        }
        CityFilter::Selected {
            raw: raw.trim().to_string(),
            province: Province::resolve(raw),
        }
    }

    fn matches(&self, listing: &Listing) -> bool {
        match self {
            CityFilter::All => true,
            CityFilter::Selected { raw, province } => match (province, listing.province) {
                (Some(wanted), Some(actual)) => *wanted == actual,
                _ => listing.city == *raw,
            },
        }
    }
}

/// UI filter state applied to one collection.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub query: String,
    pub city: CityFilter,
    pub deal_type: Option<DealType>,
    pub property_type: Option<PropertyType>,
    pub saved_only: bool,
    pub saved_ids: BTreeSet<ListingId>,
    pub my_ads_only: bool,
    pub current_user: Option<OwnerId>,
    pub pending_visibility: PendingVisibility,
}

impl ListingFilter {
    /// Seed the current user and saved ids from a session context.
    pub fn for_session(session: &SessionContext) -> Self {
        Self {
            saved_ids: session.saved.clone(),
            current_user: Some(session.current_user()),
            ..Self::default()
        }
    }

    fn owns(&self, listing: &Listing) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|user| listing.is_owned_by(user))
    }

    fn visible(&self, listing: &Listing) -> bool {
        listing.is_approved()
            || (self.my_ads_only
                && self.pending_visibility == PendingVisibility::OwnerOnly
                && self.owns(listing))
    }

    fn matches_text(&self, listing: &Listing) -> bool {
        let needle = fold(&self.query).to_lowercase();
        needle.is_empty() || fold(&listing.title).to_lowercase().contains(&needle)
    }

    fn matches_category(&self, listing: &Listing) -> bool {
        let Some(details) = listing.property() else {
            return true;
        };
        self.deal_type.map_or(true, |deal| details.deal_type == deal)
            && self
                .property_type
                .map_or(true, |kind| details.property_type == kind)
    }

    /// Inclusion test; every rule must hold.
    pub fn matches(&self, listing: &Listing) -> bool {
        self.visible(listing)
            && (!self.my_ads_only || self.owns(listing))
            && self.matches_text(listing)
            && self.city.matches(listing)
            && self.matches_category(listing)
            && (!self.saved_only || self.saved_ids.contains(&listing.id))
    }

    /// Matching listings in source order.
    pub fn apply<'a, I>(&self, listings: I) -> Vec<&'a Listing>
    where
        I: IntoIterator<Item = &'a Listing>,
    {
        listings
            .into_iter()
            .filter(|listing| self.matches(listing))
            .collect()
    }
}
