//! End-to-end scenarios through the public marketplace facade, driven by a
//! signed-in session against the demo catalogue.

use std::sync::Arc;

use bazaar::marketplace::seed::DEMO_OWNER;
use bazaar::marketplace::{
    DealType, DeleteConfirmation, FileSessionStore, GeoPoint, InMemoryGateway, ListingFilter,
    ListingKind, ListingStatus, Marketplace, MarketplaceSettings, PendingVisibility,
    PropertyType, SessionContext, SessionStore, SubmissionFields, SubmissionForm,
};

async fn demo_marketplace(
    settings: MarketplaceSettings,
) -> Marketplace<InMemoryGateway, InMemoryGateway> {
    let gateway = Arc::new(InMemoryGateway::with_demo_listings());
    Marketplace::load(gateway.clone(), gateway, settings).await
}

fn land_form() -> SubmissionForm {
    SubmissionForm {
        title: "زمین رهایشی در پغمان".to_string(),
        city: "کابل".to_string(),
        address: "پغمان".to_string(),
        description: String::new(),
        phone_number: DEMO_OWNER.to_string(),
        location: Some(GeoPoint::new(34.59, 68.95)),
        fields: SubmissionFields::Property {
            price: "۱۲۰۰۰۰۰".to_string(),
            deal_type: DealType::Sale,
            property_type: PropertyType::Land,
            bedrooms: String::new(),
            area: "۶۰۰".to_string(),
            has_storage: false,
            features: Vec::new(),
        },
    }
}

#[tokio::test]
async fn demo_catalogue_hides_pending_listings_from_the_public_feed() {
    let marketplace = demo_marketplace(MarketplaceSettings::default()).await;

    for kind in ListingKind::ALL {
        let public = marketplace.feed(kind, &ListingFilter::default()).await;
        assert!(!public.is_empty(), "{kind}");
        assert!(public.iter().all(|listing| listing.is_approved()), "{kind}");
        assert_eq!(marketplace.queue(kind, ListingStatus::Pending).await.len(), 1);
    }
}

#[tokio::test]
async fn session_submission_moderation_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sessions = FileSessionStore::new(dir.path().join("session.json"));

    let mut session = sessions.load().expect("empty session");
    session.login(DEMO_OWNER).expect("valid phone");
    sessions.save(&session).expect("session saved");

    let session: SessionContext = sessions.load().expect("session reloads");
    let marketplace = demo_marketplace(MarketplaceSettings::default()).await;

    let listing = marketplace
        .submit(
            ListingKind::Property,
            land_form(),
            Vec::new(),
            session.current_user(),
        )
        .await
        .expect("submission succeeds");
    assert_eq!(listing.status, ListingStatus::Pending);

    let public = marketplace
        .feed(ListingKind::Property, &ListingFilter::default())
        .await;
    assert!(public.iter().all(|item| item.id != listing.id));

    let my_ads = ListingFilter {
        my_ads_only: true,
        ..ListingFilter::for_session(&session)
    };
    let mine = marketplace.feed(ListingKind::Property, &my_ads).await;
    assert_eq!(mine.first().map(|item| item.id.clone()), Some(listing.id.clone()));
    assert!(mine.iter().all(|item| item.owner_id == session.current_user()));

    marketplace
        .approve(ListingKind::Property, &listing.id)
        .await
        .expect("approval succeeds");
    let public = marketplace
        .feed(ListingKind::Property, &ListingFilter::default())
        .await;
    assert_eq!(public.first().map(|item| item.id.clone()), Some(listing.id.clone()));

    marketplace
        .delete(ListingKind::Property, &listing.id, DeleteConfirmation::Confirmed)
        .await
        .expect("delete succeeds");
    marketplace.refresh().await;
    for filter in [ListingFilter::default(), my_ads] {
        let feed = marketplace.feed(ListingKind::Property, &filter).await;
        assert!(feed.iter().all(|item| item.id != listing.id));
    }
}

#[tokio::test]
async fn hidden_pending_visibility_applies_to_owners_too() {
    let marketplace = demo_marketplace(MarketplaceSettings {
        pending_visibility: PendingVisibility::Hidden,
        ..MarketplaceSettings::default()
    })
    .await;

    let mut session = SessionContext::default();
    session.login(DEMO_OWNER).expect("valid phone");
    let listing = marketplace
        .submit(
            ListingKind::Property,
            land_form(),
            Vec::new(),
            session.current_user(),
        )
        .await
        .expect("submission succeeds");

    let my_ads = ListingFilter {
        my_ads_only: true,
        ..ListingFilter::for_session(&session)
    };
    let mine = marketplace.feed(ListingKind::Property, &my_ads).await;
    assert!(mine.iter().all(|item| item.id != listing.id));
    assert!(!mine.is_empty());
}
