use std::sync::Arc;

use super::common::*;
use crate::marketplace::digits::NumberError;
use crate::marketplace::domain::{ListingDetails, ListingKind, ListingStatus, OwnerId};
use crate::marketplace::filter::ListingFilter;
use crate::marketplace::gateway::{GatewayError, InMemoryGateway, ListingGateway};
use crate::marketplace::province::{Language, Province};
use crate::marketplace::service::{Marketplace, MarketplaceSettings};
use crate::marketplace::submission::{
    SubmissionError, SubmissionFields, ValidationError, MAX_IMAGES,
};

#[tokio::test]
async fn submitted_listing_is_pending_and_hidden_until_approved() {
    let (marketplace, _) = build_marketplace(Vec::new()).await;
    let owner = OwnerId::new("0700112233");

    let listing = marketplace
        .submit(ListingKind::Property, property_form(), vec![jpeg("front.jpg")], owner.clone())
        .await
        .expect("submission succeeds");

    assert_eq!(listing.status, ListingStatus::Pending);
    assert_eq!(listing.owner_id, owner);
    assert_eq!(listing.province, Some(Province::Kabul));
    assert_eq!(listing.phone_number, "0700112233");
    let details = listing.property().expect("property details");
    assert_eq!(details.price, 500_000);
    assert_eq!(details.bedrooms, 2);
    assert_eq!(details.area, 0);
    assert_eq!(details.currency, "AFN");
    assert_eq!(details.features, vec!["گراچ".to_string()]);

    let public = marketplace
        .feed(ListingKind::Property, &ListingFilter::default())
        .await;
    assert!(public.is_empty());
    assert!(marketplace
        .get(ListingKind::Property, &listing.id, None)
        .await
        .is_none());
    assert!(marketplace
        .get(ListingKind::Property, &listing.id, Some(&owner))
        .await
        .is_some());

    marketplace
        .approve(ListingKind::Property, &listing.id)
        .await
        .expect("approval succeeds");
    let public = marketplace
        .feed(ListingKind::Property, &ListingFilter::default())
        .await;
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].id, listing.id);
}

#[tokio::test]
async fn uploaded_images_become_public_urls_in_order() {
    let (marketplace, gateway) = build_marketplace(Vec::new()).await;

    let listing = marketplace
        .submit(
            ListingKind::Property,
            property_form(),
            vec![jpeg("a.jpg"), jpeg("b.jpg")],
            OwnerId::guest(),
        )
        .await
        .expect("submission succeeds");

    assert_eq!(listing.images.len(), 2);
    assert!(listing
        .images
        .iter()
        .all(|url| url.starts_with("memory://images/") && url.ends_with(".jpg")));
    let keys = gateway.object_keys().await;
    assert_eq!(keys.len(), 2);
    for key in &keys {
        let stored = gateway.object(key).await.expect("object stored");
        assert_eq!(stored.content_type, "image/jpeg");
        assert!(!stored.bytes.is_empty());
    }
    assert!(listing.owner_id.is_guest());
}

#[tokio::test]
async fn submission_without_images_persists_seeded_placeholder() {
    let (marketplace, _) = build_marketplace(Vec::new()).await;

    let listing = marketplace
        .submit(ListingKind::Job, job_form(), Vec::new(), OwnerId::guest())
        .await
        .expect("submission succeeds");

    assert_eq!(listing.images.len(), 1);
    assert!(listing.images[0].starts_with("https://picsum.photos/seed/job-"));
    assert!(listing.images[0].ends_with("/800/600"));
    match &listing.details {
        ListingDetails::Job(details) => assert_eq!(details.salary, 25_000),
        other => panic!("expected job details, got {other:?}"),
    }
}

#[tokio::test]
async fn new_listing_goes_to_the_front_of_its_collection() {
    let (marketplace, _) = build_marketplace(vec![approved("old", "u1", "خانه")]).await;
    let listing = marketplace
        .submit(ListingKind::Property, property_form(), Vec::new(), OwnerId::new("u1"))
        .await
        .expect("submission succeeds");

    let filter = ListingFilter {
        my_ads_only: true,
        current_user: Some(OwnerId::new("u1")),
        ..ListingFilter::default()
    };
    let mine = marketplace.feed(ListingKind::Property, &filter).await;
    assert_eq!(owned_ids(&mine), vec![listing.id.0.clone(), "old".to_string()]);
}

#[tokio::test]
async fn failed_insert_removes_uploaded_images() {
    let gateway = Arc::new(InMemoryGateway::new());
    gateway.reject_inserts(true);
    let objects = Arc::new(RecordingObjectStore::default());
    let marketplace = Marketplace::new(gateway.clone(), objects.clone(), MarketplaceSettings::default());

    let result = marketplace
        .submit(
            ListingKind::Property,
            property_form(),
            vec![jpeg("a.jpg"), jpeg("b.png")],
            OwnerId::guest(),
        )
        .await;

    assert!(matches!(result, Err(SubmissionError::Insert(GatewayError::Unavailable(_)))));
    assert_eq!(objects.uploads().len(), 2);
    assert_eq!(objects.removed(), objects.uploads());
    assert_eq!(marketplace.len().await, 0);
    assert!(gateway
        .select_all(ListingKind::Property)
        .await
        .expect("rows")
        .is_empty());
}

#[tokio::test]
async fn failed_upload_removes_earlier_uploads_and_skips_insert() {
    let gateway = Arc::new(InMemoryGateway::new());
    let objects = Arc::new(RecordingObjectStore::failing_after(1));
    let marketplace = Marketplace::new(gateway.clone(), objects.clone(), MarketplaceSettings::default());

    let result = marketplace
        .submit(
            ListingKind::Property,
            property_form(),
            vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")],
            OwnerId::guest(),
        )
        .await;

    match result {
        Err(error @ SubmissionError::Upload(_)) => {
            assert_eq!(error.localized(Language::Dari), "خطا در بارگذاری عکس ها.");
        }
        other => panic!("expected upload failure, got {other:?}"),
    }
    assert_eq!(objects.uploads().len(), 1);
    assert_eq!(objects.removed(), objects.uploads());
    assert!(gateway
        .select_all(ListingKind::Property)
        .await
        .expect("rows")
        .is_empty());
}

#[tokio::test]
async fn invalid_forms_are_rejected_before_any_upload() {
    let gateway = Arc::new(InMemoryGateway::new());
    let objects = Arc::new(RecordingObjectStore::default());
    let marketplace = Marketplace::new(gateway, objects.clone(), MarketplaceSettings::default());

    let mut no_title = property_form();
    no_title.title = "   ".to_string();
    let mut short_phone = property_form();
    short_phone.phone_number = "۰۷۰۰".to_string();
    let mut no_location = property_form();
    no_location.location = None;
    let mut bad_price = property_form();
    if let SubmissionFields::Property { price, .. } = &mut bad_price.fields {
        *price = "پنج لک".to_string();
    }
    let mut unknown_city = property_form();
    unknown_city.city = "Atlantis".to_string();

    let cases = [
        (no_title, ValidationError::MissingTitle),
        (short_phone, ValidationError::InvalidPhone(NumberError::PhoneTooShort(4))),
        (no_location, ValidationError::MissingLocation),
        (
            bad_price,
            ValidationError::InvalidAmount {
                field: "price",
                source: NumberError::NotANumber("پنج لک".to_string()),
            },
        ),
        (unknown_city, ValidationError::UnknownProvince("Atlantis".to_string())),
    ];

    for (form, expected) in cases {
        match marketplace
            .submit(ListingKind::Property, form, vec![jpeg("a.jpg")], OwnerId::guest())
            .await
        {
            Err(SubmissionError::Validation(actual)) => assert_eq!(actual, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }
    assert!(objects.uploads().is_empty());
}

#[tokio::test]
async fn kind_mismatch_and_image_limits_are_validation_errors() {
    let (marketplace, _) = build_marketplace(Vec::new()).await;

    let result = marketplace
        .submit(ListingKind::Service, job_form(), Vec::new(), OwnerId::guest())
        .await;
    assert!(matches!(
        result,
        Err(SubmissionError::Validation(ValidationError::KindMismatch {
            expected: ListingKind::Service,
            found: ListingKind::Job,
        }))
    ));

    let images = (0..=MAX_IMAGES).map(|n| jpeg(&format!("{n}.jpg"))).collect();
    let result = marketplace
        .submit(ListingKind::Job, job_form(), images, OwnerId::guest())
        .await;
    assert!(matches!(
        result,
        Err(SubmissionError::Validation(ValidationError::TooManyImages(11)))
    ));
}

#[test]
fn validation_messages_are_localized() {
    assert_eq!(
        ValidationError::MissingTitle.localized(Language::Dari),
        "لطفاً عنوان آگهی را وارد کنید."
    );
    assert_ne!(
        ValidationError::MissingLocation.localized(Language::Pashto),
        ValidationError::MissingLocation.localized(Language::Dari)
    );
}
