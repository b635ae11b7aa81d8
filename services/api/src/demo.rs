use crate::infra::{describe, image_from_path, marketplace_settings};
use bazaar::config::AppConfig;
use bazaar::error::AppError;
use bazaar::marketplace::seed::DEMO_OWNER;
use bazaar::marketplace::{
    DealType, DeleteConfirmation, GeoPoint, ImageUpload, InMemoryGateway, Language, Listing,
    ListingFilter, ListingKind, ListingStatus, Marketplace, PropertyType, SessionContext,
    SubmissionFields, SubmissionForm,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Photo to attach to the demo listing; its content type is guessed from the extension
    #[arg(long)]
    pub(crate) photo: Option<PathBuf>,
    /// Print listings in Pashto instead of Dari
    #[arg(long)]
    pub(crate) pashto: bool,
}

type DemoMarketplace = Marketplace<InMemoryGateway, InMemoryGateway>;

pub(crate) async fn run_demo(config: AppConfig, args: DemoArgs) -> Result<(), AppError> {
    let language = if args.pashto {
        Language::Pashto
    } else {
        Language::Dari
    };
    let gateway = Arc::new(InMemoryGateway::with_demo_listings());
    let marketplace = Marketplace::load(
        gateway.clone(),
        gateway.clone(),
        marketplace_settings(&config),
    )
    .await;

    let mut session = SessionContext::default();
    session.login(DEMO_OWNER)?;
    session.set_language(language);

    println!("=== Bazaar Demo ===");
    println!("Signed in as {}", session.current_user().as_str());
    for kind in ListingKind::ALL {
        let public = marketplace.feed(kind, &ListingFilter::default()).await;
        let pending = marketplace.queue(kind, ListingStatus::Pending).await;
        println!(
            "{kind}: {} public, {} awaiting review",
            public.len(),
            pending.len()
        );
    }

    let images = match &args.photo {
        Some(path) => vec![image_from_path(path).await?],
        None => Vec::new(),
    };
    let listing = submit_demo_listing(&marketplace, &session, images).await?;
    println!();
    println!("Submitted:");
    println!("  {}", describe(&listing, language));
    println!("  image: {}", listing.primary_image());
    for key in gateway.object_keys().await {
        if let Some(object) = gateway.object(&key).await {
            println!(
                "  stored photo {key}: {}, {} bytes",
                object.content_type,
                object.bytes.len()
            );
        }
    }

    let my_ads = ListingFilter {
        my_ads_only: true,
        ..ListingFilter::for_session(&session)
    };
    report_visibility(&marketplace, &listing, &my_ads, "after submission").await;

    let approved = marketplace
        .approve(ListingKind::Property, &listing.id)
        .await?;
    println!();
    println!("Approved by moderator:");
    if let Some(approved) = approved {
        println!("  {}", describe(&approved, language));
    }
    report_visibility(&marketplace, &listing, &my_ads, "after approval").await;

    marketplace
        .delete(
            ListingKind::Property,
            &listing.id,
            DeleteConfirmation::from_flag(true),
        )
        .await?;
    marketplace.refresh().await;
    println!();
    println!("Deleted by moderator and reloaded from the gateway.");
    report_visibility(&marketplace, &listing, &my_ads, "after deletion").await;

    Ok(())
}

async fn submit_demo_listing(
    marketplace: &DemoMarketplace,
    session: &SessionContext,
    images: Vec<ImageUpload>,
) -> Result<Listing, AppError> {
    let form = SubmissionForm {
        title: "آپارتمان دو خوابه در کارته سه".to_string(),
        city: "کابل".to_string(),
        address: "کارته سه، نزدیک پوهنتون".to_string(),
        description: "آپارتمان تازه ترمیم شده با آب و برق دایمی.".to_string(),
        phone_number: session.phone.clone().unwrap_or_default(),
        location: Some(GeoPoint::new(34.4950, 69.1480)),
        fields: SubmissionFields::Property {
            price: "۱۸۰۰۰".to_string(),
            deal_type: DealType::Rent,
            property_type: PropertyType::Apartment,
            bedrooms: "۲".to_string(),
            area: "۱۱۰".to_string(),
            has_storage: true,
            features: vec!["پارکینگ".to_string()],
        },
    };

    let listing = marketplace
        .submit(ListingKind::Property, form, images, session.current_user())
        .await?;
    Ok(listing)
}

async fn report_visibility(
    marketplace: &DemoMarketplace,
    listing: &Listing,
    my_ads: &ListingFilter,
    stage: &str,
) {
    let public = marketplace
        .feed(ListingKind::Property, &ListingFilter::default())
        .await;
    let mine = marketplace.feed(ListingKind::Property, my_ads).await;
    let in_public = public.iter().any(|item| item.id == listing.id);
    let in_mine = mine.iter().any(|item| item.id == listing.id);

    println!(
        "  {stage}: public feed {}, my ads {}",
        presence(in_public),
        presence(in_mine)
    );
}

fn presence(found: bool) -> &'static str {
    if found {
        "shows it"
    } else {
        "does not show it"
    }
}
