use crate::infra::{
    describe, marketplace_settings, parse_deal_type, parse_kind, parse_language,
    parse_property_type, Backend,
};
use bazaar::config::AppConfig;
use bazaar::error::AppError;
use bazaar::marketplace::{
    CityFilter, DealType, FileSessionStore, Language, ListingFilter, ListingGateway, ListingId,
    ListingKind, Marketplace, ObjectStore, PropertyType, SessionContext, SessionStore,
};
use clap::{Args, Subcommand};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ListingsArgs {
    /// Collection to browse: properties, jobs or services
    #[arg(value_parser = parse_kind)]
    pub(crate) kind: ListingKind,
    /// Case-insensitive text matched against listing titles
    #[arg(long, default_value = "")]
    pub(crate) query: String,
    /// Province or city in Dari or Pashto (defaults to all provinces)
    #[arg(long)]
    pub(crate) city: Option<String>,
    /// Deal type for properties (sale, rent, mortgage)
    #[arg(long, value_parser = parse_deal_type)]
    pub(crate) deal: Option<DealType>,
    /// Property type (apartment, house, home, land, commercial, shop)
    #[arg(long, value_parser = parse_property_type)]
    pub(crate) property_type: Option<PropertyType>,
    /// Only listings bookmarked in the session
    #[arg(long)]
    pub(crate) saved: bool,
    /// Only listings owned by the signed-in user, including those awaiting review
    #[arg(long)]
    pub(crate) mine: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SessionCommand {
    /// Print the saved session
    Show,
    /// Sign in with a mobile number
    Login { phone: String },
    /// Sign out, keeping bookmarks and language
    Logout,
    /// Bookmark a listing, or drop the bookmark when it is already saved
    Save { id: String },
    /// Switch the display language (dari or pashto)
    Language {
        #[arg(value_parser = parse_language)]
        language: Language,
    },
}

pub(crate) async fn run_listings(config: AppConfig, args: ListingsArgs) -> Result<(), AppError> {
    let session = FileSessionStore::new(&config.session.path).load()?;
    let filter = listings_filter(&session, &args);

    match Backend::from_config(&config.gateway)? {
        Backend::Hosted(gateway) => {
            print_feed(&config, gateway.clone(), gateway, &session, args.kind, &filter).await
        }
        Backend::Memory(gateway) => {
            print_feed(&config, gateway.clone(), gateway, &session, args.kind, &filter).await
        }
    }
    Ok(())
}

fn listings_filter(session: &SessionContext, args: &ListingsArgs) -> ListingFilter {
    ListingFilter {
        query: args.query.clone(),
        city: args
            .city
            .as_deref()
            .map(CityFilter::parse)
            .unwrap_or_default(),
        deal_type: args.deal,
        property_type: args.property_type,
        saved_only: args.saved,
        my_ads_only: args.mine,
        ..ListingFilter::for_session(session)
    }
}

async fn print_feed<G, O>(
    config: &AppConfig,
    gateway: Arc<G>,
    objects: Arc<O>,
    session: &SessionContext,
    kind: ListingKind,
    filter: &ListingFilter,
) where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    let marketplace = Marketplace::load(gateway, objects, marketplace_settings(config)).await;
    let feed = marketplace.feed(kind, filter).await;

    println!("{kind}: {} listing(s) for {}", feed.len(), session.current_user().as_str());
    for listing in &feed {
        let marker = if session.saved.contains(&listing.id) { "*" } else { " " };
        println!("{marker} {}", describe(listing, session.language));
    }
}

pub(crate) fn run_session(config: AppConfig, command: SessionCommand) -> Result<(), AppError> {
    let store = FileSessionStore::new(&config.session.path);
    let mut session = store.load()?;

    match command {
        SessionCommand::Show => {
            print_session(&session);
            return Ok(());
        }
        SessionCommand::Login { phone } => {
            let phone = session.login(&phone)?.to_string();
            println!("Signed in as {phone}");
        }
        SessionCommand::Logout => {
            session.logout();
            println!(
                "Signed out; new listings will be owned by {}",
                session.current_user().as_str()
            );
        }
        SessionCommand::Save { id } => {
            let id = ListingId::new(id);
            if session.toggle_saved(id.clone()) {
                println!("Saved listing {id}");
            } else {
                println!("Removed listing {id} from saved");
            }
        }
        SessionCommand::Language { language } => {
            session.set_language(language);
            println!("Display language set to {}", language.code());
        }
    }

    store.save(&session)?;
    Ok(())
}

fn print_session(session: &SessionContext) {
    println!("User: {}", session.current_user().as_str());
    println!("Signed in: {}", session.is_signed_in());
    println!("Language: {}", session.language.code());
    if session.saved.is_empty() {
        println!("Saved listings: none");
    } else {
        let saved: Vec<&str> = session.saved.iter().map(ListingId::as_str).collect();
        println!("Saved listings: {}", saved.join(", "));
    }
}
