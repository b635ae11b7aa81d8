use crate::cli::ServeArgs;
use crate::infra::{marketplace_settings, AppState, Backend};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bazaar::config::AppConfig;
use bazaar::error::AppError;
use bazaar::marketplace::{AdminGate, ListingGateway, Marketplace, ObjectStore};
use bazaar::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    match Backend::from_config(&config.gateway)? {
        Backend::Hosted(gateway) => serve(config, gateway.clone(), gateway).await,
        Backend::Memory(gateway) => serve(config, gateway.clone(), gateway).await,
    }
}

async fn serve<G, O>(config: AppConfig, gateway: Arc<G>, objects: Arc<O>) -> Result<(), AppError>
where
    G: ListingGateway + 'static,
    O: ObjectStore + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let admin = AdminGate::new(config.moderation.admin_token.clone());
    if !admin.is_enabled() {
        warn!("APP_ADMIN_TOKEN is not set; moderation routes will refuse every request");
    }

    let marketplace = Arc::new(
        Marketplace::load(gateway, objects, marketplace_settings(&config)).await,
    );
    let listings = marketplace.len().await;
    let pending_visibility = marketplace.settings().pending_visibility;

    let app = with_marketplace_routes(marketplace, admin)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        listings,
        ?pending_visibility,
        "classifieds marketplace ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
