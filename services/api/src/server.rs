use crate::cli::ServeArgs;
use crate::infra::{cors_layer, with_frontend, AppState};
use crate::routes::with_api_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grimoveis::auth::{AuthService, InMemoryCredentialRepository, TokenAuthority};
use grimoveis::clock::{Clock, SystemClock};
use grimoveis::config::AppConfig;
use grimoveis::error::AppError;
use grimoveis::listings::{InMemoryListingRepository, ListingImporter, ListingService};
use grimoveis::media::{CloudinaryMediaStore, MediaStore};
use grimoveis::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens = TokenAuthority::from_config(&config.auth);

    let listing_service = Arc::new(ListingService::new(
        Arc::new(InMemoryListingRepository::default()),
        clock.clone(),
    ));
    if let Some(path) = args.seed_csv.take() {
        let drafts = ListingImporter::from_path(&path)?;
        let seeded = drafts.len();
        for draft in drafts {
            listing_service.create_draft(draft)?;
        }
        info!(seeded, path = %path.display(), "listings seeded from CSV");
    }

    let auth_service = Arc::new(AuthService::new(
        Arc::new(InMemoryCredentialRepository::default()),
        tokens,
        clock.clone(),
    ));
    let media_store: Arc<dyn MediaStore> =
        Arc::new(CloudinaryMediaStore::new(&config.media, clock)?);

    let app = with_api_routes(
        listing_service,
        auth_service,
        media_store,
        config.media.max_request_bytes,
    )
    .layer(Extension(app_state));
    let app = with_frontend(app, &config.frontend)
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "grimoveis api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
