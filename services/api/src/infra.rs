use axum::http::{header, HeaderValue, Method};
use axum::Router;
use grimoveis::config::{FrontendConfig, ServerConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Browser access for the configured origins only. Origins that are not valid
/// header values are skipped with a warning.
pub(crate) fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unusable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Serves the prebuilt single-page app for every unmatched route, with
/// `index.html` as the catch-all.
pub(crate) fn with_frontend(router: Router, config: &FrontendConfig) -> Router {
    let build_dir = &config.build_dir;
    if !build_dir.is_dir() {
        warn!(
            build_dir = %build_dir.display(),
            "frontend build directory not found; unmatched routes will return 404"
        );
        return router;
    }

    let index = ServeFile::new(build_dir.join("index.html"));
    router.fallback_service(ServeDir::new(build_dir).fallback(index))
}
