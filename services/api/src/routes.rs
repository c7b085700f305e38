use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use grimoveis::auth::{auth_router, AuthService, CredentialRepository};
use grimoveis::listings::{listing_router, ListingRepository, ListingService};
use grimoveis::media::{upload_router, MediaStore};
use serde_json::json;
use std::sync::Arc;

/// Auth, listing and upload routes plus the operational endpoints.
pub(crate) fn with_api_routes<L, C>(
    listings: Arc<ListingService<L>>,
    accounts: Arc<AuthService<C>>,
    media: Arc<dyn MediaStore>,
    max_upload_bytes: usize,
) -> Router
where
    L: ListingRepository + 'static,
    C: CredentialRepository + 'static,
{
    let tokens = accounts.tokens().clone();

    auth_router(accounts)
        .merge(listing_router(listings, tokens.clone()))
        .merge(upload_router(media, tokens, max_upload_bytes))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
