use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use super::domain::ListingId;
use super::repository::ListingRepository;
use super::service::{ListingService, ListingServiceError};
use crate::auth::{require_bearer, AuthenticatedUser, TokenAuthority};
use crate::error::ApiError;

/// Reads are public; create, update and delete sit behind the bearer gate.
pub fn listing_router<R>(service: Arc<ListingService<R>>, tokens: TokenAuthority) -> Router
where
    R: ListingRepository + 'static,
{
    let public = Router::new()
        .route("/imoveis", get(list_handler::<R>))
        .route("/imoveis/:id", get(get_handler::<R>));

    let protected = Router::new()
        .route("/imoveis", post(create_handler::<R>))
        .route(
            "/imoveis/:id",
            axum::routing::put(update_handler::<R>).delete(delete_handler::<R>),
        )
        .route_layer(middleware::from_fn_with_state(tokens, require_bearer));

    public.merge(protected).with_state(service)
}

impl From<ListingServiceError> for ApiError {
    fn from(value: ListingServiceError) -> Self {
        match value {
            ListingServiceError::Invalid(errors) => ApiError::Invalid(errors.into_messages()),
            ListingServiceError::NotFound(_) => ApiError::NotFound("Listing not found.".to_string()),
            ListingServiceError::Repository(err) => ApiError::Internal(err.to_string()),
        }
    }
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::Invalid(vec![rejection.body_text()]))
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
) -> Result<Response, ApiError>
where
    R: ListingRepository + 'static,
{
    let listings = service.list()?;
    Ok(Json(json!({ "listings": listings })).into_response())
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    R: ListingRepository + 'static,
{
    let listing = service.get(&ListingId(id))?;
    Ok(Json(listing).into_response())
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: ListingRepository + 'static,
{
    let payload = json_body(payload)?;
    let listing = service.create(&payload)?;
    info!(listing_id = %listing.id, user_id = %user.id, "listing published");
    Ok((StatusCode::CREATED, Json(listing)).into_response())
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(id): Path<String>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: ListingRepository + 'static,
{
    let payload = json_body(payload)?;
    let listing = service.update(&ListingId(id), &payload)?;
    info!(listing_id = %listing.id, user_id = %user.id, "listing edited");
    let body = json!({ "message": "Listing updated successfully.", "listing": listing });
    Ok(Json(body).into_response())
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(id): Path<String>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Response, ApiError>
where
    R: ListingRepository + 'static,
{
    let listing = service.delete(&ListingId(id))?;
    info!(listing_id = %listing.id, user_id = %user.id, "listing removed");
    Ok(Json(json!({ "message": "Listing deleted successfully." })).into_response())
}
