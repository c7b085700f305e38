use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::repository::CredentialRepository;
use super::service::{AuthService, AuthServiceError};
use crate::error::ApiError;

/// Body of both auth endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsPayload {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub senha: Option<String>,
}

impl CredentialsPayload {
    fn into_parts(self) -> (String, String) {
        (self.email.unwrap_or_default(), self.senha.unwrap_or_default())
    }
}

pub fn auth_router<R>(service: Arc<AuthService<R>>) -> Router
where
    R: CredentialRepository + 'static,
{
    Router::new()
        .route("/auth/usuarios", post(register_handler::<R>))
        .route("/auth/login", post(login_handler::<R>))
        .with_state(service)
}

impl From<AuthServiceError> for ApiError {
    fn from(value: AuthServiceError) -> Self {
        match value {
            AuthServiceError::MissingCredentials => {
                ApiError::BadRequest("Email and password are required.".to_string())
            }
            AuthServiceError::EmailTaken => {
                ApiError::Conflict("Email already registered.".to_string())
            }
            AuthServiceError::InvalidCredentials => ApiError::Unauthorized,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

fn credentials(
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<(String, String), ApiError> {
    match payload {
        Ok(Json(payload)) => Ok(payload.into_parts()),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

/// Runs password hashing off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, AuthServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::Internal(format!("auth task failed: {err}")))?
        .map_err(ApiError::from)
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<AuthService<R>>>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: CredentialRepository + 'static,
{
    let (email, password) = credentials(payload)?;
    blocking(move || service.register(&email, &password)).await?;

    let body = json!({ "message": "User registered successfully!" });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub(crate) async fn login_handler<R>(
    State(service): State<Arc<AuthService<R>>>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: CredentialRepository + 'static,
{
    let (email, password) = credentials(payload)?;
    let session = blocking(move || service.login(&email, &password)).await?;

    Ok(Json(session).into_response())
}
