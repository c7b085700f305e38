use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{middleware, Extension, Json, Router};
use serde_json::json;
use tracing::info;

use super::store::{MediaError, MediaStore, UploadFile, MAX_GALLERY_FILES};
use crate::auth::{require_bearer, AuthenticatedUser, TokenAuthority};
use crate::error::ApiError;

const SINGLE_FIELD: &str = "image";
const GALLERY_FIELD: &str = "images";

/// `POST /upload` and `POST /upload/gallery`, both behind the bearer gate.
pub fn upload_router(
    store: Arc<dyn MediaStore>,
    tokens: TokenAuthority,
    max_request_bytes: usize,
) -> Router {
    Router::new()
        .route("/upload", post(single_handler))
        .route("/upload/gallery", post(gallery_handler))
        .route_layer(middleware::from_fn_with_state(tokens, require_bearer))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .with_state(store)
}

impl From<MediaError> for ApiError {
    fn from(value: MediaError) -> Self {
        ApiError::BadRequest(value.to_string())
    }
}

/// Reads every file part named `field`, refusing other file fields and more
/// than `limit` files. Plain text parts are skipped.
async fn collect_files(
    multipart: Result<Multipart, MultipartRejection>,
    field: &str,
    limit: usize,
) -> Result<Vec<UploadFile>, MediaError> {
    let Ok(mut multipart) = multipart else {
        return Err(MediaError::NoFile);
    };

    let mut files = Vec::new();
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|err| MediaError::Multipart(err.body_text()))?
    {
        if part.file_name().is_none() {
            continue;
        }
        let name = part.name().unwrap_or_default().to_string();
        if name != field {
            return Err(MediaError::UnexpectedField(name));
        }
        if files.len() == limit {
            return Err(MediaError::TooManyFiles { limit });
        }

        let file_name = part.file_name().map(str::to_string);
        let content_type = part.content_type().map(str::to_string);
        let bytes = part
            .bytes()
            .await
            .map_err(|err| MediaError::Multipart(err.body_text()))?;
        files.push(UploadFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(MediaError::NoFile);
    }
    Ok(files)
}

/// Checks the whole batch before anything is sent, then uploads in order.
async fn store_all(
    store: &dyn MediaStore,
    files: Vec<UploadFile>,
) -> Result<Vec<String>, MediaError> {
    for file in &files {
        file.ensure_allowed()?;
    }

    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        urls.push(store.upload(file).await?);
    }
    Ok(urls)
}

pub(crate) async fn single_handler(
    State(store): State<Arc<dyn MediaStore>>,
    Extension(user): Extension<AuthenticatedUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let files = collect_files(multipart, SINGLE_FIELD, 1).await?;
    let mut urls = store_all(store.as_ref(), files).await?;
    let file_path = urls.pop().ok_or(MediaError::NoFile)?;

    info!(user_id = %user.id, "image uploaded");
    let body = json!({ "message": "File uploaded successfully!", "filePath": file_path });
    Ok(Json(body).into_response())
}

pub(crate) async fn gallery_handler(
    State(store): State<Arc<dyn MediaStore>>,
    Extension(user): Extension<AuthenticatedUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let files = collect_files(multipart, GALLERY_FIELD, MAX_GALLERY_FILES).await?;
    let urls = store_all(store.as_ref(), files).await?;

    info!(user_id = %user.id, count = urls.len(), "gallery uploaded");
    let body = json!({
        "message": format!("{} files uploaded successfully!", urls.len()),
        "filePaths": urls,
    });
    Ok(Json(body).into_response())
}
