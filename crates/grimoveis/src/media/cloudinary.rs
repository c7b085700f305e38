//! Signed uploads to the Cloudinary image API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::store::{MediaError, MediaStore, UploadFile, ALLOWED_FORMATS, TRANSFORMATION};
use crate::clock::Clock;
use crate::config::MediaConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Deserialize)]
struct UploadReply {
    secure_url: Option<String>,
    error: Option<ReplyError>,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    message: String,
}

pub struct CloudinaryMediaStore {
    client: Client,
    endpoint: String,
    api_key: String,
    api_secret: SecretString,
    folder: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CloudinaryMediaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryMediaStore")
            .field("endpoint", &self.endpoint)
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}

impl CloudinaryMediaStore {
    pub fn new(config: &MediaConfig, clock: Arc<dyn Clock>) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| MediaError::Client(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{API_BASE}/{}/image/upload", config.cloud_name),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
            clock,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Signed parameters, sorted by name.
    fn upload_params(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        vec![
            ("allowed_formats", ALLOWED_FORMATS.join(",")),
            ("folder", self.folder.clone()),
            ("timestamp", timestamp.to_string()),
            ("transformation", TRANSFORMATION.to_string()),
        ]
    }

    fn sign(&self, params: &[(&'static str, String)]) -> String {
        signature(params, self.api_secret.expose_secret())
    }
}

/// SHA-1 over `k1=v1&k2=v2...` followed by the API secret, hex encoded.
fn signature(params: &[(&'static str, String)], secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    sha1_smol::Sha1::from(format!("{joined}{secret}"))
        .digest()
        .to_string()
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(&self, file: UploadFile) -> Result<String, MediaError> {
        file.ensure_allowed()?;

        let params = self.upload_params(self.clock.now().timestamp());
        let signature = self.sign(&params);

        let mut part = Part::bytes(file.bytes)
            .file_name(file.file_name.unwrap_or_else(|| "upload".to_string()));
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|err| MediaError::Multipart(err.to_string()))?;
        }

        let mut form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }
        let form = form.part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| MediaError::Transfer(err.to_string()))?;

        let status = response.status();
        let reply: UploadReply = response
            .json()
            .await
            .map_err(|err| MediaError::Transfer(err.to_string()))?;

        match (status.is_success(), reply) {
            (
                true,
                UploadReply {
                    secure_url: Some(url),
                    ..
                },
            ) => {
                debug!(url = %url, "image stored");
                Ok(url)
            }
            (_, reply) => {
                let message = reply
                    .error
                    .map(|error| error.message)
                    .unwrap_or_else(|| format!("status {status}"));
                warn!(status = %status, message = %message, "media host refused upload");
                Err(MediaError::Rejected(message))
            }
        }
    }
}
