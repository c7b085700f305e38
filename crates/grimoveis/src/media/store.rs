use async_trait::async_trait;
use mime::Mime;

/// Image formats the media host accepts, as file extensions.
pub const ALLOWED_FORMATS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Server-side resize applied by the media host: fit inside 1920x1080.
pub const TRANSFORMATION: &str = "c_limit,h_1080,w_1920";

pub const MAX_GALLERY_FILES: usize = 10;

/// One file part received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Image format of the part, from its declared content type or, failing
    /// that, from its file name.
    pub fn format(&self) -> Option<&'static str> {
        let declared = self
            .content_type
            .as_deref()
            .and_then(|raw| raw.parse::<Mime>().ok())
            .filter(|mime| *mime != mime::APPLICATION_OCTET_STREAM);

        let mime = match declared {
            Some(mime) => mime,
            None => mime_guess::from_path(self.file_name.as_deref()?).first()?,
        };

        if mime.type_() != mime::IMAGE {
            return None;
        }
        match mime.subtype().as_str() {
            "jpeg" | "jpg" | "pjpeg" => Some("jpg"),
            "png" => Some("png"),
            "webp" => Some("webp"),
            _ => None,
        }
    }

    /// Fails unless the part is one of [`ALLOWED_FORMATS`].
    pub fn ensure_allowed(&self) -> Result<&'static str, MediaError> {
        self.format()
            .filter(|format| ALLOWED_FORMATS.contains(format))
            .ok_or_else(|| MediaError::UnsupportedFormat(self.describe()))
    }

    fn describe(&self) -> String {
        self.file_name
            .clone()
            .or_else(|| self.content_type.clone())
            .unwrap_or_else(|| "unnamed file".to_string())
    }
}

/// External object store that keeps uploaded images and hands back public URLs.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores one image and returns its public URL.
    async fn upload(&self, file: UploadFile) -> Result<String, MediaError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("No file was uploaded.")]
    NoFile,
    #[error("Too many files: at most {limit} per request.")]
    TooManyFiles { limit: usize },
    #[error("Unexpected field: {0}")]
    UnexpectedField(String),
    #[error("File format not allowed: {0}")]
    UnsupportedFormat(String),
    #[error("Upload error: {0}")]
    Multipart(String),
    #[error("Upload failed: {0}")]
    Transfer(String),
    #[error("Media host rejected the upload: {0}")]
    Rejected(String),
    #[error("media client could not be built: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: Option<&str>, content_type: Option<&str>) -> UploadFile {
        UploadFile {
            file_name: name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[test]
    fn declared_content_type_wins() {
        assert_eq!(file(Some("foto.bin"), Some("image/png")).format(), Some("png"));
        assert_eq!(file(None, Some("image/jpeg")).format(), Some("jpg"));
    }

    #[test]
    fn file_name_is_used_when_type_is_missing_or_generic() {
        assert_eq!(file(Some("sala.webp"), None).format(), Some("webp"));
        assert_eq!(
            file(Some("fachada.JPEG"), Some("application/octet-stream")).format(),
            Some("jpg")
        );
    }

    #[test]
    fn non_images_and_other_formats_are_refused() {
        assert!(matches!(
            file(Some("planta.pdf"), Some("application/pdf")).ensure_allowed(),
            Err(MediaError::UnsupportedFormat(name)) if name == "planta.pdf"
        ));
        assert!(file(Some("animacao.gif"), None).ensure_allowed().is_err());
        assert!(file(None, None).ensure_allowed().is_err());
        assert_eq!(file(Some("quarto.png"), None).ensure_allowed().ok(), Some("png"));
    }
}
