//! Image uploads forwarded to an external media host.

pub mod cloudinary;
pub mod router;
pub mod store;

pub use cloudinary::CloudinaryMediaStore;
pub use router::upload_router;
pub use store::{
    MediaError, MediaStore, UploadFile, ALLOWED_FORMATS, MAX_GALLERY_FILES, TRANSFORMATION,
};
