//! Upload handling for menu photographs: type allow-list, size ceilings,
//! collision-free storage names and the static file server for stored images.

pub mod media_server;
pub mod mime_detect;
pub mod upload;

pub use media_server::media_router;
pub use mime_detect::{ALLOWED_IMAGE_TYPES, detect_mime_type, is_allowed_image, is_inline_safe};
pub use upload::{ImageStore, StoredImage, UploadError, UploadPolicy, storage_name};
