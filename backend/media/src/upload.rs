use std::path::{Path, PathBuf};

use bytes::Bytes;
use rand::Rng;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::mime_detect::{ALLOWED_IMAGE_TYPES, is_allowed_image};

/// Public URL prefix for stored images.
pub const IMAGES_URL_PREFIX: &str = "/uploads/images";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No image files were uploaded")]
    NoFiles,
    #[error("Only image files are allowed ({ALLOWED_IMAGE_TYPES})")]
    NotAnImage { filename: String },
    #[error("File '{filename}' exceeds the {limit} byte limit")]
    TooLarge { filename: String, limit: u64 },
    #[error("Too many files: at most {limit} images per upload")]
    TooManyFiles { limit: usize },
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Limits applied to each multipart upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_file_bytes: u64,
    pub max_files: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            max_files: 10,
        }
    }
}

impl UploadPolicy {
    /// Check one incoming file. `index` is its zero-based position among the
    /// images of the request.
    pub fn check_file(
        &self,
        index: usize,
        filename: &str,
        mime: &str,
        size: usize,
    ) -> Result<(), UploadError> {
        if index >= self.max_files {
            return Err(UploadError::TooManyFiles { limit: self.max_files });
        }
        if !is_allowed_image(filename, mime) {
            return Err(UploadError::NotAnImage { filename: filename.to_string() });
        }
        if size as u64 > self.max_file_bytes {
            return Err(UploadError::TooLarge {
                filename: filename.to_string(),
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }

    /// Total request body ceiling derived from the per-file limits, with
    /// headroom for multipart framing and text fields.
    pub fn body_limit(&self) -> usize {
        let files = self.max_file_bytes.saturating_mul(self.max_files as u64);
        usize::try_from(files.saturating_add(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

/// `<unix-millis>-<random below 1e9><.ext>`, keeping the original extension.
pub fn storage_name(original: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let nonce: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{millis}-{nonce}{ext}")
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub file_name: String,
    pub path: PathBuf,
    pub url: String,
}

/// Image files on local disk, under `<upload root>/images`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(upload_root: impl AsRef<Path>) -> Self {
        Self {
            dir: upload_root.as_ref().join("images"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Write an accepted upload under a fresh storage name.
    pub async fn save(&self, original_name: &str, data: &Bytes) -> Result<StoredImage, UploadError> {
        self.ensure_dir().await?;
        let file_name = storage_name(original_name);
        let path = self.dir.join(&file_name);
        fs::write(&path, data).await?;
        debug!(original = %original_name, stored = %file_name, bytes = data.len(), "Stored upload");
        Ok(StoredImage {
            url: format!("{IMAGES_URL_PREFIX}/{file_name}"),
            file_name,
            path,
        })
    }
}
