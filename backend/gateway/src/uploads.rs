//! Multipart parsing for menu photo uploads.

use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};
use tracing::debug;

use menuscan_core::MenuImage;
use menuscan_media::{ImageStore, UploadError, UploadPolicy};

use crate::response::ApiError;

/// Form field carrying the photographs.
pub const IMAGES_FIELD: &str = "images";
pub const RESTAURANT_FIELD: &str = "restaurant_name";

#[derive(Debug)]
pub struct AcceptedImage {
    pub original_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub images: Vec<AcceptedImage>,
    pub restaurant_name: Option<String>,
}

impl UploadForm {
    /// The provided restaurant name, exactly as sent, unless it is empty.
    pub fn restaurant_name(&self) -> Option<&str> {
        self.restaurant_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Fail with "No image files were uploaded" when the form had none.
    pub fn require_images(&self) -> Result<(), ApiError> {
        if self.images.is_empty() {
            return Err(UploadError::NoFiles.into());
        }
        Ok(())
    }

    /// Persist every image under the upload directory, then hand them over
    /// as vision inputs.
    pub async fn store(self, images: &ImageStore) -> Result<Vec<MenuImage>, ApiError> {
        let mut out = Vec::with_capacity(self.images.len());
        for image in self.images {
            let stored = images.save(&image.original_name, &image.data).await?;
            debug!(original = %image.original_name, stored = %stored.file_name, "Upload stored");
            out.push(MenuImage::new(image.mime_type, image.data));
        }
        Ok(out)
    }
}

/// Read the whole multipart body, applying the upload policy to each image
/// as it streams in.
pub async fn read_upload(
    mut multipart: Multipart,
    policy: &UploadPolicy,
) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGES_FIELD => {
                let index = form.images.len();
                let original_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                policy.check_file(index, &original_name, &mime_type, 0)?;

                let mut buf = BytesMut::new();
                while let Some(chunk) = field.chunk().await? {
                    buf.extend_from_slice(&chunk);
                    policy.check_file(index, &original_name, &mime_type, buf.len())?;
                }
                debug!(
                    index,
                    file = %original_name,
                    mime = %mime_type,
                    bytes = buf.len(),
                    "Image received"
                );
                form.images.push(AcceptedImage {
                    original_name,
                    mime_type,
                    data: buf.freeze(),
                });
            }
            RESTAURANT_FIELD => {
                form.restaurant_name = Some(field.text().await?);
            }
            other => debug!(field = %other, "Ignoring unexpected form field"),
        }
    }

    Ok(form)
}
