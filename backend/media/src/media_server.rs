//! Serves stored menu images over HTTP.

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::{path::PathBuf, sync::Arc};
use tokio::fs;
use tracing::{debug, warn};

use crate::mime_detect::{detect_mime_type, is_inline_safe};

#[derive(Clone)]
pub struct MediaServerState {
    pub media_dir: Arc<PathBuf>,
}

/// Build the image server router.
///
/// Mount at `/uploads/images`:
///   GET /uploads/images/:filename
pub fn media_router(media_dir: PathBuf) -> Router {
    let state = MediaServerState {
        media_dir: Arc::new(media_dir),
    };
    Router::new()
        .route("/:filename", get(serve_media))
        .with_state(state)
}

async fn serve_media(
    Path(filename): Path<String>,
    State(state): State<MediaServerState>,
) -> Response {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        warn!(filename = %filename, "Rejected suspicious media path");
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    }

    let path = state.media_dir.join(&filename);
    debug!(path = %path.display(), "Serving media file");

    match fs::read(&path).await {
        Ok(bytes) => {
            let mime = detect_mime_type(&path);
            let disposition = if is_inline_safe(mime) { "inline" } else { "attachment" };
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(mime)),
                    (header::CONTENT_DISPOSITION, HeaderValue::from_static(disposition)),
                    (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400")),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Media file not found").into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read media file");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read media").into_response()
        }
    }
}
