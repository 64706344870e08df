//! MIME type detection and the upload allow-list.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Human-readable list used in rejection messages.
pub const ALLOWED_IMAGE_TYPES: &str = "JPEG, JPG, PNG, WEBP, HEIC";

static ALLOWED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)jpeg|jpg|png|webp|heic").unwrap());

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "webp"         => "image/webp",
        "heic"         => "image/heic",
        "gif"          => "image/gif",
        _              => "application/octet-stream",
    }
}

/// An upload is accepted only when both the file extension and the declared
/// MIME type name an allowed image format.
pub fn is_allowed_image(filename: &str, mime: &str) -> bool {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    ALLOWED_PATTERN.is_match(ext) && ALLOWED_PATTERN.is_match(mime)
}

/// Whether a stored file is safe to serve inline.
pub fn is_inline_safe(mime: &str) -> bool {
    matches!(mime, "image/jpeg" | "image/png" | "image/webp" | "image/gif")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_jpeg() {
        assert_eq!(detect_mime_type(&PathBuf::from("photo.JPG")), "image/jpeg");
        assert_eq!(detect_mime_type(&PathBuf::from("menu.heic")), "image/heic");
    }

    #[test]
    fn unknown_extension_fallback() {
        assert_eq!(detect_mime_type(&PathBuf::from("file.xyz")), "application/octet-stream");
    }

    #[test]
    fn allow_list_needs_extension_and_mime() {
        assert!(is_allowed_image("menu.jpg", "image/jpeg"));
        assert!(is_allowed_image("MENU.PNG", "image/png"));
        assert!(is_allowed_image("page.heic", "image/heic"));
        assert!(!is_allowed_image("menu.gif", "image/gif"));
        assert!(!is_allowed_image("menu.jpg", "application/pdf"));
        assert!(!is_allowed_image("menu.pdf", "image/jpeg"));
        assert!(!is_allowed_image("menu", "image/jpeg"));
    }
}
