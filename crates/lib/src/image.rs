//! # Image Precheck
//!
//! Validates the inbound base64 payload before any external call is made and
//! builds the `data:` URI handed to the vision model.

use crate::errors::MetadataError;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// The MIME type assumed when the magic bytes are not recognized.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// A validated image, ready to be sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub mime_type: &'static str,
    pub base64: String,
}

impl PreparedImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Checks presence, size and encoding of `image_base64`.
///
/// A leading `data:<mime>;base64,` header is stripped. The size limit applies
/// to the encoded payload. Only the first few bytes are decoded, which is
/// enough to sniff the format.
pub fn prepare_image(image_base64: &str, max_len: usize) -> Result<PreparedImage, MetadataError> {
    let trimmed = image_base64.trim();
    let payload = strip_data_uri_header(trimmed);
    if payload.is_empty() {
        return Err(MetadataError::MissingImage);
    }

    if payload.len() > max_len {
        return Err(MetadataError::ImageTooLarge {
            size: payload.len(),
            limit: max_len,
        });
    }

    let head = head_bytes(payload)?;
    Ok(PreparedImage {
        mime_type: sniff_mime_type(&head),
        base64: payload.to_string(),
    })
}

fn strip_data_uri_header(text: &str) -> &str {
    if !text.starts_with("data:") {
        return text;
    }
    match text.find(";base64,") {
        Some(index) => &text[index + ";base64,".len()..],
        None => text,
    }
}

/// Decodes up to the first 16 base64 characters (12 bytes).
fn head_bytes(payload: &str) -> Result<Vec<u8>, MetadataError> {
    let prefix_len = payload.len().min(16);
    let prefix_len = prefix_len - prefix_len % 4;
    let bytes = payload.as_bytes();
    let prefix = if prefix_len == 0 {
        bytes
    } else {
        &bytes[..prefix_len]
    };
    STANDARD
        .decode(prefix)
        .map_err(|e| MetadataError::InvalidImage(e.to_string()))
}

/// Recognizes PNG, JPEG, GIF and WebP by their magic bytes.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        DEFAULT_MIME_TYPE
    }
}
