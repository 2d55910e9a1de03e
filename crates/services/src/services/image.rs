//! Data-URL image payload handling.

use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

static MIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/([a-zA-Z0-9]+);").unwrap()
});

/// An image decoded from a `data:image/...;base64,` payload.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// File extension inferred from the declared MIME type.
    pub extension: String,
    /// Decoded image bytes.
    pub bytes: Vec<u8>,
    /// The raw base64 body, kept for forwarding to the AI API.
    pub base64: String,
}

impl DecodedImage {
    /// Content type derived from the inferred extension, mirroring the
    /// upload path naming.
    pub fn content_type(&self) -> String {
        format!("image/{}", self.extension)
    }
}

/// Decode a `data:image/<type>;base64,<data>` payload. Returns `None` for
/// anything malformed: wrong prefix, no payload separator, or an
/// undecodable body. Payloads with an unrecognizable image subtype fall
/// back to a `jpeg` extension.
pub fn decode_data_url(payload: &str) -> Option<DecodedImage> {
    if !payload.starts_with("data:image/") {
        return None;
    }

    let (_, body) = payload.split_once(',')?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(body)
        .ok()?;

    let extension = MIME_RE
        .captures(payload)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "jpeg".to_string());

    Some(DecodedImage {
        extension,
        bytes,
        base64: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png_payload() {
        let image = decode_data_url("data:image/png;base64,AAAA").unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(image.content_type(), "image/png");
        assert_eq!(image.bytes, vec![0, 0, 0]);
        assert_eq!(image.base64, "AAAA");
    }

    #[test]
    fn test_decode_webp_payload() {
        let image = decode_data_url("data:image/webp;base64,AAAA").unwrap();
        assert_eq!(image.extension, "webp");
    }

    #[test]
    fn test_missing_prefix_is_rejected() {
        assert!(decode_data_url("AAAA").is_none());
        assert!(decode_data_url("data:text/plain;base64,AAAA").is_none());
    }

    #[test]
    fn test_missing_separator_is_rejected() {
        assert!(decode_data_url("data:image/png;base64").is_none());
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        assert!(decode_data_url("data:image/png;base64,!!not-base64!!").is_none());
    }

    #[test]
    fn test_unknown_subtype_falls_back_to_jpeg() {
        let image = decode_data_url("data:image/;base64,AAAA").unwrap();
        assert_eq!(image.extension, "jpeg");
        assert_eq!(image.content_type(), "image/jpeg");
    }
}
