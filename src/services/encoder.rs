use base64::{engine::general_purpose, Engine};

use crate::services::analysis::AnalysisError;

/// Transport-ready form of a user-supplied image: mime type plus base64
/// payload, ready to inline into the upstream request.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

/// Encode raw image bytes for transport. The browser-declared content type
/// wins when it is an `image/*` type (no assumed subset); otherwise the
/// magic bytes are sniffed. Fails when the input is empty or the type
/// cannot be determined either way.
pub fn encode_image(
    bytes: &[u8],
    declared_mime: Option<&str>,
) -> Result<EncodedImage, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::Encoding("image file is empty".to_string()));
    }

    let mime_type = match declared_mime.map(str::trim).filter(|m| m.starts_with("image/")) {
        Some(declared) => declared.to_string(),
        None => sniff_mime_type(bytes)
            .ok_or_else(|| {
                AnalysisError::Encoding(
                    "could not determine the image type from the file contents".to_string(),
                )
            })?
            .to_string(),
    };

    let data = general_purpose::STANDARD.encode(bytes);
    log::debug!(
        "📊 Encoded image: {} bytes in, {} base64 chars out, mime {}",
        bytes.len(),
        data.len(),
        mime_type
    );

    Ok(EncodedImage { mime_type, data })
}

/// Identify common image formats by signature. Only used as a fallback
/// when the upload carried no usable content type.
fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        Some("image/tiff")
    } else {
        None
    }
}
