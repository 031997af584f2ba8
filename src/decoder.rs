use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};

use crate::error::{DecodeError, PipelineError};
use crate::model::{ImageFormat, ImagePayload};

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Decodes a base64 image field into an [`ImagePayload`].
///
/// An empty (or whitespace-only) field is reported as a missing image rather
/// than a decode failure.
pub fn decode(encoded: &str) -> Result<ImagePayload, PipelineError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(PipelineError::MissingImage);
    }

    let bytes = BASE64_STANDARD
        .decode(encoded)
        .map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;
    if bytes.is_empty() {
        return Err(PipelineError::MissingImage);
    }

    let format = sniff_format(&bytes).ok_or(DecodeError::UnsupportedFormat)?;
    Ok(ImagePayload { bytes, format })
}

fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(JPEG_MAGIC) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(PNG_MAGIC) {
        Some(ImageFormat::Png)
    } else {
        None
    }
}
