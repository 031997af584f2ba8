use axum::http::StatusCode;

/// Message returned to callers when the request carries no usable image.
pub const NO_IMAGE_MESSAGE: &str = "No image provided in the request body.";

/// Errors produced while turning the transport payload into image bytes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload is not valid standard base64.
    #[error("Invalid image encoding: {0}")]
    InvalidEncoding(String),
    /// The decoded bytes are neither JPEG nor PNG.
    #[error("Unsupported image format, expected JPEG or PNG")]
    UnsupportedFormat,
}

/// Errors raised by a [`crate::LabelDetector`].
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Label detection failed: {0}")]
    ServiceFailure(String),
}

/// Errors raised by a [`crate::TextGenerator`].
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Text generation failed: {0}")]
    ServiceFailure(String),
    /// The service answered successfully but the first candidate held no text.
    #[error("Text generation returned an empty description")]
    EmptyOutput,
}

/// Coarse classification of a pipeline failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Decode,
    Detection,
    Generation,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Decode => "decode",
            ErrorKind::Detection => "detection",
            ErrorKind::Generation => "generation",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Terminal error of a single pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The request did not carry an image at all.
    #[error("No image provided in the request body.")]
    MissingImage,
    /// The request body is larger than the server accepts.
    #[error("Request body too large, images are limited to 5 MB.")]
    PayloadTooLarge,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("Request cancelled.")]
    Cancelled,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MissingImage | PipelineError::PayloadTooLarge => ErrorKind::Input,
            PipelineError::Decode(_) => ErrorKind::Decode,
            PipelineError::Detection(_) => ErrorKind::Detection,
            PipelineError::Generation(_) => ErrorKind::Generation,
            PipelineError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// HTTP status used by the invocation boundary for this error.
    ///
    /// Decode failures are client errors, same as a missing image.
    pub fn status(&self) -> StatusCode {
        if let PipelineError::PayloadTooLarge = self {
            return StatusCode::PAYLOAD_TOO_LARGE;
        }
        match self.kind() {
            ErrorKind::Input | ErrorKind::Decode => StatusCode::BAD_REQUEST,
            ErrorKind::Detection | ErrorKind::Generation => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PipelineError::MissingImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PipelineError::from(DecodeError::UnsupportedFormat).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PipelineError::from(DetectionError::ServiceFailure("timed out".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PipelineError::from(GenerationError::EmptyOutput).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(PipelineError::Cancelled.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            PipelineError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_missing_image_message() {
        assert_eq!(PipelineError::MissingImage.to_string(), NO_IMAGE_MESSAGE);
        assert_eq!(PipelineError::MissingImage.kind().as_str(), "input");
    }

    #[test]
    fn test_transparent_causes() {
        let err = PipelineError::from(DetectionError::ServiceFailure("connection refused".into()));
        assert_eq!(err.to_string(), "Label detection failed: connection refused");
        assert_eq!(err.kind(), ErrorKind::Detection);
    }
}
