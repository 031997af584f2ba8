use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;

use crate::detector::LabelDetector;
use crate::error::PipelineError;
use crate::generator::TextGenerator;
use crate::messages::{DescribeRequest, DescribeResponse, ErrorResponse};
use crate::pipeline::Pipeline;

/// Cross-origin headers attached to every response for the browser client.
pub const CORS_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "OPTIONS,POST"),
];

/// Largest decoded image accepted, matching the label detector's limit.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Largest request body accepted: a base64 encoded [`MAX_IMAGE_BYTES`] image
/// plus room for the JSON envelope.
pub const MAX_BODY_BYTES: usize = MAX_IMAGE_BYTES.div_ceil(3) * 4 + 1024;

/// Shared state of the HTTP boundary.
pub struct AppState<D: LabelDetector, G: TextGenerator> {
    pipeline: Arc<Pipeline<D, G>>,
    shutdown: CancellationToken,
}

impl<D: LabelDetector, G: TextGenerator> Clone for AppState<D, G> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<D: LabelDetector, G: TextGenerator> AppState<D, G> {
    /// Requests in flight are cancelled once `shutdown` fires.
    pub fn new(pipeline: Arc<Pipeline<D, G>>, shutdown: CancellationToken) -> Self {
        Self { pipeline, shutdown }
    }
}

/// Builds the router serving the describe endpoint.
pub fn router<D, G>(state: AppState<D, G>) -> Router
where
    D: LabelDetector + 'static,
    G: TextGenerator + 'static,
{
    Router::new()
        .route("/", get(|| async { "captionist is running" }))
        .route("/describe", post(post_describe::<D, G>))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn post_describe<D, G>(
    State(state): State<AppState<D, G>>,
    payload: Result<Json<DescribeRequest>, JsonRejection>,
) -> Response
where
    D: LabelDetector + 'static,
    G: TextGenerator + 'static,
{
    let image = match payload {
        Ok(Json(DescribeRequest { image: Some(image) })) if !image.trim().is_empty() => image,
        Ok(_) => return error_response(&PipelineError::MissingImage),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            log::warn!("Rejected oversized request body");
            return error_response(&PipelineError::PayloadTooLarge);
        }
        Err(rejection) => {
            log::debug!("Rejected request body: {}", rejection.body_text());
            return error_response(&PipelineError::MissingImage);
        }
    };

    let cancel = state.shutdown.child_token();
    match state.pipeline.run_with_cancel(&image, &cancel).await {
        Ok(result) => (
            StatusCode::OK,
            CORS_HEADERS,
            Json(DescribeResponse {
                labels: result.labels,
                description: result.description,
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &PipelineError) -> Response {
    let status = e.status();
    if status.is_server_error() {
        log::error!("Request failed: {}", e);
    }
    (
        status,
        CORS_HEADERS,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}
