use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::DetectionError;
use crate::model::{Concept, ConceptSet, ImagePayload};

/// Vision capability that labels the contents of an image.
///
/// Implementations must return at most `max_labels` concepts, each with a
/// confidence of at least `min_confidence`, ranked by descending confidence.
/// An empty set is a valid answer.
#[async_trait]
pub trait LabelDetector: Send + Sync {
    async fn detect(
        &self,
        image: &ImagePayload,
        max_labels: usize,
        min_confidence: f32,
    ) -> Result<ConceptSet, DetectionError>;
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsRequest<'a> {
    image: ImageBlob<'a>,
    max_labels: usize,
    min_confidence: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ImageBlob<'a> {
    bytes: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsResponse {
    #[serde(default)]
    labels: Vec<DetectedLabel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectedLabel {
    name: String,
    confidence: f32,
}

impl DetectLabelsResponse {
    /// Converts the upstream labels, rejecting confidences outside `[0, 100]`.
    fn into_concepts(self) -> Result<Vec<Concept>, DetectionError> {
        self.labels
            .into_iter()
            .map(|l| {
                if (0.0..=100.0).contains(&l.confidence) {
                    Ok(Concept::new(l.name, l.confidence))
                } else {
                    Err(DetectionError::ServiceFailure(format!(
                        "malformed response: confidence {} of label {:?} is outside [0, 100]",
                        l.confidence, l.name
                    )))
                }
            })
            .collect()
    }
}

/// [`LabelDetector`] speaking the DetectLabels JSON protocol over HTTP.
pub struct HttpLabelDetector {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLabelDetector {
    /// Creates a detector posting to `endpoint`, bounding each call by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DetectionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectionError::ServiceFailure(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Creates a detector reusing an existing connection pool.
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl LabelDetector for HttpLabelDetector {
    async fn detect(
        &self,
        image: &ImagePayload,
        max_labels: usize,
        min_confidence: f32,
    ) -> Result<ConceptSet, DetectionError> {
        let encoded = BASE64_STANDARD.encode(&image.bytes);
        let request = DetectLabelsRequest {
            image: ImageBlob { bytes: &encoded },
            max_labels,
            min_confidence,
        };

        log::debug!(
            "Detecting labels in {} bytes of {}",
            image.bytes.len(),
            image.content_type()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DetectionError::ServiceFailure(describe_reqwest_error(&e)))?;

        let body: DetectLabelsResponse = response
            .json()
            .await
            .map_err(|e| DetectionError::ServiceFailure(format!("malformed response: {e}")))?;

        let concepts = body.into_concepts()?;
        Ok(select_concepts(concepts, max_labels, min_confidence))
    }
}

/// Drops concepts below `min_confidence` and keeps the first `max_labels`,
/// preserving the upstream ranking.
pub(crate) fn select_concepts(
    concepts: impl IntoIterator<Item = Concept>,
    max_labels: usize,
    min_confidence: f32,
) -> ConceptSet {
    concepts
        .into_iter()
        .filter(|c| c.confidence >= min_confidence)
        .take(max_labels)
        .collect()
}

pub(crate) fn describe_reqwest_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if let Some(status) = e.status() {
        format!("upstream responded with status {status}")
    } else if e.is_connect() {
        "could not connect to the service".to_string()
    } else {
        "request failed".to_string()
    }
}
