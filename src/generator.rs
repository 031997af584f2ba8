use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::detector::describe_reqwest_error;
use crate::error::GenerationError;
use crate::model::{GenerationConfig, Prompt};

/// Model every generation request is sent to.
pub const TARGET_MODEL_ID: &str = "amazon.titan-text-express-v1";

/// Generative-text capability.
///
/// Implementations return the trimmed text of the first candidate.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &Prompt,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeRequest<'a> {
    input_text: &'a str,
    text_generation_config: TextGenerationConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextGenerationConfig<'a> {
    max_token_count: u32,
    temperature: f32,
    top_p: f32,
    stop_sequences: &'a [String],
}

impl<'a> From<&'a GenerationConfig> for TextGenerationConfig<'a> {
    fn from(config: &'a GenerationConfig) -> Self {
        Self {
            max_token_count: config.max_token_count,
            temperature: config.temperature,
            top_p: config.top_p,
            stop_sequences: &config.stop_sequences,
        }
    }
}

#[derive(Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    results: Vec<InvokeResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvokeResult {
    #[serde(default)]
    output_text: String,
}

impl InvokeResponse {
    fn into_description(self) -> Result<String, GenerationError> {
        let first = self.results.into_iter().next().ok_or_else(|| {
            GenerationError::ServiceFailure("malformed response: no results".to_string())
        })?;
        let text = first.output_text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyOutput);
        }
        Ok(text.to_string())
    }
}

/// [`TextGenerator`] invoking a hosted model over HTTP.
pub struct HttpTextGenerator {
    client: reqwest::Client,
    invoke_url: String,
}

impl HttpTextGenerator {
    /// Creates a generator against `base_url`, bounding each call by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::ServiceFailure(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        let invoke_url = format!(
            "{}/model/{}/invoke",
            base_url.trim_end_matches('/'),
            TARGET_MODEL_ID
        );
        Self { client, invoke_url }
    }

    pub fn invoke_url(&self) -> &str {
        &self.invoke_url
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(
        &self,
        prompt: &Prompt,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        let request = InvokeRequest {
            input_text: prompt.as_str(),
            text_generation_config: config.into(),
        };

        log::debug!(
            "Invoking {} with a {} byte prompt",
            TARGET_MODEL_ID,
            prompt.as_str().len()
        );

        let response = self
            .client
            .post(&self.invoke_url)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GenerationError::ServiceFailure(describe_reqwest_error(&e)))?;

        let body: InvokeResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ServiceFailure(format!("malformed response: {e}")))?;

        body.into_description()
    }
}
