use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::decoder;
use crate::detector::LabelDetector;
use crate::error::{DetectionError, GenerationError, PipelineError};
use crate::generator::TextGenerator;
use crate::model::{AnalysisResult, GenerationConfig};
use crate::prompt;

/// Description returned when no concept clears the confidence threshold.
pub const NO_LABELS_DESCRIPTION: &str =
    "Could not detect any labels with high confidence. Please try another image.";

/// Stages a single request moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Decoded,
    Detected,
    PromptBuilt,
    Generated,
    Assembled,
    Failed,
}

impl PipelineState {
    /// Returns the state as a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Received => "received",
            PipelineState::Decoded => "decoded",
            PipelineState::Detected => "detected",
            PipelineState::PromptBuilt => "prompt_built",
            PipelineState::Generated => "generated",
            PipelineState::Assembled => "assembled",
            PipelineState::Failed => "failed",
        }
    }
}

/// Static configuration of the pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Maximum number of concepts requested from the detector.
    pub max_labels: usize,
    /// Minimum confidence, in `[0, 100]`, for a concept to be kept.
    pub min_confidence: f32,
    /// Upper bound on each outbound call.
    pub call_timeout: Duration,
    pub generation: GenerationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_labels: 10,
            min_confidence: 80.0,
            call_timeout: Duration::from_secs(30),
            generation: GenerationConfig::default(),
        }
    }
}

/// Two-stage describe pipeline: label detection followed by text generation.
///
/// The pipeline holds only read-only handles, so one instance can serve any
/// number of concurrent requests. Every stage fails fast; no partial result is
/// ever returned.
pub struct Pipeline<D: LabelDetector, G: TextGenerator> {
    detector: D,
    generator: G,
    config: PipelineConfig,
}

impl<D: LabelDetector, G: TextGenerator> Pipeline<D, G> {
    /// Creates a new pipeline over the given service clients.
    ///
    /// `max_labels` is raised to 1 when configured as 0. `min_confidence` is
    /// clamped to `[0, 100]`; a non-finite value falls back to the default.
    pub fn new(detector: D, generator: G, mut config: PipelineConfig) -> Self {
        config.max_labels = config.max_labels.max(1);
        config.min_confidence = if config.min_confidence.is_finite() {
            config.min_confidence.clamp(0.0, 100.0)
        } else {
            let fallback = PipelineConfig::default().min_confidence;
            log::warn!(
                "Ignoring minimum confidence {}, using {}",
                config.min_confidence,
                fallback
            );
            fallback
        };
        Self {
            detector,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline on a base64 encoded image.
    pub async fn run(&self, encoded_image: &str) -> Result<AnalysisResult, PipelineError> {
        self.run_with_cancel(encoded_image, &CancellationToken::new()).await
    }

    /// Runs the pipeline, aborting the in-flight call once `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        encoded_image: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, PipelineError> {
        let result = self.execute(encoded_image, cancel).await;
        match &result {
            Ok(analysis) => log::info!("Described image with {} labels", analysis.labels.len()),
            Err(e) => {
                transition(PipelineState::Failed);
                log::warn!("Pipeline failed ({}): {}", e.kind().as_str(), e);
            }
        }
        result
    }

    async fn execute(
        &self,
        encoded_image: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, PipelineError> {
        transition(PipelineState::Received);
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let image = decoder::decode(encoded_image)?;
        transition(PipelineState::Decoded);

        let concepts = self
            .bounded(
                cancel,
                self.detector
                    .detect(&image, self.config.max_labels, self.config.min_confidence),
            )
            .await
            .ok_or(PipelineError::Cancelled)?
            .unwrap_or_else(|| {
                Err(DetectionError::ServiceFailure(
                    "request timed out".to_string(),
                ))
            })?;
        transition(PipelineState::Detected);
        log::debug!("Detector returned {} labels", concepts.len());

        if concepts.is_empty() {
            log::debug!("No labels above {} confidence", self.config.min_confidence);
            transition(PipelineState::Assembled);
            return Ok(AnalysisResult {
                labels: Vec::new(),
                description: NO_LABELS_DESCRIPTION.to_string(),
            });
        }

        let prompt = prompt::build(&concepts);
        transition(PipelineState::PromptBuilt);

        let description = self
            .bounded(
                cancel,
                self.generator.generate(&prompt, &self.config.generation),
            )
            .await
            .ok_or(PipelineError::Cancelled)?
            .unwrap_or_else(|| {
                Err(GenerationError::ServiceFailure(
                    "request timed out".to_string(),
                ))
            })?;
        transition(PipelineState::Generated);

        let result = AnalysisResult {
            labels: concepts.names(),
            description,
        };
        transition(PipelineState::Assembled);
        Ok(result)
    }

    /// Races `call` against the timeout and the cancellation token.
    ///
    /// Returns `None` when cancelled and `Some(None)` when the timeout elapsed.
    async fn bounded<T>(
        &self,
        cancel: &CancellationToken,
        call: impl Future<Output = T>,
    ) -> Option<Option<T>> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            outcome = tokio::time::timeout(self.config.call_timeout, call) => Some(outcome.ok()),
        }
    }
}

fn transition(state: PipelineState) {
    log::debug!("Pipeline state: {}", state.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Concept, ConceptSet, ImagePayload, Prompt};
    use async_trait::async_trait;

    struct FixedDetector(Vec<Concept>);

    #[async_trait]
    impl LabelDetector for FixedDetector {
        async fn detect(
            &self,
            _image: &ImagePayload,
            max_labels: usize,
            _min_confidence: f32,
        ) -> Result<ConceptSet, DetectionError> {
            Ok(self.0.iter().take(max_labels).cloned().collect())
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(
            &self,
            prompt: &Prompt,
            _config: &GenerationConfig,
        ) -> Result<String, GenerationError> {
            Ok(prompt.as_str().to_string())
        }
    }

    // "/9j/4A==" decodes to FF D8 FF E0
    const JPEG_B64: &str = "/9j/4A==";

    #[test]
    fn test_state_names() {
        assert_eq!(PipelineState::PromptBuilt.as_str(), "prompt_built");
        assert_eq!(PipelineState::Failed.as_str(), "failed");
    }

    #[test]
    fn test_zero_max_labels_is_raised() {
        let config = PipelineConfig {
            max_labels: 0,
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(FixedDetector(vec![]), EchoGenerator, config);
        assert_eq!(pipeline.config().max_labels, 1);
    }

    #[test]
    fn test_min_confidence_is_sanitized() {
        for (configured, expected) in [
            (f32::NAN, 80.0),
            (f32::INFINITY, 80.0),
            (150.0, 100.0),
            (-3.0, 0.0),
            (55.5, 55.5),
        ] {
            let config = PipelineConfig {
                min_confidence: configured,
                ..PipelineConfig::default()
            };
            let pipeline = Pipeline::new(FixedDetector(vec![]), EchoGenerator, config);
            assert_eq!(pipeline.config().min_confidence, expected, "{configured}");
        }
    }

    #[tokio::test]
    async fn test_prompt_reaches_generator() {
        let pipeline = Pipeline::new(
            FixedDetector(vec![Concept::new("Cat", 95.0), Concept::new("Pet", 82.0)]),
            EchoGenerator,
            PipelineConfig::default(),
        );
        let result = pipeline.run(JPEG_B64).await.unwrap();
        assert_eq!(result.labels, vec!["Cat", "Pet"]);
        assert!(result.description.contains("Cat, Pet"));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token() {
        let pipeline = Pipeline::new(
            FixedDetector(vec![]),
            EchoGenerator,
            PipelineConfig::default(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            pipeline.run_with_cancel(JPEG_B64, &cancel).await,
            Err(PipelineError::Cancelled)
        ));
    }
}
