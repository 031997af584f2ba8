//! Counting test doubles for the two service traits.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use captionist::{
    Concept, ConceptSet, DetectionError, GenerationConfig, GenerationError, ImagePayload,
    LabelDetector, Prompt, TextGenerator,
};

/// A minimal JPEG header, enough for format sniffing.
pub fn jpeg_base64() -> String {
    BASE64_STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46])
}

pub enum DetectorBehavior {
    Labels(Vec<(&'static str, f32)>),
    Fail(&'static str),
    Hang,
}

pub struct MockDetector {
    behavior: DetectorBehavior,
    pub calls: Arc<AtomicUsize>,
}

impl MockDetector {
    pub fn new(behavior: DetectorBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn labels(labels: Vec<(&'static str, f32)>) -> Self {
        Self::new(DetectorBehavior::Labels(labels))
    }
}

#[async_trait]
impl LabelDetector for MockDetector {
    async fn detect(
        &self,
        _image: &ImagePayload,
        max_labels: usize,
        min_confidence: f32,
    ) -> Result<ConceptSet, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            DetectorBehavior::Labels(labels) => Ok(labels
                .iter()
                .filter(|(_, confidence)| *confidence >= min_confidence)
                .take(max_labels)
                .map(|(name, confidence)| Concept::new(*name, *confidence))
                .collect()),
            DetectorBehavior::Fail(cause) => Err(DetectionError::ServiceFailure(cause.to_string())),
            DetectorBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ConceptSet::default())
            }
        }
    }
}

pub enum GeneratorBehavior {
    Text(&'static str),
    Fail(&'static str),
    Empty,
    Hang,
}

pub struct MockGenerator {
    behavior: GeneratorBehavior,
    pub calls: Arc<AtomicUsize>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerator {
    pub fn new(behavior: GeneratorBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn text(text: &'static str) -> Self {
        Self::new(GeneratorBehavior::Text(text))
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(
        &self,
        prompt: &Prompt,
        _config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());
        match &self.behavior {
            GeneratorBehavior::Text(text) => Ok(text.to_string()),
            GeneratorBehavior::Fail(cause) => {
                Err(GenerationError::ServiceFailure(cause.to_string()))
            }
            GeneratorBehavior::Empty => Err(GenerationError::EmptyOutput),
            GeneratorBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }
}

pub fn scenario_a_detector() -> MockDetector {
    MockDetector::labels(vec![("Cat", 95.0), ("Animal", 90.0), ("Pet", 82.0)])
}
