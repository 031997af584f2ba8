use serde::Serialize;

/// Content types the decoder recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Returns the MIME type of the format.
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Decoded image bytes owned by a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    /// Raw image bytes, never empty.
    pub bytes: Vec<u8>,
    /// Format sniffed from the leading bytes.
    pub format: ImageFormat,
}

impl ImagePayload {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// A named visual label with a confidence score in `[0, 100]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Concept {
    pub name: String,
    pub confidence: f32,
}

impl Concept {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// Concepts detected in one image, in the order the detector ranked them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConceptSet(Vec<Concept>);

impl ConceptSet {
    pub fn new(concepts: Vec<Concept>) -> Self {
        Self(concepts)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Concept> {
        self.0.iter()
    }

    /// Returns the concept names, dropping confidences.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|c| c.name.clone()).collect()
    }
}

impl FromIterator<Concept> for ConceptSet {
    fn from_iter<I: IntoIterator<Item = Concept>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Instruction string submitted to the text generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameters for text generation, fixed for the lifetime of the service.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Upper bound on generated tokens.
    pub max_token_count: u32,
    pub temperature: f32,
    /// Nucleus-sampling cutoff.
    pub top_p: f32,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_token_count: 512,
            temperature: 0.7,
            top_p: 0.9,
            stop_sequences: Vec::new(),
        }
    }
}

/// Final value returned to the caller of the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub labels: Vec<String>,
    pub description: String,
}
