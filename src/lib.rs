//! Describe images by chaining a label detector and a text generator.
//!
//! A request carries a base64 encoded image. The [`Pipeline`] decodes it, asks
//! a [`LabelDetector`] for the visual concepts it contains, turns those into a
//! prompt and lets a [`TextGenerator`] write a one-sentence description. The
//! [`server`] module exposes the pipeline over HTTP.

pub mod decoder;
pub mod detector;
pub mod error;
pub mod generator;
pub mod messages;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod server;

pub use detector::{HttpLabelDetector, LabelDetector};
pub use error::{DecodeError, DetectionError, ErrorKind, GenerationError, PipelineError};
pub use generator::{HttpTextGenerator, TARGET_MODEL_ID, TextGenerator};
pub use model::{AnalysisResult, Concept, ConceptSet, GenerationConfig, ImagePayload, Prompt};
pub use pipeline::{NO_LABELS_DESCRIPTION, Pipeline, PipelineConfig, PipelineState};
