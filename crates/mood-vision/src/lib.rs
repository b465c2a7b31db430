//! Facial emotion resolution and detection orchestration.
//!
//! This crate provides:
//! - The emotion resolver cascade turning raw scores into a mood
//! - The detection orchestrator with backend, rotation and face-crop fallbacks
//! - Remote classifier and (with `opencv`) Haar cascade collaborators
//! - Image decoding, orientation and crop helpers

pub mod config;
pub mod detection;
pub mod error;
pub mod imaging;
pub mod metrics;
pub mod resolver;
pub mod source;

pub use config::DetectionConfig;
pub use detection::{
    DetectionReport, EmotionBackend, EmotionOrchestrator, FaceRegionDetector, FallbackTier,
    RemoteEmotionBackend,
};
#[cfg(feature = "opencv")]
pub use detection::HaarCascadeDetector;
pub use error::{VisionError, VisionResult};
pub use resolver::{classify, resolve, Resolution};
pub use source::SourceImage;
