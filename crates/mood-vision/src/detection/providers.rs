//! Collaborator traits for the orchestrator.
//!
//! Emotion backends and face-region detectors are injected as trait
//! objects so the fallback logic runs without a network or model files.

use async_trait::async_trait;
use image::GrayImage;
use mood_models::{EmotionVector, FaceRegion};
use std::path::Path;

use crate::error::VisionResult;

/// Facial-expression classifier.
///
/// Implementations must return a best-effort vector even when no face is
/// localized in the image.
#[async_trait]
pub trait EmotionBackend: Send + Sync {
    /// Score the image stored at `image`.
    async fn analyze(&self, image: &Path) -> VisionResult<EmotionVector>;

    /// Backend name, reported as the detection method on acceptance.
    fn name(&self) -> &str;
}

/// Face-region localizer used by the crop fallback.
#[async_trait]
pub trait FaceRegionDetector: Send + Sync {
    /// Find candidate face boxes in an equalized grayscale image.
    async fn find_regions(&self, image: &GrayImage) -> VisionResult<Vec<FaceRegion>>;

    /// Detector name for logging.
    fn name(&self) -> &str;
}
