//! Emotion detection over local image files.
//!
//! Wires the classification service client, the Haar cascade detector and
//! the orchestrator together from environment configuration.

pub mod config;
pub mod logging;

use mood_ml_client::EmotionClient;
use mood_models::{DetectionAttempt, DetectionResult};
use mood_vision::{
    EmotionBackend, EmotionOrchestrator, FaceRegionDetector, RemoteEmotionBackend,
    SourceImage, VisionResult,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub use config::AppConfig;

/// Build an orchestrator from application config.
///
/// The secondary backend and the face-crop tier are only wired in when
/// configured. A configured cascade that fails to load is an error.
pub fn build_orchestrator(config: &AppConfig) -> VisionResult<EmotionOrchestrator> {
    let client = Arc::new(EmotionClient::new(config.service.clone())?);

    let primary: Arc<dyn EmotionBackend> = Arc::new(RemoteEmotionBackend::new(
        Arc::clone(&client),
        config.primary_detector.clone(),
    )?);
    let mut orchestrator =
        EmotionOrchestrator::new(primary).with_config(config.detection.clone());

    if let Some(detector) = &config.secondary_detector {
        orchestrator = orchestrator.with_secondary(Arc::new(RemoteEmotionBackend::new(
            Arc::clone(&client),
            detector.clone(),
        )?));
    }

    if let Some(path) = &config.cascade_path {
        orchestrator = orchestrator.with_face_detector(face_detector(path)?);
    }

    info!(
        tiers = ?orchestrator.tiers(),
        service = %config.service.base_url,
        "Emotion orchestrator ready"
    );
    Ok(orchestrator)
}

#[cfg(feature = "opencv")]
fn face_detector(cascade_path: &Path) -> VisionResult<Arc<dyn FaceRegionDetector>> {
    Ok(Arc::new(mood_vision::HaarCascadeDetector::new(cascade_path)?))
}

#[cfg(not(feature = "opencv"))]
fn face_detector(cascade_path: &Path) -> VisionResult<Arc<dyn FaceRegionDetector>> {
    Err(mood_vision::VisionError::internal(format!(
        "cascade {} configured but Haar detection requires the `opencv` feature",
        cascade_path.display()
    )))
}

/// Totals for one [`run_batch`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub emitted: usize,
    pub failures: usize,
    /// Images never reported because the batch was cancelled
    pub skipped: usize,
}

impl BatchSummary {
    pub fn interrupted(&self) -> bool {
        self.skipped > 0
    }
}

/// Analyse `images` in order, handing each output to `emit`.
///
/// Once `cancel` reads `true` no further image is started, and the image in
/// flight is dropped rather than reported with its fallback result.
pub async fn run_batch<E>(
    orchestrator: &EmotionOrchestrator,
    images: &[PathBuf],
    with_attempts: bool,
    cancel: watch::Receiver<bool>,
    mut emit: impl FnMut(DetectionOutput) -> Result<(), E>,
) -> Result<BatchSummary, E> {
    let mut summary = BatchSummary::default();

    for (index, path) in images.iter().enumerate() {
        if *cancel.borrow() {
            summary.skipped = images.len() - index;
            warn!(skipped = summary.skipped, "Batch cancelled");
            break;
        }

        let source = match SourceImage::open(path) {
            Ok(source) => source,
            Err(e) => {
                error!(image = %path.display(), "Skipping image: {}", e);
                summary.failures += 1;
                continue;
            }
        };

        let report = match orchestrator.detect_report(&source, Some(cancel.clone())).await {
            Ok(report) => report,
            Err(e) => {
                error!(image = %path.display(), "Detection failed: {}", e);
                summary.failures += 1;
                continue;
            }
        };

        if *cancel.borrow() {
            summary.skipped = images.len() - index;
            warn!(skipped = summary.skipped, "Batch cancelled");
            break;
        }

        let mut output = DetectionOutput::new(path.display().to_string(), report.result);
        if with_attempts {
            output = output.with_attempts(report.attempts);
        }
        emit(output)?;
        summary.emitted += 1;
    }

    Ok(summary)
}

/// JSON line printed per analysed image.
#[derive(Debug, Serialize)]
pub struct DetectionOutput {
    pub image: String,
    #[serde(flatten)]
    pub result: DetectionResult,
    /// Supportive chat reply for the detected mood
    pub reply: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<DetectionAttempt>>,
}

impl DetectionOutput {
    pub fn new(image: impl Into<String>, result: DetectionResult) -> Self {
        let reply = result.mood.label.reply();
        Self {
            image: image.into(),
            result,
            reply,
            attempts: None,
        }
    }

    pub fn with_attempts(mut self, attempts: Vec<DetectionAttempt>) -> Self {
        self.attempts = Some(attempts);
        self
    }
}
