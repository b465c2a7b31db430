//! Emotion backend backed by the remote classification service.

use async_trait::async_trait;
use mood_ml_client::{EmotionClient, ServiceRegion};
use mood_models::{DetectionMethod, EmotionVector};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::providers::EmotionBackend;
use crate::error::{VisionError, VisionResult};

/// Sends images to the classification service with a fixed face detector.
///
/// Two instances sharing one client give the primary and secondary
/// backends (e.g. `retinaface` and `opencv`).
pub struct RemoteEmotionBackend {
    client: Arc<EmotionClient>,
    detector_backend: String,
}

impl RemoteEmotionBackend {
    /// Fails for an empty name or one of the reserved method tags
    /// (`crop`, `detect-only`, `none`).
    pub fn new(client: Arc<EmotionClient>, detector_backend: impl Into<String>) -> VisionResult<Self> {
        let detector_backend = detector_backend.into();
        if !DetectionMethod::is_valid_backend_name(&detector_backend) {
            return Err(VisionError::InvalidBackendName(detector_backend));
        }
        Ok(Self {
            client,
            detector_backend,
        })
    }
}

#[async_trait]
impl EmotionBackend for RemoteEmotionBackend {
    async fn analyze(&self, image: &Path) -> VisionResult<EmotionVector> {
        let bytes = tokio::fs::read(image).await?;
        let analysis = self.client.analyze_image(&bytes, &self.detector_backend).await?;

        debug!(
            backend = %self.detector_backend,
            dominant = ?analysis.dominant_emotion,
            region = ?analysis.region.as_ref().and_then(ServiceRegion::to_face_region),
            "Emotion service returned {} scores",
            analysis.emotion.len()
        );

        Ok(analysis.emotion_vector())
    }

    fn name(&self) -> &str {
        &self.detector_backend
    }
}
