//! Detection orchestrator.
//!
//! Runs an ordered list of fallback tiers over one image and stops at the
//! first tier that produces an accepted result:
//!
//! 1. **Primary backend** on the unmodified image.
//! 2. **Secondary backend**, only if the primary produced no usable vector.
//! 3. **Face crop**: search four orientations for a face region, crop the
//!    largest one with padding and re-run the primary backend on the crop.
//!
//! When no tier accepts, the result is built from what the tiers learned
//! (the best pre-crop reading and whether a face was found).

use mood_models::{
    DetectionAttempt, DetectionMethod, DetectionResult, EmotionVector, FaceRegion, ImageVariant,
    ResolvedMood,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::providers::{EmotionBackend, FaceRegionDetector};
use crate::config::DetectionConfig;
use crate::error::{VisionError, VisionResult};
use crate::imaging;
use crate::metrics::{self, AttemptOutcome};
use crate::resolver;
use crate::source::SourceImage;

/// One step of the fallback order.
#[derive(Clone)]
pub enum FallbackTier {
    /// Classify the unmodified image with a backend.
    Backend(Arc<dyn EmotionBackend>),
    /// Localize a face and classify a padded crop of it.
    FaceCrop(Arc<dyn FaceRegionDetector>),
}

impl FallbackTier {
    pub fn name(&self) -> &str {
        match self {
            FallbackTier::Backend(backend) => backend.name(),
            FallbackTier::FaceCrop(_) => "face_crop",
        }
    }
}

impl std::fmt::Debug for FallbackTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackTier::Backend(backend) => write!(f, "Backend({})", backend.name()),
            FallbackTier::FaceCrop(detector) => write!(f, "FaceCrop({})", detector.name()),
        }
    }
}

/// Detection result plus the backend attempts that led to it.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    pub result: DetectionResult,
    pub attempts: Vec<DetectionAttempt>,
}

/// Best reading from the unmodified image.
struct Reading {
    mood: ResolvedMood,
    vector: EmotionVector,
}

/// Per-call state threaded through the tiers.
struct DetectionContext {
    reading: Option<Reading>,
    face_found: bool,
    attempts: Vec<DetectionAttempt>,
    cancel: Option<watch::Receiver<bool>>,
}

impl DetectionContext {
    fn new(cancel: Option<watch::Receiver<bool>>) -> Self {
        Self {
            reading: None,
            face_found: false,
            attempts: Vec::new(),
            cancel,
        }
    }
}

/// Orchestrates backends and face-region fallbacks for one image at a time.
///
/// Holds only shared collaborators and an immutable config, so a single
/// instance can serve concurrent calls.
pub struct EmotionOrchestrator {
    primary: Arc<dyn EmotionBackend>,
    secondary: Option<Arc<dyn EmotionBackend>>,
    face_detector: Option<Arc<dyn FaceRegionDetector>>,
    config: DetectionConfig,
}

impl EmotionOrchestrator {
    /// Create an orchestrator with only a primary backend.
    pub fn new(primary: Arc<dyn EmotionBackend>) -> Self {
        Self {
            primary,
            secondary: None,
            face_detector: None,
            config: DetectionConfig::default(),
        }
    }

    /// Backend tried when the primary produces no usable vector.
    pub fn with_secondary(mut self, secondary: Arc<dyn EmotionBackend>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Detector enabling the face-crop fallback.
    pub fn with_face_detector(mut self, detector: Arc<dyn FaceRegionDetector>) -> Self {
        self.face_detector = Some(detector);
        self
    }

    pub fn with_config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Fallback tiers in the order they run.
    pub fn tiers(&self) -> Vec<FallbackTier> {
        let mut tiers = vec![FallbackTier::Backend(Arc::clone(&self.primary))];
        if let Some(secondary) = &self.secondary {
            tiers.push(FallbackTier::Backend(Arc::clone(secondary)));
        }
        if let Some(detector) = &self.face_detector {
            tiers.push(FallbackTier::FaceCrop(Arc::clone(detector)));
        }
        tiers
    }

    /// Analyze an image.
    ///
    /// Fails only when the image itself is unusable. Backend and detector
    /// failures degrade to the next tier.
    pub async fn detect(&self, source: &SourceImage) -> VisionResult<DetectionResult> {
        Ok(self.run(source, None).await?.result)
    }

    /// Analyze an image, abandoning in-flight backend calls once `cancel`
    /// turns `true`. A cancelled call counts as a failed backend.
    pub async fn detect_with_cancel(
        &self,
        source: &SourceImage,
        cancel: watch::Receiver<bool>,
    ) -> VisionResult<DetectionResult> {
        Ok(self.run(source, Some(cancel)).await?.result)
    }

    /// Analyze an image and keep the attempt log.
    pub async fn detect_report(
        &self,
        source: &SourceImage,
        cancel: Option<watch::Receiver<bool>>,
    ) -> VisionResult<DetectionReport> {
        self.run(source, cancel).await
    }

    async fn run(
        &self,
        source: &SourceImage,
        cancel: Option<watch::Receiver<bool>>,
    ) -> VisionResult<DetectionReport> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(VisionError::invalid_image(format!(
                "{} has no pixels",
                source.path().display()
            )));
        }

        let mut ctx = DetectionContext::new(cancel);
        let mut accepted = None;
        for tier in self.tiers() {
            debug!(tier = %tier.name(), "Running detection tier");
            if let Some(result) = self.run_tier(&tier, source, &mut ctx).await {
                accepted = Some(result);
                break;
            }
        }

        let DetectionContext {
            reading,
            face_found,
            attempts,
            ..
        } = ctx;
        let result = match accepted {
            Some(result) => result,
            None => self.finish(reading, face_found),
        };

        info!(
            method = %result.method,
            label = %result.mood.label,
            confidence = result.mood.confidence,
            face_detected = result.face_detected,
            attempts = attempts.len(),
            "Emotion detection complete"
        );
        metrics::record_detection(&result);

        Ok(DetectionReport { result, attempts })
    }

    async fn run_tier(
        &self,
        tier: &FallbackTier,
        source: &SourceImage,
        ctx: &mut DetectionContext,
    ) -> Option<DetectionResult> {
        match tier {
            FallbackTier::Backend(backend) => self.backend_tier(backend.as_ref(), source, ctx).await,
            FallbackTier::FaceCrop(detector) => {
                self.face_crop_tier(detector.as_ref(), source, ctx).await
            }
        }
    }

    /// Classify the unmodified image. Skipped once an earlier backend
    /// produced a reading, accepted or not.
    async fn backend_tier(
        &self,
        backend: &dyn EmotionBackend,
        source: &SourceImage,
        ctx: &mut DetectionContext,
    ) -> Option<DetectionResult> {
        if ctx.reading.is_some() {
            return None;
        }

        let vector = self
            .attempt(backend, source.path(), ImageVariant::Identity, ctx)
            .await?;
        let resolution = resolver::classify(&vector);
        let mood = resolution.mood;

        debug!(
            backend = %backend.name(),
            rule = %resolution.rule,
            label = %mood.label,
            confidence = mood.confidence,
            "Resolved backend reading"
        );

        ctx.reading = Some(Reading {
            mood,
            vector: vector.clone(),
        });

        if mood.meets(self.config.accept_threshold) {
            return Some(DetectionResult::new(
                mood,
                true,
                DetectionMethod::Backend(backend.name().to_string()),
                vector,
            ));
        }

        info!(
            backend = %backend.name(),
            confidence = mood.confidence,
            threshold = self.config.accept_threshold,
            "Backend reading below acceptance threshold"
        );
        None
    }

    /// Search orientations for a face and classify a padded crop of the
    /// largest region in the first orientation that has one.
    async fn face_crop_tier(
        &self,
        detector: &dyn FaceRegionDetector,
        source: &SourceImage,
        ctx: &mut DetectionContext,
    ) -> Option<DetectionResult> {
        // Nothing to improve on when both backends failed.
        if ctx.reading.is_none() {
            return None;
        }

        for &variant in ImageVariant::SEARCH_ORDER {
            let oriented = imaging::orient(source.image(), variant);
            let gray = imaging::normalized_gray(&oriented);

            let regions = match detector.find_regions(&gray).await {
                Ok(regions) => regions,
                Err(e) => {
                    warn!(
                        detector = %detector.name(),
                        variant = %variant,
                        "Face detection failed: {}", e
                    );
                    continue;
                }
            };

            let Some(face) = FaceRegion::largest(&regions) else {
                debug!(variant = %variant, "No face region");
                continue;
            };

            info!(
                variant = %variant,
                regions = regions.len(),
                x = face.x,
                y = face.y,
                width = face.width,
                height = face.height,
                "Face region found"
            );
            ctx.face_found = true;
            return self.crop_and_classify(&oriented, &face, ctx).await;
        }

        info!("No face region in any orientation");
        None
    }

    async fn crop_and_classify(
        &self,
        oriented: &image::DynamicImage,
        face: &FaceRegion,
        ctx: &mut DetectionContext,
    ) -> Option<DetectionResult> {
        let region = imaging::padded_crop_region(oriented, face, self.config.crop_padding_ratio);
        let crop = match imaging::write_crop(oriented, &region, &self.config.scratch_dir()) {
            Ok(crop) => crop,
            Err(e) => {
                warn!("Failed to write face crop: {}", e);
                return None;
            }
        };

        let backend = self.primary.as_ref();
        let vector = self
            .attempt(backend, crop.path(), ImageVariant::Cropped, ctx)
            .await?;
        let mood = resolver::resolve(&vector);

        if mood.meets(self.config.crop_accept_threshold) {
            return Some(DetectionResult::new(mood, true, DetectionMethod::Crop, vector));
        }

        debug!(
            confidence = mood.confidence,
            threshold = self.config.crop_accept_threshold,
            "Crop reading below acceptance threshold"
        );
        None
    }

    /// Result when no tier accepted.
    fn finish(&self, reading: Option<Reading>, face_found: bool) -> DetectionResult {
        match reading {
            None => DetectionResult::new(
                ResolvedMood::neutral(self.config.fallback_confidence),
                false,
                DetectionMethod::None,
                EmotionVector::new(),
            ),
            Some(reading) if face_found => {
                DetectionResult::new(reading.mood, true, DetectionMethod::DetectOnly, reading.vector)
            }
            Some(reading) => {
                DetectionResult::new(reading.mood, false, DetectionMethod::None, reading.vector)
            }
        }
    }

    /// Invoke a backend and log the attempt. `None` means no usable vector.
    async fn attempt(
        &self,
        backend: &dyn EmotionBackend,
        image: &Path,
        variant: ImageVariant,
        ctx: &mut DetectionContext,
    ) -> Option<EmotionVector> {
        let name = backend.name();

        match self.guarded_analyze(backend, image, ctx.cancel.as_mut()).await {
            Ok(vector) => {
                metrics::record_backend_attempt(name, variant, AttemptOutcome::Ok);
                ctx.attempts
                    .push(DetectionAttempt::succeeded(name, variant, vector.clone()));
                Some(vector)
            }
            Err(e) => {
                let outcome = match &e {
                    VisionError::Timeout(_) => AttemptOutcome::Timeout,
                    VisionError::Cancelled => AttemptOutcome::Cancelled,
                    VisionError::IncompleteVector { .. } => AttemptOutcome::Incomplete,
                    _ => AttemptOutcome::Failed,
                };
                warn!(
                    backend = %name,
                    variant = %variant,
                    outcome = outcome.as_str(),
                    "Backend attempt failed: {}", e
                );
                metrics::record_backend_attempt(name, variant, outcome);
                ctx.attempts.push(DetectionAttempt::failed(name, variant));
                None
            }
        }
    }

    /// Backend call bounded by the configured timeout and the cancel signal.
    async fn guarded_analyze(
        &self,
        backend: &dyn EmotionBackend,
        image: &Path,
        cancel: Option<&mut watch::Receiver<bool>>,
    ) -> VisionResult<EmotionVector> {
        let call = tokio::time::timeout(self.config.backend_timeout(), backend.analyze(image));

        let outcome = match cancel {
            Some(cancel_rx) => {
                tokio::select! {
                    biased;
                    _ = cancelled(cancel_rx) => return Err(VisionError::Cancelled),
                    outcome = call => outcome,
                }
            }
            None => call.await,
        };

        let vector = outcome.map_err(|_| VisionError::Timeout(self.config.backend_timeout_ms))??;
        if !vector.is_complete() {
            return Err(VisionError::IncompleteVector {
                backend: backend.name().to_string(),
                present: vector.len(),
            });
        }

        Ok(vector)
    }
}

/// Resolves once the signal reads `true`. Never resolves if the sender is
/// dropped first.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow_and_update() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::GrayImage;
    use mood_models::{EmotionClass, MoodLabel};

    struct FixedBackend {
        name: &'static str,
        vector: EmotionVector,
    }

    #[async_trait]
    impl EmotionBackend for FixedBackend {
        async fn analyze(&self, _image: &Path) -> VisionResult<EmotionVector> {
            Ok(self.vector.clone())
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct NoFaces;

    #[async_trait]
    impl FaceRegionDetector for NoFaces {
        async fn find_regions(&self, _image: &GrayImage) -> VisionResult<Vec<FaceRegion>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    fn complete(scores: &[(EmotionClass, f64)]) -> EmotionVector {
        let base = EmotionClass::ALL
            .iter()
            .fold(EmotionVector::new(), |v, c| v.with(*c, 0.0));
        scores.iter().fold(base, |v, (c, s)| v.with(*c, *s))
    }

    #[test]
    fn test_tier_order() {
        let backend = |name| -> Arc<dyn EmotionBackend> {
            Arc::new(FixedBackend {
                name,
                vector: EmotionVector::new(),
            })
        };
        let orchestrator = EmotionOrchestrator::new(backend("retinaface"))
            .with_secondary(backend("opencv"))
            .with_face_detector(Arc::new(NoFaces));

        let names: Vec<String> = orchestrator
            .tiers()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["retinaface", "opencv", "face_crop"]);

        let bare = EmotionOrchestrator::new(backend("retinaface"));
        assert_eq!(bare.tiers().len(), 1);
    }

    #[test]
    fn test_finish_without_reading_is_neutral_fallback() {
        let orchestrator = EmotionOrchestrator::new(Arc::new(FixedBackend {
            name: "a",
            vector: EmotionVector::new(),
        }));

        let result = orchestrator.finish(None, true);
        assert_eq!(result.mood, ResolvedMood::new(MoodLabel::Neutral, 0.4));
        assert!(!result.face_detected);
        assert_eq!(result.method, DetectionMethod::None);
        assert!(result.all_emotions.is_empty());
    }

    #[test]
    fn test_finish_with_face_is_detect_only() {
        let orchestrator = EmotionOrchestrator::new(Arc::new(FixedBackend {
            name: "a",
            vector: EmotionVector::new(),
        }));
        let vector = complete(&[(EmotionClass::Neutral, 30.0)]);
        let reading = Reading {
            mood: resolver::resolve(&vector),
            vector: vector.clone(),
        };

        let result = orchestrator.finish(Some(reading), true);
        assert_eq!(result.method, DetectionMethod::DetectOnly);
        assert!(result.face_detected);
        assert_eq!(result.all_emotions, vector);
    }

    #[tokio::test]
    async fn test_cancelled_resolves_on_signal() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), cancelled(&mut rx))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_pends_after_sender_drop() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(20), cancelled(&mut rx)).await;
        assert!(waited.is_err());
    }
}
