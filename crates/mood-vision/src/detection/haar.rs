//! Haar cascade face-region detector (`opencv` feature).

use async_trait::async_trait;
use image::GrayImage;
use mood_models::FaceRegion;
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use super::providers::FaceRegionDetector;
use crate::error::{VisionError, VisionResult};

const SCALE_FACTOR: f64 = 1.3;
const MIN_NEIGHBORS: i32 = 5;

/// Frontal-face Haar cascade run on the blocking pool.
pub struct HaarCascadeDetector {
    classifier: Arc<Mutex<CascadeClassifier>>,
}

impl HaarCascadeDetector {
    /// Load a cascade XML file such as `haarcascade_frontalface_default.xml`.
    pub fn new(cascade_path: impl AsRef<Path>) -> VisionResult<Self> {
        let cascade_path = cascade_path.as_ref();
        if !cascade_path.exists() {
            return Err(VisionError::model_not_found(cascade_path.display().to_string()));
        }

        let path = cascade_path.to_string_lossy();
        let classifier = CascadeClassifier::new(&path).map_err(|e| {
            error!("Failed to load Haar cascade: {}", e);
            VisionError::model_not_found(format!("{}: {}", path, e))
        })?;

        if classifier.empty().map_err(opencv_error)? {
            return Err(VisionError::model_not_found(format!("{}: empty cascade", path)));
        }

        Ok(Self {
            classifier: Arc::new(Mutex::new(classifier)),
        })
    }
}

#[async_trait]
impl FaceRegionDetector for HaarCascadeDetector {
    async fn find_regions(&self, image: &GrayImage) -> VisionResult<Vec<FaceRegion>> {
        let classifier = Arc::clone(&self.classifier);
        let image = image.clone();

        tokio::task::spawn_blocking(move || detect(&classifier, &image))
            .await
            .map_err(|e| VisionError::internal(format!("face detection task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "haar"
    }
}

fn detect(classifier: &Mutex<CascadeClassifier>, image: &GrayImage) -> VisionResult<Vec<FaceRegion>> {
    if image.width() == 0 || image.height() == 0 {
        return Ok(Vec::new());
    }

    let flat = Mat::from_slice(image.as_raw()).map_err(opencv_error)?;
    let mat = flat
        .reshape(1, image.height() as i32)
        .and_then(|m| m.try_clone())
        .map_err(opencv_error)?;

    let mut faces = Vector::<Rect>::new();
    let mut classifier = classifier
        .lock()
        .map_err(|_| VisionError::internal("cascade classifier lock poisoned"))?;
    classifier
        .detect_multi_scale(
            &mat,
            &mut faces,
            SCALE_FACTOR,
            MIN_NEIGHBORS,
            0,
            Size::new(0, 0),
            Size::new(0, 0),
        )
        .map_err(opencv_error)?;

    let regions: Vec<FaceRegion> = faces
        .iter()
        .filter(|r| r.x >= 0 && r.y >= 0 && r.width > 0 && r.height > 0)
        .map(|r| FaceRegion::new(r.x as u32, r.y as u32, r.width as u32, r.height as u32))
        .collect();

    debug!("Haar cascade found {} face region(s)", regions.len());
    Ok(regions)
}

fn opencv_error(e: opencv::Error) -> VisionError {
    VisionError::detection_failed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cascade_is_rejected() {
        assert!(HaarCascadeDetector::new("/nonexistent/haarcascade.xml").is_err());
    }
}
