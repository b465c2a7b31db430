//! ML service request/response types.

use std::collections::HashMap;

use mood_models::{EmotionVector, FaceRegion};
use serde::{Deserialize, Serialize};

/// Request for emotion analysis of one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64-encoded image bytes
    pub image_base64: String,
    /// Face detector the service should use (`retinaface`, `opencv`, ...)
    pub detector_backend: String,
    /// Fail when no face is found (always false for this client)
    #[serde(default)]
    pub enforce_detection: bool,
    /// Analysis actions to run
    pub actions: Vec<String>,
}

impl AnalyzeRequest {
    /// Emotion-only request with face enforcement disabled.
    pub fn emotion(image_base64: String, detector_backend: impl Into<String>) -> Self {
        Self {
            image_base64,
            detector_backend: detector_backend.into(),
            enforce_detection: false,
            actions: vec!["emotion".to_string()],
        }
    }
}

/// Face region as reported by the service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServiceRegion {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl ServiceRegion {
    pub fn to_face_region(&self) -> Option<FaceRegion> {
        let x = u32::try_from(self.x.max(0)).ok()?;
        let y = u32::try_from(self.y.max(0)).ok()?;
        let w = u32::try_from(self.w).ok()?;
        let h = u32::try_from(self.h).ok()?;
        let region = FaceRegion::new(x, y, w, h);
        (!region.is_empty()).then_some(region)
    }
}

/// Analysis of a single face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceAnalysis {
    /// Raw per-class scores keyed by class name
    pub emotion: HashMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<ServiceRegion>,
}

impl FaceAnalysis {
    /// Scores as an [`EmotionVector`]. Unknown class names are dropped.
    pub fn emotion_vector(&self) -> EmotionVector {
        EmotionVector::from_scores(self.emotion.iter().map(|(k, v)| (k.as_str(), *v)))
    }
}

/// Analysis response: one face, or one entry per detected face.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Multiple(Vec<FaceAnalysis>),
    Single(FaceAnalysis),
}

impl AnalyzeResponse {
    /// The analysis of the first face.
    pub fn into_first(self) -> Option<FaceAnalysis> {
        match self {
            AnalyzeResponse::Single(face) => Some(face),
            AnalyzeResponse::Multiple(faces) => faces.into_iter().next(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mood_models::EmotionClass;

    #[test]
    fn test_request_disables_enforcement() {
        let request = AnalyzeRequest::emotion("abc".into(), "retinaface");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["enforce_detection"], false);
        assert_eq!(json["detector_backend"], "retinaface");
        assert_eq!(json["actions"], serde_json::json!(["emotion"]));
    }

    #[test]
    fn test_response_single_and_list() {
        let single: AnalyzeResponse = serde_json::from_str(
            r#"{"emotion": {"happy": 91.0, "sad": 1.0}, "dominant_emotion": "happy"}"#,
        )
        .unwrap();
        let face = single.into_first().unwrap();
        assert_eq!(face.emotion_vector().get(EmotionClass::Happy), 91.0);

        let list: AnalyzeResponse = serde_json::from_str(
            r#"[{"emotion": {"fear": 33.0}}, {"emotion": {"happy": 10.0}}]"#,
        )
        .unwrap();
        let face = list.into_first().unwrap();
        assert_eq!(face.emotion_vector().get(EmotionClass::Fear), 33.0);

        let empty: AnalyzeResponse = serde_json::from_str("[]").unwrap();
        assert!(empty.into_first().is_none());
    }

    #[test]
    fn test_region_conversion() {
        let region = ServiceRegion { x: -4, y: 10, w: 50, h: 60 };
        assert_eq!(region.to_face_region(), Some(FaceRegion::new(0, 10, 50, 60)));

        let degenerate = ServiceRegion { x: 0, y: 0, w: 0, h: 60 };
        assert_eq!(degenerate.to_face_region(), None);
    }
}
