//! Detection attempts and results.
//!
//! A `DetectionResult` is what callers receive from one image analysis.
//! `DetectionAttempt` records a single backend invocation and never
//! outlives the analysis that created it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::emotion::EmotionVector;
use crate::mood::ResolvedMood;

/// Image variant handed to a backend or face detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ImageVariant {
    #[serde(rename = "identity")]
    Identity,
    /// Rotated 90 degrees clockwise.
    #[serde(rename = "rotated_90")]
    Rotated90,
    #[serde(rename = "rotated_180")]
    Rotated180,
    /// Rotated 270 degrees clockwise (90 counter-clockwise).
    #[serde(rename = "rotated_270")]
    Rotated270,
    /// Padded face-region crop.
    #[serde(rename = "cropped")]
    Cropped,
}

impl ImageVariant {
    /// Orientations searched for a face region, in order.
    pub const SEARCH_ORDER: &'static [ImageVariant] = &[
        ImageVariant::Identity,
        ImageVariant::Rotated90,
        ImageVariant::Rotated270,
        ImageVariant::Rotated180,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageVariant::Identity => "identity",
            ImageVariant::Rotated90 => "rotated_90",
            ImageVariant::Rotated180 => "rotated_180",
            ImageVariant::Rotated270 => "rotated_270",
            ImageVariant::Cropped => "cropped",
        }
    }
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One backend invocation inside a detection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionAttempt {
    pub backend_id: String,
    pub image_variant: ImageVariant,
    pub vector: Option<EmotionVector>,
    pub succeeded: bool,
}

impl DetectionAttempt {
    pub fn succeeded(backend_id: impl Into<String>, variant: ImageVariant, vector: EmotionVector) -> Self {
        Self {
            backend_id: backend_id.into(),
            image_variant: variant,
            vector: Some(vector),
            succeeded: true,
        }
    }

    pub fn failed(backend_id: impl Into<String>, variant: ImageVariant) -> Self {
        Self {
            backend_id: backend_id.into(),
            image_variant: variant,
            vector: None,
            succeeded: false,
        }
    }
}

/// Strategy that produced an accepted detection result.
///
/// Serialized as a plain string tag: the backend name, `crop`,
/// `detect-only` or `none`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DetectionMethod {
    /// Accepted straight from the named backend.
    Backend(String),
    /// Accepted from a padded face crop.
    Crop,
    /// A face region was found but the crop did not improve confidence.
    DetectOnly,
    /// No backend reading and no face region.
    None,
}

impl DetectionMethod {
    /// Tags of the non-backend strategies. A backend with one of these
    /// names would be indistinguishable from the strategy once serialized.
    pub const RESERVED_TAGS: &'static [&'static str] = &["crop", "detect-only", "none"];

    /// Whether `name` may be used as a backend name.
    pub fn is_valid_backend_name(name: &str) -> bool {
        !name.is_empty() && !Self::RESERVED_TAGS.contains(&name)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DetectionMethod::Backend(name) => name,
            DetectionMethod::Crop => "crop",
            DetectionMethod::DetectOnly => "detect-only",
            DetectionMethod::None => "none",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<DetectionMethod> for String {
    fn from(method: DetectionMethod) -> Self {
        match method {
            DetectionMethod::Backend(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl From<String> for DetectionMethod {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "crop" => DetectionMethod::Crop,
            "detect-only" => DetectionMethod::DetectOnly,
            "none" => DetectionMethod::None,
            _ => DetectionMethod::Backend(tag),
        }
    }
}

/// Final outcome of analysing one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionResult {
    pub mood: ResolvedMood,
    pub face_detected: bool,
    #[schemars(with = "String")]
    pub method: DetectionMethod,
    /// Raw scores behind `mood`, empty when no backend produced any.
    pub all_emotions: EmotionVector,
}

impl DetectionResult {
    pub fn new(
        mood: ResolvedMood,
        face_detected: bool,
        method: DetectionMethod,
        all_emotions: EmotionVector,
    ) -> Self {
        Self {
            mood,
            face_detected,
            method,
            all_emotions,
        }
    }
}
