//! Error types for emotion detection.

use thiserror::Error;

/// Result type for detection operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur during emotion detection.
///
/// Only `InvalidImage` ever escapes `EmotionOrchestrator::detect`; every
/// other variant is absorbed into a fallback tier.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Backend {backend} failed: {message}")]
    BackendFailed { backend: String, message: String },

    #[error("Invalid backend name: {0:?}")]
    InvalidBackendName(String),

    #[error("Backend {backend} returned incomplete scores ({present}/7 classes)")]
    IncompleteVector { backend: String, present: usize },

    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Emotion service error: {0}")]
    Service(#[from] mood_ml_client::MlError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Create an invalid image error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage(message.into())
    }

    /// Create a backend failure error.
    pub fn backend_failed(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendFailed {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
