//! Emotion detection with backend and face-crop fallbacks.

#[cfg(feature = "opencv")]
mod haar;
mod orchestrator;
mod providers;
mod remote;

#[cfg(feature = "opencv")]
pub use haar::HaarCascadeDetector;
pub use orchestrator::{DetectionReport, EmotionOrchestrator, FallbackTier};
pub use providers::{EmotionBackend, FaceRegionDetector};
pub use remote::RemoteEmotionBackend;
