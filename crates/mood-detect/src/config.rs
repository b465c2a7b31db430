//! Application configuration.

use mood_ml_client::EmotionClientConfig;
use mood_vision::DetectionConfig;
use std::path::PathBuf;

/// Default face detector for the primary backend.
pub const DEFAULT_PRIMARY_DETECTOR: &str = "retinaface";
/// Default face detector for the secondary backend.
pub const DEFAULT_SECONDARY_DETECTOR: &str = "opencv";

/// Configuration for the detection binaries.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Detector the primary backend asks the service to use
    pub primary_detector: String,
    /// Detector for the secondary backend; `None` disables it
    pub secondary_detector: Option<String>,
    /// Haar cascade XML for the face-crop fallback; `None` disables it
    pub cascade_path: Option<PathBuf>,
    /// Orchestrator thresholds and limits
    pub detection: DetectionConfig,
    /// Classification service connection
    pub service: EmotionClientConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            primary_detector: DEFAULT_PRIMARY_DETECTOR.to_string(),
            secondary_detector: Some(DEFAULT_SECONDARY_DETECTOR.to_string()),
            cascade_path: None,
            detection: DetectionConfig::default(),
            service: EmotionClientConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            primary_detector: std::env::var("MOOD_PRIMARY_DETECTOR")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_PRIMARY_DETECTOR.to_string()),
            secondary_detector: match std::env::var("MOOD_SECONDARY_DETECTOR") {
                Ok(s) if s.is_empty() => None,
                Ok(s) => Some(s),
                Err(_) => Some(DEFAULT_SECONDARY_DETECTOR.to_string()),
            },
            cascade_path: std::env::var("MOOD_CASCADE_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            detection: DetectionConfig::from_env(),
            service: EmotionClientConfig::from_env(),
        }
    }
}
