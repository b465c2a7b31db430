//! Configuration for the detection orchestrator.
//!
//! The thresholds are empirically chosen and kept tunable. The defaults
//! reproduce the production service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for [`crate::EmotionOrchestrator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum confidence to accept a backend reading outright (default: 0.5)
    pub accept_threshold: f64,

    /// Minimum confidence to accept a reading from a face crop (default: 0.25)
    pub crop_accept_threshold: f64,

    /// Neutral confidence reported when no backend produced scores (default: 0.4)
    pub fallback_confidence: f64,

    /// Crop padding as a fraction of the face box's longer side (default: 0.2)
    pub crop_padding_ratio: f64,

    /// Upper bound on a single backend call in milliseconds (default: 30000)
    pub backend_timeout_ms: u64,

    /// Directory for temporary crop files (default: system temp dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.5,
            crop_accept_threshold: 0.25,
            fallback_confidence: 0.4,
            crop_padding_ratio: 0.2,
            backend_timeout_ms: 30_000,
            scratch_dir: None,
        }
    }
}

impl DetectionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            accept_threshold: env_parse("MOOD_ACCEPT_THRESHOLD")
                .unwrap_or(defaults.accept_threshold),
            crop_accept_threshold: env_parse("MOOD_CROP_ACCEPT_THRESHOLD")
                .unwrap_or(defaults.crop_accept_threshold),
            fallback_confidence: env_parse("MOOD_FALLBACK_CONFIDENCE")
                .unwrap_or(defaults.fallback_confidence),
            crop_padding_ratio: env_parse("MOOD_CROP_PADDING_RATIO")
                .unwrap_or(defaults.crop_padding_ratio),
            backend_timeout_ms: env_parse("MOOD_BACKEND_TIMEOUT_MS")
                .unwrap_or(defaults.backend_timeout_ms),
            scratch_dir: std::env::var("MOOD_SCRATCH_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Backend call timeout.
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    /// Directory temporary crops are written to.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout_ms = timeout.as_millis() as u64;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectionConfig::default();
        assert_eq!(config.accept_threshold, 0.5);
        assert_eq!(config.crop_accept_threshold, 0.25);
        assert_eq!(config.fallback_confidence, 0.4);
        assert_eq!(config.crop_padding_ratio, 0.2);
        assert_eq!(config.backend_timeout(), Duration::from_secs(30));
        assert_eq!(config.scratch_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_builders() {
        let config = DetectionConfig::default()
            .with_scratch_dir("/tmp/mood-test")
            .with_backend_timeout(Duration::from_millis(250));
        assert_eq!(config.scratch_dir(), PathBuf::from("/tmp/mood-test"));
        assert_eq!(config.backend_timeout_ms, 250);
    }

    #[test]
    fn test_serde_round_trip_keeps_thresholds() {
        let json = serde_json::to_string(&DetectionConfig::default()).unwrap();
        assert!(!json.contains("scratch_dir"));
        let back: DetectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.crop_accept_threshold, 0.25);
        assert!(back.scratch_dir.is_none());
    }
}
