//! Detection metrics.
//!
//! Recorded through the `metrics` facade; the hosting binary decides
//! whether a recorder is installed.

use metrics::{counter, histogram};
use mood_models::{DetectionResult, ImageVariant};

/// Metric names as constants for consistency.
pub mod names {
    pub const BACKEND_ATTEMPTS_TOTAL: &str = "mood_backend_attempts_total";
    pub const DETECTIONS_TOTAL: &str = "mood_detections_total";
    pub const DETECTION_CONFIDENCE: &str = "mood_detection_confidence";
}

/// Outcome label for a backend attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Ok,
    Failed,
    Incomplete,
    Timeout,
    Cancelled,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Ok => "ok",
            AttemptOutcome::Failed => "failed",
            AttemptOutcome::Incomplete => "incomplete",
            AttemptOutcome::Timeout => "timeout",
            AttemptOutcome::Cancelled => "cancelled",
        }
    }
}

/// Record one backend invocation.
pub fn record_backend_attempt(backend: &str, variant: ImageVariant, outcome: AttemptOutcome) {
    let labels = [
        ("backend", backend.to_string()),
        ("variant", variant.as_str().to_string()),
        ("outcome", outcome.as_str().to_string()),
    ];
    counter!(names::BACKEND_ATTEMPTS_TOTAL, &labels).increment(1);
}

/// Record a finished detection.
pub fn record_detection(result: &DetectionResult) {
    let labels = [
        ("method", result.method.to_string()),
        ("face_detected", result.face_detected.to_string()),
    ];
    counter!(names::DETECTIONS_TOTAL, &labels).increment(1);

    let labels = [("method", result.method.to_string())];
    histogram!(names::DETECTION_CONFIDENCE, &labels).record(result.mood.confidence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use metrics_util::CompositeKey;
    use mood_models::{DetectionMethod, EmotionVector, MoodLabel, ResolvedMood};

    fn labels(key: &CompositeKey) -> Vec<(String, String)> {
        key.key()
            .labels()
            .map(|l| (l.key().to_string(), l.value().to_string()))
            .collect()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_backend_attempt_counter_labels() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_backend_attempt("retinaface", ImageVariant::Rotated90, AttemptOutcome::Timeout);
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(snapshot.len(), 1);
        let (key, _, _, value) = &snapshot[0];
        assert_eq!(key.key().name(), names::BACKEND_ATTEMPTS_TOTAL);
        assert_eq!(
            labels(key),
            pairs(&[
                ("backend", "retinaface"),
                ("variant", ImageVariant::Rotated90.as_str()),
                ("outcome", "timeout"),
            ])
        );
        assert_eq!(value, &DebugValue::Counter(1));
    }

    #[test]
    fn test_detection_records_counter_and_confidence() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let result = DetectionResult::new(
            ResolvedMood::new(MoodLabel::Sad, 0.62),
            true,
            DetectionMethod::Crop,
            EmotionVector::new(),
        );

        metrics::with_local_recorder(&recorder, || record_detection(&result));

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(snapshot.len(), 2);
        for (key, _, _, value) in &snapshot {
            match key.key().name() {
                names::DETECTIONS_TOTAL => {
                    assert_eq!(labels(key), pairs(&[("method", "crop"), ("face_detected", "true")]));
                    assert_eq!(value, &DebugValue::Counter(1));
                }
                names::DETECTION_CONFIDENCE => {
                    assert_eq!(labels(key), pairs(&[("method", "crop")]));
                    match value {
                        DebugValue::Histogram(values) => {
                            assert_eq!(values.len(), 1);
                            assert!((values[0].into_inner() - 0.62).abs() < 1e-9);
                        }
                        other => panic!("unexpected value {:?}", other),
                    }
                }
                other => panic!("unexpected metric {}", other),
            }
        }
    }
}
