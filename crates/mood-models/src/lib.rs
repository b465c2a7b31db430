//! Shared data models for the mood emotion engine.
//!
//! This crate provides Serde-serializable types for:
//! - Raw per-class emotion scores from facial-expression classifiers
//! - App-facing mood labels and resolved moods
//! - Face regions reported by face detectors
//! - Detection attempts and final detection results

pub mod detection;
pub mod emotion;
pub mod mood;
pub mod region;

// Re-export common types
pub use detection::{DetectionAttempt, DetectionMethod, DetectionResult, ImageVariant};
pub use emotion::{ClassParseError, EmotionClass, EmotionVector};
pub use mood::{LabelParseError, MoodLabel, ResolutionRule, ResolvedMood};
pub use region::FaceRegion;
