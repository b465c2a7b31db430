//! App-facing mood labels and resolved moods.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Mood label shown to users and stored in mood history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum MoodLabel {
    Happy,
    Sad,
    Angry,
    Anxious,
    Excited,
    Neutral,
    #[serde(alias = "Stress")]
    Stressed,
}

impl MoodLabel {
    pub const ALL: &'static [MoodLabel] = &[
        MoodLabel::Happy,
        MoodLabel::Sad,
        MoodLabel::Angry,
        MoodLabel::Anxious,
        MoodLabel::Excited,
        MoodLabel::Neutral,
        MoodLabel::Stressed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "Happy",
            MoodLabel::Sad => "Sad",
            MoodLabel::Angry => "Angry",
            MoodLabel::Anxious => "Anxious",
            MoodLabel::Excited => "Excited",
            MoodLabel::Neutral => "Neutral",
            MoodLabel::Stressed => "Stressed",
        }
    }

    /// Companion reply sent back after a photo is analysed.
    pub fn reply(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "You look so happy! 😊✨ What's making you smile? Share the vibes!",
            MoodLabel::Sad => {
                "I can see you're really hurting. 😢 It's okay to let it out. What happened? Talk to me..."
            }
            MoodLabel::Angry => "I see you're frustrated. 😠 What's going on? I'm here to listen.",
            MoodLabel::Stressed => {
                "You seem really stressed 😰💭 Take a deep breath. Everything will be okay. What's on your mind?"
            }
            MoodLabel::Anxious => "You seem a bit anxious 😟 Everything will be fine. I'm listening.",
            MoodLabel::Excited => {
                "Woah! You look amazing! 🎉🔥 What's got you so excited? Tell me more!"
            }
            MoodLabel::Neutral => "Nice photo! 📸 How's your day going? What's up?",
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MoodLabel {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(MoodLabel::Happy),
            "sad" => Ok(MoodLabel::Sad),
            "angry" => Ok(MoodLabel::Angry),
            "anxious" => Ok(MoodLabel::Anxious),
            "excited" => Ok(MoodLabel::Excited),
            "neutral" => Ok(MoodLabel::Neutral),
            "stressed" | "stress" => Ok(MoodLabel::Stressed),
            _ => Err(LabelParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown mood label: {0}")]
pub struct LabelParseError(String);

/// A single mood label with a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedMood {
    pub label: MoodLabel,
    pub confidence: f64,
}

impl ResolvedMood {
    /// Create a resolved mood. Confidence is clamped into `[0, 1]`.
    pub fn new(label: MoodLabel, confidence: f64) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { label, confidence }
    }

    /// Low-confidence neutral guess used when no classifier produced scores.
    pub fn neutral(confidence: f64) -> Self {
        Self::new(MoodLabel::Neutral, confidence)
    }

    /// Whether this mood meets the given acceptance threshold.
    #[inline]
    pub fn meets(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

/// Which rule of the resolution cascade produced a mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionRule {
    /// Happy above 25 and above sad.
    HappyDominant,
    /// Sad more than 15 points above fear.
    Crying,
    /// Fear plus sad above 45.
    Stressed,
    /// Angry above 10.
    Angry,
    /// Sad above 15 and above happy.
    Sad,
    /// Happy above 15.
    SubtleHappy,
    /// Fear above 30.
    Anxious,
    /// Highest raw score.
    Dominant,
}

impl ResolutionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionRule::HappyDominant => "happy_dominant",
            ResolutionRule::Crying => "crying",
            ResolutionRule::Stressed => "stressed",
            ResolutionRule::Angry => "angry",
            ResolutionRule::Sad => "sad",
            ResolutionRule::SubtleHappy => "subtle_happy",
            ResolutionRule::Anxious => "anxious",
            ResolutionRule::Dominant => "dominant",
        }
    }
}

impl fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_accepts_stress_alias() {
        assert_eq!("Stress".parse::<MoodLabel>().unwrap(), MoodLabel::Stressed);
        assert_eq!("stressed".parse::<MoodLabel>().unwrap(), MoodLabel::Stressed);
        assert!("bored".parse::<MoodLabel>().is_err());

        let label: MoodLabel = serde_json::from_str("\"Stress\"").unwrap();
        assert_eq!(label, MoodLabel::Stressed);
        assert_eq!(serde_json::to_string(&label).unwrap(), "\"Stressed\"");
    }

    #[test]
    fn test_every_label_has_reply() {
        for label in MoodLabel::ALL {
            assert!(!label.reply().is_empty());
        }
    }

    #[test]
    fn test_resolved_mood_clamps_confidence() {
        assert_eq!(ResolvedMood::new(MoodLabel::Sad, 1.7).confidence, 1.0);
        assert_eq!(ResolvedMood::new(MoodLabel::Sad, -0.2).confidence, 0.0);
        assert_eq!(ResolvedMood::new(MoodLabel::Sad, f64::NAN).confidence, 0.0);
    }

    #[test]
    fn test_meets_is_inclusive() {
        let mood = ResolvedMood::new(MoodLabel::Happy, 0.5);
        assert!(mood.meets(0.5));
        assert!(!mood.meets(0.51));
    }
}
