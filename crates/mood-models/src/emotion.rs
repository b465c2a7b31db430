//! Emotion classes and raw classifier score vectors.
//!
//! Facial-expression classifiers report one score per class on a 0-100
//! scale. Scores are independent and are not required to sum to 100.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::mood::MoodLabel;

/// Upper bound of a raw classifier score.
pub const MAX_SCORE: f64 = 100.0;

/// Emotion class reported by a facial-expression classifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum EmotionClass {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl EmotionClass {
    /// All classes, in classifier output order.
    pub const ALL: &'static [EmotionClass] = &[
        EmotionClass::Angry,
        EmotionClass::Disgust,
        EmotionClass::Fear,
        EmotionClass::Happy,
        EmotionClass::Sad,
        EmotionClass::Surprise,
        EmotionClass::Neutral,
    ];

    /// Returns the class name as reported by classifiers.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionClass::Angry => "angry",
            EmotionClass::Disgust => "disgust",
            EmotionClass::Fear => "fear",
            EmotionClass::Happy => "happy",
            EmotionClass::Sad => "sad",
            EmotionClass::Surprise => "surprise",
            EmotionClass::Neutral => "neutral",
        }
    }

    /// App-facing label for this class.
    pub fn label(&self) -> MoodLabel {
        match self {
            EmotionClass::Happy => MoodLabel::Happy,
            EmotionClass::Sad => MoodLabel::Sad,
            EmotionClass::Angry => MoodLabel::Angry,
            EmotionClass::Fear => MoodLabel::Anxious,
            EmotionClass::Surprise => MoodLabel::Excited,
            EmotionClass::Neutral => MoodLabel::Neutral,
            EmotionClass::Disgust => MoodLabel::Stressed,
        }
    }
}

impl fmt::Display for EmotionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmotionClass {
    type Err = ClassParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "angry" => Ok(EmotionClass::Angry),
            "disgust" => Ok(EmotionClass::Disgust),
            "fear" => Ok(EmotionClass::Fear),
            "happy" => Ok(EmotionClass::Happy),
            "sad" => Ok(EmotionClass::Sad),
            "surprise" => Ok(EmotionClass::Surprise),
            "neutral" => Ok(EmotionClass::Neutral),
            _ => Err(ClassParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown emotion class: {0}")]
pub struct ClassParseError(String);

/// Raw per-class scores from a classifier, each in `[0, 100]`.
///
/// Missing classes read as `0.0`. Use [`EmotionVector::is_complete`] to
/// check whether a backend reported every class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EmotionVector {
    scores: BTreeMap<EmotionClass, f64>,
}

impl EmotionVector {
    /// Create an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vector from `(class name, score)` pairs.
    ///
    /// Unknown class names are skipped.
    pub fn from_scores<'a, I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut vector = Self::new();
        for (name, score) in scores {
            if let Ok(class) = name.parse::<EmotionClass>() {
                vector.set(class, score);
            }
        }
        vector
    }

    /// Builder-style setter.
    pub fn with(mut self, class: EmotionClass, score: f64) -> Self {
        self.set(class, score);
        self
    }

    /// Set the score for a class, sanitized into `[0, 100]`.
    pub fn set(&mut self, class: EmotionClass, score: f64) {
        self.scores.insert(class, sanitize(score));
    }

    /// Score for a class, `0.0` when absent.
    #[inline]
    pub fn get(&self, class: EmotionClass) -> f64 {
        self.scores.get(&class).copied().unwrap_or(0.0)
    }

    /// Whether the class was reported at all.
    pub fn contains(&self, class: EmotionClass) -> bool {
        self.scores.contains_key(&class)
    }

    /// True when every class in [`EmotionClass::ALL`] is present.
    pub fn is_complete(&self) -> bool {
        EmotionClass::ALL.iter().all(|c| self.scores.contains_key(c))
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Iterate over reported `(class, score)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (EmotionClass, f64)> + '_ {
        self.scores.iter().map(|(c, s)| (*c, *s))
    }
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, MAX_SCORE)
    } else {
        0.0
    }
}
