//! Emotion resolution cascade.
//!
//! Maps a raw classifier score vector to a single mood and confidence.
//! Plain argmax mislabels crying faces (heavy fear and sad overlap) and
//! misses subtle smiles, so an ordered cascade of threshold rules runs
//! first. The first matching rule wins:
//!
//! | # | Condition | Mood | Confidence |
//! |---|-----------|------|------------|
//! | 1 | happy > 25 and happy > sad | Happy | happy / 100 |
//! | 2 | sad > fear + 15 | Sad | sad / 100 |
//! | 3 | fear + sad > 45 | Stressed | (fear + sad) / 200 |
//! | 4 | angry > 10 | Angry | angry / 100 |
//! | 5 | sad > 15 and sad > happy | Sad | sad / 100 |
//! | 6 | happy > 15 | Happy | happy / 100 |
//! | 7 | fear > 30 | Anxious | fear / 100 |
//! | 8 | otherwise | label of the highest class | score / 100 |
//!
//! Scores are on the raw 0-100 scale. Missing classes count as zero.

use mood_models::{EmotionClass, EmotionVector, MoodLabel, ResolutionRule, ResolvedMood};

const HAPPY_DOMINANT_MIN: f64 = 25.0;
const CRYING_MARGIN: f64 = 15.0;
const STRESS_COMBINED_MIN: f64 = 45.0;
const ANGRY_MIN: f64 = 10.0;
const SAD_MIN: f64 = 15.0;
const SUBTLE_HAPPY_MIN: f64 = 15.0;
const ANXIOUS_MIN: f64 = 30.0;

/// Tie-break order for the dominant-class rule.
const DOMINANCE_ORDER: [EmotionClass; 7] = [
    EmotionClass::Neutral,
    EmotionClass::Happy,
    EmotionClass::Sad,
    EmotionClass::Angry,
    EmotionClass::Fear,
    EmotionClass::Surprise,
    EmotionClass::Disgust,
];

/// A resolved mood together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub mood: ResolvedMood,
    pub rule: ResolutionRule,
}

/// Resolve a score vector into a mood.
pub fn resolve(vector: &EmotionVector) -> ResolvedMood {
    classify(vector).mood
}

/// Resolve a score vector, reporting which cascade rule fired.
pub fn classify(vector: &EmotionVector) -> Resolution {
    let happy = vector.get(EmotionClass::Happy);
    let sad = vector.get(EmotionClass::Sad);
    let fear = vector.get(EmotionClass::Fear);
    let angry = vector.get(EmotionClass::Angry);

    let (label, confidence, rule) = if happy > HAPPY_DOMINANT_MIN && happy > sad {
        (MoodLabel::Happy, happy / 100.0, ResolutionRule::HappyDominant)
    } else if sad > fear + CRYING_MARGIN {
        (MoodLabel::Sad, sad / 100.0, ResolutionRule::Crying)
    } else if fear + sad > STRESS_COMBINED_MIN {
        (MoodLabel::Stressed, (fear + sad) / 200.0, ResolutionRule::Stressed)
    } else if angry > ANGRY_MIN {
        (MoodLabel::Angry, angry / 100.0, ResolutionRule::Angry)
    } else if sad > SAD_MIN && sad > happy {
        (MoodLabel::Sad, sad / 100.0, ResolutionRule::Sad)
    } else if happy > SUBTLE_HAPPY_MIN {
        (MoodLabel::Happy, happy / 100.0, ResolutionRule::SubtleHappy)
    } else if fear > ANXIOUS_MIN {
        (MoodLabel::Anxious, fear / 100.0, ResolutionRule::Anxious)
    } else {
        let (class, score) = dominant(vector);
        (class.label(), score / 100.0, ResolutionRule::Dominant)
    };

    Resolution {
        mood: ResolvedMood::new(label, confidence),
        rule,
    }
}

/// Highest-scoring class. Ties go to the earlier class in `DOMINANCE_ORDER`.
pub fn dominant(vector: &EmotionVector) -> (EmotionClass, f64) {
    let mut best = (DOMINANCE_ORDER[0], vector.get(DOMINANCE_ORDER[0]));
    for class in &DOMINANCE_ORDER[1..] {
        let score = vector.get(*class);
        if score > best.1 {
            best = (*class, score);
        }
    }
    best
}
