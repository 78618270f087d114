use serde::{Deserialize, Serialize};

/// Discrete emotions the host can set on the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprised,
    Neutral,
}

/// Weighted emotion mix. Each component is held in [0, 1]; the vector is
/// deliberately not normalised so hosts can layer emotions freely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    pub happy: f32,
    pub sad: f32,
    pub angry: f32,
    pub surprised: f32,
    pub neutral: f32,
}

impl EmotionVector {
    /// Pure neutral: the rest state of a freshly created engine.
    pub fn neutral() -> Self {
        Self {
            happy: 0.0,
            sad: 0.0,
            angry: 0.0,
            surprised: 0.0,
            neutral: 1.0,
        }
    }

    pub fn get(&self, emotion: Emotion) -> f32 {
        match emotion {
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Angry => self.angry,
            Emotion::Surprised => self.surprised,
            Emotion::Neutral => self.neutral,
        }
    }

    /// Sets one component, clamped to [0, 1].
    pub fn set(&mut self, emotion: Emotion, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match emotion {
            Emotion::Happy => self.happy = value,
            Emotion::Sad => self.sad = value,
            Emotion::Angry => self.angry = value,
            Emotion::Surprised => self.surprised = value,
            Emotion::Neutral => self.neutral = value,
        }
    }
}

impl Default for EmotionVector {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Tuning weights for how loudness energy reshapes the base emotion mix.
///
/// The defaults were tuned by ear against recorded speech. Energy lends
/// happiness outright (more when the base is mostly neutral) and decays
/// neutral, so loud audio reads livelier even when the host set nothing.
/// The remaining components stay proportional to what the host set: sad
/// deepens in quiet passages, angry and surprised scale between a floor
/// and full strength as energy rises.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub happy_energy: f32,
    pub happy_neutral: f32,
    pub sad_quiet: f32,
    pub angry_floor: f32,
    pub angry_energy: f32,
    pub surprised_floor: f32,
    pub surprised_energy: f32,
    pub neutral_decay: f32,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            happy_energy: 0.30,
            happy_neutral: 0.20,
            sad_quiet: 0.25,
            angry_floor: 0.30,
            angry_energy: 0.70,
            surprised_floor: 0.25,
            surprised_energy: 0.75,
            neutral_decay: 0.60,
        }
    }
}

/// Blends the base emotion with the current loudness energy.
///
/// Pure: the result depends only on the arguments, and every component of
/// the output lies in [0, 1] for any input.
pub fn blend(base: &EmotionVector, energy: f32, weights: &BlendWeights) -> EmotionVector {
    let energy = energy.clamp(0.0, 1.0);
    let quiet = 1.0 - energy;

    let happy = base.happy
        + energy * weights.happy_energy
        + base.neutral * energy * weights.happy_neutral;
    let sad = base.sad * (1.0 + quiet * weights.sad_quiet);
    let angry = base.angry * (weights.angry_floor + energy * weights.angry_energy);
    let surprised = base.surprised * (weights.surprised_floor + energy * weights.surprised_energy);
    let neutral = base.neutral * (1.0 - energy * weights.neutral_decay);

    EmotionVector {
        happy: happy.clamp(0.0, 1.0),
        sad: sad.clamp(0.0, 1.0),
        angry: angry.clamp(0.0, 1.0),
        surprised: surprised.clamp(0.0, 1.0),
        neutral: neutral.clamp(0.0, 1.0),
    }
}
