//! Seeded idle-motion oscillators.
//!
//! All gestures are pure functions of elapsed time, the gesture seed, the
//! blended emotion mix and the current loudness energy. Two engines given
//! the same seed produce bit-identical motion, which is what makes gesture
//! behaviour testable at all.

use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::emotion::EmotionVector;

const HEAD_PITCH_HZ: f32 = 0.23;
const HEAD_YAW_HZ: f32 = 0.17;
const HEAD_ROLL_HZ: f32 = 0.11;
const EYE_YAW_HZ: f32 = 0.31;
const EYE_PITCH_HZ: f32 = 0.41;
const WAVE_HZ: f32 = 0.73;
const BLINK_BASE_HZ: f32 = 0.30;
const BLINK_THRESHOLD: f32 = 0.97;

/// Phase offset for the gesture oscillators, stored as a value in [0, 1).
///
/// The seed only shifts phases; it never changes amplitudes or
/// frequencies, so all seeds produce motion of the same character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureSeed(f32);

impl GestureSeed {
    /// Draws a fresh random seed.
    pub fn roll() -> Self {
        Self(rand::thread_rng().gen::<f32>())
    }

    /// Builds a deterministic seed, folding any float into [0, 1).
    pub fn from_value(value: f32) -> Self {
        Self(value.rem_euclid(1.0))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    fn phase(&self) -> f32 {
        self.0 * TAU
    }
}

impl Default for GestureSeed {
    fn default() -> Self {
        Self(0.0)
    }
}

/// Head pose in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadRotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Gaze offset in radians, relative to straight ahead.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyeDirection {
    pub yaw: f32,
    pub pitch: f32,
}

fn osc(t: f32, hz: f32, phase: f32) -> f32 {
    (TAU * hz * t + phase).sin()
}

/// Slow head sway. Energy widens the sway, anger sharpens pitch nods and
/// happiness adds roll.
pub fn head_rotation(t: f32, seed: GestureSeed, mix: &EmotionVector, energy: f32) -> HeadRotation {
    let phase = seed.phase();
    let sway = 0.35 + 0.65 * energy.clamp(0.0, 1.0);
    let pitch_amp = 0.050 * sway * (1.0 + 0.8 * mix.angry);
    let yaw_amp = 0.060 * sway;
    let roll_amp = 0.035 * sway * (1.0 + 0.6 * mix.happy);

    HeadRotation {
        pitch: pitch_amp * (osc(t, HEAD_PITCH_HZ, phase) + 0.4 * osc(t, HEAD_PITCH_HZ * 2.7, phase * 1.9)),
        yaw: yaw_amp * (osc(t, HEAD_YAW_HZ, phase * 0.6) + 0.3 * osc(t, HEAD_YAW_HZ * 3.1, phase * 2.3)),
        roll: roll_amp * (osc(t, HEAD_ROLL_HZ, phase * 1.4) + 0.5 * osc(t, HEAD_ROLL_HZ * 2.2, phase * 0.8)),
    }
}

/// Idle gaze wander. Loud audio pulls the gaze toward centre so the avatar
/// appears to focus while speaking.
pub fn eye_direction(t: f32, seed: GestureSeed, energy: f32) -> EyeDirection {
    let phase = seed.phase();
    let drift = 1.0 - 0.6 * energy.clamp(0.0, 1.0);

    EyeDirection {
        yaw: 0.12 * drift * osc(t, EYE_YAW_HZ, phase * 1.3),
        pitch: 0.08 * drift * osc(t, EYE_PITCH_HZ, phase * 0.7),
    }
}

/// Hand-wave intensity in [0, 1]. Silent audio keeps the hands down;
/// happiness and surprise raise how far the wave can lift.
pub fn hand_wave(t: f32, seed: GestureSeed, mix: &EmotionVector, energy: f32) -> f32 {
    let phase = seed.phase();
    let excitement = (mix.happy + mix.surprised).min(1.0);
    let lift = energy.clamp(0.0, 1.0) * (0.3 + 0.7 * excitement);
    lift * (0.5 + 0.5 * osc(t, WAVE_HZ, phase))
}

/// Blink amount in [0, 1]. A thresholded sine yields short closures with
/// long open stretches between them; calm, quiet moments blink more often
/// than loud ones.
pub fn blink(t: f32, seed: GestureSeed, mix: &EmotionVector, energy: f32) -> f32 {
    let phase = seed.phase();
    let calm = 0.6 + 0.8 * (1.0 - energy.clamp(0.0, 1.0));
    let rate = BLINK_BASE_HZ * (0.5 + 0.8 * mix.neutral) * calm;
    let s = (TAU * rate * t + phase).sin();
    if s <= BLINK_THRESHOLD {
        0.0
    } else {
        ((s - BLINK_THRESHOLD) / (1.0 - BLINK_THRESHOLD)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_times() -> impl Iterator<Item = f32> {
        (0..2_000).map(|i| i as f32 * 0.033)
    }

    #[test]
    fn gestures_stay_bounded() {
        let seed = GestureSeed::from_value(0.42);
        let mix = EmotionVector {
            happy: 1.0,
            sad: 1.0,
            angry: 1.0,
            surprised: 1.0,
            neutral: 1.0,
        };
        for t in sample_times() {
            let head = head_rotation(t, seed, &mix, 1.0);
            assert!(head.pitch.abs() < 0.3);
            assert!(head.yaw.abs() < 0.3);
            assert!(head.roll.abs() < 0.3);

            let eyes = eye_direction(t, seed, 0.0);
            assert!(eyes.yaw.abs() <= 0.12 + 1e-6);
            assert!(eyes.pitch.abs() <= 0.08 + 1e-6);

            let wave = hand_wave(t, seed, &mix, 1.0);
            assert!((0.0..=1.0).contains(&wave));

            let blink = blink(t, seed, &mix, 0.0);
            assert!((0.0..=1.0).contains(&blink));
        }
    }

    #[test]
    fn blink_is_mostly_open() {
        let seed = GestureSeed::from_value(0.8);
        let mix = EmotionVector::neutral();
        let closed = sample_times().filter(|&t| blink(t, seed, &mix, 0.2) > 0.0).count();
        let total = sample_times().count();
        // Closures are brief spikes, not a constant squint.
        assert!(closed * 5 < total, "blinking {closed} of {total} samples");
    }

    #[test]
    fn silent_audio_keeps_hands_down() {
        let seed = GestureSeed::from_value(0.3);
        let mix = EmotionVector {
            happy: 1.0,
            ..EmotionVector::neutral()
        };
        for t in sample_times() {
            assert_eq!(hand_wave(t, seed, &mix, 0.0), 0.0);
        }
    }

    #[test]
    fn different_seeds_produce_different_motion() {
        let a = GestureSeed::from_value(0.1);
        let b = GestureSeed::from_value(0.6);
        let mix = EmotionVector::neutral();

        let difference: f32 = sample_times()
            .map(|t| {
                let ha = head_rotation(t, a, &mix, 0.5);
                let hb = head_rotation(t, b, &mix, 0.5);
                (ha.pitch - hb.pitch).abs() + (ha.yaw - hb.yaw).abs() + (ha.roll - hb.roll).abs()
            })
            .sum();
        assert!(difference > 1.0);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let seed = GestureSeed::from_value(0.77);
        let mix = EmotionVector::neutral();
        for t in [0.0_f32, 1.5, 10.2, 300.0] {
            assert_eq!(head_rotation(t, seed, &mix, 0.4), head_rotation(t, seed, &mix, 0.4));
            assert_eq!(eye_direction(t, seed, 0.4), eye_direction(t, seed, 0.4));
        }
    }

    #[test]
    fn from_value_folds_into_unit_interval() {
        assert!((GestureSeed::from_value(1.25).value() - 0.25).abs() < 1e-6);
        assert!((GestureSeed::from_value(-0.25).value() - 0.75).abs() < 1e-6);
        assert!(GestureSeed::roll().value() >= 0.0);
    }
}
