use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::{
    config::AnimationConfig,
    emotion::{blend, BlendWeights, EmotionVector},
    gesture::{self, EyeDirection, GestureSeed, HeadRotation},
    Result, RigError,
};

/// Immutable pose produced once per tick. Everything a renderer needs to
/// draw the avatar for one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationSnapshot {
    /// Mouth openness in [0, 1], tracking smoothed loudness.
    pub mouth_open: f32,
    /// Eyelid closure in [0, 1].
    pub blink: f32,
    pub head_rotation: HeadRotation,
    pub eye_direction: EyeDirection,
    /// Hand-wave intensity in [0, 1].
    pub hand_wave: f32,
    /// Smoothed overall intensity in [0, 1].
    pub intensity: f32,
    /// Emotion mix after loudness blending.
    pub emotion_mix: EmotionVector,
    /// Raw per-tick loudness energy in [0, 1].
    pub energy: f32,
}

fn smooth(old: f32, target: f32, alpha: f32) -> f32 {
    old * (1.0 - alpha) + target * alpha
}

/// Turns per-tick energy readings into smoothed animation snapshots.
///
/// Holds the exponential-smoothing state between ticks; the gesture maths
/// itself lives in [`crate::gesture`] and stays pure.
#[derive(Debug)]
pub struct Animator {
    config: AnimationConfig,
    mouth: f32,
    energy: f32,
    progress: f32,
}

impl Animator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            mouth: 0.0,
            energy: 0.0,
            progress: 0.0,
        }
    }

    /// Produces the snapshot for one tick.
    ///
    /// `elapsed` is seconds since the engine was created and only drives the
    /// gesture oscillators, so gestures keep moving while playback is
    /// paused.
    pub fn tick(
        &mut self,
        elapsed: f32,
        raw_energy: f32,
        base: &EmotionVector,
        seed: GestureSeed,
        weights: &BlendWeights,
    ) -> AnimationSnapshot {
        let raw_energy = raw_energy.clamp(0.0, 1.0);
        self.mouth = smooth(self.mouth, raw_energy, self.config.smoothing);
        self.energy = smooth(self.energy, raw_energy, self.config.smoothing);

        let mix = blend(base, self.energy, weights);
        AnimationSnapshot {
            mouth_open: self.mouth.clamp(0.0, 1.0),
            blink: gesture::blink(elapsed, seed, &mix, self.energy),
            head_rotation: gesture::head_rotation(elapsed, seed, &mix, self.energy),
            eye_direction: gesture::eye_direction(elapsed, seed, self.energy),
            hand_wave: gesture::hand_wave(elapsed, seed, &mix, self.energy),
            intensity: self.energy.clamp(0.0, 1.0),
            emotion_mix: mix,
            energy: raw_energy,
        }
    }

    /// Smooths the playback progress fraction toward `position / duration`.
    /// While playback is active the result is held below 1.0 so progress
    /// displays only complete once playback actually stops.
    pub fn update_progress(&mut self, position: f64, duration: f64, active: bool) -> f32 {
        let target = if duration > 0.0 {
            ((position / duration) as f32).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.progress = smooth(self.progress, target, self.config.progress_smoothing);
        self.progress = self.progress.clamp(0.0, 1.0);
        if active {
            self.progress = self.progress.min(0.999);
        }
        self.progress
    }

    /// Clears smoothing state, as when new audio replaces the old.
    pub fn reset(&mut self) {
        self.mouth = 0.0;
        self.energy = 0.0;
        self.progress = 0.0;
    }
}

/// Shared, thread-safe view of the most recent snapshot. Renderers clone
/// the handle and read at their own cadence.
#[derive(Clone)]
pub struct SnapshotHandle {
    shared: Arc<Mutex<AnimationSnapshot>>,
}

impl SnapshotHandle {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(AnimationSnapshot::default())),
        }
    }

    /// Returns a copy of the latest published snapshot.
    pub fn get(&self) -> Result<AnimationSnapshot> {
        let guard = self.lock()?;
        Ok(guard.clone())
    }

    pub(crate) fn publish(&self, snapshot: AnimationSnapshot) {
        // A reader panicking mid-lock must not silence the publisher.
        match self.shared.lock() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, AnimationSnapshot>> {
        self.shared
            .lock()
            .map_err(|_| RigError::msg("animation snapshot has been poisoned"))
    }
}

impl std::fmt::Debug for SnapshotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotHandle").finish()
    }
}
