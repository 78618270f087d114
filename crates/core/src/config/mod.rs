use serde::{Deserialize, Serialize};

use crate::{emotion::BlendWeights, Result, RigError};

/// Top-level configuration for one engine instance.
///
/// Everything in here is a tuning constant with a sensible default; the
/// structure round-trips through JSON so hosts can persist rig presets.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    pub analysis: AnalysisConfig,
    pub animation: AnimationConfig,
    pub blend: BlendWeights,
    pub speech: SpeechConfig,
    pub record: RecordConfig,
}

impl EngineConfig {
    /// Parses a configuration from its JSON representation.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| RigError::msg(format!("invalid engine config: {e}")))
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RigError::msg(format!("could not serialize engine config: {e}")))
    }
}

/// Configuration of the per-tick loudness analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of most-recent samples the analysis tap retains.
    pub window_size: usize,
    /// Per-tick decay applied to the running peak tracker. Slightly below
    /// one so normalization adapts to loudness trends without hard resets.
    pub peak_decay: f32,
    /// Floor below which the peak is treated as silence, guarding the
    /// normalization division.
    pub peak_floor: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            peak_decay: 0.995,
            peak_floor: 1.0e-4,
        }
    }
}

/// Configuration of the snapshot aggregation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Exponential smoothing factor for mouth openness and intensity,
    /// in (0, 1]; higher values track the raw energy more eagerly.
    pub smoothing: f32,
    /// Exponential smoothing factor for the playback progress indicator.
    pub progress_smoothing: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.35,
            progress_smoothing: 0.2,
        }
    }
}

/// Configuration of the speech synthesis entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Upper bound on the number of characters accepted per synthesis
    /// request; longer texts are rejected.
    pub max_text_chars: usize,
    /// Voice tag used when the caller does not supply one.
    pub default_voice: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            max_text_chars: 480,
            default_voice: "default".to_string(),
        }
    }
}

/// Configuration of recording sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Nominal frame rate advertised to the clip encoder.
    pub fps: u32,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self { fps: 30 }
    }
}
