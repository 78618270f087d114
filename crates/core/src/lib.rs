//! Core library for the VoiceRig avatar animation engine.
//!
//! VoiceRig turns an audio signal into a small set of animation
//! parameters for a speaking avatar: mouth openness, blink, head/eye
//! motion and a hand gesture, derived from per-tick loudness analysis and
//! an emotion blend. The crate also owns the playback transport state
//! machine and a recording facility that captures the rendered output in
//! lock step with audio playback.
//!
//! Each module owns a distinct subsystem ([`graph`], [`transport`],
//! [`analysis`], [`animation`], [`record`], ...); [`engine::RigEngine`]
//! ties them together behind a single facade the host drives with a
//! cooperative per-frame `tick`.

pub mod analysis;
pub mod animation;
pub mod asset;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod graph;
pub mod record;
pub mod transport;

pub use analysis::FeatureExtractor;
pub use animation::{AnimationSnapshot, Animator, SnapshotHandle};
pub use asset::AudioAsset;
pub use config::{AnalysisConfig, AnimationConfig, EngineConfig, RecordConfig, SpeechConfig};
pub use emotion::{blend, BlendWeights, Emotion, EmotionVector};
pub use engine::{EngineStatus, RigEngine, SpeechSynthesizer, TrackExtractor};
pub use error::{Result, RigError};
pub use gesture::{EyeDirection, GestureSeed, HeadRotation};
pub use graph::{AudioGraph, NullOutput, OutputBackend};
pub use record::{
    CaptureSpec, ClipEncoder, ClipFormat, ClipTranscoder, EncoderFactory, MediaClip, SurfaceFrame,
    VisualSurface, WavClipEncoder, WavEncoderFactory,
};
pub use transport::{PlaybackState, Transport};
