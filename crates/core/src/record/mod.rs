//! Clip recording: capturing the visual surface and processed audio in
//! lock step and assembling the result into a media clip.
//!
//! The encoder behind a session is chosen by an [`EncoderFactory`], so
//! hosts can plug in streaming video encoders; the built-in
//! [`WavClipEncoder`] covers the audio-only path without further
//! dependencies.

use std::fmt;
use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::{Result, RigError};

/// Container formats a clip can be delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipFormat {
    Wav,
    Webm,
    Mp4,
}

impl ClipFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ClipFormat::Wav => "wav",
            ClipFormat::Webm => "webm",
            ClipFormat::Mp4 => "mp4",
        }
    }
}

/// Dimensions and rates a recording session captures at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub sample_rate: u32,
}

/// One captured frame of the visual surface, tightly packed RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A finished clip: the container bytes plus the format they are in.
#[derive(Clone, PartialEq)]
pub struct MediaClip {
    pub format: ClipFormat,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for MediaClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaClip")
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Source of visual frames for a recording session. The renderer side of
/// the host implements this.
pub trait VisualSurface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Captures the surface as it looks right now.
    fn capture_frame(&mut self) -> Result<SurfaceFrame>;
}

/// Incremental clip encoder. `push` may emit container chunks as encoding
/// progresses; `finish` emits whatever remains.
pub trait ClipEncoder: Send {
    /// The container format this encoder produces.
    fn format(&self) -> ClipFormat;

    fn start(&mut self, spec: &CaptureSpec) -> Result<()>;

    /// Consumes one captured frame together with the audio processed since
    /// the previous frame.
    fn push(&mut self, frame: &SurfaceFrame, audio: &[f32]) -> Result<Option<Vec<u8>>>;

    fn finish(&mut self) -> Result<Vec<u8>>;
}

/// Creates an encoder for a capture spec. Returning an error signals that
/// no encoder is available for the requested configuration.
pub trait EncoderFactory: Send + Sync {
    fn create(&self, spec: &CaptureSpec) -> Result<Box<dyn ClipEncoder>>;
}

/// Converts a finished clip into another container format.
pub trait ClipTranscoder: Send + Sync {
    fn transcode(&self, clip: MediaClip, target: ClipFormat) -> Result<MediaClip>;
}

/// Audio-only encoder producing a 32-bit float mono WAV. Video frames are
/// accepted and counted but not stored.
#[derive(Debug, Default)]
pub struct WavClipEncoder {
    sample_rate: u32,
    samples: Vec<f32>,
    frames: u64,
}

impl ClipEncoder for WavClipEncoder {
    fn format(&self) -> ClipFormat {
        ClipFormat::Wav
    }

    fn start(&mut self, spec: &CaptureSpec) -> Result<()> {
        if spec.sample_rate == 0 {
            return Err(RigError::msg("capture sample rate must be non-zero"));
        }
        self.sample_rate = spec.sample_rate;
        self.samples.clear();
        self.frames = 0;
        Ok(())
    }

    fn push(&mut self, _frame: &SurfaceFrame, audio: &[f32]) -> Result<Option<Vec<u8>>> {
        self.samples.extend_from_slice(audio);
        self.frames += 1;
        Ok(None)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut bytes = Vec::new();
        {
            let cursor = Cursor::new(&mut bytes);
            let mut writer = hound::WavWriter::new(cursor, spec)
                .map_err(|err| RigError::msg(format!("wav encoding failed: {err}")))?;
            for sample in &self.samples {
                writer
                    .write_sample(*sample)
                    .map_err(|err| RigError::msg(format!("wav encoding failed: {err}")))?;
            }
            writer
                .finalize()
                .map_err(|err| RigError::msg(format!("wav encoding failed: {err}")))?;
        }
        Ok(bytes)
    }
}

/// Factory for the built-in WAV encoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavEncoderFactory;

impl EncoderFactory for WavEncoderFactory {
    fn create(&self, _spec: &CaptureSpec) -> Result<Box<dyn ClipEncoder>> {
        Ok(Box::new(WavClipEncoder::default()))
    }
}

/// Transport position captured when a recording session starts, restored
/// when it ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SavedPosition {
    Paused { offset: f64 },
    Running { offset: f64 },
}

/// A recording session in progress: captures the surface and the drained
/// capture-sink audio once per tick, accumulating encoder output chunks.
pub struct RecordingSession {
    surface: Box<dyn VisualSurface>,
    encoder: Box<dyn ClipEncoder>,
    target: ClipFormat,
    saved: SavedPosition,
    chunks: Vec<Vec<u8>>,
}

impl RecordingSession {
    pub fn new(
        surface: Box<dyn VisualSurface>,
        encoder: Box<dyn ClipEncoder>,
        target: ClipFormat,
        saved: SavedPosition,
    ) -> Self {
        Self {
            surface,
            encoder,
            target,
            saved,
            chunks: Vec::new(),
        }
    }

    /// Captures one frame and hands it, with the tick's processed audio,
    /// to the encoder.
    pub fn step(&mut self, audio: &[f32]) -> Result<()> {
        let frame = self.surface.capture_frame()?;
        if let Some(chunk) = self.encoder.push(&frame, audio)? {
            self.chunks.push(chunk);
        }
        Ok(())
    }

    /// Finishes the encoder and assembles all chunks, in arrival order,
    /// into the final clip.
    pub fn finalize(mut self) -> Result<MediaClip> {
        let tail = self.encoder.finish()?;
        self.chunks.push(tail);

        let total = self.chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in &self.chunks {
            bytes.extend_from_slice(chunk);
        }
        Ok(MediaClip {
            format: self.encoder.format(),
            bytes,
        })
    }

    /// Whether the encoder's output format differs from the requested one.
    pub fn needs_transcode(&self) -> bool {
        self.encoder.format() != self.target
    }

    pub fn target(&self) -> ClipFormat {
        self.target
    }

    pub fn saved(&self) -> SavedPosition {
        self.saved
    }
}

impl fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSession")
            .field("target", &self.target)
            .field("saved", &self.saved)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}
