use std::fmt;

use crate::Result;

/// Speaker leg of the audio graph.
///
/// Implementations receive post-gain mono sample blocks pushed by the
/// transport pump. Activation may be refused (no output device, platform
/// policy); such failures should surface as
/// [`RigError::PlaybackUnavailable`](crate::RigError::PlaybackUnavailable).
/// Deliberately not `Send`: platform audio streams are thread-bound and
/// the graph never leaves the engine's thread.
pub trait OutputBackend {
    /// Prepares the device for playback at the given sample rate.
    fn activate(&mut self, sample_rate: u32) -> Result<()>;

    /// Consumes one block of post-gain mono samples.
    fn write(&mut self, samples: &[f32]);

    /// Releases the device. Called on disconnect and rate changes.
    fn deactivate(&mut self) {}
}

/// Output backend that discards all audio. Used headless and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl OutputBackend for NullOutput {
    fn activate(&mut self, _sample_rate: u32) -> Result<()> {
        Ok(())
    }

    fn write(&mut self, _samples: &[f32]) {}
}

/// Ring window over the most recent pre-gain samples, read once per tick
/// by the loudness analysis.
#[derive(Debug)]
struct AnalysisTap {
    buf: Vec<f32>,
    pos: usize,
    filled: usize,
}

impl AnalysisTap {
    fn new(window_size: usize) -> Self {
        Self {
            buf: vec![0.0; window_size.max(1)],
            pos: 0,
            filled: 0,
        }
    }

    fn push_block(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.buf[self.pos] = sample;
            self.pos = (self.pos + 1) % self.buf.len();
        }
        self.filled = (self.filled + samples.len()).min(self.buf.len());
    }

    /// Copies the window into `out` in chronological order.
    fn copy_window(&self, out: &mut Vec<f32>) {
        out.clear();
        if self.filled < self.buf.len() {
            out.extend_from_slice(&self.buf[..self.filled]);
            return;
        }
        out.extend_from_slice(&self.buf[self.pos..]);
        out.extend_from_slice(&self.buf[..self.pos]);
    }

    fn reset(&mut self) {
        self.buf.fill(0.0);
        self.pos = 0;
        self.filled = 0;
    }
}

/// Audio-graph endpoint that exposes processed (post-gain) audio for a
/// recording session. Armed only while a session is active; the session
/// drains it once per tick.
#[derive(Debug, Default)]
struct CaptureSink {
    samples: Vec<f32>,
}

/// The live audio graph: source → analysis tap → gain → speaker + capture
/// sink, modelled as one explicitly owned resource object.
///
/// The tap sits before the gain stage so loudness analysis is unaffected by
/// the volume setting; the speaker and the capture sink both receive the
/// post-gain signal. Connection to the output backend is established
/// lazily and idempotently via [`AudioGraph::ensure_connected`].
pub struct AudioGraph {
    gain: f32,
    tap: AnalysisTap,
    capture: Option<CaptureSink>,
    output: Box<dyn OutputBackend>,
    connected_rate: Option<u32>,
    scratch: Vec<f32>,
    silence: Vec<f32>,
}

impl AudioGraph {
    pub fn new(window_size: usize, output: Box<dyn OutputBackend>) -> Self {
        Self {
            gain: 1.0,
            tap: AnalysisTap::new(window_size),
            capture: None,
            output,
            connected_rate: None,
            scratch: Vec::new(),
            silence: Vec::new(),
        }
    }

    /// Connects the output backend for the given sample rate. Idempotent:
    /// reconnecting at the same rate is a no-op, a rate change rebuilds the
    /// connection.
    pub fn ensure_connected(&mut self, sample_rate: u32) -> Result<()> {
        match self.connected_rate {
            Some(rate) if rate == sample_rate => Ok(()),
            Some(_) => {
                self.output.deactivate();
                self.connected_rate = None;
                self.output.activate(sample_rate)?;
                self.connected_rate = Some(sample_rate);
                Ok(())
            }
            None => {
                self.output.activate(sample_rate)?;
                self.connected_rate = Some(sample_rate);
                Ok(())
            }
        }
    }

    /// Tears the backend connection down. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if self.connected_rate.take().is_some() {
            self.output.deactivate();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected_rate.is_some()
    }

    /// Sets the gain multiplier, clamped to [0, 1]. Takes effect on the
    /// next processed block regardless of play state.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Routes one mono block through the graph: pre-gain into the analysis
    /// tap, post-gain to the speaker and any armed capture sink.
    pub fn process_block(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        self.tap.push_block(samples);

        self.scratch.clear();
        self.scratch.extend(samples.iter().map(|s| s * self.gain));
        if self.connected_rate.is_some() {
            self.output.write(&self.scratch);
        }
        if let Some(capture) = self.capture.as_mut() {
            capture.samples.extend_from_slice(&self.scratch);
        }
    }

    /// Pushes a block of silence through the graph so the tap decays while
    /// nothing is playing.
    pub fn push_silence(&mut self, frames: usize) {
        if frames == 0 {
            return;
        }
        let mut silence = std::mem::take(&mut self.silence);
        silence.clear();
        silence.resize(frames, 0.0);
        self.process_block(&silence);
        self.silence = silence;
    }

    /// Arms the capture sink. Processed audio accumulates until drained.
    pub fn arm_capture(&mut self) {
        self.capture = Some(CaptureSink::default());
    }

    /// Disarms the capture sink, discarding anything not yet drained.
    pub fn disarm_capture(&mut self) {
        self.capture = None;
    }

    pub fn capture_armed(&self) -> bool {
        self.capture.is_some()
    }

    /// Takes all processed audio accumulated since the last drain. Empty
    /// when the sink is not armed.
    pub fn drain_capture(&mut self) -> Vec<f32> {
        match self.capture.as_mut() {
            Some(capture) => std::mem::take(&mut capture.samples),
            None => Vec::new(),
        }
    }

    /// Copies the current analysis window (pre-gain) in chronological order.
    pub fn copy_tap_window(&self, out: &mut Vec<f32>) {
        self.tap.copy_window(out);
    }

    pub fn reset_tap(&mut self) {
        self.tap.reset();
    }
}

impl fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioGraph")
            .field("gain", &self.gain)
            .field("connected_rate", &self.connected_rate)
            .field("capture_armed", &self.capture.is_some())
            .finish()
    }
}
