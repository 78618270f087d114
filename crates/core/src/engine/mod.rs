//! The engine facade tying every subsystem together.
//!
//! `RigEngine` owns the audio graph, the transport, the analysis and
//! animation state, and any active recording session. The host drives it
//! with a cooperative `tick(now)` call once per frame; decode, speech
//! synthesis, track extraction and clip transcoding run on background
//! threads and report back through a channel drained at the top of each
//! tick.

use std::fmt;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    analysis::FeatureExtractor,
    animation::{AnimationSnapshot, Animator, SnapshotHandle},
    asset::AudioAsset,
    config::EngineConfig,
    emotion::{Emotion, EmotionVector},
    gesture::GestureSeed,
    graph::{AudioGraph, NullOutput, OutputBackend},
    record::{
        CaptureSpec, ClipFormat, ClipTranscoder, EncoderFactory, MediaClip, RecordingSession,
        SavedPosition, VisualSurface, WavEncoderFactory,
    },
    transport::{PlaybackState, Transport},
    Result, RigError,
};

/// Sample rate assumed for idle silence while no asset is loaded.
const IDLE_SAMPLE_RATE: u32 = 48_000;
/// Cap on how much silence a single tick may push, guarding against huge
/// clock jumps after the host was suspended.
const MAX_SILENCE_SECONDS: f64 = 1.0;

/// Text-to-speech collaborator. Returns encoded audio bytes the engine
/// decodes like any other audio input.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}

/// Video-container collaborator. Pulls the audio track out of a container
/// and returns it as encoded audio bytes.
pub trait TrackExtractor: Send + Sync {
    fn extract_track(&self, container: &[u8]) -> Result<Vec<u8>>;
}

/// Which background audio job produced an outcome. Each kind owns one
/// status flag, held up while any job of that kind is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioJob {
    Load,
    Speech,
    VideoTrack,
}

enum JobOutcome {
    Audio {
        job: AudioJob,
        generation: u64,
        result: Result<AudioAsset>,
    },
    Transcode {
        result: Result<MediaClip>,
    },
}

/// Bookkeeping for in-flight background audio jobs. Requests may overlap,
/// so each kind carries a count rather than a flag, and `generation`
/// stamps every spawn so the straggler from a superseded request is
/// discarded instead of clobbering newer audio.
#[derive(Debug, Default)]
struct PendingJobs {
    generation: u64,
    load: u32,
    speech: u32,
    video: u32,
}

impl PendingJobs {
    /// Registers a new job and returns the stamp its outcome must carry
    /// to still be current when it reports back.
    fn begin(&mut self, job: AudioJob) -> u64 {
        self.generation += 1;
        *self.slot(job) += 1;
        self.generation
    }

    fn finish(&mut self, job: AudioJob) {
        let slot = self.slot(job);
        *slot = slot.saturating_sub(1);
    }

    /// Marks every in-flight job as superseded without spawning one.
    fn supersede(&mut self) {
        self.generation += 1;
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    fn busy(&self, job: AudioJob) -> bool {
        match job {
            AudioJob::Load => self.load > 0,
            AudioJob::Speech => self.speech > 0,
            AudioJob::VideoTrack => self.video > 0,
        }
    }

    fn slot(&mut self, job: AudioJob) -> &mut u32 {
        match job {
            AudioJob::Load => &mut self.load,
            AudioJob::Speech => &mut self.speech,
            AudioJob::VideoTrack => &mut self.video,
        }
    }
}

/// Host-visible engine state, refreshed every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub has_audio: bool,
    pub is_playing: bool,
    pub is_loading_audio: bool,
    pub is_generating_speech: bool,
    pub is_processing_video: bool,
    pub is_exporting: bool,
    /// Smoothed playback progress, held below 1.0 while audio is active.
    pub playback_progress: f32,
    pub audio_duration: f64,
    /// Short human-readable description of what the engine is doing.
    pub message: String,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            has_audio: false,
            is_playing: false,
            is_loading_audio: false,
            is_generating_speech: false,
            is_processing_video: false,
            is_exporting: false,
            playback_progress: 0.0,
            audio_duration: 0.0,
            message: "idle".into(),
        }
    }
}

/// Recording lifecycle: frames are captured while `Capturing`; a session
/// whose clip needs a format conversion parks in `Transcoding` until the
/// background transcoder reports back.
enum ActiveSession {
    Capturing(RecordingSession),
    Transcoding { saved: SavedPosition },
}

/// The audio-to-animation engine.
pub struct RigEngine {
    config: EngineConfig,
    graph: AudioGraph,
    transport: Transport,
    asset: Option<AudioAsset>,
    extractor: FeatureExtractor,
    animator: Animator,
    base_emotion: EmotionVector,
    seed: GestureSeed,
    handle: SnapshotHandle,
    status: EngineStatus,
    last_error: Option<RigError>,
    session: Option<ActiveSession>,
    export_result: Option<Result<MediaClip>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    track_extractor: Option<Arc<dyn TrackExtractor>>,
    transcoder: Option<Arc<dyn ClipTranscoder>>,
    encoder_factory: Arc<dyn EncoderFactory>,
    jobs_tx: Sender<JobOutcome>,
    jobs_rx: Receiver<JobOutcome>,
    pending: PendingJobs,
    now: f64,
    epoch: Option<f64>,
}

impl RigEngine {
    pub fn new(config: EngineConfig, output: Box<dyn OutputBackend>) -> Self {
        let (jobs_tx, jobs_rx) = unbounded();
        let graph = AudioGraph::new(config.analysis.window_size, output);
        let extractor = FeatureExtractor::new(config.analysis.clone());
        let animator = Animator::new(config.animation.clone());
        Self {
            config,
            graph,
            transport: Transport::new(),
            asset: None,
            extractor,
            animator,
            base_emotion: EmotionVector::neutral(),
            seed: GestureSeed::roll(),
            handle: SnapshotHandle::new(),
            status: EngineStatus::default(),
            last_error: None,
            session: None,
            export_result: None,
            synthesizer: None,
            track_extractor: None,
            transcoder: None,
            encoder_factory: Arc::new(WavEncoderFactory),
            jobs_tx,
            jobs_rx,
            pending: PendingJobs::default(),
            now: 0.0,
            epoch: None,
        }
    }

    /// Engine with no speaker attached, for servers and tests.
    pub fn headless(config: EngineConfig) -> Self {
        Self::new(config, Box::new(NullOutput))
    }

    pub fn set_synthesizer(&mut self, synthesizer: Arc<dyn SpeechSynthesizer>) {
        self.synthesizer = Some(synthesizer);
    }

    pub fn set_track_extractor(&mut self, extractor: Arc<dyn TrackExtractor>) {
        self.track_extractor = Some(extractor);
    }

    pub fn set_transcoder(&mut self, transcoder: Arc<dyn ClipTranscoder>) {
        self.transcoder = Some(transcoder);
    }

    pub fn set_encoder_factory(&mut self, factory: Arc<dyn EncoderFactory>) {
        self.encoder_factory = factory;
    }

    /// One animation tick. `now` is the host's monotonic clock in seconds;
    /// values running backwards are clamped to the last seen time.
    pub fn tick(&mut self, now: f64) -> AnimationSnapshot {
        let now = now.max(self.now);
        let dt = now - self.now;
        self.now = now;
        let epoch = *self.epoch.get_or_insert(now);

        self.drain_jobs();

        let ended = self.transport.process_end_signals();
        if ended && self.session.is_none() {
            self.status.message = "finished".into();
            debug!("playback reached the end of the audio");
        }

        if self.transport.is_running() {
            if let Some(asset) = self.asset.as_ref() {
                self.transport.pump(now, asset, &mut self.graph);
            }
        } else {
            let rate = self
                .asset
                .as_ref()
                .map(AudioAsset::sample_rate)
                .unwrap_or(IDLE_SAMPLE_RATE);
            let frames = (dt.min(MAX_SILENCE_SECONDS) * rate as f64) as usize;
            self.graph.push_silence(frames);
        }

        let raw_energy = self.extractor.process(&self.graph);
        let elapsed = (now - epoch) as f32;
        let snapshot = self.animator.tick(
            elapsed,
            raw_energy,
            &self.base_emotion,
            self.seed,
            &self.config.blend,
        );

        self.status.playback_progress = self.animator.update_progress(
            self.transport.position(now),
            self.transport.duration(),
            self.transport.is_running(),
        );
        self.status.is_playing = self.transport.is_running();

        self.handle.publish(snapshot.clone());
        self.step_recording(ended);
        snapshot
    }

    /// Installs already-decoded audio, replacing any current asset. The
    /// transport resets to paused-at-start and analysis state clears.
    pub fn load_asset(&mut self, asset: AudioAsset) -> Result<()> {
        self.ensure_transport_free()?;
        self.pending.supersede();
        self.install_asset(asset);
        Ok(())
    }

    /// Decodes audio bytes on a background thread and installs the result.
    pub fn load_audio(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.ensure_transport_free()?;
        let generation = self.pending.begin(AudioJob::Load);
        self.status.is_loading_audio = true;
        self.status.message = "decoding audio...".into();
        let tx = self.jobs_tx.clone();
        thread::spawn(move || {
            let result = AudioAsset::decode(bytes);
            let _ = tx.send(JobOutcome::Audio {
                job: AudioJob::Load,
                generation,
                result,
            });
        });
        Ok(())
    }

    /// Synthesizes speech on a background thread and installs the decoded
    /// result. Empty or over-long text is rejected up front.
    pub fn synthesize_speech(&mut self, text: &str, voice: Option<&str>) -> Result<()> {
        self.ensure_transport_free()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(RigError::Synthesis("speech text is empty".into()));
        }
        let cap = self.config.speech.max_text_chars;
        if text.chars().count() > cap {
            return Err(RigError::Synthesis(format!(
                "speech text exceeds {cap} characters"
            )));
        }
        let Some(synthesizer) = self.synthesizer.clone() else {
            return Err(RigError::Synthesis(
                "no speech synthesizer is configured".into(),
            ));
        };

        let voice = voice.unwrap_or(&self.config.speech.default_voice).to_owned();
        let text = text.to_owned();
        let generation = self.pending.begin(AudioJob::Speech);
        self.status.is_generating_speech = true;
        self.status.message = "generating speech...".into();
        let tx = self.jobs_tx.clone();
        thread::spawn(move || {
            let result = synthesizer
                .synthesize(&text, &voice)
                .and_then(AudioAsset::decode);
            let _ = tx.send(JobOutcome::Audio {
                job: AudioJob::Speech,
                generation,
                result,
            });
        });
        Ok(())
    }

    /// Extracts the audio track of a video container on a background
    /// thread and installs the decoded result.
    pub fn load_video_audio(&mut self, container: Vec<u8>) -> Result<()> {
        self.ensure_transport_free()?;
        let Some(extractor) = self.track_extractor.clone() else {
            return Err(RigError::Extraction(
                "no track extractor is configured".into(),
            ));
        };

        let generation = self.pending.begin(AudioJob::VideoTrack);
        self.status.is_processing_video = true;
        self.status.message = "extracting audio track...".into();
        let tx = self.jobs_tx.clone();
        thread::spawn(move || {
            let result = extractor
                .extract_track(&container)
                .and_then(AudioAsset::decode);
            let _ = tx.send(JobOutcome::Audio {
                job: AudioJob::VideoTrack,
                generation,
                result,
            });
        });
        Ok(())
    }

    /// Starts playback from the current offset. `Ok(false)` when already
    /// running.
    pub fn play(&mut self) -> Result<bool> {
        self.ensure_transport_free()?;
        self.start_playback()
    }

    /// Pauses playback, keeping the current offset for resume. `Ok(false)`
    /// when nothing was running.
    pub fn pause(&mut self) -> Result<bool> {
        self.ensure_transport_free()?;
        let paused = self.transport.pause(self.now);
        if paused {
            self.status.is_playing = false;
            self.status.message = "paused".into();
        }
        Ok(paused)
    }

    /// Moves the playhead to `offset` seconds, clamped into the clip.
    pub fn seek(&mut self, offset: f64) -> Result<()> {
        self.ensure_transport_free()?;
        self.transport.seek(self.now, offset)
    }

    /// Sets the output volume in [0, 1]. Applies immediately, also while
    /// paused, and is never blocked by a recording session.
    pub fn set_volume(&mut self, volume: f32) {
        self.graph.set_gain(volume);
    }

    pub fn volume(&self) -> f32 {
        self.graph.gain()
    }

    pub fn set_emotion(&mut self, emotion: Emotion, value: f32) {
        self.base_emotion.set(emotion, value);
    }

    pub fn base_emotion(&self) -> EmotionVector {
        self.base_emotion
    }

    /// Draws a fresh gesture seed, shifting all oscillator phases.
    pub fn reroll_gesture_seed(&mut self) -> GestureSeed {
        self.seed = GestureSeed::roll();
        self.seed
    }

    pub fn set_gesture_seed(&mut self, seed: GestureSeed) {
        self.seed = seed;
    }

    pub fn gesture_seed(&self) -> GestureSeed {
        self.seed
    }

    /// Starts a recording session: playback is forced to the start, every
    /// tick captures one surface frame plus the processed audio, and the
    /// session resolves when playback reaches its natural end. The
    /// pre-recording transport position is restored afterwards. Poll
    /// [`RigEngine::take_export_result`] for the finished clip.
    pub fn export_video(
        &mut self,
        surface: Box<dyn VisualSurface>,
        target: ClipFormat,
    ) -> Result<()> {
        if self.session.is_some() || self.status.is_exporting {
            return Err(RigError::NotReady(
                "a recording session is already active".into(),
            ));
        }
        let Some(asset) = self.asset.as_ref() else {
            return Err(RigError::NotReady("no audio is loaded".into()));
        };
        if self.status.is_loading_audio
            || self.status.is_generating_speech
            || self.status.is_processing_video
        {
            return Err(RigError::NotReady("audio is still being prepared".into()));
        }

        let spec = CaptureSpec {
            width: surface.width(),
            height: surface.height(),
            fps: self.config.record.fps,
            sample_rate: asset.sample_rate(),
        };
        let mut encoder = self.encoder_factory.create(&spec)?;
        if encoder.format() != target && self.transcoder.is_none() {
            return Err(RigError::UnsupportedFormat(format!(
                "no transcoder available to produce {}",
                target.extension()
            )));
        }
        encoder.start(&spec).map_err(RigError::export)?;

        let saved = match self.transport.state() {
            PlaybackState::Running { .. } => SavedPosition::Running {
                offset: self.transport.position(self.now),
            },
            PlaybackState::Paused { offset } => SavedPosition::Paused { offset },
            PlaybackState::Empty => SavedPosition::Paused { offset: 0.0 },
        };

        // The clip always covers the full audio, so recording starts from
        // offset zero regardless of where the playhead was.
        self.transport.pause(self.now);
        if let Err(err) = self.transport.seek(self.now, 0.0) {
            self.restore_position(saved);
            return Err(RigError::export(err));
        }
        if let Err(err) = self.start_playback() {
            self.restore_position(saved);
            return Err(RigError::export(err));
        }

        self.graph.arm_capture();
        self.session = Some(ActiveSession::Capturing(RecordingSession::new(
            surface, encoder, target, saved,
        )));
        self.export_result = None;
        self.status.is_exporting = true;
        self.status.message = "recording clip...".into();
        info!(format = target.extension(), "recording session started");
        Ok(())
    }

    /// Takes the finished clip (or the failure) once a recording session
    /// has resolved.
    pub fn take_export_result(&mut self) -> Option<Result<MediaClip>> {
        self.export_result.take()
    }

    /// Takes the most recent background job failure.
    pub fn take_last_error(&mut self) -> Option<RigError> {
        self.last_error.take()
    }

    pub fn status(&self) -> &EngineStatus {
        &self.status
    }

    /// Shared read-only view of the latest published snapshot.
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.handle.clone()
    }

    pub fn position(&self) -> f64 {
        self.transport.position(self.now)
    }

    pub fn duration(&self) -> f64 {
        self.transport.duration()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_running()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn ensure_transport_free(&self) -> Result<()> {
        if self.session.is_some() || self.status.is_exporting {
            return Err(RigError::PlaybackUnavailable(
                "a recording session holds the transport".into(),
            ));
        }
        Ok(())
    }

    fn start_playback(&mut self) -> Result<bool> {
        let Some(asset) = self.asset.as_ref() else {
            return Err(RigError::PlaybackUnavailable("no audio is loaded".into()));
        };
        self.graph.ensure_connected(asset.sample_rate())?;
        let started = self.transport.play(self.now)?;
        if started {
            self.status.is_playing = true;
            self.status.message = "playing".into();
            debug!(position = self.transport.position(self.now), "playback started");
        }
        Ok(started)
    }

    fn install_asset(&mut self, asset: AudioAsset) {
        info!(
            duration = asset.duration_seconds(),
            sample_rate = asset.sample_rate(),
            "audio installed"
        );
        self.transport.load(asset.duration_seconds());
        self.graph.reset_tap();
        self.extractor.reset();
        self.animator.reset();
        self.status.has_audio = true;
        self.status.is_playing = false;
        self.status.audio_duration = asset.duration_seconds();
        self.status.message = "audio ready".into();
        self.asset = Some(asset);
    }

    fn drain_jobs(&mut self) {
        while let Ok(outcome) = self.jobs_rx.try_recv() {
            match outcome {
                JobOutcome::Audio {
                    job,
                    generation,
                    result,
                } => {
                    self.pending.finish(job);
                    self.update_job_flag(job);
                    if !self.pending.is_current(generation) {
                        debug!(?job, "discarding superseded audio job result");
                        continue;
                    }
                    if self.session.is_some() {
                        warn!(?job, "discarding audio job result while a session is active");
                        continue;
                    }
                    match result {
                        Ok(asset) => self.install_asset(asset),
                        Err(err) => {
                            warn!(error = %err, ?job, "background audio job failed");
                            self.status.message = err.to_string();
                            self.last_error = Some(err);
                        }
                    }
                }
                JobOutcome::Transcode { result } => match self.session.take() {
                    Some(ActiveSession::Transcoding { saved }) => match result {
                        Ok(clip) => self.finish_export_success(clip, saved),
                        Err(err) => self.abort_export(saved, err),
                    },
                    other => self.session = other,
                },
            }
        }
    }

    fn update_job_flag(&mut self, job: AudioJob) {
        let busy = self.pending.busy(job);
        match job {
            AudioJob::Load => self.status.is_loading_audio = busy,
            AudioJob::Speech => self.status.is_generating_speech = busy,
            AudioJob::VideoTrack => self.status.is_processing_video = busy,
        }
    }

    /// Advances an active recording session by one tick: feed it the
    /// tick's processed audio, or close it out once playback has ended.
    fn step_recording(&mut self, ended: bool) {
        let Some(active) = self.session.take() else {
            return;
        };
        let mut session = match active {
            ActiveSession::Capturing(session) => session,
            transcoding @ ActiveSession::Transcoding { .. } => {
                self.session = Some(transcoding);
                return;
            }
        };

        if ended {
            self.graph.disarm_capture();
            let saved = session.saved();
            let target = session.target();
            let needs_transcode = session.needs_transcode();
            match session.finalize() {
                Ok(clip) if needs_transcode => {
                    let Some(transcoder) = self.transcoder.clone() else {
                        self.abort_export(
                            saved,
                            RigError::UnsupportedFormat(
                                "clip transcoding is not configured".into(),
                            ),
                        );
                        return;
                    };
                    self.session = Some(ActiveSession::Transcoding { saved });
                    self.status.message = "transcoding clip...".into();
                    let tx = self.jobs_tx.clone();
                    thread::spawn(move || {
                        let result = transcoder.transcode(clip, target).map_err(RigError::export);
                        let _ = tx.send(JobOutcome::Transcode { result });
                    });
                }
                Ok(clip) => self.finish_export_success(clip, saved),
                Err(err) => self.abort_export(saved, RigError::export(err)),
            }
            return;
        }

        let audio = self.graph.drain_capture();
        match session.step(&audio) {
            Ok(()) => self.session = Some(ActiveSession::Capturing(session)),
            Err(err) => {
                let saved = session.saved();
                self.abort_export(saved, RigError::export(err));
            }
        }
    }

    fn finish_export_success(&mut self, clip: MediaClip, saved: SavedPosition) {
        info!(
            format = clip.format.extension(),
            bytes = clip.bytes.len(),
            "recording session finished"
        );
        self.restore_position(saved);
        self.session = None;
        self.status.is_exporting = false;
        self.status.message = "clip ready".into();
        self.export_result = Some(Ok(clip));
    }

    fn abort_export(&mut self, saved: SavedPosition, err: RigError) {
        warn!(error = %err, "recording session failed");
        self.restore_position(saved);
        self.session = None;
        self.status.is_exporting = false;
        self.status.message = err.to_string();
        self.export_result = Some(Err(err));
    }

    /// Best effort: a failure to put the playhead back must not turn a
    /// finished export into an error.
    fn restore_position(&mut self, saved: SavedPosition) {
        self.graph.disarm_capture();
        let result = match saved {
            SavedPosition::Paused { offset } => {
                self.transport.pause(self.now);
                self.transport.seek(self.now, offset)
            }
            SavedPosition::Running { offset } => {
                self.transport.pause(self.now);
                match self.transport.seek(self.now, offset) {
                    Ok(()) => self.start_playback().map(|_| ()),
                    Err(err) => Err(err),
                }
            }
        };
        if let Err(err) = result {
            warn!(error = %err, "could not restore pre-recording playback position");
        }
        self.status.is_playing = self.transport.is_running();
    }
}

impl fmt::Debug for RigEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigEngine")
            .field("status", &self.status)
            .field("transport", &self.transport)
            .field("graph", &self.graph)
            .field("has_session", &self.session.is_some())
            .finish()
    }
}

impl Drop for RigEngine {
    fn drop(&mut self) {
        self.transport.unload();
        self.graph.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::record::{ClipEncoder, SurfaceFrame};

    fn engine() -> RigEngine {
        RigEngine::headless(EngineConfig::default())
    }

    fn tone_asset(seconds: f64) -> AudioAsset {
        let rate = 1_000;
        let frames = (seconds * rate as f64) as usize;
        AudioAsset::from_mono(vec![0.4; frames], rate)
    }

    fn loaded_engine(seconds: f64) -> RigEngine {
        let mut engine = engine();
        engine
            .load_asset(tone_asset(seconds))
            .expect("loading a decoded asset should succeed");
        engine
    }

    fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec)
                .expect("wav writer should open");
            for sample in samples {
                writer.write_sample(*sample).expect("sample should write");
            }
            writer.finalize().expect("wav should finalize");
        }
        bytes
    }

    /// Ticks the engine forward until the predicate holds, giving
    /// background threads a moment to run.
    fn pump_until(
        engine: &mut RigEngine,
        now: &mut f64,
        predicate: impl Fn(&RigEngine) -> bool,
    ) -> bool {
        for _ in 0..500 {
            *now += 0.02;
            engine.tick(*now);
            if predicate(engine) {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    struct PixelSurface;

    impl VisualSurface for PixelSurface {
        fn width(&self) -> u32 {
            2
        }

        fn height(&self) -> u32 {
            2
        }

        fn capture_frame(&mut self) -> Result<SurfaceFrame> {
            Ok(SurfaceFrame {
                width: 2,
                height: 2,
                rgba: vec![255; 16],
            })
        }
    }

    struct LostSurface;

    impl VisualSurface for LostSurface {
        fn width(&self) -> u32 {
            2
        }

        fn height(&self) -> u32 {
            2
        }

        fn capture_frame(&mut self) -> Result<SurfaceFrame> {
            Err(RigError::msg("surface context lost"))
        }
    }

    struct StubSynth {
        wav: Vec<u8>,
    }

    impl SpeechSynthesizer for StubSynth {
        fn synthesize(&self, _text: &str, _voice: &str) -> Result<Vec<u8>> {
            Ok(self.wav.clone())
        }
    }

    struct FailingSynth;

    impl SpeechSynthesizer for FailingSynth {
        fn synthesize(&self, _text: &str, _voice: &str) -> Result<Vec<u8>> {
            Err(RigError::Synthesis("voice model unavailable".into()))
        }
    }

    /// Holds each scripted response, keyed by the request text, until its
    /// gate fires. Lets a test decide in which order overlapping requests
    /// complete.
    struct GatedSynth {
        scripts: Mutex<HashMap<String, (Receiver<()>, Vec<u8>)>>,
    }

    impl SpeechSynthesizer for GatedSynth {
        fn synthesize(&self, text: &str, _voice: &str) -> Result<Vec<u8>> {
            let script = self
                .scripts
                .lock()
                .expect("script table should lock")
                .remove(text);
            let Some((gate, wav)) = script else {
                return Err(RigError::Synthesis(format!("no script for {text:?}")));
            };
            gate.recv()
                .map_err(|_| RigError::Synthesis("gate sender dropped".into()))?;
            Ok(wav)
        }
    }

    fn gated_synth(scripts: Vec<(&str, Vec<u8>)>) -> (Arc<GatedSynth>, Vec<Sender<()>>) {
        let mut gates = Vec::new();
        let mut table = HashMap::new();
        for (text, wav) in scripts {
            let (tx, rx) = unbounded();
            gates.push(tx);
            table.insert(text.to_owned(), (rx, wav));
        }
        let synth = Arc::new(GatedSynth {
            scripts: Mutex::new(table),
        });
        (synth, gates)
    }

    struct StubExtractor {
        wav: Vec<u8>,
        requested: Mutex<Vec<usize>>,
    }

    impl TrackExtractor for StubExtractor {
        fn extract_track(&self, container: &[u8]) -> Result<Vec<u8>> {
            self.requested
                .lock()
                .expect("request log should lock")
                .push(container.len());
            Ok(self.wav.clone())
        }
    }

    struct RelabelTranscoder;

    impl ClipTranscoder for RelabelTranscoder {
        fn transcode(&self, clip: MediaClip, target: ClipFormat) -> Result<MediaClip> {
            Ok(MediaClip {
                format: target,
                bytes: clip.bytes,
            })
        }
    }

    struct FailingTranscoder;

    impl ClipTranscoder for FailingTranscoder {
        fn transcode(&self, _clip: MediaClip, _target: ClipFormat) -> Result<MediaClip> {
            Err(RigError::msg("transcode backend crashed"))
        }
    }

    struct ExplodingEncoder;

    impl ClipEncoder for ExplodingEncoder {
        fn format(&self) -> ClipFormat {
            ClipFormat::Wav
        }

        fn start(&mut self, _spec: &CaptureSpec) -> Result<()> {
            Ok(())
        }

        fn push(&mut self, _frame: &SurfaceFrame, _audio: &[f32]) -> Result<Option<Vec<u8>>> {
            Err(RigError::msg("encoder backend lost"))
        }

        fn finish(&mut self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    struct ExplodingFactory;

    impl EncoderFactory for ExplodingFactory {
        fn create(&self, _spec: &CaptureSpec) -> Result<Box<dyn ClipEncoder>> {
            Ok(Box::new(ExplodingEncoder))
        }
    }

    struct RefusingFactory;

    impl EncoderFactory for RefusingFactory {
        fn create(&self, _spec: &CaptureSpec) -> Result<Box<dyn ClipEncoder>> {
            Err(RigError::UnsupportedFormat(
                "no encoder for this capture spec".into(),
            ))
        }
    }

    /// Runs a recording session to completion and returns its resolution.
    fn run_export(engine: &mut RigEngine, now: &mut f64) -> Result<MediaClip> {
        assert!(pump_until(engine, now, |e| !e.status().is_exporting));
        engine
            .take_export_result()
            .expect("export should have resolved")
    }

    #[test]
    fn play_without_audio_is_unavailable() {
        let mut engine = engine();
        let err = engine.play().expect_err("no audio means no playback");
        assert!(matches!(err, RigError::PlaybackUnavailable(_)));
        assert!(!engine.status().is_playing);
    }

    #[test]
    fn play_pause_round_trip_preserves_offset() {
        let mut engine = loaded_engine(10.0);
        engine.tick(0.0);
        assert!(engine.play().expect("play should start"));

        engine.tick(2.0);
        assert!(engine.status().is_playing);
        assert!(engine.pause().expect("pause should succeed"));
        assert!((engine.position() - 2.0).abs() < 1e-9);
        assert!(!engine.status().is_playing);

        assert!(engine.play().expect("resume should start"));
        engine.tick(3.5);
        assert!((engine.position() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn redundant_play_and_pause_are_no_ops() {
        let mut engine = loaded_engine(10.0);
        engine.tick(0.0);
        assert!(!engine.pause().expect("pause while paused is a no-op"));
        assert!(engine.play().expect("play should start"));
        assert!(!engine.play().expect("play while running is a no-op"));
    }

    #[test]
    fn seek_round_trips_while_paused() {
        let mut engine = loaded_engine(10.0);
        engine.tick(0.0);
        engine.seek(4.2).expect("seek should succeed");
        assert!((engine.position() - 4.2).abs() < 1e-9);

        engine.seek(-3.0).expect("seek should clamp");
        assert_eq!(engine.position(), 0.0);
        engine.seek(99.0).expect("seek should clamp");
        assert!(engine.position() < 10.0);
    }

    #[test]
    fn natural_end_pauses_at_the_start() {
        let mut engine = loaded_engine(1.0);
        engine.tick(0.0);
        engine.play().expect("play should start");

        engine.tick(0.6);
        engine.tick(1.2);
        assert!(engine.status().is_playing, "end applies on the next tick");
        engine.tick(1.3);

        assert!(!engine.status().is_playing);
        assert_eq!(engine.position(), 0.0);
        assert_eq!(engine.status().message, "finished");
    }

    #[test]
    fn short_clip_play_pause_seek_cycle() {
        let mut engine = loaded_engine(2.0);
        engine.tick(0.0);
        engine.play().expect("play should start");

        engine.tick(1.0);
        engine.pause().expect("pause should succeed");
        assert!((engine.position() - 1.0).abs() < 1e-9);

        engine.seek(0.5).expect("seek should succeed");
        engine.play().expect("resume should start");
        engine.tick(1.5);
        assert!((engine.position() - 1.0).abs() < 1e-9);

        engine.tick(2.5);
        engine.tick(2.6);
        assert!(!engine.status().is_playing);
        assert_eq!(engine.position(), 0.0);
    }

    #[test]
    fn loading_new_audio_mid_playback_resets_transport() {
        let mut engine = loaded_engine(10.0);
        engine.tick(0.0);
        engine.play().expect("play should start");
        engine.tick(1.0);

        engine
            .load_asset(tone_asset(3.0))
            .expect("replacement load should succeed");
        assert!(!engine.status().is_playing);
        assert_eq!(engine.position(), 0.0);
        assert_eq!(engine.duration(), 3.0);
        assert!(engine.status().has_audio);
    }

    #[test]
    fn volume_zero_does_not_silence_analysis() {
        let mut engine = loaded_engine(5.0);
        engine.set_volume(0.0);
        assert_eq!(engine.volume(), 0.0);

        engine.tick(0.0);
        engine.play().expect("play should start");
        let mut peak_energy = 0.0_f32;
        for i in 1..40 {
            let snapshot = engine.tick(i as f64 * 0.1);
            peak_energy = peak_energy.max(snapshot.energy);
        }
        assert!(peak_energy > 0.5, "energy peaked at {peak_energy}");
    }

    #[test]
    fn set_emotion_flows_into_the_snapshot() {
        let mut engine = loaded_engine(5.0);
        engine.set_emotion(Emotion::Happy, 1.0);
        assert_eq!(engine.base_emotion().happy, 1.0);

        let snapshot = engine.tick(0.0);
        assert!(snapshot.emotion_mix.happy > 0.0);
    }

    #[test]
    fn reroll_replaces_the_stored_seed() {
        let mut engine = engine();
        engine.set_gesture_seed(GestureSeed::from_value(0.25));
        let rolled = engine.reroll_gesture_seed();
        assert_eq!(engine.gesture_seed(), rolled);
        assert!((0.0..1.0).contains(&rolled.value()));
    }

    #[test]
    fn tick_publishes_through_the_handle() {
        let mut engine = loaded_engine(1.0);
        let handle = engine.snapshot_handle();
        let snapshot = engine.tick(0.5);
        let published = handle.get().expect("handle should read");
        assert_eq!(snapshot, published);
    }

    #[test]
    fn backward_clock_values_are_clamped() {
        let mut engine = loaded_engine(10.0);
        engine.tick(5.0);
        engine.play().expect("play should start");
        engine.tick(6.0);
        let before = engine.position();
        engine.tick(1.0);
        assert!(engine.position() >= before);
    }

    #[test]
    fn export_without_audio_is_not_ready() {
        let mut engine = engine();
        let err = engine
            .export_video(Box::new(PixelSurface), ClipFormat::Wav)
            .expect_err("no audio means nothing to record");
        assert!(matches!(err, RigError::NotReady(_)));
        assert!(!engine.status().is_exporting);
        assert!(engine.take_export_result().is_none());
    }

    #[test]
    fn export_while_audio_is_preparing_is_not_ready() {
        let mut engine = loaded_engine(1.0);
        engine
            .load_audio(wav_bytes(&[0.1; 400], 1_000))
            .expect("background load should start");
        let err = engine
            .export_video(Box::new(PixelSurface), ClipFormat::Wav)
            .expect_err("decode in flight should block recording");
        assert!(matches!(err, RigError::NotReady(_)));
    }

    #[test]
    fn export_produces_wav_and_restores_paused_offset() {
        let mut engine = loaded_engine(1.0);
        let mut now = 0.0;
        engine.tick(now);
        engine.seek(0.25).expect("seek should succeed");

        engine
            .export_video(Box::new(PixelSurface), ClipFormat::Wav)
            .expect("export should start");
        assert!(engine.status().is_exporting);
        assert!(engine.is_playing(), "recording forces playback");
        assert_eq!(engine.position(), 0.0);

        let clip = run_export(&mut engine, &mut now).expect("export should succeed");
        assert_eq!(clip.format, ClipFormat::Wav);

        let mut reader =
            hound::WavReader::new(Cursor::new(&clip.bytes)).expect("clip should be valid wav");
        assert_eq!(reader.spec().sample_rate, 1_000);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 1_000, "full clip audio captured");
        assert!((samples[500] - 0.4).abs() < 1e-6);

        assert!(!engine.status().is_playing);
        assert!((engine.position() - 0.25).abs() < 1e-9);
        assert_eq!(engine.status().message, "clip ready");
    }

    #[test]
    fn export_restores_running_playback() {
        let mut engine = loaded_engine(1.0);
        let mut now = 0.0;
        engine.tick(now);
        engine.play().expect("play should start");
        now = 0.2;
        engine.tick(now);

        engine
            .export_video(Box::new(PixelSurface), ClipFormat::Wav)
            .expect("export should start");
        run_export(&mut engine, &mut now).expect("export should succeed");

        assert!(engine.status().is_playing, "playback resumes after export");
        assert!(engine.position() >= 0.2 - 1e-9);
    }

    #[test]
    fn export_rejects_transport_calls_mid_session() {
        let mut engine = loaded_engine(1.0);
        let mut now = 0.0;
        engine.tick(now);
        engine
            .export_video(Box::new(PixelSurface), ClipFormat::Wav)
            .expect("export should start");

        assert!(matches!(engine.play(), Err(RigError::PlaybackUnavailable(_))));
        assert!(matches!(engine.pause(), Err(RigError::PlaybackUnavailable(_))));
        assert!(matches!(engine.seek(0.5), Err(RigError::PlaybackUnavailable(_))));
        assert!(matches!(
            engine.load_asset(tone_asset(1.0)),
            Err(RigError::PlaybackUnavailable(_))
        ));
        assert!(matches!(
            engine.load_audio(vec![1, 2, 3]),
            Err(RigError::PlaybackUnavailable(_))
        ));
        assert!(matches!(
            engine.synthesize_speech("mid-session", None),
            Err(RigError::PlaybackUnavailable(_))
        ));
        assert!(matches!(
            engine.load_video_audio(vec![4, 5, 6]),
            Err(RigError::PlaybackUnavailable(_))
        ));
        // Volume stays adjustable during recording.
        engine.set_volume(0.5);
        assert_eq!(engine.volume(), 0.5);

        run_export(&mut engine, &mut now).expect("export should succeed");
        assert!(engine.play().is_ok(), "transport frees up after the session");
    }

    #[test]
    fn export_to_foreign_format_requires_a_transcoder() {
        let mut engine = loaded_engine(1.0);
        engine.tick(0.0);
        let err = engine
            .export_video(Box::new(PixelSurface), ClipFormat::Mp4)
            .expect_err("wav encoder cannot deliver mp4 without a transcoder");
        assert!(matches!(err, RigError::UnsupportedFormat(_)));
        assert!(!engine.status().is_exporting);
    }

    #[test]
    fn export_transcodes_into_the_requested_format() {
        let mut engine = loaded_engine(1.0);
        engine.set_transcoder(Arc::new(RelabelTranscoder));
        let mut now = 0.0;
        engine.tick(now);

        engine
            .export_video(Box::new(PixelSurface), ClipFormat::Mp4)
            .expect("export should start");
        let clip = run_export(&mut engine, &mut now).expect("export should succeed");
        assert_eq!(clip.format, ClipFormat::Mp4);
        assert!(!clip.bytes.is_empty());
    }

    #[test]
    fn transcoder_failure_surfaces_as_export_error() {
        let mut engine = loaded_engine(1.0);
        engine.set_transcoder(Arc::new(FailingTranscoder));
        let mut now = 0.0;
        engine.tick(now);
        engine.seek(0.3).expect("seek should succeed");

        engine
            .export_video(Box::new(PixelSurface), ClipFormat::Webm)
            .expect("export should start");
        let err = run_export(&mut engine, &mut now).expect_err("transcode should fail");
        assert!(matches!(err, RigError::Export(_)));
        assert!((engine.position() - 0.3).abs() < 1e-9, "position restored");
    }

    #[test]
    fn encoder_failure_aborts_and_restores() {
        let mut engine = loaded_engine(1.0);
        engine.set_encoder_factory(Arc::new(ExplodingFactory));
        let mut now = 0.0;
        engine.tick(now);
        engine.seek(0.5).expect("seek should succeed");

        engine
            .export_video(Box::new(PixelSurface), ClipFormat::Wav)
            .expect("export should start");
        let err = run_export(&mut engine, &mut now).expect_err("encoder should fail");
        assert!(matches!(err, RigError::Export(_)));
        assert!(!engine.status().is_exporting);
        assert!((engine.position() - 0.5).abs() < 1e-9);
        assert!(!engine.status().message.is_empty());
    }

    #[test]
    fn surface_failure_aborts_the_session() {
        let mut engine = loaded_engine(1.0);
        let mut now = 0.0;
        engine.tick(now);

        engine
            .export_video(Box::new(LostSurface), ClipFormat::Wav)
            .expect("export should start");
        let err = run_export(&mut engine, &mut now).expect_err("capture should fail");
        assert!(matches!(err, RigError::Export(_)));
        assert!(!engine.status().is_playing);
    }

    #[test]
    fn factory_rejection_leaves_the_transport_untouched() {
        let mut engine = loaded_engine(1.0);
        engine.set_encoder_factory(Arc::new(RefusingFactory));
        engine.tick(0.0);
        engine.seek(0.4).expect("seek should succeed");

        let err = engine
            .export_video(Box::new(PixelSurface), ClipFormat::Wav)
            .expect_err("factory refuses");
        assert!(matches!(err, RigError::UnsupportedFormat(_)));
        assert!((engine.position() - 0.4).abs() < 1e-9);
        assert!(!engine.status().is_exporting);
    }

    #[test]
    fn background_load_installs_decoded_audio() {
        let mut engine = engine();
        let mut now = 0.0;
        engine
            .load_audio(wav_bytes(&[0.2; 800], 1_000))
            .expect("background load should start");
        assert!(engine.status().is_loading_audio);

        assert!(pump_until(&mut engine, &mut now, |e| e.status().has_audio));
        assert!(!engine.status().is_loading_audio);
        assert!((engine.duration() - 0.8).abs() < 1e-6);
        assert_eq!(engine.status().message, "audio ready");
    }

    #[test]
    fn failed_load_preserves_the_existing_audio() {
        let mut engine = loaded_engine(1.0);
        let mut now = 0.0;
        engine
            .load_audio(vec![0xDE, 0xAD, 0xBE, 0xEF])
            .expect("background load should start");

        assert!(pump_until(&mut engine, &mut now, |e| {
            !e.status().is_loading_audio
        }));
        assert!(engine.status().has_audio, "old asset survives a bad load");
        assert_eq!(engine.duration(), 1.0);
        let err = engine.take_last_error().expect("failure should be stored");
        assert!(matches!(err, RigError::Decode(_)));
        assert_ne!(engine.status().message, "audio ready");
    }

    #[test]
    fn speech_synthesis_installs_decoded_audio() {
        let mut engine = engine();
        engine.set_synthesizer(Arc::new(StubSynth {
            wav: wav_bytes(&[0.3; 500], 1_000),
        }));
        let mut now = 0.0;

        engine
            .synthesize_speech("hello there", None)
            .expect("synthesis should start");
        assert!(engine.status().is_generating_speech);

        assert!(pump_until(&mut engine, &mut now, |e| e.status().has_audio));
        assert!(!engine.status().is_generating_speech);
        assert!((engine.duration() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn speech_failure_clears_the_flag_and_sets_the_message() {
        let mut engine = engine();
        engine.set_synthesizer(Arc::new(FailingSynth));
        let mut now = 0.0;

        engine
            .synthesize_speech("hello", None)
            .expect("synthesis should start");
        assert!(pump_until(&mut engine, &mut now, |e| {
            !e.status().is_generating_speech
        }));

        assert!(!engine.status().has_audio);
        let err = engine.take_last_error().expect("failure should be stored");
        assert!(matches!(err, RigError::Synthesis(_)));
        assert!(engine.status().message.contains("synthesis"));
    }

    #[test]
    fn over_long_speech_text_is_rejected() {
        let mut engine = engine();
        engine.set_synthesizer(Arc::new(FailingSynth));
        let cap = engine.config().speech.max_text_chars;
        let text = "a".repeat(cap + 1);

        let err = engine
            .synthesize_speech(&text, None)
            .expect_err("over-long text must be rejected");
        assert!(matches!(err, RigError::Synthesis(_)));
        assert!(!engine.status().is_generating_speech);

        assert!(matches!(
            engine.synthesize_speech("   ", None),
            Err(RigError::Synthesis(_))
        ));
    }

    #[test]
    fn speech_without_a_synthesizer_is_rejected() {
        let mut engine = engine();
        let err = engine
            .synthesize_speech("hello", None)
            .expect_err("no synthesizer configured");
        assert!(matches!(err, RigError::Synthesis(_)));
    }

    #[test]
    fn overlapping_speech_jobs_never_wedge_a_recording() {
        let (synth, gates) = gated_synth(vec![
            ("first take", wav_bytes(&[0.2; 400], 1_000)),
            ("second take", wav_bytes(&[0.3; 500], 1_000)),
        ]);
        let mut engine = loaded_engine(1.0);
        engine.set_synthesizer(synth);
        let mut now = 0.0;
        engine.tick(now);

        engine
            .synthesize_speech("first take", None)
            .expect("first request should start");
        engine
            .synthesize_speech("second take", None)
            .expect("second request should start");

        gates[0].send(()).expect("first gate should open");
        for _ in 0..50 {
            now += 0.02;
            engine.tick(now);
            thread::sleep(Duration::from_millis(1));
        }
        assert!(
            engine.status().is_generating_speech,
            "the second request keeps the flag up"
        );
        assert_eq!(engine.duration(), 1.0, "superseded speech is not installed");
        let err = engine
            .export_video(Box::new(PixelSurface), ClipFormat::Wav)
            .expect_err("recording must wait until speech settles");
        assert!(matches!(err, RigError::NotReady(_)));

        gates[1].send(()).expect("second gate should open");
        assert!(pump_until(&mut engine, &mut now, |e| {
            !e.status().is_generating_speech
        }));
        assert!((engine.duration() - 0.5).abs() < 1e-6);

        engine
            .export_video(Box::new(PixelSurface), ClipFormat::Wav)
            .expect("export should start once speech settles");
        let clip = run_export(&mut engine, &mut now).expect("export should succeed");
        let mut reader =
            hound::WavReader::new(Cursor::new(&clip.bytes)).expect("clip should be valid wav");
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 500, "clip covers the installed take");
        assert!((samples[250] - 0.3).abs() < 1e-6);
        assert!(!engine.status().is_exporting);
    }

    #[test]
    fn latest_speech_request_wins_out_of_order_completion() {
        let (synth, gates) = gated_synth(vec![
            ("slow draft", wav_bytes(&[0.2; 400], 1_000)),
            ("final cut", wav_bytes(&[0.3; 700], 1_000)),
        ]);
        let mut engine = engine();
        engine.set_synthesizer(synth);
        let mut now = 0.0;

        engine
            .synthesize_speech("slow draft", None)
            .expect("first request should start");
        engine
            .synthesize_speech("final cut", None)
            .expect("second request should start");

        // The newer request finishes first.
        gates[1].send(()).expect("second gate should open");
        assert!(pump_until(&mut engine, &mut now, |e| e.status().has_audio));
        assert!((engine.duration() - 0.7).abs() < 1e-6);
        assert!(
            engine.status().is_generating_speech,
            "the straggler keeps the flag up"
        );

        // The stale straggler lands afterwards and is discarded.
        gates[0].send(()).expect("first gate should open");
        assert!(pump_until(&mut engine, &mut now, |e| {
            !e.status().is_generating_speech
        }));
        assert!((engine.duration() - 0.7).abs() < 1e-6, "newer take survives");
    }

    #[test]
    fn direct_load_supersedes_an_in_flight_speech_job() {
        let (synth, gates) = gated_synth(vec![("stale take", wav_bytes(&[0.2; 400], 1_000))]);
        let mut engine = engine();
        engine.set_synthesizer(synth);
        let mut now = 0.0;

        engine
            .synthesize_speech("stale take", None)
            .expect("request should start");
        engine
            .load_asset(tone_asset(2.0))
            .expect("direct load should succeed");
        assert_eq!(engine.duration(), 2.0);

        gates[0].send(()).expect("gate should open");
        assert!(pump_until(&mut engine, &mut now, |e| {
            !e.status().is_generating_speech
        }));
        assert_eq!(engine.duration(), 2.0, "direct load survives the straggler");
        assert_eq!(engine.status().message, "audio ready");
    }

    #[test]
    fn video_track_extraction_installs_audio() {
        let mut engine = engine();
        let extractor = Arc::new(StubExtractor {
            wav: wav_bytes(&[0.1; 250], 1_000),
            requested: Mutex::new(Vec::new()),
        });
        engine.set_track_extractor(extractor.clone());
        let mut now = 0.0;

        engine
            .load_video_audio(vec![9; 64])
            .expect("extraction should start");
        assert!(engine.status().is_processing_video);

        assert!(pump_until(&mut engine, &mut now, |e| e.status().has_audio));
        assert!(!engine.status().is_processing_video);
        assert!((engine.duration() - 0.25).abs() < 1e-6);
        assert_eq!(*extractor.requested.lock().unwrap(), vec![64]);
    }

    #[test]
    fn video_extraction_without_extractor_is_rejected() {
        let mut engine = engine();
        let err = engine
            .load_video_audio(vec![1, 2, 3])
            .expect_err("no extractor configured");
        assert!(matches!(err, RigError::Extraction(_)));
        assert!(!engine.status().is_processing_video);
    }

    #[test]
    fn idle_engine_emits_neutral_snapshots() {
        let mut engine = engine();
        let snapshot = engine.tick(0.0);
        assert_eq!(snapshot.energy, 0.0);
        assert_eq!(snapshot.mouth_open, 0.0);
        assert!(snapshot.emotion_mix.neutral > 0.9);

        // Gestures keep idling without audio.
        let later = engine.tick(3.0);
        assert_ne!(later.head_rotation, snapshot.head_rotation);
    }
}
