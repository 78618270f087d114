//! Playback transport state machine.
//!
//! The transport owns the play/pause/seek lifecycle and the single active
//! source node feeding the audio graph. Position is derived, never stored:
//! while running it is `now - clock_start`, so pausing and resuming is a
//! matter of capturing and re-anchoring the clock.

use serde::{Deserialize, Serialize};

use crate::{asset::AudioAsset, graph::AudioGraph, Result, RigError};

/// Offsets are clamped just short of the end so a seek to `duration`
/// cannot immediately re-trigger the end signal.
const END_GUARD_SECONDS: f64 = 1.0e-6;

/// The three transport states. `Paused` remembers the offset to resume
/// from; `Running` remembers where the clock was anchored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No audio loaded.
    Empty,
    /// Audio loaded, not playing. `offset` is the resume position.
    Paused { offset: f64 },
    /// Playing. Position is `now - clock_start`.
    Running { clock_start: f64 },
}

/// One live pass over the source audio. A node is created on every
/// play/seek and retired on pause/seek/load, so a queued end signal can be
/// matched against the node that produced it.
#[derive(Debug)]
struct SourceNode {
    id: u64,
    /// Position up to which samples have been fed into the graph.
    pumped: f64,
    ended: bool,
}

/// Playback transport: state machine plus the pump that feeds the audio
/// graph from the loaded asset.
#[derive(Debug)]
pub struct Transport {
    state: PlaybackState,
    node: Option<SourceNode>,
    next_node_id: u64,
    /// End signal queued by the pump, tagged with the emitting node's id.
    /// Processed at the start of the next tick; retiring the node purges
    /// it, which is what suppresses stale end signals after a seek.
    pending_end: Option<u64>,
    duration: f64,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Empty,
            node: None,
            next_node_id: 0,
            pending_end: None,
            duration: 0.0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PlaybackState::Running { .. })
    }

    /// Installs new audio. Any current playback stops and the transport
    /// lands paused at the start.
    pub fn load(&mut self, duration: f64) {
        self.retire_node();
        self.duration = duration.max(0.0);
        self.state = PlaybackState::Paused { offset: 0.0 };
    }

    /// Drops the loaded audio and returns to `Empty`.
    pub fn unload(&mut self) {
        self.retire_node();
        self.duration = 0.0;
        self.state = PlaybackState::Empty;
    }

    /// Starts playback from the paused offset. Returns `Ok(false)` when
    /// already running; starting with no audio loaded is an error.
    pub fn play(&mut self, now: f64) -> Result<bool> {
        match self.state {
            PlaybackState::Empty => {
                Err(RigError::PlaybackUnavailable("no audio is loaded".into()))
            }
            PlaybackState::Running { .. } => Ok(false),
            PlaybackState::Paused { offset } => {
                self.spawn_node(offset);
                self.state = PlaybackState::Running {
                    clock_start: now - offset,
                };
                Ok(true)
            }
        }
    }

    /// Pauses playback, capturing the current position as the resume
    /// offset. Returns `false` when nothing was running.
    pub fn pause(&mut self, now: f64) -> bool {
        match self.state {
            PlaybackState::Running { clock_start } => {
                let offset = (now - clock_start).clamp(0.0, self.duration);
                self.retire_node();
                self.state = PlaybackState::Paused { offset };
                true
            }
            _ => false,
        }
    }

    /// Moves the playhead. While running the stream restarts from the new
    /// offset on a fresh node; while paused only the stored offset moves.
    pub fn seek(&mut self, now: f64, offset: f64) -> Result<()> {
        let offset = offset.clamp(0.0, (self.duration - END_GUARD_SECONDS).max(0.0));
        match self.state {
            PlaybackState::Empty => {
                Err(RigError::PlaybackUnavailable("no audio is loaded".into()))
            }
            PlaybackState::Paused { .. } => {
                self.state = PlaybackState::Paused { offset };
                Ok(())
            }
            PlaybackState::Running { .. } => {
                self.retire_node();
                self.spawn_node(offset);
                self.state = PlaybackState::Running {
                    clock_start: now - offset,
                };
                Ok(())
            }
        }
    }

    /// Current playhead position in seconds.
    pub fn position(&self, now: f64) -> f64 {
        match self.state {
            PlaybackState::Empty => 0.0,
            PlaybackState::Paused { offset } => offset,
            PlaybackState::Running { clock_start } => {
                (now - clock_start).clamp(0.0, self.duration)
            }
        }
    }

    /// Handles any queued end signal. Must run at the start of a tick,
    /// before the pump. Returns `true` when playback genuinely finished;
    /// signals from retired nodes are dropped silently.
    pub fn process_end_signals(&mut self) -> bool {
        let Some(id) = self.pending_end.take() else {
            return false;
        };
        if self.node.as_ref().map(|node| node.id) != Some(id) {
            return false;
        }
        self.retire_node();
        self.state = PlaybackState::Paused { offset: 0.0 };
        true
    }

    /// Feeds the graph all source samples between the last pump and the
    /// current position. Queues the end signal once the playhead crosses
    /// the end of the asset.
    pub fn pump(&mut self, now: f64, asset: &AudioAsset, graph: &mut AudioGraph) {
        let PlaybackState::Running { clock_start } = self.state else {
            return;
        };
        let Some(node) = self.node.as_mut() else {
            return;
        };

        let position = (now - clock_start).max(0.0);
        let sample_rate = asset.sample_rate() as f64;
        let frames = asset.frame_count();
        let from = ((node.pumped * sample_rate) as usize).min(frames);
        let to = ((position * sample_rate) as usize).min(frames);
        if to > from {
            graph.process_block(&asset.mono()[from..to]);
        }
        node.pumped = position.min(self.duration);

        if position >= self.duration && !node.ended {
            node.ended = true;
            self.pending_end = Some(node.id);
        }
    }

    fn spawn_node(&mut self, offset: f64) {
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.node = Some(SourceNode {
            id,
            pumped: offset,
            ended: false,
        });
    }

    /// Drops the active node and purges any end signal it queued.
    fn retire_node(&mut self) {
        if let Some(node) = self.node.take() {
            if self.pending_end == Some(node.id) {
                self.pending_end = None;
            }
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
