//! Speaker output backend built on cpal.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{info, warn};
use voicerig_core::{OutputBackend, Result, RigError};

/// Cap on queued audio so a stalled stream cannot grow the backlog
/// without bound.
const MAX_BACKLOG_SECONDS: u32 = 2;

/// Speaker backend: pumped blocks are queued here and drained by the cpal
/// stream callback, which pads with silence when the queue runs dry.
pub struct CpalOutput {
    queue: Arc<Mutex<VecDeque<f32>>>,
    stream: Option<cpal::Stream>,
    sample_rate: u32,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            stream: None,
            sample_rate: 0,
        }
    }
}

impl Default for CpalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBackend for CpalOutput {
    fn activate(&mut self, sample_rate: u32) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| RigError::PlaybackUnavailable("no default output device".into()))?;
        let device_name = device
            .description()
            .map(|d| d.name().to_owned())
            .unwrap_or_else(|_| "<unknown>".into());
        info!(device = %device_name, sample_rate, "opening speaker stream");

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = Arc::clone(&self.queue);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    let mut queue = match queue.lock() {
                        Ok(queue) => queue,
                        Err(_) => return,
                    };
                    for sample in data.iter_mut() {
                        *sample = queue.pop_front().unwrap_or(0.0);
                    }
                },
                move |err| {
                    warn!("speaker stream error: {err}");
                },
                None,
            )
            .map_err(|e| {
                RigError::PlaybackUnavailable(format!("failed to build output stream: {e}"))
            })?;
        stream.play().map_err(|e| {
            RigError::PlaybackUnavailable(format!("failed to start output stream: {e}"))
        })?;

        self.sample_rate = sample_rate;
        self.stream = Some(stream);
        Ok(())
    }

    fn write(&mut self, samples: &[f32]) {
        let Ok(mut queue) = self.queue.lock() else {
            return;
        };
        queue.extend(samples.iter().copied());

        let cap = (self.sample_rate * MAX_BACKLOG_SECONDS) as usize;
        while cap > 0 && queue.len() > cap {
            queue.pop_front();
        }
    }

    fn deactivate(&mut self) {
        self.stream = None;
        if let Ok(mut queue) = self.queue.lock() {
            queue.clear();
        }
    }
}
