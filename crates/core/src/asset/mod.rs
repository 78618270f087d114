use std::fmt;
use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{Result, RigError};

/// Decoded, fixed-length audio owned by the engine.
///
/// An asset is immutable once constructed: loading new audio replaces the
/// whole asset rather than mutating it, which is what invalidates any
/// in-flight playback or recording. Channels are stored planar; a mono
/// mixdown is precomputed for the graph pump and the loudness analysis.
pub struct AudioAsset {
    channels: Vec<Vec<f32>>,
    mono: Vec<f32>,
    sample_rate: u32,
}

impl AudioAsset {
    /// Decodes an in-memory byte buffer (WAV, MP3, AAC or MP4 audio) into
    /// an asset. Fails with [`RigError::Decode`] on malformed or
    /// unsupported input.
    pub fn decode(bytes: Vec<u8>) -> Result<Self> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| RigError::Decode(format!("unrecognized audio container: {e}")))?;

        let mut format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| RigError::Decode("no default audio track".into()))?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| RigError::Decode("unknown sample rate".into()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| RigError::Decode(format!("no decoder for track: {e}")))?;

        let mut channels: Vec<Vec<f32>> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) => {
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        break;
                    }
                    return Err(RigError::Decode(format!("audio read error: {e}")));
                }
                Err(e) => return Err(RigError::Decode(format!("audio read error: {e}"))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                // Skip over corrupt packets; symphonia recovers on the next one.
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(RigError::Decode(format!("audio decode error: {e}"))),
            };

            let spec = *decoded.spec();
            let channel_count = spec.channels.count();
            if channels.is_empty() {
                channels = vec![Vec::new(); channel_count];
            } else if channels.len() != channel_count {
                return Err(RigError::Decode(
                    "channel layout changed mid-stream".into(),
                ));
            }

            let frames = decoded.frames() as u64;
            let needs_new = match sample_buf.as_ref() {
                Some(b) => b.capacity() < frames as usize * channel_count,
                None => true,
            };
            if needs_new {
                sample_buf = Some(SampleBuffer::<f32>::new(frames, spec));
            }

            if let Some(buf) = sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
                for frame in buf.samples().chunks_exact(channel_count) {
                    for (channel, sample) in channels.iter_mut().zip(frame) {
                        channel.push(*sample);
                    }
                }
            }
        }

        if channels.is_empty() || channels[0].is_empty() {
            return Err(RigError::Decode("audio stream contained no samples".into()));
        }

        Ok(Self::from_channels(channels, sample_rate))
    }

    /// Builds an asset from planar channel data. Used by the decoder and by
    /// hosts that synthesize audio in memory.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let mono = if channels.len() <= 1 {
            Vec::new()
        } else {
            let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
            let scale = 1.0 / channels.len() as f32;
            (0..frames)
                .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() * scale)
                .collect()
        };
        Self {
            channels,
            mono,
            sample_rate,
        }
    }

    /// Builds a single-channel asset. Handy for synthetic signals in tests
    /// and demos.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::from_channels(vec![samples], sample_rate)
    }

    /// Number of audio channels in the decoded stream.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples of one channel.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Mono mixdown fed to the audio graph and the loudness analysis.
    pub fn mono(&self) -> &[f32] {
        if self.channels.len() == 1 {
            &self.channels[0]
        } else {
            &self.mono
        }
    }

    /// Number of sample frames per channel.
    pub fn frame_count(&self) -> usize {
        self.mono().len()
    }

    /// Sample rate of the decoded stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total length of the asset in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / f64::from(self.sample_rate)
    }
}

impl fmt::Debug for AudioAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioAsset")
            .field("channels", &self.channels.len())
            .field("frames", &self.frame_count())
            .field("sample_rate", &self.sample_rate)
            .field("duration_seconds", &self.duration_seconds())
            .finish()
    }
}
