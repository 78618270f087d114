use crate::{config::AnalysisConfig, graph::AudioGraph};

/// Per-tick loudness analysis over the audio graph's tap window.
///
/// The extractor normalises RMS loudness against a slowly decaying peak so
/// that quiet recordings still drive the full animation range while loud
/// ones do not pin it at maximum.
#[derive(Debug)]
pub struct FeatureExtractor {
    config: AnalysisConfig,
    window: Vec<f32>,
    peak: f32,
}

impl FeatureExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            window: Vec::new(),
            peak: 0.0,
        }
    }

    /// Reads the graph's analysis tap and returns the energy in [0, 1].
    pub fn process(&mut self, graph: &AudioGraph) -> f32 {
        let mut window = std::mem::take(&mut self.window);
        graph.copy_tap_window(&mut window);
        let energy = self.process_window(&window);
        self.window = window;
        energy
    }

    /// Normalised loudness for one window of samples.
    pub fn process_window(&mut self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let rms = compute_rms(samples);
        self.peak = (self.peak * self.config.peak_decay).max(rms);
        if self.peak <= self.config.peak_floor {
            // Below the floor everything is treated as silence, which also
            // keeps the division well conditioned.
            return 0.0;
        }
        (rms / self.peak).clamp(0.0, 1.0)
    }

    /// Clears adaptation state, as when new audio replaces the old.
    pub fn reset(&mut self) {
        self.peak = 0.0;
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

fn compute_rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}
