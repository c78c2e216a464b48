// Short-time Fourier analysis of a recorded take.
//
// The buffer is cut into overlapping Hann-windowed frames, each frame goes
// through a forward FFT, and the one-sided magnitudes are stored frame-major:
// `magnitudes[frame * freq_bins + bin]`, bins ascending from 0 Hz to Nyquist.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pcm_buffer::PcmBuffer;
use crate::shared::SAMPLE_RATE;

// ~1.5 s per frame at 44.1 kHz
pub const MAX_WINDOW_LEN: usize = 1 << 16;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SpectrogramError {
    #[error("need at least {window_len} samples for one analysis window, got {samples}")]
    InsufficientSamples { samples: usize, window_len: usize },
    #[error("invalid analysis window: length {window_len}, hop {hop}")]
    InvalidWindow { window_len: usize, hop: usize },
}

/// Analysis parameters. The defaults (256-sample frames, 50% overlap) give
/// ~5.8 ms frames and ~172 Hz bins at 44.1 kHz.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    pub window_len: usize,
    pub hop: usize,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            window_len: 256,
            hop: 128,
        }
    }
}

/// Magnitudes for one take. Never mutated after computation; a new take
/// produces a new `Spectrogram`.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrogram {
    magnitudes: Vec<f32>,
    time_bins: usize,
    freq_bins: usize,
    window_len: usize,
    hop: usize,
}

impl Spectrogram {
    pub fn time_bins(&self) -> usize {
        self.time_bins
    }

    pub fn freq_bins(&self) -> usize {
        self.freq_bins
    }

    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    pub fn frame(&self, time: usize) -> Option<&[f32]> {
        let start = time.checked_mul(self.freq_bins)?;
        self.magnitudes.get(start..start + self.freq_bins)
    }

    pub fn get(&self, time: usize, bin: usize) -> Option<f32> {
        if bin >= self.freq_bins {
            return None;
        }
        self.frame(time).map(|f| f[bin])
    }

    // Hz between adjacent bins
    pub fn bin_resolution(&self) -> f32 {
        SAMPLE_RATE as f32 / self.window_len as f32
    }

    pub fn bin_hz(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_resolution()
    }

    // sample offset of a frame's first sample
    pub fn frame_offset(&self, time: usize) -> usize {
        time * self.hop
    }

    pub fn max_magnitude(&self) -> f32 {
        self.magnitudes.iter().copied().fold(0.0, f32::max)
    }

    /// The bin with the most energy summed over the whole take.
    pub fn dominant_bin(&self) -> Option<usize> {
        let mut totals = vec![0.0f32; self.freq_bins];
        for frame in self.magnitudes.chunks_exact(self.freq_bins.max(1)) {
            for (total, &m) in totals.iter_mut().zip(frame) {
                *total += m;
            }
        }
        totals
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(bin, _)| bin)
    }
}

pub struct SpectrogramEngine {
    config: SpectrogramConfig,
    window: Vec<f32>,
    // 2 / sum(window), so a full-scale sine reads ~1.0 at its bin
    norm: f32,
    fft: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for SpectrogramEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrogramEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for SpectrogramEngine {
    fn default() -> Self {
        let config = SpectrogramConfig::default();
        let window = hann_window(config.window_len);
        Self::build(config, window)
    }
}

impl SpectrogramEngine {
    pub fn new(config: SpectrogramConfig) -> Result<Self, SpectrogramError> {
        let SpectrogramConfig { window_len, hop } = config;
        if !(2..=MAX_WINDOW_LEN).contains(&window_len) || hop == 0 || hop > window_len {
            return Err(SpectrogramError::InvalidWindow { window_len, hop });
        }
        let window = hann_window(window_len);
        Ok(Self::build(config, window))
    }

    fn build(config: SpectrogramConfig, window: Vec<f32>) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.window_len);
        let sum: f32 = window.iter().sum();
        Self {
            config,
            window,
            norm: if sum > 0.0 { 2.0 / sum } else { 1.0 },
            fft,
        }
    }

    pub fn config(&self) -> SpectrogramConfig {
        self.config
    }

    pub fn compute(&self, buffer: &PcmBuffer) -> Result<Spectrogram, SpectrogramError> {
        let SpectrogramConfig { window_len, hop } = self.config;
        if buffer.len() < window_len {
            return Err(SpectrogramError::InsufficientSamples {
                samples: buffer.len(),
                window_len,
            });
        }

        let samples = buffer.to_f32();
        let time_bins = 1 + (samples.len() - window_len) / hop;
        let freq_bins = window_len / 2 + 1;

        let mut magnitudes = Vec::with_capacity(time_bins * freq_bins);
        let mut frame = vec![Complex::new(0.0f32, 0.0); window_len];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for t in 0..time_bins {
            let start = t * hop;
            for (slot, (&x, &w)) in frame
                .iter_mut()
                .zip(samples[start..start + window_len].iter().zip(&self.window))
            {
                *slot = Complex::new(x * w, 0.0);
            }
            self.fft.process_with_scratch(&mut frame, &mut scratch);
            magnitudes.extend(frame[..freq_bins].iter().map(|c| c.norm() * self.norm));
        }

        Ok(Spectrogram {
            magnitudes,
            time_bins,
            freq_bins,
            window_len,
            hop,
        })
    }
}

/// Symmetric Hann window, zero at both ends.
pub fn hann_window(len: usize) -> Vec<f32> {
    if len < 2 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f32;
    (0..len)
        .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
        .collect()
}
