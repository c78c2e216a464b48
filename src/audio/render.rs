// Spectrogram -> RGB raster. Pure: same magnitudes and options, same pixels.
//
// Time runs left to right, frequency bottom (0 Hz) to top (Nyquist).
// Magnitudes are shown in dB relative to the loudest cell, clipped to
// `dynamic_range_db` below it.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::spectrogram::Spectrogram;

// anything quieter than this counts as silence, even if it is the loudest cell
const SILENCE_DB: f32 = -120.0;
const EPSILON: f32 = 1e-10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScale {
    Grayscale,
    #[default]
    Magma,
    Heat,
}

impl ColorScale {
    fn stops(self) -> &'static [[u8; 3]] {
        match self {
            ColorScale::Grayscale => &[[0, 0, 0], [255, 255, 255]],
            ColorScale::Magma => &[
                [0, 0, 4],
                [59, 15, 112],
                [140, 41, 129],
                [222, 73, 104],
                [254, 159, 109],
                [252, 253, 191],
            ],
            ColorScale::Heat => &[
                [0, 0, 0],
                [160, 0, 0],
                [255, 96, 0],
                [255, 220, 0],
                [255, 255, 255],
            ],
        }
    }

    /// Color for a level in [0, 1]; out-of-range levels are clamped.
    pub fn color(self, level: f32) -> Rgb<u8> {
        let stops = self.stops();
        let level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
        let pos = level * (stops.len() - 1) as f32;
        let i = (pos.floor() as usize).min(stops.len() - 2);
        let frac = pos - i as f32;
        let (a, b) = (stops[i], stops[i + 1]);
        Rgb(std::array::from_fn(|c| {
            (a[c] as f32 + (b[c] as f32 - a[c] as f32) * frac).round() as u8
        }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub color_scale: ColorScale,
    pub dynamic_range_db: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            color_scale: ColorScale::Magma,
            dynamic_range_db: 80.0,
        }
    }
}

pub fn to_db(magnitude: f32) -> f32 {
    20.0 * (magnitude + EPSILON).log10()
}

pub fn render(spectrogram: &Spectrogram, options: &RenderOptions) -> RgbImage {
    let (width, height) = (options.width, options.height);
    let (time_bins, freq_bins) = (spectrogram.time_bins(), spectrogram.freq_bins());
    if time_bins == 0 || freq_bins == 0 {
        return RgbImage::from_pixel(width, height, options.color_scale.color(0.0));
    }

    let range = options.dynamic_range_db.max(1.0);
    let peak = to_db(spectrogram.max_magnitude()).max(SILENCE_DB);
    let floor = peak - range;
    let magnitudes = spectrogram.magnitudes();

    RgbImage::from_fn(width, height, |x, y| {
        // nearest cell; y is flipped so low frequencies sit at the bottom
        let t = (x as usize * time_bins / width as usize).min(time_bins - 1);
        let row = (height - 1 - y) as usize;
        let f = (row * freq_bins / height as usize).min(freq_bins - 1);
        let db = to_db(magnitudes[t * freq_bins + f]);
        options.color_scale.color((db - floor) / range)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{PcmBuffer, SpectrogramEngine};

    fn tone_spectrogram() -> Spectrogram {
        let samples: Vec<i16> = (0..8192)
            .map(|i| ((i as f32 * 0.3).sin() * 12000.0) as i16)
            .collect();
        SpectrogramEngine::default()
            .compute(&PcmBuffer::from_samples(samples))
            .unwrap()
    }

    #[test]
    fn color_scale_endpoints() {
        assert_eq!(ColorScale::Grayscale.color(0.0), Rgb([0, 0, 0]));
        assert_eq!(ColorScale::Grayscale.color(1.0), Rgb([255, 255, 255]));
        assert_eq!(ColorScale::Grayscale.color(7.0), Rgb([255, 255, 255]));
        assert_eq!(ColorScale::Grayscale.color(f32::NAN), Rgb([0, 0, 0]));
        assert_eq!(ColorScale::Magma.color(1.0), Rgb([252, 253, 191]));
    }

    #[test]
    fn render_has_requested_size() {
        let spec = tone_spectrogram();
        let options = RenderOptions {
            width: 64,
            height: 32,
            ..Default::default()
        };
        let img = render(&spec, &options);
        assert_eq!(img.dimensions(), (64, 32));
    }

    #[test]
    fn render_is_deterministic() {
        let spec = tone_spectrogram();
        let options = RenderOptions::default();
        assert_eq!(render(&spec, &options), render(&spec, &options));
    }

    #[test]
    fn loudest_row_is_brightest() {
        let spec = tone_spectrogram();
        let options = RenderOptions {
            width: 16,
            height: spec.freq_bins() as u32,
            color_scale: ColorScale::Grayscale,
            dynamic_range_db: 80.0,
        };
        let img = render(&spec, &options);
        let bin = spec.dominant_bin().unwrap();
        let y = options.height - 1 - bin as u32;
        let peak_row = img.get_pixel(8, y)[0];
        let top_row = img.get_pixel(8, 0)[0];
        assert!(peak_row > 200, "peak row was {peak_row}");
        assert!(peak_row > top_row);
    }

    #[test]
    fn silence_renders_dark() {
        let spec = SpectrogramEngine::default()
            .compute(&PcmBuffer::from_samples(vec![0; 1024]))
            .unwrap();
        let options = RenderOptions {
            width: 8,
            height: 8,
            color_scale: ColorScale::Grayscale,
            ..Default::default()
        };
        let img = render(&spec, &options);
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
