use std::time::Duration;

use crate::shared::SAMPLE_RATE;

/// Mono 16-bit samples at 44.1 kHz. Only the recorder writes to one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PcmBuffer {
    data: Vec<i16>,
}

impl PcmBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(data: Vec<i16>) -> Self {
        Self { data }
    }

    pub(crate) fn append(&mut self, samples: &[i16]) {
        self.data.extend_from_slice(samples);
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
    }

    pub fn samples(&self) -> &[i16] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.data.len() as f64 / SAMPLE_RATE as f64)
    }

    // normalized to [-1, 1) for analysis and playback
    pub fn to_f32(&self) -> Vec<f32> {
        self.data
            .iter()
            .map(|&s| s as f32 / (i16::MAX as f32 + 1.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_and_clear_empties() {
        let mut buf = PcmBuffer::new();
        buf.append(&[1, 2, 3]);
        buf.append(&[4]);
        assert_eq!(buf.samples(), &[1, 2, 3, 4]);
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn duration_follows_sample_count() {
        let buf = PcmBuffer::from_samples(vec![0; SAMPLE_RATE as usize / 2]);
        assert_eq!(buf.duration(), Duration::from_millis(500));
    }

    #[test]
    fn to_f32_stays_in_range() {
        let buf = PcmBuffer::from_samples(vec![i16::MIN, 0, i16::MAX]);
        let f = buf.to_f32();
        assert_eq!(f[0], -1.0);
        assert_eq!(f[1], 0.0);
        assert!(f[2] < 1.0 && f[2] > 0.99);
    }
}
