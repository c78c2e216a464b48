// cpal adapters: the microphone that feeds the recorder and the speaker that
// plays a finished take back. The core never touches these; main.rs moves
// samples and commands between them and the middle layer.
use std::sync::Arc;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use beatscope::shared::SAMPLE_RATE;

#[derive(Clone, Debug)]
pub enum DeviceCommand {
    // mono samples at SAMPLE_RATE, normalized to [-1, 1)
    Play(Arc<[f32]>),
    Stop,
}

pub struct DeviceHandle {
    tx: Sender<DeviceCommand>,
    captured_rx: Receiver<Vec<i16>>,
    finished_rx: Receiver<()>,
    _output_stream: Option<cpal::Stream>, // None when no speaker available
    _input_stream: Option<cpal::Stream>,  // None when no mic available
}

impl DeviceHandle {
    // no streams at all; commands go nowhere and nothing is captured
    pub fn disconnected() -> Self {
        let (tx, _) = crossbeam_channel::bounded(1);
        let (_, captured_rx) = crossbeam_channel::bounded(1);
        let (_, finished_rx) = crossbeam_channel::bounded(1);
        Self {
            tx,
            captured_rx,
            finished_rx,
            _output_stream: None,
            _input_stream: None,
        }
    }

    pub fn send(&self, cmd: DeviceCommand) {
        let _ = self.tx.try_send(cmd);
    }

    /// Everything the mic delivered since the last call, in order.
    pub fn drain_captured(&self) -> Vec<Vec<i16>> {
        self.captured_rx.try_iter().collect()
    }

    pub fn poll_playback_finished(&self) -> bool {
        self.finished_rx.try_iter().count() > 0
    }
}

pub fn start_devices() -> DeviceHandle {
    let (tx, rx) = crossbeam_channel::bounded::<DeviceCommand>(64);
    let (captured_tx, captured_rx) = crossbeam_channel::bounded::<Vec<i16>>(2048);
    let (finished_tx, finished_rx) = crossbeam_channel::bounded::<()>(16);

    let host = cpal::default_host();

    let output_stream = match build_output_stream(&host, rx, finished_tx) {
        Ok(stream) => Some(stream),
        Err(e) => {
            tracing::warn!("playback disabled: {e:#}");
            None
        }
    };
    let input_stream = match build_input_stream(&host, captured_tx) {
        Ok(stream) => Some(stream),
        Err(e) => {
            tracing::warn!("mic recording disabled: {e:#}");
            None
        }
    };

    DeviceHandle {
        tx,
        captured_rx,
        finished_rx,
        _output_stream: output_stream,
        _input_stream: input_stream,
    }
}

// ── Output stream ─────────────────────────────────────────────────

// Plays one take at a time, resampled to the device rate and copied to every
// output channel.
struct Player {
    samples: Option<Arc<[f32]>>,
    pos: f64,
    step: f64, // source samples per device frame
    finished_tx: Sender<()>,
}

impl Player {
    fn new(device_rate: u32, finished_tx: Sender<()>) -> Self {
        Self {
            samples: None,
            pos: 0.0,
            step: SAMPLE_RATE as f64 / device_rate.max(1) as f64,
            finished_tx,
        }
    }

    fn handle_cmd(&mut self, cmd: DeviceCommand) {
        match cmd {
            DeviceCommand::Play(samples) => {
                self.samples = Some(samples);
                self.pos = 0.0;
            }
            DeviceCommand::Stop => self.samples = None,
        }
    }

    fn render_block(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            let sample = self.next_sample();
            frame.fill(sample);
        }
    }

    fn next_sample(&mut self) -> f32 {
        let Some(samples) = &self.samples else {
            return 0.0;
        };
        let i = self.pos as usize;
        if i >= samples.len() {
            self.samples = None;
            let _ = self.finished_tx.try_send(());
            return 0.0;
        }
        let frac = (self.pos - i as f64) as f32;
        let a = samples[i];
        let b = samples.get(i + 1).copied().unwrap_or(a);
        self.pos += self.step;
        lerp(a, b, frac)
    }
}

fn build_output_stream(
    host: &cpal::Host,
    rx: Receiver<DeviceCommand>,
    finished_tx: Sender<()>,
) -> anyhow::Result<cpal::Stream> {
    let device = host.default_output_device().context("no default output device")?;
    let supported = device.default_output_config().context("no default output config")?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        anyhow::bail!("unsupported output sample format (only f32 supported for now)");
    }
    let config: cpal::StreamConfig = supported.into();
    let channels = config.channels as usize;
    let mut player = Player::new(config.sample_rate, finished_tx);

    let err_fn = |err| tracing::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                player.handle_cmd(cmd);
            }
            player.render_block(data, channels);
        },
        err_fn,
        None,
    )?;
    stream.play().context("failed to play output stream")?;
    Ok(stream)
}

// ── Input stream ──────────────────────────────────────────────────

// Streaming linear resampler from the mic rate to SAMPLE_RATE. Position 0 is
// the last sample of the previous block, so blocks join without clicks.
struct Resampler {
    step: f64, // input samples per output sample
    pos: f64,
    last: f32,
}

impl Resampler {
    fn new(input_rate: u32) -> Self {
        Self {
            step: input_rate.max(1) as f64 / SAMPLE_RATE as f64,
            pos: 0.0,
            last: 0.0,
        }
    }

    fn process(&mut self, input: &[f32], out: &mut Vec<i16>) {
        let len = input.len() as f64;
        while self.pos < len {
            let i = self.pos as usize;
            let frac = (self.pos - i as f64) as f32;
            let a = if i == 0 { self.last } else { input[i - 1] };
            let b = input[i];
            out.push(to_i16(lerp(a, b, frac)));
            self.pos += self.step;
        }
        self.pos -= len;
        if let Some(&last) = input.last() {
            self.last = last;
        }
    }
}

fn build_input_stream(host: &cpal::Host, tx: Sender<Vec<i16>>) -> anyhow::Result<cpal::Stream> {
    let device = host.default_input_device().context("no default input device")?;
    let supported = device.default_input_config().context("no default input config")?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        anyhow::bail!("unsupported input sample format (only f32 supported for now)");
    }
    let config: cpal::StreamConfig = supported.into();
    let in_channels = (config.channels as usize).max(1);
    let mut resampler = Resampler::new(config.sample_rate);

    let err_fn = |err| tracing::error!("audio input stream error: {err}");

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _info: &cpal::InputCallbackInfo| {
            // first channel only; the recorder is mono
            let mono: Vec<f32> = data.iter().step_by(in_channels).copied().collect();
            let mut out = Vec::with_capacity(mono.len() + 1);
            resampler.process(&mono, &mut out);
            let _ = tx.try_send(out);
        },
        err_fn,
        None,
    )?;
    stream.play().context("could not start input stream")?;
    Ok(stream)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

fn to_i16(x: f32) -> i16 {
    (x.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_plays_to_the_end_and_reports() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let mut player = Player::new(SAMPLE_RATE, tx);
        player.handle_cmd(DeviceCommand::Play(Arc::from(vec![0.5f32, -0.5, 0.25])));

        let mut out = vec![1.0f32; 8]; // 4 stereo frames
        player.render_block(&mut out, 2);
        assert_eq!(out, vec![0.5, 0.5, -0.5, -0.5, 0.25, 0.25, 0.0, 0.0]);
        assert!(rx.try_recv().is_ok());
        assert!(player.samples.is_none());
    }

    #[test]
    fn player_stop_silences() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let mut player = Player::new(SAMPLE_RATE, tx);
        player.handle_cmd(DeviceCommand::Play(Arc::from(vec![0.5f32; 100])));
        player.handle_cmd(DeviceCommand::Stop);
        let mut out = vec![1.0f32; 4];
        player.render_block(&mut out, 1);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn resampler_halves_a_double_rate_stream() {
        let mut resampler = Resampler::new(SAMPLE_RATE * 2);
        let mut out = Vec::new();
        let block: Vec<f32> = vec![0.5; 100];
        resampler.process(&block, &mut out);
        resampler.process(&block, &mut out);
        assert_eq!(out.len(), 100);
        // first output interpolates from silence
        assert_eq!(out[0], 0);
        assert!(out[1..].iter().all(|&s| s == to_i16(0.5)));
    }

    #[test]
    fn resampler_at_native_rate_keeps_count() {
        let mut resampler = Resampler::new(SAMPLE_RATE);
        let mut out = Vec::new();
        resampler.process(&[0.1, 0.2, 0.3], &mut out);
        resampler.process(&[0.4], &mut out);
        assert_eq!(out.len(), 4);
        assert_eq!(out[1], to_i16(0.1));
        assert_eq!(out[3], to_i16(0.3));
    }
}
