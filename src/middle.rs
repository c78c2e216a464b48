// The middle layer: owns the sequencer session and the recorder, turns input
// events into core calls and device commands, and builds the DisplayState the
// TUI draws every frame. The TUI itself holds no sequencer or recorder state.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use beatscope::audio::{self, wav, RenderOptions, SpectrogramEngine};
use beatscope::shared::STEPS_PER_PATTERN;
use beatscope::{
    BeatGenerator, Pattern, PlaybackState, Recorder, RecorderError, SequencerGrid, Session, Take,
    VoicePlayer,
};
use image::RgbImage;

use crate::config::Config;
use crate::device::DeviceCommand;

// size of the spectrogram thumbnail shown in the terminal
const PREVIEW_WIDTH: u32 = 96;
const PREVIEW_HEIGHT: u32 = 32;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    MoveCursor { rows: isize, steps: isize },
    ToggleStep, // at the cursor
    PlayPause,
    Rewind,
    GenerateBeat,
    ClearPattern,
    Record, // start or stop a take
    PlayTake,
    StopTake,
    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub labels: Vec<String>,
    pub pattern: Pattern,
    pub playing: bool,
    pub column: Option<u8>, // playhead, once the transport has ticked
    pub fired: Vec<bool>,   // rows triggered on the last tick
    pub cursor: (usize, usize),
    pub bpm: f32,
    pub recording: bool,
    pub recorded_secs: f32,
    pub playback: bool,
    pub rendering: bool,
    pub status: String,
    pub preview: Option<RgbImage>,
}

// Wall-clock adapter for the transport: turns elapsed seconds into whole ticks.
#[derive(Clone, Debug)]
pub struct StepClock {
    interval: f64,
    acc: f64,
}

impl StepClock {
    pub fn new(interval: f64) -> Self {
        Self {
            interval: interval.max(1e-3),
            acc: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.acc = 0.0;
    }

    // how many ticks are due after `elapsed` more seconds
    pub fn advance(&mut self, elapsed: f64) -> usize {
        self.acc += elapsed.max(0.0);
        let due = (self.acc / self.interval).floor();
        self.acc -= due * self.interval;
        due as usize
    }
}

// lights up the rows that fired, for the LED column next to the labels
struct StepFlash {
    rows: Vec<bool>,
}

impl VoicePlayer for StepFlash {
    fn trigger(&mut self, instrument: usize, _label: &str) {
        if let Some(row) = self.rows.get_mut(instrument) {
            *row = true;
        }
    }
}

pub struct Middle {
    session: Session,
    generator: BeatGenerator,
    recorder: Recorder,
    clock: StepClock,
    flash: StepFlash,
    ticked: bool,
    cursor: (usize, usize),
    bpm: f32,
    image: RenderOptions,
    status: String,
    preview: Option<RgbImage>,
}

impl Middle {
    pub fn new(config: &Config, project_dir: &Path) -> Self {
        let engine = SpectrogramEngine::new(config.spectrogram).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "bad spectrogram settings, using defaults");
            SpectrogramEngine::default()
        });
        let generator = match config.seed {
            Some(seed) => BeatGenerator::from_seed(seed),
            None => BeatGenerator::from_entropy(),
        };
        let grid = SequencerGrid::default();
        let flash = StepFlash {
            rows: vec![false; grid.instrument_count()],
        };
        Self {
            session: Session::new(grid),
            generator,
            recorder: Recorder::with_engine(config.container_path(project_dir), engine),
            clock: StepClock::new(config.step_interval().as_secs_f64()),
            flash,
            ticked: false,
            cursor: (0, 0),
            bpm: config.bpm,
            image: config.image,
            status: String::from("ready"),
            preview: None,
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<DeviceCommand> {
        match event {
            InputEvent::MoveCursor { rows, steps } => {
                let max_row = self.session.grid().instrument_count().saturating_sub(1);
                self.cursor.0 = self.cursor.0.saturating_add_signed(rows).min(max_row);
                self.cursor.1 = self
                    .cursor
                    .1
                    .saturating_add_signed(steps)
                    .min(STEPS_PER_PATTERN - 1);
            }
            InputEvent::ToggleStep => {
                let (row, step) = self.cursor;
                if let Err(e) = self.session.toggle(row, step) {
                    self.status = e.to_string();
                }
            }
            InputEvent::PlayPause => {
                self.session.toggle_play();
                self.clock.reset();
            }
            InputEvent::Rewind => {
                self.session.rewind();
                self.ticked = false;
            }
            InputEvent::GenerateBeat => {
                self.status = match self.session.generate(&mut self.generator) {
                    Ok(()) => String::from("generated beat"),
                    Err(e) => e.to_string(),
                };
            }
            InputEvent::ClearPattern => self.session.clear(),
            InputEvent::Record => self.toggle_recording(),
            InputEvent::PlayTake => return self.play_take(),
            InputEvent::StopTake => {
                self.recorder.stop_playback();
                return vec![DeviceCommand::Stop];
            }
            InputEvent::Quit => {}
        }
        vec![]
    }

    /// Advance the sequencer by wall-clock time and collect finished takes.
    pub fn tick(&mut self, elapsed: f64) {
        for _ in 0..self.clock.advance(elapsed) {
            if !self.session.transport().is_playing() {
                break;
            }
            self.flash.rows.fill(false);
            self.session.tick_into(&mut self.flash);
            self.ticked = true;
        }
        for done in self.recorder.poll_completed() {
            match done {
                Ok(take) => self.on_take(&take),
                Err(e) => self.status = format!("save failed: {e}"),
            }
        }
    }

    pub fn on_captured(&mut self, samples: &[i16]) {
        if self.recorder.is_recording() {
            // only fails when not recording, checked above
            let _ = self.recorder.feed(samples);
        }
    }

    pub fn on_playback_finished(&mut self) {
        self.recorder.stop_playback();
    }

    pub fn display_state(&self) -> DisplayState {
        let grid = self.session.grid();
        let transport = self.session.transport();
        DisplayState {
            labels: grid.labels().to_vec(),
            pattern: grid.snapshot(),
            playing: transport.is_playing(),
            column: self.ticked.then_some(transport.column() as u8),
            fired: self.flash.rows.clone(),
            cursor: self.cursor,
            bpm: self.bpm,
            recording: self.recorder.is_recording(),
            recorded_secs: self.recorder.buffer().duration().as_secs_f32(),
            playback: self.recorder.playback() == PlaybackState::Playing,
            rendering: self.recorder.pending() > 0,
            status: self.status.clone(),
            preview: self.preview.clone(),
        }
    }

    fn toggle_recording(&mut self) {
        let result = if self.recorder.is_recording() {
            self.recorder.stop_deferred().map(|()| "rendering take...")
        } else {
            self.recorder.start().map(|()| "recording")
        };
        self.status = match result {
            Ok(msg) => msg.to_string(),
            Err(e) => e.to_string(),
        };
    }

    fn play_take(&mut self) -> Vec<DeviceCommand> {
        let take = match self.recorder.play() {
            Ok(take) => take,
            Err(RecorderError::NoRecordingAvailable) => {
                self.status = String::from("nothing recorded yet");
                return vec![];
            }
            Err(e) => {
                self.status = e.to_string();
                return vec![];
            }
        };
        match wav::load(&take.container) {
            Ok(buffer) => {
                self.status = format!("playing {}", take.container.display());
                vec![DeviceCommand::Play(Arc::from(buffer.to_f32()))]
            }
            Err(e) => {
                self.recorder.stop_playback();
                self.status = e.to_string();
                vec![]
            }
        }
    }

    fn on_take(&mut self, take: &Take) {
        let Some(spectrogram) = &take.spectrogram else {
            self.preview = None;
            self.status = format!(
                "saved {} (too short for a spectrogram)",
                take.container.display()
            );
            return;
        };
        let png = spectrogram_path(&take.container);
        if let Err(e) = audio::render(spectrogram, &self.image).save(&png) {
            tracing::warn!(path = %png.display(), error = %e, "could not write spectrogram image");
        }
        let thumb = RenderOptions {
            width: PREVIEW_WIDTH,
            height: PREVIEW_HEIGHT,
            ..self.image
        };
        self.preview = Some(audio::render(spectrogram, &thumb));
        self.status = format!(
            "saved {} ({:.1}s)",
            take.container.display(),
            take.duration.as_secs_f32()
        );
    }
}

// temp_audio.wav -> temp_audio.png
fn spectrogram_path(container: &Path) -> PathBuf {
    container.with_extension("png")
}
