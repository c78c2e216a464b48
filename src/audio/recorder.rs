// Recorder state machine: Idle <-> Recording, plus an independent playback flag.
//
// Stopping a take writes the WAV container and computes its spectrogram.
// stop() does both inline; stop_deferred() flips to Idle right away and lets a
// worker thread do the heavy part, the host picks the result up with
// poll_completed(). Either way a finished take replaces the previous one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::pcm_buffer::PcmBuffer;
use super::spectrogram::{Spectrogram, SpectrogramEngine};
use super::wav::{self, WavError};

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("already recording")]
    AlreadyRecording,
    #[error("not recording")]
    NotRecording,
    #[error("no recording available")]
    NoRecordingAvailable,
    #[error(transparent)]
    Wav(#[from] WavError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Everything one finished recording produced.
#[derive(Clone, Debug)]
pub struct Take {
    pub container: PathBuf,
    pub samples: usize,
    pub duration: Duration,
    // None for takes shorter than one analysis window
    pub spectrogram: Option<Arc<Spectrogram>>,
}

struct RenderJob {
    generation: u64,
    buffer: PcmBuffer,
    staging: PathBuf, // written here, moved over the container on install
    container: PathBuf,
}

struct Completed {
    generation: u64,
    staging: PathBuf,
    result: Result<Take, WavError>,
}

pub struct Recorder {
    state: RecordingState,
    playback: PlaybackState,
    buffer: PcmBuffer,
    container: PathBuf,
    engine: Arc<SpectrogramEngine>,
    take: Option<Arc<Take>>,
    take_generation: u64,
    generation: u64,
    pending: usize,
    jobs_tx: Option<Sender<RenderJob>>, // spawned on first deferred stop
    done_tx: Sender<Completed>,
    done_rx: Receiver<Completed>,
}

impl Recorder {
    /// `container` is the file every finished take is written to.
    pub fn new(container: impl Into<PathBuf>) -> Self {
        Self::with_engine(container, SpectrogramEngine::default())
    }

    pub fn with_engine(container: impl Into<PathBuf>, engine: SpectrogramEngine) -> Self {
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        Self {
            state: RecordingState::Idle,
            playback: PlaybackState::Stopped,
            buffer: PcmBuffer::new(),
            container: container.into(),
            engine: Arc::new(engine),
            take: None,
            take_generation: 0,
            generation: 0,
            pending: 0,
            jobs_tx: None,
            done_tx,
            done_rx,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn container(&self) -> &Path {
        &self.container
    }

    // read-only view; between takes this is the last recording
    pub fn buffer(&self) -> &PcmBuffer {
        &self.buffer
    }

    pub fn take(&self) -> Option<&Arc<Take>> {
        self.take.as_ref()
    }

    // deferred takes still being rendered
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn start(&mut self) -> Result<(), RecorderError> {
        if self.state == RecordingState::Recording {
            return Err(RecorderError::AlreadyRecording);
        }
        self.buffer.clear();
        self.state = RecordingState::Recording;
        info!(container = %self.container.display(), "recording started");
        Ok(())
    }

    pub fn feed(&mut self, samples: &[i16]) -> Result<(), RecorderError> {
        if self.state != RecordingState::Recording {
            return Err(RecorderError::NotRecording);
        }
        self.buffer.append(samples);
        Ok(())
    }

    /// Finish the take: write the container and compute the spectrogram
    /// before returning. The new container is written beside the old one and
    /// moved over it only once complete. If writing fails the recorder keeps
    /// recording and the previous take and its container are untouched.
    pub fn stop(&mut self) -> Result<Arc<Take>, RecorderError> {
        if self.state != RecordingState::Recording {
            return Err(RecorderError::NotRecording);
        }
        let generation = self.generation + 1;
        let staging = staging_path(&self.container, generation);
        let take = render_take(&self.engine, &self.buffer, &staging, &self.container)
            .and_then(|take| publish(&staging, &take.container).map(|()| take))
            .inspect_err(|_| {
                let _ = std::fs::remove_file(&staging);
            })?;
        self.state = RecordingState::Idle;
        self.generation = generation;
        let take = Arc::new(take);
        self.install(generation, Arc::clone(&take));
        Ok(take)
    }

    /// Finish the take without waiting for the container or spectrogram.
    /// The recorder is Idle (and can start again) as soon as this returns.
    pub fn stop_deferred(&mut self) -> Result<(), RecorderError> {
        if self.state != RecordingState::Recording {
            return Err(RecorderError::NotRecording);
        }
        self.state = RecordingState::Idle;
        self.generation += 1;
        let job = RenderJob {
            generation: self.generation,
            buffer: self.buffer.clone(),
            staging: staging_path(&self.container, self.generation),
            container: self.container.clone(),
        };
        info!(
            samples = job.buffer.len(),
            "recording stopped, rendering in background"
        );
        self.pending += 1;
        self.submit(job);
        Ok(())
    }

    /// Install whatever the worker finished since the last call, oldest
    /// first. Takes (and failures) overtaken by a newer stop are dropped.
    pub fn poll_completed(&mut self) -> Vec<Result<Arc<Take>, RecorderError>> {
        let mut outcomes = Vec::new();
        while let Ok(done) = self.done_rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            if done.generation < self.take_generation {
                debug!(generation = done.generation, "discarding stale take");
                let _ = std::fs::remove_file(&done.staging);
                continue;
            }
            let published = done
                .result
                .and_then(|take| publish(&done.staging, &take.container).map(|()| take));
            match published {
                Ok(take) => {
                    let take = Arc::new(take);
                    self.install(done.generation, Arc::clone(&take));
                    outcomes.push(Ok(take));
                }
                Err(e) => {
                    warn!(error = %e, generation = done.generation, "background render failed");
                    let _ = std::fs::remove_file(&done.staging);
                    outcomes.push(Err(e.into()));
                }
            }
        }
        outcomes
    }

    /// Mark the latest take as playing and hand it back so the host can
    /// open its container.
    pub fn play(&mut self) -> Result<Arc<Take>, RecorderError> {
        let take = self.take.clone().ok_or(RecorderError::NoRecordingAvailable)?;
        if self.playback != PlaybackState::Playing {
            debug!(container = %take.container.display(), "playback started");
            self.playback = PlaybackState::Playing;
        }
        Ok(take)
    }

    pub fn stop_playback(&mut self) {
        if self.playback != PlaybackState::Stopped {
            debug!("playback stopped");
            self.playback = PlaybackState::Stopped;
        }
    }

    fn install(&mut self, generation: u64, take: Arc<Take>) {
        info!(
            samples = take.samples,
            spectrogram = take.spectrogram.is_some(),
            "take ready"
        );
        self.take_generation = generation;
        self.take = Some(take);
    }

    fn submit(&mut self, job: RenderJob) {
        let job = match &self.jobs_tx {
            Some(tx) => match tx.send(job) {
                Ok(()) => return,
                Err(e) => e.into_inner(), // worker died; start a new one
            },
            None => job,
        };
        match spawn_worker(Arc::clone(&self.engine), self.done_tx.clone()) {
            Ok(tx) => match tx.send(job) {
                Ok(()) => self.jobs_tx = Some(tx),
                Err(e) => self.render_inline(e.into_inner()),
            },
            Err(e) => {
                warn!(error = %e, "could not spawn render worker, rendering inline");
                self.render_inline(job);
            }
        }
    }

    fn render_inline(&self, job: RenderJob) {
        let _ = self.done_tx.send(run_job(&self.engine, job));
    }
}

fn staging_path(container: &Path, generation: u64) -> PathBuf {
    let mut name = container.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{generation}.part"));
    container.with_file_name(name)
}

// Moves a fully written staging file over the container.
fn publish(staging: &Path, container: &Path) -> Result<(), WavError> {
    std::fs::rename(staging, container)
        .map_err(|e| WavError::EncodeFailure(hound::Error::IoError(e)))
}

fn run_job(engine: &SpectrogramEngine, job: RenderJob) -> Completed {
    let result = render_take(engine, &job.buffer, &job.staging, &job.container);
    Completed {
        generation: job.generation,
        staging: job.staging,
        result,
    }
}

fn spawn_worker(
    engine: Arc<SpectrogramEngine>,
    done_tx: Sender<Completed>,
) -> std::io::Result<Sender<RenderJob>> {
    let (tx, rx) = crossbeam_channel::unbounded::<RenderJob>();
    std::thread::Builder::new()
        .name("beatscope-render".into())
        .spawn(move || {
            // exits once the recorder drops its sender
            for job in rx.iter() {
                if done_tx.send(run_job(&engine, job)).is_err() {
                    break;
                }
            }
        })?;
    Ok(tx)
}

// Writes the wav to `path`; the take records `container` as its home.
fn render_take(
    engine: &SpectrogramEngine,
    buffer: &PcmBuffer,
    path: &Path,
    container: &Path,
) -> Result<Take, WavError> {
    wav::save(path, buffer)?;

    let spectrogram = if buffer.is_empty() {
        debug!("empty take, no spectrogram");
        None
    } else {
        match engine.compute(buffer) {
            Ok(spectrogram) => Some(Arc::new(spectrogram)),
            Err(e) => {
                warn!(error = %e, "take too short for a spectrogram");
                None
            }
        }
    };

    Ok(Take {
        container: container.to_path_buf(),
        samples: buffer.len(),
        duration: buffer.duration(),
        spectrogram,
    })
}
