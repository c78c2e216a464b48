// Step sequencer and take recorder for a small drum-machine toy.
//
// Two engines, both driven by a host:
// - [`sequencer`]: a fixed grid of instrument rows x 16 steps, a transport
//   clock advanced by explicit ticks, and a seeded random beat generator.
// - [`audio`]: a mono 16-bit recorder that writes each finished take to a
//   WAV container and computes a spectrogram of it, plus a stateless
//   renderer turning that spectrogram into an RGB image.
//
// Nothing here opens audio devices or timers; the host feeds samples in and
// calls `tick()` on its own schedule.

pub mod audio;
pub mod sequencer;
pub mod shared;

pub use audio::{
    PcmBuffer, PlaybackState, Recorder, RecorderError, RecordingState, Spectrogram,
    SpectrogramEngine, SpectrogramError, Take, WavError,
};
pub use sequencer::{
    BeatGenerator, GridError, Pattern, SequencerGrid, Session, StepReport, Transport,
    TransportState, VoicePlayer,
};

use thiserror::Error;

/// Any error the core can hand back to a host.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Recorder(#[from] RecorderError),
    #[error(transparent)]
    Spectrogram(#[from] SpectrogramError),
    #[error(transparent)]
    Wav(#[from] WavError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
