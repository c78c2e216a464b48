mod pcm_buffer;
mod recorder;
mod render;
mod spectrogram;
pub mod wav;

pub use pcm_buffer::PcmBuffer;
pub use recorder::{PlaybackState, Recorder, RecorderError, RecordingState, Take};
pub use render::{render, to_db, ColorScale, RenderOptions};
pub use spectrogram::{
    hann_window, Spectrogram, SpectrogramConfig, SpectrogramEngine, SpectrogramError,
};
pub use wav::WavError;
