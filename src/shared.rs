// Constants shared by the sequencer and the recorder.
//
// The grid is always 16 steps wide; the number of instrument rows is whatever
// the session was built with (the reference kit below has 10). Audio is always
// mono 16-bit at 44.1 kHz, both in the PCM buffer and in the WAV container.

pub const STEPS_PER_PATTERN: usize = 16;

pub const SAMPLE_RATE: u32 = 44100;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

// the reference drum kit, in row order
pub const DEFAULT_INSTRUMENTS: [&str; 10] = [
    "Kick",
    "Snare",
    "Hi-hat Closed",
    "Hi-hat Open",
    "Tom Low",
    "Tom Mid",
    "Tom High",
    "Clap",
    "Rim",
    "Record scratch",
];
