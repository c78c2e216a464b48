// WAV container for recorded takes: mono, 16-bit signed PCM, 44.1 kHz.
//
// hound computes the RIFF and data chunk sizes from what was actually written,
// so an empty buffer still produces a well-formed (44-byte) file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use thiserror::Error;

use super::pcm_buffer::PcmBuffer;
use crate::shared::{BITS_PER_SAMPLE, CHANNELS, SAMPLE_RATE};

#[derive(Debug, Error)]
pub enum WavError {
    #[error("failed to encode wav: {0}")]
    EncodeFailure(#[source] hound::Error),
    #[error("failed to decode wav: {0}")]
    DecodeFailure(#[source] hound::Error),
    #[error("unsupported wav format: {channels} ch, {bits} bit, {rate} Hz")]
    UnsupportedFormat { channels: u16, bits: u16, rate: u32 },
}

pub fn spec() -> hound::WavSpec {
    hound::WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    }
}

pub fn write<W: Write + Seek>(out: W, buffer: &PcmBuffer) -> Result<(), WavError> {
    let mut writer = hound::WavWriter::new(out, spec()).map_err(WavError::EncodeFailure)?;
    for &s in buffer.samples() {
        writer.write_sample(s).map_err(WavError::EncodeFailure)?;
    }
    writer.finalize().map_err(WavError::EncodeFailure)
}

pub fn read<R: Read>(input: R) -> Result<PcmBuffer, WavError> {
    let mut reader = hound::WavReader::new(input).map_err(WavError::DecodeFailure)?;
    let file_spec = reader.spec();
    if file_spec != spec() {
        return Err(WavError::UnsupportedFormat {
            channels: file_spec.channels,
            bits: file_spec.bits_per_sample,
            rate: file_spec.sample_rate,
        });
    }
    let data = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(WavError::DecodeFailure)?;
    Ok(PcmBuffer::from_samples(data))
}

pub fn encode(buffer: &PcmBuffer) -> Result<Vec<u8>, WavError> {
    let mut cursor = Cursor::new(Vec::new());
    write(&mut cursor, buffer)?;
    Ok(cursor.into_inner())
}

pub fn decode(bytes: &[u8]) -> Result<PcmBuffer, WavError> {
    read(Cursor::new(bytes))
}

// Replaces whatever was at `path`.
pub fn save(path: &Path, buffer: &PcmBuffer) -> Result<(), WavError> {
    let file = File::create(path).map_err(|e| WavError::EncodeFailure(hound::Error::IoError(e)))?;
    write(BufWriter::new(file), buffer)
}

pub fn load(path: &Path) -> Result<PcmBuffer, WavError> {
    let file = File::open(path).map_err(|e| WavError::DecodeFailure(hound::Error::IoError(e)))?;
    read(BufReader::new(file))
}
