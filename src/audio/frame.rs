//! Audio containers passed between the capture driver, the normalizer, the
//! segmenter, and the transcription sink.

use super::resample::to_pcm16;
use super::TARGET_CHANNELS;
use anyhow::{Context, Result};
use std::io::Cursor;
use std::time::Duration;

/// Interleaved samples in the representation the device delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSamples {
    F32(Vec<f32>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    U16(Vec<u16>),
}

impl RawSamples {
    pub fn len(&self) -> usize {
        match self {
            RawSamples::F32(data) => data.len(),
            RawSamples::I16(data) => data.len(),
            RawSamples::I32(data) => data.len(),
            RawSamples::U16(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format_label(&self) -> &'static str {
        match self {
            RawSamples::F32(_) => "f32",
            RawSamples::I16(_) => "i16",
            RawSamples::I32(_) => "i32",
            RawSamples::U16(_) => "u16",
        }
    }
}

/// One capture-driver block. The declared channel count and rate are trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
    pub samples: RawSamples,
    pub channels: u16,
    pub sample_rate: u32,
    /// Offset of the first sample from the start of the stream.
    pub timestamp: Duration,
}

/// Normalized mono audio at the target rate. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
    sample_rate: u32,
    timestamp: Duration,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32, timestamp: Duration) -> Self {
        Self {
            samples,
            sample_rate,
            timestamp,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        samples_to_duration(self.samples.len(), self.sample_rate)
    }
}

/// A finished utterance: pre-roll through the trailing silence hang-over.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Stream time of the voice-end decision that released this utterance.
    pub captured_at: Duration,
}

impl Utterance {
    pub fn duration(&self) -> Duration {
        samples_to_duration(self.samples.len(), self.sample_rate)
    }

    pub fn to_pcm16(&self) -> Vec<i16> {
        to_pcm16(&self.samples)
    }

    /// Wrap the utterance in a mono 16-bit WAV container at its own rate.
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: TARGET_CHANNELS,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).context("failed to start wav writer")?;
            for sample in self.to_pcm16() {
                writer
                    .write_sample(sample)
                    .context("failed to write wav sample")?;
            }
            writer.finalize().context("failed to finalize wav")?;
        }
        Ok(cursor.into_inner())
    }
}

pub(crate) fn samples_to_duration(samples: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(samples as f64 / f64::from(sample_rate))
}
