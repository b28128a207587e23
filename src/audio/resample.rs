use super::dispatch::append_downmixed_samples;
use super::frame::{AudioFrame, RawChunk, RawSamples};
use std::cmp::Ordering as CmpOrdering;

/// Sample representations the capture driver may deliver. `to_unit` maps one
/// sample into [-1.0, 1.0] using the width of the source type.
pub trait PcmSample: Copy {
    fn to_unit(self) -> f32;
}

impl PcmSample for f32 {
    fn to_unit(self) -> f32 {
        if self.is_finite() {
            self.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

impl PcmSample for i16 {
    fn to_unit(self) -> f32 {
        (f32::from(self) / f32::from(i16::MAX)).clamp(-1.0, 1.0)
    }
}

impl PcmSample for i32 {
    fn to_unit(self) -> f32 {
        // f32 cannot hold i32::MAX exactly; divide in f64.
        (f64::from(self) / f64::from(i32::MAX)).clamp(-1.0, 1.0) as f32
    }
}

impl PcmSample for u16 {
    fn to_unit(self) -> f32 {
        let centred = f32::from(self) - 32_768.0;
        (centred / 32_768.0).clamp(-1.0, 1.0)
    }
}

pub fn normalize_samples<T: PcmSample>(data: &[T]) -> Vec<f32> {
    data.iter().copied().map(PcmSample::to_unit).collect()
}

/// Linear-interpolation resampler. The output has `round(len * to / from)`
/// samples placed evenly over the source index range `[0, len - 1]`.
///
/// Equal or zero rates return the input unchanged. The function never fails;
/// degenerate input yields an empty vector.
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return input.to_vec();
    }
    if input.is_empty() {
        return Vec::new();
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let new_len = (input.len() as f64 * ratio).round() as usize;
    match new_len {
        0 => Vec::new(),
        1 => vec![input[0]],
        _ => {
            let last = (input.len() - 1) as f64;
            let step = last / (new_len - 1) as f64;
            (0..new_len)
                .map(|i| interpolate(input, i as f64 * step))
                .collect()
        }
    }
}

fn interpolate(input: &[f32], position: f64) -> f32 {
    let idx = position.floor() as usize;
    let frac = (position - idx as f64) as f32;
    match (input.get(idx), input.get(idx + 1)) {
        (Some(a), Some(b)) => a * (1.0 - frac) + b * frac,
        (Some(a), None) => *a,
        _ => input.last().copied().unwrap_or(0.0),
    }
}

/// Return exactly `frame_length` samples: zero-padded or truncated on the right.
pub fn prepare_for_fixed_frame(input: &[f32], frame_length: usize) -> Vec<f32> {
    let mut data = input.to_vec();
    match data.len().cmp(&frame_length) {
        CmpOrdering::Greater => data.truncate(frame_length),
        CmpOrdering::Less => data.resize(frame_length, 0.0),
        CmpOrdering::Equal => {}
    }
    data
}

/// Downmix, normalize, and resample one capture chunk into an `AudioFrame`.
pub fn prepare_for_processing(chunk: &RawChunk, target_rate: u32) -> AudioFrame {
    let channels = usize::from(chunk.channels.max(1));
    let mut mono = Vec::with_capacity(chunk.samples.len() / channels + 1);
    match &chunk.samples {
        RawSamples::F32(data) => append_downmixed_samples(&mut mono, data, channels, f32::to_unit),
        RawSamples::I16(data) => append_downmixed_samples(&mut mono, data, channels, i16::to_unit),
        RawSamples::I32(data) => append_downmixed_samples(&mut mono, data, channels, i32::to_unit),
        RawSamples::U16(data) => append_downmixed_samples(&mut mono, data, channels, u16::to_unit),
    }
    let samples = resample(&mono, chunk.sample_rate, target_rate);
    let rate = if chunk.sample_rate == 0 || target_rate == 0 {
        chunk.sample_rate
    } else {
        target_rate
    };
    AudioFrame::new(samples, rate, chunk.timestamp)
}

/// Scale unit samples to 16-bit PCM, clamping out-of-range input.
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.to_unit() * f32::from(i16::MAX)).round() as i16)
        .collect()
}

pub fn from_pcm16(samples: &[i16]) -> Vec<f32> {
    normalize_samples(samples)
}
