use super::frame::{samples_to_duration, RawChunk, RawSamples};
use crossbeam_channel::{Sender, TrySendError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Downmix multi-channel input to mono while applying the provided converter so
/// the segmenter receives a single channel regardless of the microphone layout.
pub fn append_downmixed_samples<T, F>(buf: &mut Vec<f32>, data: &[T], channels: usize, mut convert: F)
where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    // Average each interleaved frame; a trailing partial frame is averaged
    // over the channels present.
    let mut acc = 0.0f32;
    let mut count = 0usize;
    for sample in data.iter().copied() {
        acc += convert(sample);
        count += 1;
        if count == channels {
            buf.push(acc / channels as f32);
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push(acc / count as f32);
    }
}

/// Raw sample types the dispatcher can wrap back into a `RawChunk`.
pub(super) trait ChunkSample: Copy {
    fn wrap(samples: Vec<Self>) -> RawSamples;
}

impl ChunkSample for f32 {
    fn wrap(samples: Vec<Self>) -> RawSamples {
        RawSamples::F32(samples)
    }
}

impl ChunkSample for i16 {
    fn wrap(samples: Vec<Self>) -> RawSamples {
        RawSamples::I16(samples)
    }
}

impl ChunkSample for i32 {
    fn wrap(samples: Vec<Self>) -> RawSamples {
        RawSamples::I32(samples)
    }
}

impl ChunkSample for u16 {
    fn wrap(samples: Vec<Self>) -> RawSamples {
        RawSamples::U16(samples)
    }
}

/// Re-blocks device callbacks into fixed-size interleaved chunks and hands
/// them to the runtime without ever blocking the audio thread.
pub(super) struct FrameDispatcher<T> {
    block_samples: usize,
    channels: u16,
    sample_rate: u32,
    emitted_frames: u64,
    pending: Vec<T>,
    sender: Sender<RawChunk>,
    dropped: Arc<AtomicUsize>,
}

impl<T: ChunkSample> FrameDispatcher<T> {
    pub(super) fn new(
        block_frames: usize,
        channels: u16,
        sample_rate: u32,
        sender: Sender<RawChunk>,
        dropped: Arc<AtomicUsize>,
    ) -> Self {
        let block_samples = block_frames.max(1) * usize::from(channels.max(1));
        Self {
            block_samples,
            channels: channels.max(1),
            sample_rate,
            emitted_frames: 0,
            pending: Vec::with_capacity(block_samples),
            sender,
            dropped,
        }
    }

    pub(super) fn push(&mut self, data: &[T]) {
        self.pending.extend_from_slice(data);

        while self.pending.len() >= self.block_samples {
            let block: Vec<T> = self.pending.drain(..self.block_samples).collect();
            let timestamp = samples_to_duration(self.emitted_frames as usize, self.sample_rate);
            self.emitted_frames += (self.block_samples / usize::from(self.channels)) as u64;
            let chunk = RawChunk {
                samples: T::wrap(block),
                channels: self.channels,
                sample_rate: self.sample_rate,
                timestamp,
            };
            if let Err(err) = self.sender.try_send(chunk) {
                match err {
                    TrySendError::Full(_) => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    TrySendError::Disconnected(_) => break,
                }
            }
        }
    }
}
