//! Audio normalization and voice activity segmentation.
//!
//! Raw microphone chunks arrive at whatever rate and layout the device
//! offers. They are downmixed, normalized to [-1, 1] `f32`, and resampled to
//! the target rate before the segmenter slices them into fixed VAD frames.

/// Default target sample rate shared by the VAD and wake-word classifiers.
pub const TARGET_RATE: u32 = 16_000;

/// Target channel count for every downstream consumer.
pub const TARGET_CHANNELS: u16 = 1;

mod buffer;
mod dispatch;
mod frame;
mod gate;
mod recorder;
mod resample;
mod segmenter;
mod vad;
mod wake;

pub use buffer::{PreRollBuffer, UtteranceBuffer};
pub use dispatch::append_downmixed_samples;
pub use frame::{AudioFrame, RawChunk, RawSamples, Utterance};
pub use gate::CaptureGate;
pub use recorder::{CaptureStream, Recorder};
pub use resample::{
    from_pcm16, normalize_samples, prepare_for_fixed_frame, prepare_for_processing, resample,
    to_pcm16, PcmSample,
};
pub use segmenter::{
    FrameSegmenter, SegmenterConfig, SegmenterEvent, SegmenterState, SegmenterStats,
    SharedSegmenter,
};
pub use vad::{rms_db, SimpleThresholdVad, VadDecision, VadEngine};
pub use wake::{WakeWordDetector, WakeWordGate};
