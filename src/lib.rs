//! Always-on voice front-end: microphone normalization, frame-level voice
//! activity segmentation, and the assistant state machine that turns speech
//! events into recording, feedback, and transcription handoff.

pub mod assistant;
pub mod audio;
pub mod config;
mod error;
mod lock;
pub mod runtime;
pub mod sinks;
pub mod telemetry;
#[cfg(feature = "vad_earshot")]
pub mod vad_earshot;

pub use assistant::{
    Action, AssistantState, AssistantStateMachine, ButtonPress, Feedback, MachineConfig,
    ProcessingOutcome, RemoteCommand, StateSnapshot, Trigger,
};
pub use audio::{
    AudioFrame, CaptureGate, FrameSegmenter, RawChunk, RawSamples, SegmenterConfig,
    SegmenterEvent, Utterance,
};
pub use error::{CaptureError, ClassifyError};
pub(crate) use lock::lock_or_recover;
pub use runtime::Assistant;
