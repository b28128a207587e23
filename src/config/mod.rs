//! Command-line parsing and validation helpers.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use crate::assistant::MachineConfig;
use crate::audio::SegmenterConfig;
use clap::{Parser, ValueEnum};
use std::time::Duration;

pub use defaults::{
    default_vad_engine, DEFAULT_BACKEND_TIMEOUT_MS, DEFAULT_BACKEND_URL, DEFAULT_CAPTURE_BLOCK_MS,
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_ERROR_COOLDOWN_MS, DEFAULT_LISTEN_TIMEOUT_MS,
    DEFAULT_LOG_LEVEL, DEFAULT_MAX_UTTERANCE_MS, DEFAULT_PRE_ROLL_FRAMES,
    DEFAULT_PROCESSING_TIMEOUT_MS, DEFAULT_SAMPLE_RATE, DEFAULT_SILENCE_TIMEOUT_MS,
    DEFAULT_SPEAKING_TIMEOUT_MS, DEFAULT_SPEECH_THRESHOLD, DEFAULT_VAD_FRAME_MS,
    DEFAULT_VAD_SENSITIVITY, DEFAULT_VAD_THRESHOLD_DB, DEFAULT_WAKE_FRAME_LENGTH,
    DEFAULT_WAKE_THRESHOLD,
};

/// CLI options for the wakeline front-end. Every value is range-checked by
/// `validate()` before the pipeline starts.
#[derive(Debug, Parser, Clone)]
#[command(about = "Always-on voice front-end", author, version)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long, env = "WAKELINE_INPUT_DEVICE")]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Write JSON trace logs to WAKELINE_TRACE_LOG (or the temp dir)
    #[arg(long = "logs", env = "WAKELINE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all logging (overrides --logs)
    #[arg(long = "no-logs", env = "WAKELINE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long = "log-level", env = "WAKELINE_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Target sample rate for the segmenter and wake-word detector (Hz)
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Voice activity detection frame size (milliseconds)
    #[arg(long = "vad-frame-ms", default_value_t = DEFAULT_VAD_FRAME_MS)]
    pub vad_frame_ms: u64,

    /// VAD aggressiveness, 0 (permissive) to 3 (strict)
    #[arg(long = "vad-sensitivity", default_value_t = DEFAULT_VAD_SENSITIVITY)]
    pub vad_sensitivity: u8,

    /// Voice activity detector implementation to use
    #[arg(long = "vad-engine", value_enum, default_value_t = default_vad_engine())]
    pub vad_engine: VadEngineKind,

    /// Energy gate for the simple VAD at sensitivity 0 (decibels)
    #[arg(long = "vad-threshold-db", default_value_t = DEFAULT_VAD_THRESHOLD_DB)]
    pub vad_threshold_db: f32,

    /// Score threshold for classifiers that report a confidence
    #[arg(long = "speech-threshold", default_value_t = DEFAULT_SPEECH_THRESHOLD)]
    pub speech_threshold: f32,

    /// Trailing silence that closes an utterance (milliseconds)
    #[arg(long = "silence-timeout-ms", default_value_t = DEFAULT_SILENCE_TIMEOUT_MS)]
    pub silence_timeout_ms: u64,

    /// VAD frames kept ahead of a detected voice start
    #[arg(long = "pre-roll-frames", default_value_t = DEFAULT_PRE_ROLL_FRAMES)]
    pub pre_roll_frames: usize,

    /// Hard cap on one utterance (milliseconds)
    #[arg(long = "max-utterance-ms", default_value_t = DEFAULT_MAX_UTTERANCE_MS)]
    pub max_utterance_ms: u64,

    /// Time spent in the error state before returning to idle (milliseconds)
    #[arg(long = "error-cooldown-ms", default_value_t = DEFAULT_ERROR_COOLDOWN_MS)]
    pub error_cooldown_ms: u64,

    /// Give up listening after this long without a capture (0 disables)
    #[arg(long = "listen-timeout-ms", default_value_t = DEFAULT_LISTEN_TIMEOUT_MS)]
    pub listen_timeout_ms: u64,

    /// Give up waiting on the backend after this long (0 disables)
    #[arg(long = "processing-timeout-ms", default_value_t = DEFAULT_PROCESSING_TIMEOUT_MS)]
    pub processing_timeout_ms: u64,

    /// Give up waiting on reply playback after this long (0 disables)
    #[arg(long = "speaking-timeout-ms", default_value_t = DEFAULT_SPEAKING_TIMEOUT_MS)]
    pub speaking_timeout_ms: u64,

    /// Capacity of each bounded queue (capture, triggers, sinks)
    #[arg(long = "channel-capacity", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Capture block size handed from the audio callback (milliseconds)
    #[arg(long = "capture-block-ms", default_value_t = DEFAULT_CAPTURE_BLOCK_MS)]
    pub capture_block_ms: u64,

    /// Samples per wake-word detector frame
    #[arg(long = "wake-frame-length", default_value_t = DEFAULT_WAKE_FRAME_LENGTH)]
    pub wake_frame_length: usize,

    /// Score threshold for the wake-word detector
    #[arg(long = "wake-threshold", default_value_t = DEFAULT_WAKE_THRESHOLD)]
    pub wake_threshold: f32,

    /// Base URL of the assistant backend
    #[arg(long = "backend-url", env = "WAKELINE_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// HTTP timeout for one transcription request (milliseconds)
    #[arg(long = "backend-timeout-ms", default_value_t = DEFAULT_BACKEND_TIMEOUT_MS)]
    pub backend_timeout_ms: u64,
}

/// Available runtime-selectable VAD implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VadEngineKind {
    Earshot,
    Simple,
}

impl VadEngineKind {
    pub fn label(self) -> &'static str {
        match self {
            VadEngineKind::Earshot => "earshot",
            VadEngineKind::Simple => "simple",
        }
    }
}

/// Runtime wiring knobs that are neither segmenter nor state-machine policy.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub target_rate: u32,
    pub channel_capacity: usize,
    pub capture_block_ms: u64,
    pub wake_frame_length: usize,
    pub wake_threshold: f32,
    pub tick_interval: Duration,
}

impl AppConfig {
    pub fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            sample_rate: self.sample_rate,
            frame_ms: self.vad_frame_ms,
            sensitivity: self.vad_sensitivity,
            silence_timeout: Duration::from_millis(self.silence_timeout_ms),
            pre_roll_frames: self.pre_roll_frames,
            max_utterance: Duration::from_millis(self.max_utterance_ms),
            speech_threshold: self.speech_threshold,
            vad_threshold_db: self.vad_threshold_db,
        }
    }

    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            error_cooldown: Duration::from_millis(self.error_cooldown_ms),
            listen_timeout: Duration::from_millis(self.listen_timeout_ms),
            processing_timeout: Duration::from_millis(self.processing_timeout_ms),
            speaking_timeout: Duration::from_millis(self.speaking_timeout_ms),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            target_rate: self.sample_rate,
            channel_capacity: self.channel_capacity,
            capture_block_ms: self.capture_block_ms,
            wake_frame_length: self.wake_frame_length,
            wake_threshold: self.wake_threshold,
            tick_interval: Duration::from_millis(100),
        }
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}
