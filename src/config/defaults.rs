use super::VadEngineKind;

pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_VAD_FRAME_MS: u64 = 30;
pub const DEFAULT_VAD_SENSITIVITY: u8 = 3;
pub const DEFAULT_VAD_THRESHOLD_DB: f32 = -40.0;
pub const DEFAULT_SPEECH_THRESHOLD: f32 = 0.5;
pub const DEFAULT_SILENCE_TIMEOUT_MS: u64 = 1_500;
pub const DEFAULT_PRE_ROLL_FRAMES: usize = 10;
pub const DEFAULT_MAX_UTTERANCE_MS: u64 = 20_000;

pub const DEFAULT_ERROR_COOLDOWN_MS: u64 = 3_000;
pub const DEFAULT_LISTEN_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PROCESSING_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SPEAKING_TIMEOUT_MS: u64 = 60_000;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
pub const DEFAULT_CAPTURE_BLOCK_MS: u64 = 30;
pub const DEFAULT_WAKE_FRAME_LENGTH: usize = 512;
pub const DEFAULT_WAKE_THRESHOLD: f32 = 0.5;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Earshot only runs at these frame lengths.
pub(super) const EARSHOT_FRAME_MS: [u64; 3] = [10, 20, 30];
pub(super) const MAX_TIMEOUT_MS: u64 = 600_000;

pub fn default_vad_engine() -> VadEngineKind {
    if cfg!(feature = "vad_earshot") {
        VadEngineKind::Earshot
    } else {
        VadEngineKind::Simple
    }
}
