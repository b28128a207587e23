//! Voice Activity Detection (VAD) for speech/silence classification.
//!
//! Engines see one fixed-length 16-bit frame at a time and report a decision.
//! The segmenter owns the engine and turns decisions into utterance events.

use crate::error::ClassifyError;

const FLOOR_DB: f32 = -60.0;
const DB_PER_SENSITIVITY_STEP: f32 = 5.0;

/// Voice Activity Detection engine that processes audio frames.
///
/// # Frame Size Contract
/// Frame size in samples = (sample_rate * frame_duration_ms) / 1000, e.g.
/// 30ms @ 16kHz = 480 samples. Earshot accepts 10, 20, or 30 ms frames and
/// rejects anything else with `ClassifyError::FrameLength`.
pub trait VadEngine: Send {
    fn process_frame(&mut self, samples: &[i16]) -> Result<VadDecision, ClassifyError>;

    /// Apply a new aggressiveness level (0 = permissive, 3 = strict).
    fn set_sensitivity(&mut self, _level: u8) {}

    fn reset(&mut self);

    fn name(&self) -> &'static str {
        "unknown_vad"
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VadDecision {
    Speech,
    Silence,
    /// Continuous confidence, compared against a configured threshold.
    Score(f32),
}

impl VadDecision {
    pub fn is_speech(self, threshold: f32) -> bool {
        match self {
            VadDecision::Speech => true,
            VadDecision::Silence => false,
            VadDecision::Score(score) => score >= threshold,
        }
    }
}

/// Lightweight fallback VAD that operates on RMS energy. Used when Earshot is
/// disabled or unavailable.
#[derive(Debug, Clone)]
pub struct SimpleThresholdVad {
    base_threshold_db: f32,
    threshold_db: f32,
}

impl SimpleThresholdVad {
    pub fn new(threshold_db: f32) -> Self {
        Self {
            base_threshold_db: threshold_db,
            threshold_db,
        }
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }
}

impl VadEngine for SimpleThresholdVad {
    fn process_frame(&mut self, samples: &[i16]) -> Result<VadDecision, ClassifyError> {
        if samples.is_empty() {
            return Ok(VadDecision::Silence);
        }
        let unit: Vec<f32> = samples
            .iter()
            .map(|s| f32::from(*s) / f32::from(i16::MAX))
            .collect();
        if rms_db(&unit) >= self.threshold_db {
            Ok(VadDecision::Speech)
        } else {
            Ok(VadDecision::Silence)
        }
    }

    // Each level above 0 raises the gate by a fixed step.
    fn set_sensitivity(&mut self, level: u8) {
        self.threshold_db =
            self.base_threshold_db + f32::from(level.min(3)) * DB_PER_SENSITIVITY_STEP;
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "simple_threshold_vad"
    }
}

pub fn rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return FLOOR_DB;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = energy.sqrt().max(1e-6);
    20.0 * rms.log10()
}
