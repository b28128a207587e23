//! Earshot-powered Voice Activity Detector adapter implementing `VadEngine`.

use crate::audio::{SegmenterConfig, VadDecision, VadEngine};
use crate::error::ClassifyError;
use earshot::{VoiceActivityDetector, VoiceActivityProfile};

/// Thin wrapper that adapts `earshot` to the crate's `VadEngine` trait.
/// Earshot only runs at 16 kHz on 10, 20, or 30 ms frames.
pub struct EarshotVad {
    detector: VoiceActivityDetector,
    frame_samples: usize,
}

impl EarshotVad {
    pub fn from_config(cfg: &SegmenterConfig) -> Self {
        Self {
            detector: VoiceActivityDetector::new(profile_for(cfg.sensitivity)),
            frame_samples: cfg.frame_samples(),
        }
    }
}

fn profile_for(sensitivity: u8) -> VoiceActivityProfile {
    match sensitivity {
        0 => VoiceActivityProfile::QUALITY,
        1 => VoiceActivityProfile::LBR,
        2 => VoiceActivityProfile::AGGRESSIVE,
        _ => VoiceActivityProfile::VERY_AGGRESSIVE,
    }
}

impl VadEngine for EarshotVad {
    fn process_frame(&mut self, samples: &[i16]) -> Result<VadDecision, ClassifyError> {
        if samples.len() != self.frame_samples {
            return Err(ClassifyError::FrameLength {
                expected: self.frame_samples,
                got: samples.len(),
            });
        }
        match self.detector.predict_16khz(samples) {
            Ok(true) => Ok(VadDecision::Speech),
            Ok(false) => Ok(VadDecision::Silence),
            Err(_) => Err(ClassifyError::Engine("earshot rejected frame".to_string())),
        }
    }

    // The profile is fixed at construction, so a new level means a new detector.
    fn set_sensitivity(&mut self, level: u8) {
        self.detector = VoiceActivityDetector::new(profile_for(level));
    }

    fn reset(&mut self) {
        self.detector.reset();
    }

    fn name(&self) -> &'static str {
        "earshot_vad"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_frame_length() {
        let mut vad = EarshotVad::from_config(&SegmenterConfig::default());
        let err = vad.process_frame(&[0; 100]).unwrap_err();
        assert_eq!(
            err,
            ClassifyError::FrameLength {
                expected: 480,
                got: 100
            }
        );
    }

    #[test]
    fn silent_frame_is_not_speech() {
        let mut vad = EarshotVad::from_config(&SegmenterConfig::default());
        let decision = vad.process_frame(&[0; 480]).expect("decision");
        assert!(!decision.is_speech(0.5));
    }

    #[test]
    fn sensitivity_change_keeps_frame_contract() {
        let mut vad = EarshotVad::from_config(&SegmenterConfig::default());
        vad.set_sensitivity(0);
        assert!(vad.process_frame(&[0; 480]).is_ok());
        assert_eq!(vad.name(), "earshot_vad");
    }
}
