//! Wake-word boundary. The detector itself is an external black box; this
//! module only re-blocks normalized audio into the fixed frames it expects.

use super::frame::AudioFrame;
use super::resample::{prepare_for_fixed_frame, to_pcm16};
use super::vad::VadDecision;
use crate::error::ClassifyError;

pub trait WakeWordDetector: Send {
    /// Samples per frame the detector requires (e.g. 512 at 16 kHz).
    fn frame_length(&self) -> usize;

    fn process(&mut self, frame: &[i16]) -> Result<VadDecision, ClassifyError>;

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "unknown_wake_word"
    }
}

/// Feeds a detector with exact-length frames carved from arbitrary chunks.
pub struct WakeWordGate {
    detector: Box<dyn WakeWordDetector>,
    threshold: f32,
    pending: Vec<f32>,
}

impl WakeWordGate {
    pub fn new(detector: Box<dyn WakeWordDetector>, threshold: f32) -> Self {
        Self {
            detector,
            threshold,
            pending: Vec::new(),
        }
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    /// Returns true once per detection; the pending tail is discarded after a
    /// hit so one utterance cannot fire twice.
    pub fn feed(&mut self, frame: &AudioFrame) -> bool {
        let frame_length = self.detector.frame_length().max(1);
        self.pending.extend_from_slice(frame.samples());

        let mut offset = 0;
        let mut detected = false;
        while self.pending.len() - offset >= frame_length {
            let block = prepare_for_fixed_frame(&self.pending[offset..], frame_length);
            offset += frame_length;
            match self.detector.process(&to_pcm16(&block)) {
                Ok(decision) if decision.is_speech(self.threshold) => {
                    detected = true;
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(detector = self.detector.name(), error = %err, "wake word frame rejected");
                }
            }
        }

        if detected {
            self.reset();
        } else {
            self.pending.drain(..offset);
        }
        detected
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.detector.reset();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
