//! Frame segmenter: turns a stream of normalized audio into utterance events.
//!
//! Incoming frames are re-sliced into fixed VAD frames (the last partial frame
//! of each batch is zero-padded). Each VAD frame is classified once and drives
//! a two-state machine; silence after speech keeps appending until the
//! hang-over expires, then the whole utterance is released at once.

use super::buffer::{PreRollBuffer, UtteranceBuffer};
use super::frame::{AudioFrame, Utterance};
use super::resample::{prepare_for_fixed_frame, resample, to_pcm16};
use super::vad::VadEngine;
use super::TARGET_RATE;
use std::borrow::Cow;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Segmenter shared between the audio path and whoever cancels capture.
/// `reset()` and `process()` serialize on the same lock.
pub type SharedSegmenter = Arc<Mutex<FrameSegmenter>>;

#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    pub sample_rate: u32,
    pub frame_ms: u64,
    /// Engine aggressiveness, 0..=3.
    pub sensitivity: u8,
    pub silence_timeout: Duration,
    pub pre_roll_frames: usize,
    /// Hard cap on one utterance; zero disables the cap.
    pub max_utterance: Duration,
    /// Threshold for engines that report a score instead of a verdict.
    pub speech_threshold: f32,
    pub vad_threshold_db: f32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            sample_rate: TARGET_RATE,
            frame_ms: 30,
            sensitivity: 3,
            silence_timeout: Duration::from_millis(1500),
            pre_roll_frames: 10,
            max_utterance: Duration::from_secs(20),
            speech_threshold: 0.5,
            vad_threshold_db: -55.0,
        }
    }
}

impl SegmenterConfig {
    pub fn frame_samples(&self) -> usize {
        ((u64::from(self.sample_rate) * self.frame_ms) / 1000).max(1) as usize
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    fn max_utterance_samples(&self) -> Option<usize> {
        if self.max_utterance.is_zero() {
            return None;
        }
        Some((self.max_utterance.as_secs_f64() * f64::from(self.sample_rate)).round() as usize)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmenterEvent {
    VoiceStart { at: Duration },
    VoiceContinuing { at: Duration },
    VoiceEnd { at: Duration },
    AudioCaptured(Utterance),
}

impl SegmenterEvent {
    pub fn label(&self) -> &'static str {
        match self {
            SegmenterEvent::VoiceStart { .. } => "voice_start",
            SegmenterEvent::VoiceContinuing { .. } => "voice_continuing",
            SegmenterEvent::VoiceEnd { .. } => "voice_end",
            SegmenterEvent::AudioCaptured(_) => "audio_captured",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmenterState {
    pub in_speech: bool,
    pub last_voice: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmenterStats {
    pub frames_processed: u64,
    pub speech_frames: u64,
    pub classify_errors: u64,
    pub utterances: u64,
    pub in_speech: bool,
    pub last_voice: Option<Duration>,
}

pub struct FrameSegmenter {
    config: SegmenterConfig,
    engine: Box<dyn VadEngine>,
    state: SegmenterState,
    pre_roll: PreRollBuffer,
    utterance: UtteranceBuffer,
    stats: SegmenterStats,
}

impl FrameSegmenter {
    pub fn new(config: SegmenterConfig, mut engine: Box<dyn VadEngine>) -> Self {
        engine.set_sensitivity(config.sensitivity);
        Self {
            pre_roll: PreRollBuffer::new(config.pre_roll_frames),
            utterance: UtteranceBuffer::new(),
            state: SegmenterState::default(),
            stats: SegmenterStats::default(),
            engine,
            config,
        }
    }

    pub fn into_shared(self) -> SharedSegmenter {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Segment one normalized frame. Frames at a different rate are resampled
    /// to the classifier rate first.
    pub fn process(&mut self, frame: &AudioFrame) -> Vec<SegmenterEvent> {
        let mut events = Vec::new();
        let samples: Cow<'_, [f32]> = if frame.sample_rate() == self.config.sample_rate {
            Cow::Borrowed(frame.samples())
        } else {
            Cow::Owned(resample(
                frame.samples(),
                frame.sample_rate(),
                self.config.sample_rate,
            ))
        };
        if samples.is_empty() {
            return events;
        }

        let frame_samples = self.config.frame_samples();
        let frame_duration = self.config.frame_duration();
        let mut started = false;
        let mut last_at = frame.timestamp();
        for (index, slice) in samples.chunks(frame_samples).enumerate() {
            let now = frame.timestamp() + frame_duration * index as u32;
            last_at = now;
            let padded;
            let vad_frame = if slice.len() == frame_samples {
                slice
            } else {
                padded = prepare_for_fixed_frame(slice, frame_samples);
                padded.as_slice()
            };
            started |= self.step(vad_frame, slice, now, &mut events);
        }

        if self.state.in_speech && !started {
            events.push(SegmenterEvent::VoiceContinuing { at: last_at });
        }
        events
    }

    /// Classify `vad_frame` (padded to the frame length) and buffer `audio`,
    /// the unpadded samples it came from. Returns true when this frame opened
    /// an utterance.
    fn step(
        &mut self,
        vad_frame: &[f32],
        audio: &[f32],
        now: Duration,
        events: &mut Vec<SegmenterEvent>,
    ) -> bool {
        self.stats.frames_processed += 1;
        let speech = match self.engine.process_frame(&to_pcm16(vad_frame)) {
            Ok(decision) => decision.is_speech(self.config.speech_threshold),
            Err(err) => {
                self.stats.classify_errors += 1;
                tracing::warn!(engine = self.engine.name(), error = %err, "vad frame failed; treating as silence");
                false
            }
        };
        if speech {
            self.stats.speech_frames += 1;
        }

        let mut started = false;
        match (speech, self.state.in_speech) {
            (true, false) => {
                self.state.in_speech = true;
                self.state.last_voice = Some(now);
                self.utterance.seed_from(&self.pre_roll);
                self.utterance.push(audio);
                events.push(SegmenterEvent::VoiceStart { at: now });
                tracing::debug!(at_ms = now.as_millis() as u64, pre_roll = self.pre_roll.len(), "voice start");
                started = true;
            }
            (true, true) => {
                self.state.last_voice = Some(now);
                self.utterance.push(audio);
            }
            (false, true) => {
                self.utterance.push(audio);
                let last_voice = self.state.last_voice.unwrap_or(now);
                if now.saturating_sub(last_voice) > self.config.silence_timeout {
                    self.finish(now, events);
                }
            }
            (false, false) => {}
        }

        if self.state.in_speech {
            if let Some(limit) = self.config.max_utterance_samples() {
                if self.utterance.total_samples() >= limit {
                    tracing::debug!(limit, "utterance reached max length; closing");
                    self.finish(now, events);
                }
            }
        }

        self.pre_roll.push(audio);
        debug_assert_eq!(self.utterance.is_empty(), !self.state.in_speech);
        started
    }

    fn finish(&mut self, now: Duration, events: &mut Vec<SegmenterEvent>) {
        self.state.in_speech = false;
        let samples = self.utterance.flatten();
        self.stats.utterances += 1;
        tracing::debug!(
            at_ms = now.as_millis() as u64,
            samples = samples.len(),
            "voice end"
        );
        events.push(SegmenterEvent::VoiceEnd { at: now });
        events.push(SegmenterEvent::AudioCaptured(Utterance {
            samples,
            sample_rate: self.config.sample_rate,
            captured_at: now,
        }));
    }

    /// Drop any in-flight utterance and pre-roll. Idempotent.
    pub fn reset(&mut self) {
        self.state = SegmenterState::default();
        self.pre_roll.clear();
        self.utterance.clear();
        self.engine.reset();
    }

    pub fn set_silence_timeout(&mut self, timeout: Duration) {
        self.config.silence_timeout = timeout;
    }

    pub fn set_sensitivity(&mut self, level: u8) {
        let level = level.min(3);
        self.config.sensitivity = level;
        self.engine.set_sensitivity(level);
    }

    pub fn state(&self) -> SegmenterState {
        self.state
    }

    pub fn stats(&self) -> SegmenterStats {
        SegmenterStats {
            in_speech: self.state.in_speech,
            last_voice: self.state.last_voice,
            ..self.stats.clone()
        }
    }

    pub fn is_in_speech(&self) -> bool {
        self.state.in_speech
    }

    pub fn pre_roll_len(&self) -> usize {
        self.pre_roll.len()
    }

    pub fn utterance_len(&self) -> usize {
        self.utterance.len()
    }
}
