//! Glue between capture, segmentation, the state machine, and the sinks.
//!
//! One thread owns the `Assistant` and multiplexes three inputs: raw capture
//! chunks, external triggers (buttons, remote commands, sink feedback), and a
//! periodic tick that drives the state machine's deadlines. Every side effect
//! leaves through the non-blocking `SinkHub`, so a slow backend can never
//! stall the audio path.

#[cfg(test)]
mod tests;

use crate::assistant::{
    Action, AssistantState, AssistantStateMachine, MachineConfig, StateSnapshot, Trigger,
};
use crate::audio::{
    prepare_for_processing, CaptureGate, FrameSegmenter, RawChunk, SegmenterEvent,
    SharedSegmenter, WakeWordDetector, WakeWordGate,
};
use crate::config::PipelineConfig;
use crate::lock_or_recover;
use crate::sinks::SinkHub;
use anyhow::{bail, Result};
use crossbeam_channel::{never, select, tick, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub struct Assistant {
    machine: Arc<Mutex<AssistantStateMachine>>,
    segmenter: SharedSegmenter,
    gate: CaptureGate,
    wake: Option<WakeWordGate>,
    hub: SinkHub,
    config: PipelineConfig,
}

impl Assistant {
    pub fn new(
        machine_config: MachineConfig,
        segmenter: FrameSegmenter,
        hub: SinkHub,
        config: PipelineConfig,
    ) -> Self {
        let gate = CaptureGate::new();
        let machine = AssistantStateMachine::new(machine_config, gate.clone(), Instant::now());
        tracing::info!(
            vad = segmenter.engine_name(),
            target_rate = config.target_rate,
            "assistant pipeline ready"
        );
        Self {
            machine: Arc::new(Mutex::new(machine)),
            segmenter: segmenter.into_shared(),
            gate,
            wake: None,
            hub,
            config,
        }
    }

    /// Listen for a wake word while idle. The detector's frame length has to
    /// match the configured one.
    pub fn with_wake_word(mut self, detector: Box<dyn WakeWordDetector>) -> Result<Self> {
        if detector.frame_length() != self.config.wake_frame_length {
            bail!(
                "wake word detector '{}' expects {} samples per frame, configured {}",
                detector.name(),
                detector.frame_length(),
                self.config.wake_frame_length
            );
        }
        let gate = WakeWordGate::new(detector, self.config.wake_threshold);
        tracing::info!(detector = gate.detector_name(), "wake word detection enabled");
        self.wake = Some(gate);
        Ok(self)
    }

    /// Normalize one capture chunk and route it. While the gate is closed the
    /// audio only reaches the wake-word detector; the segmenter never sees it.
    pub fn process_chunk(&mut self, chunk: &RawChunk) -> Vec<SegmenterEvent> {
        let frame = prepare_for_processing(chunk, self.config.target_rate);
        tracing::trace!(
            format = chunk.samples.format_label(),
            channels = chunk.channels,
            rate = chunk.sample_rate,
            samples = frame.len(),
            "capture chunk"
        );

        if !self.gate.is_open() {
            let idle = self.state() == AssistantState::Idle;
            let woke = match self.wake.as_mut() {
                Some(wake) if idle => wake.feed(&frame),
                _ => false,
            };
            if woke {
                tracing::info!(at_ms = frame.timestamp().as_millis() as u64, "wake word detected");
                self.handle(Trigger::WakeWord);
            }
            return Vec::new();
        }

        let events = lock_or_recover(&self.segmenter, "runtime::segmenter").process(&frame);
        for event in &events {
            tracing::trace!(event = event.label(), "segmenter event");
            if let Some(trigger) = Trigger::from_segmenter(event.clone()) {
                self.handle(trigger);
            }
        }
        events
    }

    pub fn handle(&mut self, trigger: Trigger) {
        self.handle_at(trigger, Instant::now());
    }

    pub fn handle_at(&mut self, trigger: Trigger, now: Instant) {
        let actions = lock_or_recover(&self.machine, "runtime::machine").handle(trigger, now);
        self.dispatch(actions);
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        let actions = lock_or_recover(&self.machine, "runtime::machine").tick(now);
        self.dispatch(actions);
    }

    fn dispatch(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::ResetSegmenter => {
                    lock_or_recover(&self.segmenter, "runtime::segmenter").reset();
                    if let Some(wake) = self.wake.as_mut() {
                        wake.reset();
                    }
                }
                Action::Render(feedback) => self.hub.render(feedback),
                Action::Transcribe { job, utterance } => self.hub.transcribe(job, utterance),
                Action::Speak(text) => self.hub.speak(text),
                Action::Publish(snapshot) => self.hub.publish(snapshot),
            }
        }
    }

    pub fn state(&self) -> AssistantState {
        lock_or_recover(&self.machine, "runtime::machine").state()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        lock_or_recover(&self.machine, "runtime::machine").snapshot(Instant::now())
    }

    pub fn gate(&self) -> &CaptureGate {
        &self.gate
    }

    pub fn segmenter_handle(&self) -> SharedSegmenter {
        Arc::clone(&self.segmenter)
    }

    pub fn machine_handle(&self) -> Arc<Mutex<AssistantStateMachine>> {
        Arc::clone(&self.machine)
    }

    /// Drive the pipeline until `shutdown` fires or is dropped.
    ///
    /// A closed capture channel or a faulted stream becomes a single
    /// `Fault` trigger; the loop keeps serving triggers and ticks afterwards
    /// so the error cooldown and status relay still work.
    pub fn run(
        &mut self,
        chunks: Receiver<RawChunk>,
        triggers: Receiver<Trigger>,
        shutdown: Receiver<()>,
        capture_faulted: impl Fn() -> bool,
    ) -> Result<()> {
        let ticker = tick(self.config.tick_interval);
        let closed_chunks = never::<RawChunk>();
        let closed_triggers = never::<Trigger>();
        let mut capture_open = true;
        let mut triggers_open = true;
        let mut capture_reported = false;

        loop {
            let chunk_rx = if capture_open { &chunks } else { &closed_chunks };
            let trigger_rx = if triggers_open { &triggers } else { &closed_triggers };
            select! {
                recv(chunk_rx) -> msg => match msg {
                    Ok(chunk) => {
                        self.process_chunk(&chunk);
                    }
                    Err(_) => {
                        tracing::error!("capture channel closed");
                        capture_open = false;
                        if !capture_reported {
                            capture_reported = true;
                            self.handle(Trigger::Fault("capture stream ended".to_string()));
                        }
                    }
                },
                recv(trigger_rx) -> msg => match msg {
                    Ok(trigger) => {
                        tracing::debug!(trigger = trigger.label(), "external trigger");
                        self.handle(trigger);
                    }
                    Err(_) => {
                        tracing::debug!("trigger channel closed");
                        triggers_open = false;
                    }
                },
                recv(ticker) -> _ => {
                    if !capture_reported && capture_faulted() {
                        capture_reported = true;
                        self.handle(Trigger::Fault("capture device error".to_string()));
                    }
                    self.tick();
                },
                recv(shutdown) -> _ => break,
            }
        }

        let stats = lock_or_recover(&self.segmenter, "runtime::segmenter").stats();
        tracing::info!(
            frames = stats.frames_processed,
            speech_frames = stats.speech_frames,
            classify_errors = stats.classify_errors,
            utterances = stats.utterances,
            sink_drops = self.hub.dropped(),
            state = %self.state(),
            "assistant stopped"
        );
        Ok(())
    }
}
