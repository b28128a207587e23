use super::trigger::{ButtonPress, ProcessingOutcome, RemoteCommand, Trigger};
use crate::audio::{CaptureGate, Utterance};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantState {
    Idle,
    Listening,
    Processing,
    Speaking,
    Error,
}

impl AssistantState {
    pub fn as_str(self) -> &'static str {
        match self {
            AssistantState::Idle => "idle",
            AssistantState::Listening => "listening",
            AssistantState::Processing => "processing",
            AssistantState::Speaking => "speaking",
            AssistantState::Error => "error",
        }
    }
}

impl fmt::Display for AssistantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual feedback requested from the LED renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    State(AssistantState),
    /// Speech heard while listening; no state change.
    VoiceDetected,
}

impl Feedback {
    pub fn name(self) -> &'static str {
        match self {
            Feedback::State(state) => state.as_str(),
            Feedback::VoiceDetected => "voice_detected",
        }
    }

    /// The symbolic LED state this feedback maps onto.
    pub fn led_state(self) -> AssistantState {
        match self {
            Feedback::State(state) => state,
            Feedback::VoiceDetected => AssistantState::Listening,
        }
    }
}

/// Serializable view handed to the status relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub state: AssistantState,
    pub previous: Option<AssistantState>,
    pub transitions: u64,
    pub in_state_ms: u64,
    pub capture_active: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub previous: AssistantState,
    pub next: AssistantState,
    pub at: Instant,
    pub reason: String,
}

/// Side effects a transition asks the runtime to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ResetSegmenter,
    Render(Feedback),
    /// Results for this utterance come back tagged with `job`.
    Transcribe { job: u64, utterance: Utterance },
    Speak(String),
    Publish(StateSnapshot),
}

#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub error_cooldown: Duration,
    /// Zero disables the corresponding fallback.
    pub listen_timeout: Duration,
    pub processing_timeout: Duration,
    pub speaking_timeout: Duration,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            error_cooldown: Duration::from_secs(3),
            listen_timeout: Duration::from_secs(30),
            processing_timeout: Duration::from_secs(30),
            speaking_timeout: Duration::from_secs(60),
        }
    }
}

/// Assistant lifecycle controller.
///
/// Pure with respect to I/O: `handle` and `tick` only mutate the machine and
/// the capture gate, and return the actions the caller must carry out. The
/// gate is open exactly while the state is `Listening`.
pub struct AssistantStateMachine {
    config: MachineConfig,
    gate: CaptureGate,
    state: AssistantState,
    previous: Option<AssistantState>,
    entered_at: Instant,
    deadline: Option<Instant>,
    transitions: u64,
    next_job: u64,
    active_job: Option<u64>,
    history: VecDeque<StateChange>,
    durations: HashMap<AssistantState, Duration>,
}

impl AssistantStateMachine {
    pub fn new(config: MachineConfig, gate: CaptureGate, now: Instant) -> Self {
        gate.close();
        Self {
            config,
            gate,
            state: AssistantState::Idle,
            previous: None,
            entered_at: now,
            deadline: None,
            transitions: 0,
            next_job: 1,
            active_job: None,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            durations: HashMap::new(),
        }
    }

    pub fn handle(&mut self, trigger: Trigger, now: Instant) -> Vec<Action> {
        use AssistantState::*;

        let label = trigger.label();
        match (self.state, trigger) {
            (Idle, Trigger::WakeWord)
            | (Idle, Trigger::Button(ButtonPress::Short))
            | (Idle, Trigger::Remote(RemoteCommand::StartListening)) => {
                self.transition(Listening, label, now, vec![Action::ResetSegmenter])
            }
            (Listening, Trigger::VoiceStart { at }) => {
                tracing::debug!(at_ms = at.as_millis() as u64, "voice detected while listening");
                vec![Action::Render(Feedback::VoiceDetected)]
            }
            (Listening, Trigger::AudioCaptured(utterance)) => {
                let job = self.next_job;
                self.next_job += 1;
                tracing::info!(job, samples = utterance.samples.len(), "utterance captured");
                let actions = self.transition(
                    Processing,
                    label,
                    now,
                    vec![Action::Transcribe { job, utterance }],
                );
                self.active_job = Some(job);
                actions
            }
            (Processing, Trigger::ProcessingResult { job, outcome })
                if self.active_job == Some(job) =>
            {
                match outcome {
                    ProcessingOutcome::Transcribed {
                        reply: Some(reply), ..
                    } if !reply.trim().is_empty() => {
                        self.transition(Speaking, label, now, vec![Action::Speak(reply)])
                    }
                    ProcessingOutcome::Transcribed { .. } => {
                        self.transition(Idle, label, now, Vec::new())
                    }
                    ProcessingOutcome::Failed(reason) => {
                        tracing::warn!(job, %reason, "processing failed");
                        self.transition(Error, label, now, Vec::new())
                    }
                }
            }
            (state, Trigger::ProcessingResult { job, .. }) => {
                tracing::debug!(
                    state = %state,
                    job,
                    active_job = ?self.active_job,
                    "stale processing result dropped"
                );
                Vec::new()
            }
            (Speaking, Trigger::PlaybackFinished) => self.transition(Idle, label, now, Vec::new()),
            (Error, Trigger::Fault(reason)) => {
                tracing::warn!(%reason, "fault while in error; cooldown restarted");
                self.deadline = Some(now + self.config.error_cooldown);
                vec![Action::ResetSegmenter]
            }
            (_, Trigger::Fault(reason)) => {
                tracing::error!(%reason, "assistant fault");
                self.transition(Error, label, now, vec![Action::ResetSegmenter])
            }
            (Listening | Processing, Trigger::Cancel)
            | (Listening | Processing, Trigger::Button(ButtonPress::Long))
            | (Listening | Processing, Trigger::Remote(RemoteCommand::Cancel)) => {
                self.transition(Idle, label, now, vec![Action::ResetSegmenter])
            }
            (Idle, Trigger::Remote(RemoteCommand::Reset)) => vec![Action::ResetSegmenter],
            (_, Trigger::Remote(RemoteCommand::Reset)) => {
                self.transition(Idle, label, now, vec![Action::ResetSegmenter])
            }
            (state, _) => {
                tracing::debug!(state = %state, trigger = label, "trigger ignored");
                Vec::new()
            }
        }
    }

    /// Evaluate cooldown and timeout deadlines.
    pub fn tick(&mut self, now: Instant) -> Vec<Action> {
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return Vec::new(),
        }
        match self.state {
            AssistantState::Error => self.transition(AssistantState::Idle, "cooldown", now, Vec::new()),
            AssistantState::Listening | AssistantState::Processing | AssistantState::Speaking => {
                tracing::warn!(state = %self.state, "state timed out; returning to idle");
                self.transition(
                    AssistantState::Idle,
                    "timeout",
                    now,
                    vec![Action::ResetSegmenter],
                )
            }
            AssistantState::Idle => {
                self.deadline = None;
                Vec::new()
            }
        }
    }

    fn transition(
        &mut self,
        next: AssistantState,
        reason: &str,
        now: Instant,
        mut actions: Vec<Action>,
    ) -> Vec<Action> {
        let previous = self.state;
        *self.durations.entry(previous).or_default() += now.saturating_duration_since(self.entered_at);

        // Frames segmented after the capture must not survive into the next
        // listening session.
        if previous == AssistantState::Listening
            && !actions.iter().any(|action| matches!(action, Action::ResetSegmenter))
        {
            actions.push(Action::ResetSegmenter);
        }
        if previous == AssistantState::Processing {
            self.active_job = None;
        }

        self.state = next;
        self.previous = Some(previous);
        self.entered_at = now;
        self.deadline = self.deadline_for(next).map(|limit| now + limit);
        self.transitions += 1;

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(StateChange {
            previous,
            next,
            at: now,
            reason: reason.to_string(),
        });

        if next == AssistantState::Listening {
            self.gate.open();
        } else {
            self.gate.close();
        }

        tracing::info!(from = %previous, to = %next, reason, "state transition");
        actions.push(Action::Render(Feedback::State(next)));
        actions.push(Action::Publish(self.snapshot(now)));
        actions
    }

    fn deadline_for(&self, state: AssistantState) -> Option<Duration> {
        let limit = match state {
            AssistantState::Idle => return None,
            AssistantState::Error => return Some(self.config.error_cooldown),
            AssistantState::Listening => self.config.listen_timeout,
            AssistantState::Processing => self.config.processing_timeout,
            AssistantState::Speaking => self.config.speaking_timeout,
        };
        (!limit.is_zero()).then_some(limit)
    }

    pub fn state(&self) -> AssistantState {
        self.state
    }

    pub fn gate(&self) -> &CaptureGate {
        &self.gate
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Id of the transcription the machine is waiting on, if any.
    pub fn active_job(&self) -> Option<u64> {
        self.active_job
    }

    pub fn snapshot(&self, now: Instant) -> StateSnapshot {
        StateSnapshot {
            state: self.state,
            previous: self.previous,
            transitions: self.transitions,
            in_state_ms: now.saturating_duration_since(self.entered_at).as_millis() as u64,
            capture_active: self.gate.is_open(),
            reason: self.history.back().map(|change| change.reason.clone()),
        }
    }

    /// Most recent `limit` transitions, oldest first.
    pub fn history(&self, limit: usize) -> Vec<StateChange> {
        let skip = self.history.len().saturating_sub(limit);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Total time spent in `state`, including the current stay.
    pub fn time_in(&self, state: AssistantState, now: Instant) -> Duration {
        let mut total = self.durations.get(&state).copied().unwrap_or_default();
        if state == self.state {
            total += now.saturating_duration_since(self.entered_at);
        }
        total
    }
}
