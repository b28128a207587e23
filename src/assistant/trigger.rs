use crate::audio::{SegmenterEvent, Utterance};
use serde::Serialize;
use std::time::Duration;

/// Already-debounced button events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonPress {
    Short,
    Long,
}

impl ButtonPress {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "short" | "short_press" => Some(ButtonPress::Short),
            "long" | "long_press" => Some(ButtonPress::Long),
            _ => None,
        }
    }
}

/// Commands arriving from the relay side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCommand {
    StartListening,
    Cancel,
    Reset,
}

impl RemoteCommand {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "start" | "start_listening" | "listen" => Some(RemoteCommand::StartListening),
            "cancel" | "stop" => Some(RemoteCommand::Cancel),
            "reset" => Some(RemoteCommand::Reset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// `reply` is the text to speak back, when the backend produced one.
    Transcribed { text: String, reply: Option<String> },
    Failed(String),
}

/// Everything the state machine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    WakeWord,
    Button(ButtonPress),
    Remote(RemoteCommand),
    VoiceStart { at: Duration },
    AudioCaptured(Utterance),
    /// `job` echoes the id handed out with `Action::Transcribe`.
    ProcessingResult { job: u64, outcome: ProcessingOutcome },
    PlaybackFinished,
    Fault(String),
    Cancel,
}

impl Trigger {
    /// Segmenter events that drive transitions. `VoiceContinuing` and
    /// `VoiceEnd` carry no transition of their own.
    pub fn from_segmenter(event: SegmenterEvent) -> Option<Self> {
        match event {
            SegmenterEvent::VoiceStart { at } => Some(Trigger::VoiceStart { at }),
            SegmenterEvent::AudioCaptured(utterance) => Some(Trigger::AudioCaptured(utterance)),
            SegmenterEvent::VoiceContinuing { .. } | SegmenterEvent::VoiceEnd { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trigger::WakeWord => "wake_word",
            Trigger::Button(ButtonPress::Short) => "short_press",
            Trigger::Button(ButtonPress::Long) => "long_press",
            Trigger::Remote(RemoteCommand::StartListening) => "remote_start",
            Trigger::Remote(RemoteCommand::Cancel) => "remote_cancel",
            Trigger::Remote(RemoteCommand::Reset) => "remote_reset",
            Trigger::VoiceStart { .. } => "voice_start",
            Trigger::AudioCaptured(_) => "audio_captured",
            Trigger::ProcessingResult {
                outcome: ProcessingOutcome::Transcribed { .. },
                ..
            } => "transcribed",
            Trigger::ProcessingResult {
                outcome: ProcessingOutcome::Failed(_),
                ..
            } => "processing_failed",
            Trigger::PlaybackFinished => "playback_finished",
            Trigger::Fault(_) => "fault",
            Trigger::Cancel => "cancel",
        }
    }
}
