use super::{LedRenderer, ReplyPlayer, StatusRelay, Transcriber};
use crate::assistant::{Feedback, ProcessingOutcome, StateSnapshot, Trigger};
use crate::audio::Utterance;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One utterance queued for transcription, tagged so the state machine can
/// tell a current result from one that arrives after a cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionJob {
    pub id: u64,
    pub utterance: Utterance,
}

/// The concrete collaborators, each moved onto its own worker thread.
pub struct SinkSet {
    pub led: Box<dyn LedRenderer>,
    pub relay: Box<dyn StatusRelay>,
    pub transcriber: Box<dyn Transcriber>,
    pub player: Box<dyn ReplyPlayer>,
}

/// Fire-and-forget handles to the sink workers. A full queue drops the item
/// and bumps `dropped`; nothing here ever blocks the audio path.
#[derive(Clone)]
pub struct SinkHub {
    led: Sender<Feedback>,
    relay: Sender<StateSnapshot>,
    transcribe: Sender<TranscriptionJob>,
    speak: Sender<String>,
    dropped: Arc<AtomicUsize>,
}

pub struct SinkReceivers {
    pub led: Receiver<Feedback>,
    pub relay: Receiver<StateSnapshot>,
    pub transcribe: Receiver<TranscriptionJob>,
    pub speak: Receiver<String>,
}

impl SinkHub {
    /// Hub plus the raw receiving ends, for callers that drive sinks themselves.
    pub fn with_capacity(capacity: usize) -> (Self, SinkReceivers) {
        let capacity = capacity.max(1);
        let (led_tx, led_rx) = bounded(capacity);
        let (relay_tx, relay_rx) = bounded(capacity);
        let (transcribe_tx, transcribe_rx) = bounded(capacity);
        let (speak_tx, speak_rx) = bounded(capacity);
        let hub = Self {
            led: led_tx,
            relay: relay_tx,
            transcribe: transcribe_tx,
            speak: speak_tx,
            dropped: Arc::new(AtomicUsize::new(0)),
        };
        let receivers = SinkReceivers {
            led: led_rx,
            relay: relay_rx,
            transcribe: transcribe_rx,
            speak: speak_rx,
        };
        (hub, receivers)
    }

    pub fn render(&self, feedback: Feedback) {
        self.offer(&self.led, feedback, "led");
    }

    pub fn publish(&self, snapshot: StateSnapshot) {
        self.offer(&self.relay, snapshot, "relay");
    }

    pub fn transcribe(&self, id: u64, utterance: Utterance) {
        self.offer(&self.transcribe, TranscriptionJob { id, utterance }, "transcriber");
    }

    pub fn speak(&self, text: String) {
        self.offer(&self.speak, text, "player");
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    fn offer<T>(&self, sender: &Sender<T>, item: T, sink: &'static str) {
        match sender.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(sink, "sink queue full; dropping");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!(sink, "sink worker gone");
            }
        }
    }
}

/// Start one worker per sink. Transcription results and playback completion
/// come back as triggers on `feedback`.
pub fn spawn_sinks(
    sinks: SinkSet,
    capacity: usize,
    feedback: Sender<Trigger>,
) -> (SinkHub, Vec<JoinHandle<()>>) {
    let (hub, receivers) = SinkHub::with_capacity(capacity);
    let SinkSet {
        mut led,
        mut relay,
        transcriber,
        mut player,
    } = sinks;
    let SinkReceivers {
        led: led_rx,
        relay: relay_rx,
        transcribe: transcribe_rx,
        speak: speak_rx,
    } = receivers;

    let mut handles = Vec::with_capacity(4);
    handles.push(thread::spawn(move || {
        for feedback in led_rx {
            led.render(feedback);
        }
    }));
    handles.push(thread::spawn(move || {
        for snapshot in relay_rx {
            if let Err(err) = relay.publish(&snapshot) {
                tracing::warn!(error = %err, "status relay failed");
            }
        }
    }));

    let results = feedback.clone();
    handles.push(thread::spawn(move || {
        for job in transcribe_rx {
            let outcome = match transcriber.transcribe(&job.utterance) {
                Ok(transcript) => {
                    tracing::info!(job = job.id, text = %transcript.text, "transcription complete");
                    ProcessingOutcome::Transcribed {
                        text: transcript.text,
                        reply: transcript.reply,
                    }
                }
                Err(err) => {
                    tracing::error!(job = job.id, error = %format!("{err:#}"), "transcription failed");
                    ProcessingOutcome::Failed(format!("{err:#}"))
                }
            };
            let result = Trigger::ProcessingResult {
                job: job.id,
                outcome,
            };
            if results.send(result).is_err() {
                break;
            }
        }
    }));
    handles.push(thread::spawn(move || {
        for text in speak_rx {
            if let Err(err) = player.play(&text) {
                tracing::warn!(error = %err, "reply playback failed");
            }
            if feedback.send(Trigger::PlaybackFinished).is_err() {
                break;
            }
        }
    }));

    (hub, handles)
}
