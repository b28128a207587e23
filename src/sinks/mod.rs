//! Output collaborators: LED feedback, status relay, remote transcription,
//! and reply playback. Each runs behind a bounded queue on its own thread.

mod hub;
mod led;
mod player;
mod relay;
mod transcribe;

pub use hub::{spawn_sinks, SinkHub, SinkReceivers, SinkSet, TranscriptionJob};
pub use led::{LedRenderer, TracingLed};
pub use player::{LogReplyPlayer, ReplyPlayer};
pub use relay::{JsonLineRelay, StatusRelay};
pub use transcribe::{sanitize_transcript, HttpTranscriber, Transcriber, Transcript};
