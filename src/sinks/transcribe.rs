//! Remote transcription: one utterance in, recognized text (and optionally a
//! spoken reply) out.

use crate::audio::Utterance;
use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

const PROCESS_PATH: &str = "/api/v1/audio/process";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub reply: Option<String>,
}

pub trait Transcriber: Send {
    fn transcribe(&self, utterance: &Utterance) -> Result<Transcript>;
}

/// Posts the utterance as a WAV upload to the assistant backend.
pub struct HttpTranscriber {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTranscriber {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}{PROCESS_PATH}", backend_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transcriber for HttpTranscriber {
    fn transcribe(&self, utterance: &Utterance) -> Result<Transcript> {
        let wav = utterance.to_wav()?;
        tracing::debug!(wav_bytes = wav.len(), endpoint = %self.endpoint, "uploading utterance");

        let part = Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .context("invalid audio mime type")?;
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(Form::new().part("audio", part))
            .send()
            .with_context(|| format!("request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("backend returned {status}: {body}");
        }
        let body: BackendReply = response
            .json()
            .context("malformed backend response")?;
        body.into_transcript()
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct BackendReply {
    #[serde(default)]
    transcription: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "response")]
    reply: Option<String>,
}

impl BackendReply {
    pub(super) fn into_transcript(self) -> Result<Transcript> {
        let raw = self
            .transcription
            .or(self.text)
            .ok_or_else(|| anyhow!("backend response has no transcription"))?;
        let reply = self
            .reply
            .map(|reply| reply.trim().to_string())
            .filter(|reply| !reply.is_empty());
        Ok(Transcript {
            text: sanitize_transcript(&raw),
            reply,
        })
    }
}

/// Strip non-speech markers such as `[silence]` or `(noise)` and collapse
/// whitespace.
pub fn sanitize_transcript(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    static NON_SPEECH_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = NON_SPEECH_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\[\s*\]|\(\s*\)|\[(?:\s*(?:silence|noise|inaudible|blank_audio|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background)\s*)\]|\((?:\s*(?:silence|noise|inaudible|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background)\s*)\)",
        )
        .ok()
    });
    let without_markers = match re {
        Some(re) => re.replace_all(trimmed, " ").into_owned(),
        None => trimmed.to_string(),
    };
    without_markers
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
