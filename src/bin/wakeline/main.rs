//! Wakeline entrypoint: opens the microphone, wires the sink workers, and runs
//! the assistant loop until stdin closes or `quit` is typed.
//!
//! # Threads
//!
//! - cpal callback: re-blocks device audio into bounded capture chunks
//! - Assistant loop: segmentation, state machine, deadline ticks
//! - Sink workers: LED, status relay, transcription, reply playback
//! - Console: maps stdin lines to button and remote triggers

mod cli_utils;
mod console;

use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use std::process;
use wakeline::audio::{Recorder, SimpleThresholdVad, VadEngine};
use wakeline::config::{AppConfig, VadEngineKind};
use wakeline::sinks::{
    spawn_sinks, HttpTranscriber, JsonLineRelay, LogReplyPlayer, SinkSet, TracingLed,
};
use wakeline::telemetry::{init_tracing, tracing_log_path};
use wakeline::{Assistant, FrameSegmenter, SegmenterConfig};

use crate::cli_utils::list_input_devices;
use crate::console::spawn_console_thread;

fn build_vad(config: &AppConfig, segmenter: &SegmenterConfig) -> Box<dyn VadEngine> {
    match config.vad_engine {
        #[cfg(feature = "vad_earshot")]
        VadEngineKind::Earshot => {
            Box::new(wakeline::vad_earshot::EarshotVad::from_config(segmenter))
        }
        #[cfg(not(feature = "vad_earshot"))]
        VadEngineKind::Earshot => Box::new(SimpleThresholdVad::new(segmenter.vad_threshold_db)),
        VadEngineKind::Simple => Box::new(SimpleThresholdVad::new(segmenter.vad_threshold_db)),
    }
}

fn main() -> Result<()> {
    let config = match AppConfig::parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("wakeline: {err:#}");
            process::exit(2);
        }
    };
    init_tracing(&config);
    if config.logs && !config.no_logs {
        eprintln!("trace log: {}", tracing_log_path().display());
    }

    if config.list_input_devices {
        return list_input_devices();
    }

    let pipeline = config.pipeline_config();
    let segmenter_config = config.segmenter_config();
    let vad = build_vad(&config, &segmenter_config);
    tracing::info!(
        engine = config.vad_engine.label(),
        frame_ms = segmenter_config.frame_ms,
        sensitivity = segmenter_config.sensitivity,
        "voice activity detector configured"
    );
    let segmenter = FrameSegmenter::new(segmenter_config, vad);

    let recorder = Recorder::new(config.input_device.as_deref())?;
    tracing::info!(device = %recorder.device_name(), "using input device");
    let capture = recorder
        .start(pipeline.channel_capacity, pipeline.capture_block_ms)
        .context("failed to open microphone")?;

    let (trigger_tx, trigger_rx) = bounded(pipeline.channel_capacity);
    let transcriber = HttpTranscriber::new(&config.backend_url, config.backend_timeout())?;
    tracing::info!(endpoint = transcriber.endpoint(), "assistant backend");
    let sinks = SinkSet {
        led: Box::new(TracingLed::new()),
        relay: Box::new(JsonLineRelay::stdout()),
        transcriber: Box::new(transcriber),
        player: Box::new(LogReplyPlayer),
    };
    let (hub, _workers) = spawn_sinks(sinks, pipeline.channel_capacity, trigger_tx.clone());

    let (shutdown_tx, shutdown_rx) = bounded(1);
    let _console = spawn_console_thread(trigger_tx, shutdown_tx);

    // No wake-word model ships with the binary; `start` or a short press opens the gate.
    let mut assistant = Assistant::new(config.machine_config(), segmenter, hub, pipeline);
    assistant.run(capture.receiver(), trigger_rx, shutdown_rx, || capture.is_faulted())?;

    let dropped = capture.dropped_chunks();
    if dropped > 0 {
        tracing::warn!(dropped, "capture chunks dropped under backpressure");
    }
    Ok(())
}
