use super::Assistant;
use crate::assistant::{
    AssistantState, Feedback, MachineConfig, ProcessingOutcome, RemoteCommand, Trigger,
};
use crate::audio::{
    FrameSegmenter, RawChunk, RawSamples, SegmenterConfig, SegmenterEvent, SimpleThresholdVad,
    VadDecision, WakeWordDetector,
};
use crate::config::PipelineConfig;
use crate::error::ClassifyError;
use crate::sinks::{SinkHub, SinkReceivers};
use crossbeam_channel::bounded;
use std::f32::consts::PI;
use std::thread;
use std::time::{Duration, Instant};

const CAPTURE_RATE: u32 = 44_100;
const CHUNK: usize = 1_323;

fn pipeline() -> PipelineConfig {
    PipelineConfig {
        target_rate: 16_000,
        channel_capacity: 64,
        capture_block_ms: 30,
        wake_frame_length: 512,
        wake_threshold: 0.5,
        tick_interval: Duration::from_millis(10),
    }
}

fn assistant() -> (Assistant, SinkReceivers) {
    let (hub, receivers) = SinkHub::with_capacity(64);
    let segmenter = FrameSegmenter::new(
        SegmenterConfig::default(),
        Box::new(SimpleThresholdVad::new(-40.0)),
    );
    let assistant = Assistant::new(MachineConfig::default(), segmenter, hub, pipeline());
    (assistant, receivers)
}

fn tone(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / CAPTURE_RATE as f32).sin())
        .collect()
}

fn chunks(signal: &[f32], start_index: usize) -> Vec<RawChunk> {
    signal
        .chunks(CHUNK)
        .enumerate()
        .map(|(i, block)| RawChunk {
            samples: RawSamples::F32(block.to_vec()),
            channels: 1,
            sample_rate: CAPTURE_RATE,
            timestamp: Duration::from_millis((start_index + i) as u64 * 30),
        })
        .collect()
}

fn speech_signal() -> Vec<f32> {
    let mut signal = vec![0.0f32; CAPTURE_RATE as usize];
    signal.extend(tone(CAPTURE_RATE as usize));
    signal.extend(vec![0.0f32; 2 * CAPTURE_RATE as usize]);
    signal
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn closed_gate_keeps_segmenter_idle() {
    let (mut assistant, _receivers) = assistant();
    for chunk in chunks(&speech_signal(), 0) {
        assert!(assistant.process_chunk(&chunk).is_empty());
    }
    assert_eq!(assistant.state(), AssistantState::Idle);
    let stats = assistant
        .segmenter_handle()
        .lock()
        .expect("segmenter")
        .stats();
    assert_eq!(stats.frames_processed, 0);
}

#[test]
fn spoken_request_flows_to_transcriber_and_player() {
    let (mut assistant, receivers) = assistant();
    assistant.handle(Trigger::Remote(RemoteCommand::StartListening));
    assert_eq!(assistant.state(), AssistantState::Listening);
    assert!(assistant.gate().is_open());

    for chunk in chunks(&speech_signal(), 0) {
        assistant.process_chunk(&chunk);
    }

    assert_eq!(assistant.state(), AssistantState::Processing);
    assert!(!assistant.gate().is_open());
    let job = receivers.transcribe.try_recv().expect("utterance handed off");
    assert_eq!(job.id, 1);
    assert_eq!(job.utterance.sample_rate, 16_000);
    let seconds = job.utterance.duration().as_secs_f32();
    assert!((1.3..=3.0).contains(&seconds), "utterance lasted {seconds}s");

    let feedback: Vec<Feedback> = receivers.led.try_iter().collect();
    assert!(feedback.contains(&Feedback::VoiceDetected));
    assert!(feedback.contains(&Feedback::State(AssistantState::Processing)));

    assistant.handle(Trigger::ProcessingResult {
        job: job.id,
        outcome: ProcessingOutcome::Transcribed {
            text: "what time is it".to_string(),
            reply: Some("It is noon.".to_string()),
        },
    });
    assert_eq!(assistant.state(), AssistantState::Speaking);
    assert_eq!(receivers.speak.try_recv().ok().as_deref(), Some("It is noon."));

    assistant.handle(Trigger::PlaybackFinished);
    assert_eq!(assistant.state(), AssistantState::Idle);

    let states: Vec<AssistantState> = receivers.relay.try_iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        vec![
            AssistantState::Listening,
            AssistantState::Processing,
            AssistantState::Speaking,
            AssistantState::Idle,
        ]
    );
}

#[test]
fn speech_after_capture_in_same_chunk_is_discarded() {
    let (mut assistant, receivers) = assistant();
    assistant.handle(Trigger::Remote(RemoteCommand::StartListening));

    // One long block at the target rate: a burst, enough silence to close it,
    // then a second burst that must not start a new utterance.
    let burst: Vec<f32> = (0..8_000)
        .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 16_000.0).sin())
        .collect();
    let mut signal = burst.clone();
    signal.extend(vec![0.0f32; 32_000]);
    signal.extend(burst);
    let chunk = RawChunk {
        samples: RawSamples::F32(signal),
        channels: 1,
        sample_rate: 16_000,
        timestamp: Duration::ZERO,
    };

    let events = assistant.process_chunk(&chunk);
    let starts = events
        .iter()
        .filter(|event| matches!(event, SegmenterEvent::VoiceStart { .. }))
        .count();
    assert_eq!(starts, 2);
    assert_eq!(assistant.state(), AssistantState::Processing);
    assert_eq!(receivers.transcribe.len(), 1);

    let segmenter = assistant.segmenter_handle();
    let segmenter = segmenter.lock().expect("segmenter");
    assert!(!segmenter.is_in_speech());
    assert_eq!(segmenter.utterance_len(), 0);
}

#[test]
fn cancel_mid_utterance_discards_audio() {
    let (mut assistant, receivers) = assistant();
    assistant.handle(Trigger::Remote(RemoteCommand::StartListening));

    let mut signal = vec![0.0f32; CAPTURE_RATE as usize / 2];
    signal.extend(tone(CAPTURE_RATE as usize / 2));
    for chunk in chunks(&signal, 0) {
        assistant.process_chunk(&chunk);
    }
    {
        let segmenter = assistant.segmenter_handle();
        let segmenter = segmenter.lock().expect("segmenter");
        assert!(segmenter.is_in_speech());
        assert!(segmenter.utterance_len() > 0);
    }

    assistant.handle(Trigger::Cancel);
    assert_eq!(assistant.state(), AssistantState::Idle);
    let segmenter = assistant.segmenter_handle();
    let segmenter = segmenter.lock().expect("segmenter");
    assert!(!segmenter.is_in_speech());
    assert_eq!(segmenter.utterance_len(), 0);
    assert_eq!(segmenter.pre_roll_len(), 0);
    assert!(receivers.transcribe.try_recv().is_err());
}

#[test]
fn fault_cools_down_back_to_idle() {
    let (mut assistant, _receivers) = assistant();
    let start = Instant::now();
    assistant.handle_at(Trigger::Fault("mic unplugged".to_string()), start);
    assert_eq!(assistant.state(), AssistantState::Error);

    assistant.tick_at(start + Duration::from_secs(1));
    assert_eq!(assistant.state(), AssistantState::Error);

    assistant.tick_at(start + Duration::from_secs(3));
    assert_eq!(assistant.state(), AssistantState::Idle);
    assert!(!assistant.gate().is_open());
}

#[test]
fn listening_timeout_resets_segmenter() {
    let (mut assistant, _receivers) = assistant();
    let start = Instant::now();
    assistant.handle_at(Trigger::Button(crate::assistant::ButtonPress::Short), start);
    for chunk in chunks(&tone(CAPTURE_RATE as usize / 2), 0) {
        assistant.process_chunk(&chunk);
    }
    assistant.tick_at(start + Duration::from_secs(31));
    assert_eq!(assistant.state(), AssistantState::Idle);
    let segmenter = assistant.segmenter_handle();
    assert_eq!(segmenter.lock().expect("segmenter").utterance_len(), 0);
}

struct ScriptedWake {
    fire_on: usize,
    calls: usize,
}

impl WakeWordDetector for ScriptedWake {
    fn frame_length(&self) -> usize {
        512
    }

    fn process(&mut self, frame: &[i16]) -> Result<VadDecision, ClassifyError> {
        assert_eq!(frame.len(), 512);
        self.calls += 1;
        Ok(if self.calls == self.fire_on {
            VadDecision::Score(0.9)
        } else {
            VadDecision::Score(0.1)
        })
    }

    fn name(&self) -> &'static str {
        "scripted_wake"
    }
}

#[test]
fn wake_word_opens_the_gate() {
    let (assistant, receivers) = assistant();
    let mut assistant = assistant
        .with_wake_word(Box::new(ScriptedWake {
            fire_on: 3,
            calls: 0,
        }))
        .expect("frame length matches");

    let idle = chunks(&vec![0.0f32; CAPTURE_RATE as usize / 2], 0);
    let mut woke_at = None;
    for (index, chunk) in idle.iter().enumerate() {
        assistant.process_chunk(chunk);
        if assistant.state() == AssistantState::Listening {
            woke_at = Some(index);
            break;
        }
    }
    // 3 frames of 512 samples need 1536 samples, about 3.5 chunks at 480 each.
    assert_eq!(woke_at, Some(3));
    assert!(assistant.gate().is_open());
    let snapshot = receivers.relay.try_recv().expect("snapshot");
    assert_eq!(snapshot.reason.as_deref(), Some("wake_word"));
}

#[test]
fn wake_word_frame_length_must_match() {
    let (assistant, _receivers) = assistant();
    let mut config = pipeline();
    config.wake_frame_length = 480;
    let assistant = Assistant {
        config,
        ..assistant
    };
    let err = assistant
        .with_wake_word(Box::new(ScriptedWake {
            fire_on: 1,
            calls: 0,
        }))
        .err()
        .expect("mismatch rejected");
    assert!(err.to_string().contains("512"));
}

#[test]
fn run_loop_turns_lost_capture_into_error() {
    let (assistant, _receivers) = assistant();
    let machine = assistant.machine_handle();
    let (chunk_tx, chunk_rx) = bounded::<RawChunk>(8);
    let (trigger_tx, trigger_rx) = bounded(8);
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

    let worker = thread::spawn(move || {
        let mut assistant = assistant;
        assistant.run(chunk_rx, trigger_rx, shutdown_rx, || false)
    });

    let state = || machine.lock().expect("machine").state();
    trigger_tx
        .send(Trigger::Remote(RemoteCommand::StartListening))
        .expect("send trigger");
    assert!(wait_for(|| state() == AssistantState::Listening));

    drop(chunk_tx);
    assert!(wait_for(|| state() == AssistantState::Error));

    shutdown_tx.send(()).expect("shutdown");
    worker.join().expect("join").expect("run");
}

#[test]
fn run_loop_reports_faulted_stream_once() {
    let (assistant, receivers) = assistant();
    let machine = assistant.machine_handle();
    let (_chunk_tx, chunk_rx) = bounded::<RawChunk>(8);
    let (_trigger_tx, trigger_rx) = bounded::<Trigger>(8);
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

    let worker = thread::spawn(move || {
        let mut assistant = assistant;
        assistant.run(chunk_rx, trigger_rx, shutdown_rx, || true)
    });

    assert!(wait_for(|| machine.lock().expect("machine").state() == AssistantState::Error));
    thread::sleep(Duration::from_millis(50));
    shutdown_tx.send(()).expect("shutdown");
    worker.join().expect("join").expect("run");

    let errors = receivers
        .relay
        .try_iter()
        .filter(|snapshot| snapshot.state == AssistantState::Error)
        .count();
    assert_eq!(errors, 1);
}
