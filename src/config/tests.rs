use super::{default_vad_engine, AppConfig, VadEngineKind};
use clap::Parser;
use std::time::Duration;

fn simple_config(args: &[&str]) -> AppConfig {
    let mut argv = vec!["test-app", "--vad-engine", "simple"];
    argv.extend_from_slice(args);
    AppConfig::parse_from(argv)
}

#[test]
fn defaults_validate() {
    let mut cfg = AppConfig::parse_from(["test-app"]);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.sample_rate, 16_000);
    assert_eq!(cfg.vad_frame_ms, 30);
    assert_eq!(cfg.vad_sensitivity, 3);
    assert_eq!(cfg.silence_timeout_ms, 1_500);
    assert_eq!(cfg.pre_roll_frames, 10);
    assert_eq!(cfg.vad_engine, default_vad_engine());
}

#[test]
fn segmenter_config_maps_fields() {
    let cfg = simple_config(&["--silence-timeout-ms", "2000", "--pre-roll-frames", "4"]);
    let seg = cfg.segmenter_config();
    assert_eq!(seg.silence_timeout, Duration::from_secs(2));
    assert_eq!(seg.pre_roll_frames, 4);
    assert_eq!(seg.frame_samples(), 480);
    assert_eq!(seg.sensitivity, 3);
}

#[test]
fn machine_config_maps_fields() {
    let cfg = simple_config(&["--error-cooldown-ms", "500", "--listen-timeout-ms", "0"]);
    let machine = cfg.machine_config();
    assert_eq!(machine.error_cooldown, Duration::from_millis(500));
    assert_eq!(machine.listen_timeout, Duration::ZERO);
    assert_eq!(machine.speaking_timeout, Duration::from_secs(60));
}

#[test]
fn rejects_sensitivity_out_of_range() {
    let mut cfg = simple_config(&["--vad-sensitivity", "4"]);
    assert!(cfg.validate().is_err());
    let mut cfg = simple_config(&["--vad-sensitivity", "0"]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_silence_timeout_shorter_than_a_frame() {
    let mut cfg = simple_config(&["--silence-timeout-ms", "10"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn max_utterance_must_exceed_silence_timeout() {
    let mut cfg = simple_config(&["--max-utterance-ms", "1500"]);
    assert!(cfg.validate().is_err());
    let mut cfg = simple_config(&["--max-utterance-ms", "1501"]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_thresholds_out_of_range() {
    let mut cfg = simple_config(&["--speech-threshold", "1.5"]);
    assert!(cfg.validate().is_err());
    let mut cfg = simple_config(&["--wake-threshold=-0.1"]);
    assert!(cfg.validate().is_err());
    let mut cfg = simple_config(&["--vad-threshold-db", "3"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_channel_capacity_bounds() {
    let mut cfg = simple_config(&["--channel-capacity", "4"]);
    assert!(cfg.validate().is_err());
    let mut cfg = simple_config(&["--channel-capacity", "2048"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn normalizes_backend_url() {
    let mut cfg = simple_config(&["--backend-url", " http://assistant.local:8000/ "]);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.backend_url, "http://assistant.local:8000");

    let mut cfg = simple_config(&["--backend-url", "ftp://assistant.local"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_blank_input_device() {
    let mut cfg = simple_config(&["--input-device", "  "]);
    assert!(cfg.validate().is_err());
}

#[test]
fn simple_engine_accepts_any_frame_size() {
    let mut cfg = simple_config(&["--vad-frame-ms", "25", "--sample-rate", "22050"]);
    assert!(cfg.validate().is_ok());
    assert_eq!(VadEngineKind::Simple.label(), "simple");
}

#[cfg(feature = "vad_earshot")]
#[test]
fn earshot_requires_supported_frame_and_rate() {
    let mut cfg = AppConfig::parse_from(["test-app", "--vad-engine", "earshot", "--vad-frame-ms", "25"]);
    assert!(cfg.validate().is_err());
    let mut cfg =
        AppConfig::parse_from(["test-app", "--vad-engine", "earshot", "--sample-rate", "8000"]);
    assert!(cfg.validate().is_err());
    let mut cfg = AppConfig::parse_from(["test-app", "--vad-engine", "earshot", "--vad-frame-ms", "20"]);
    assert!(cfg.validate().is_ok());
}

#[cfg(not(feature = "vad_earshot"))]
#[test]
fn earshot_requires_feature() {
    let mut cfg = AppConfig::parse_from(["test-app", "--vad-engine", "earshot"]);
    assert!(cfg.validate().is_err());
}
