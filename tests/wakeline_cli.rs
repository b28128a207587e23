use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn wakeline_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_wakeline").expect("wakeline test binary not built")
}

#[test]
fn wakeline_help_lists_segmenter_flags() {
    let output = Command::new(wakeline_bin())
        .arg("--help")
        .output()
        .expect("run wakeline --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("Always-on voice front-end"));
    assert!(combined.contains("--silence-timeout-ms"));
    assert!(combined.contains("--pre-roll-frames"));
}

#[test]
fn wakeline_list_input_devices_uses_override() {
    let output = Command::new(wakeline_bin())
        .arg("--list-input-devices")
        .arg("--no-logs")
        .env("WAKELINE_TEST_DEVICES", "USB Mic, Array Mic")
        .output()
        .expect("run wakeline --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("Available audio input devices:"));
    assert!(combined.contains("  - USB Mic"));
    assert!(combined.contains("  - Array Mic"));
}

#[test]
fn wakeline_list_input_devices_handles_empty_override() {
    let output = Command::new(wakeline_bin())
        .args(["--list-input-devices", "--no-logs"])
        .env("WAKELINE_TEST_DEVICES", "")
        .output()
        .expect("run wakeline --list-input-devices");
    assert!(output.status.success());
    assert!(combined_output(&output).contains("No audio input devices detected."));
}

#[test]
fn wakeline_rejects_out_of_range_sensitivity() {
    let output = Command::new(wakeline_bin())
        .args(["--vad-sensitivity", "9", "--list-input-devices"])
        .output()
        .expect("run wakeline with bad sensitivity");
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--vad-sensitivity"));
}
