use anyhow::Result;
use wakeline::audio;

/// Print capture devices. `WAKELINE_TEST_DEVICES` (comma separated) replaces
/// the cpal query so CI can exercise this without hardware.
pub(crate) fn list_input_devices() -> Result<()> {
    let devices = if let Ok(raw) = std::env::var("WAKELINE_TEST_DEVICES") {
        raw.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    } else {
        audio::Recorder::list_devices().unwrap_or_else(|err| {
            eprintln!("Failed to list audio input devices: {err}");
            Vec::new()
        })
    };

    if devices.is_empty() {
        println!("No audio input devices detected.");
    } else {
        println!("Available audio input devices:");
        for name in devices {
            println!("  - {name}");
        }
    }
    Ok(())
}
