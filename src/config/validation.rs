use super::defaults::{EARSHOT_FRAME_MS, MAX_TIMEOUT_MS};
use super::{AppConfig, VadEngineKind};
use anyhow::{bail, Result};
use clap::Parser;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize the backend URL.
    pub fn validate(&mut self) -> Result<()> {
        if !(8_000..=48_000).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between 8000 and 48000 Hz, got {}",
                self.sample_rate
            );
        }
        if !(5..=120).contains(&self.vad_frame_ms) {
            bail!(
                "--vad-frame-ms must be between 5 and 120, got {}",
                self.vad_frame_ms
            );
        }
        if self.vad_sensitivity > 3 {
            bail!(
                "--vad-sensitivity must be between 0 and 3, got {}",
                self.vad_sensitivity
            );
        }
        if !(-120.0..=0.0).contains(&self.vad_threshold_db) {
            bail!(
                "--vad-threshold-db must be between -120.0 and 0.0 dB, got {}",
                self.vad_threshold_db
            );
        }
        if !(0.0..=1.0).contains(&self.speech_threshold) {
            bail!(
                "--speech-threshold must be between 0.0 and 1.0, got {}",
                self.speech_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.wake_threshold) {
            bail!(
                "--wake-threshold must be between 0.0 and 1.0, got {}",
                self.wake_threshold
            );
        }
        if self.vad_engine == VadEngineKind::Earshot {
            #[cfg(not(feature = "vad_earshot"))]
            bail!("--vad-engine earshot requires building with the 'vad_earshot' feature");
            #[cfg(feature = "vad_earshot")]
            {
                if self.sample_rate != 16_000 {
                    bail!("--vad-engine earshot requires --sample-rate 16000");
                }
                if !EARSHOT_FRAME_MS.contains(&self.vad_frame_ms) {
                    bail!("--vad-engine earshot requires --vad-frame-ms of 10, 20, or 30");
                }
            }
        }
        if !(self.vad_frame_ms..=10_000).contains(&self.silence_timeout_ms) {
            bail!(
                "--silence-timeout-ms must be between --vad-frame-ms ({}) and 10000, got {}",
                self.vad_frame_ms,
                self.silence_timeout_ms
            );
        }
        if self.pre_roll_frames > 100 {
            bail!(
                "--pre-roll-frames must be at most 100, got {}",
                self.pre_roll_frames
            );
        }
        if self.max_utterance_ms <= self.silence_timeout_ms || self.max_utterance_ms > 120_000 {
            bail!(
                "--max-utterance-ms must be above --silence-timeout-ms ({}) and at most 120000",
                self.silence_timeout_ms
            );
        }
        if self.error_cooldown_ms == 0 || self.error_cooldown_ms > MAX_TIMEOUT_MS {
            bail!("--error-cooldown-ms must be between 1 and {MAX_TIMEOUT_MS}");
        }
        for (flag, value) in [
            ("--listen-timeout-ms", self.listen_timeout_ms),
            ("--processing-timeout-ms", self.processing_timeout_ms),
            ("--speaking-timeout-ms", self.speaking_timeout_ms),
        ] {
            if value > MAX_TIMEOUT_MS {
                bail!("{flag} must be at most {MAX_TIMEOUT_MS}, got {value}");
            }
        }
        if !(8..=1024).contains(&self.channel_capacity) {
            bail!(
                "--channel-capacity must be between 8 and 1024, got {}",
                self.channel_capacity
            );
        }
        if !(5..=200).contains(&self.capture_block_ms) {
            bail!(
                "--capture-block-ms must be between 5 and 200, got {}",
                self.capture_block_ms
            );
        }
        if !(64..=8192).contains(&self.wake_frame_length) {
            bail!(
                "--wake-frame-length must be between 64 and 8192, got {}",
                self.wake_frame_length
            );
        }
        if !(100..=120_000).contains(&self.backend_timeout_ms) {
            bail!(
                "--backend-timeout-ms must be between 100 and 120000, got {}",
                self.backend_timeout_ms
            );
        }

        let url = self.backend_url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("--backend-url must start with http:// or https://, got '{url}'");
        }
        self.backend_url = url.to_string();

        if let Some(device) = &self.input_device {
            if device.trim().is_empty() {
                bail!("--input-device must not be empty");
            }
        }
        if self.log_level.trim().is_empty() {
            bail!("--log-level must not be empty");
        }
        Ok(())
    }
}
