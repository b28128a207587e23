//! System microphone capture via CPAL.
//!
//! Handles device enumeration and stream setup. The callback only re-blocks
//! samples and hands them off; normalization happens on the runtime thread.

use super::dispatch::{ChunkSample, FrameDispatcher};
use super::frame::RawChunk;
use crate::error::CaptureError;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SizedSample, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Audio input device wrapper.
pub struct Recorder {
    device: cpal::Device,
}

impl Recorder {
    /// List microphone names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a recorder, optionally forcing a specific device when the board
    /// exposes more than one input.
    pub fn new(preferred_device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string()))?
            }
            None => host
                .default_input_device()
                .ok_or(CaptureError::NoDefaultDevice)?,
        };
        Ok(Self { device })
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Open the device at its default config and start streaming chunks of
    /// roughly `block_ms` into a bounded channel of `capacity` chunks.
    pub fn start(&self, capacity: usize, block_ms: u64) -> Result<CaptureStream> {
        let default_config = self
            .device
            .default_input_config()
            .with_context(|| format!("failed to query config for '{}'", self.device_name()))?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let sample_rate = device_config.sample_rate.0;
        let channels = device_config.channels.max(1);
        let block_frames = ((u64::from(sample_rate) * block_ms.max(1)) / 1000).max(1) as usize;

        tracing::info!(
            device = %self.device_name(),
            format = ?format,
            sample_rate,
            channels,
            block_frames,
            "opening capture stream"
        );

        let (sender, receiver) = bounded::<RawChunk>(capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));
        let faulted = Arc::new(AtomicBool::new(false));
        let wiring = StreamWiring {
            config: &device_config,
            block_frames,
            channels,
            sample_rate,
            sender,
            dropped: dropped.clone(),
            faulted: faulted.clone(),
        };

        let stream = match format {
            SampleFormat::F32 => self.build::<f32>(wiring)?,
            SampleFormat::I16 => self.build::<i16>(wiring)?,
            SampleFormat::I32 => self.build::<i32>(wiring)?,
            SampleFormat::U16 => self.build::<u16>(wiring)?,
            other => return Err(CaptureError::UnsupportedFormat(format!("{other:?}")).into()),
        };
        stream.play().with_context(|| {
            format!(
                "failed to start capture stream. {}",
                mic_permission_hint()
            )
        })?;

        Ok(CaptureStream {
            stream,
            receiver,
            dropped,
            faulted,
            sample_rate,
            channels,
        })
    }

    fn build<T>(&self, wiring: StreamWiring<'_>) -> Result<cpal::Stream>
    where
        T: SizedSample + ChunkSample + Send + 'static,
    {
        let StreamWiring {
            config,
            block_frames,
            channels,
            sample_rate,
            sender,
            dropped,
            faulted,
        } = wiring;
        let mut dispatcher =
            FrameDispatcher::<T>::new(block_frames, channels, sample_rate, sender, dropped);
        let stream = self.device.build_input_stream(
            config,
            move |data: &[T], _| dispatcher.push(data),
            move |err| {
                faulted.store(true, Ordering::Release);
                tracing::error!(error = %err, "audio stream error");
            },
            None,
        )?;
        Ok(stream)
    }
}

struct StreamWiring<'a> {
    config: &'a StreamConfig,
    block_frames: usize,
    channels: u16,
    sample_rate: u32,
    sender: Sender<RawChunk>,
    dropped: Arc<AtomicUsize>,
    faulted: Arc<AtomicBool>,
}

/// A running input stream. Dropping it stops capture and disconnects the
/// chunk channel.
pub struct CaptureStream {
    stream: cpal::Stream,
    receiver: Receiver<RawChunk>,
    dropped: Arc<AtomicUsize>,
    faulted: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl CaptureStream {
    pub fn receiver(&self) -> Receiver<RawChunk> {
        self.receiver.clone()
    }

    /// Chunks discarded because the runtime fell behind.
    pub fn dropped_chunks(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Set once the backend reports a stream error (e.g. device unplugged).
    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        if let Err(err) = self.stream.pause() {
            tracing::debug!(error = %err, "failed to pause audio stream");
        }
    }
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check ALSA/PipeWire permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}
