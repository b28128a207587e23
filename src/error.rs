use thiserror::Error;

/// Per-frame classifier failure. Always recovered locally by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("classifier expected {expected} samples, got {got}")]
    FrameLength { expected: usize, got: usize },
    #[error("classifier failed: {0}")]
    Engine(String),
}

/// Capture device setup failures surfaced by the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("input device '{0}' not found")]
    DeviceNotFound(String),
    #[error("no default input device available")]
    NoDefaultDevice,
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
}
