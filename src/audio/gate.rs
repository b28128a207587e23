use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "segmenter accepts frames" flag. Only the state machine opens or
/// closes it; the audio path only reads it.
#[derive(Clone, Debug, Default)]
pub struct CaptureGate {
    open: Arc<AtomicBool>,
}

impl CaptureGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::Release);
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}
