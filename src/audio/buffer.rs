//! Frame buffers owned by the segmenter.

use std::collections::VecDeque;

/// Ring of the most recent segmentation frames, kept regardless of speech
/// state so the onset of an utterance is not clipped.
#[derive(Debug, Clone)]
pub struct PreRollBuffer {
    frames: VecDeque<Vec<f32>>,
    capacity: usize,
}

impl PreRollBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, frame: &[f32]) {
        if self.capacity == 0 {
            return;
        }
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame.to_vec());
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest frame first.
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> {
        self.frames.iter().map(Vec::as_slice)
    }

    pub fn total_samples(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }
}

/// Frames of the utterance in progress. Live only between voice start and
/// voice end.
#[derive(Debug, Clone, Default)]
pub struct UtteranceBuffer {
    frames: Vec<Vec<f32>>,
    total_samples: usize,
}

impl UtteranceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_from(&mut self, pre_roll: &PreRollBuffer) {
        for frame in pre_roll.iter() {
            self.push(frame);
        }
    }

    pub fn push(&mut self, frame: &[f32]) {
        self.total_samples = self.total_samples.saturating_add(frame.len());
        self.frames.push(frame.to_vec());
    }

    /// Concatenate every frame and leave the buffer empty.
    pub fn flatten(&mut self) -> Vec<f32> {
        let mut audio = Vec::with_capacity(self.total_samples);
        for frame in self.frames.drain(..) {
            audio.extend(frame);
        }
        self.total_samples = 0;
        audio
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.total_samples = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn total_samples(&self) -> usize {
        self.total_samples
    }
}
