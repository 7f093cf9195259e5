use crate::error::PttResult;
use std::time::Duration;

/// One captured block of mono signed 16-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    samples: Box<[i16]>,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>) -> Self {
        Self {
            samples: samples.into_boxed_slice(),
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<i16>> for AudioFrame {
    fn from(samples: Vec<i16>) -> Self {
        Self::new(samples)
    }
}

/// Anything that yields frames on a steady cadence.
///
/// `next_frame` blocks for at most `timeout` and returns `Ok(None)` when no
/// frame arrived in time, so callers can check their stop flag between waits.
/// `Err(PttError::StreamClosed)` ends the stream.
pub trait FrameSource {
    fn next_frame(&mut self, timeout: Duration) -> PttResult<Option<AudioFrame>>;

    /// Halt delivery. Must be safe to call more than once.
    fn stop(&mut self);

    /// Frames discarded upstream because the consumer fell behind.
    fn dropped_frames(&self) -> usize {
        0
    }
}
