use std::cmp::Ordering;
use std::collections::VecDeque;

/// Rolling window of recent frame levels with a median statistic.
///
/// The median keeps short bursts of speech from dragging the floor upward
/// while the adaptive threshold keeps tracking it during monitoring.
#[derive(Debug, Clone)]
pub struct NoiseFloorEstimator {
    window: VecDeque<f32>,
    capacity: usize,
}

impl NoiseFloorEstimator {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Capacity for a window covering `window_secs` of audio.
    pub fn capacity_for(window_secs: u32, sample_rate: u32, frame_size: usize) -> usize {
        let frames = (u64::from(window_secs) * u64::from(sample_rate)) / frame_size.max(1) as u64;
        (frames as usize).max(1)
    }

    pub fn observe(&mut self, level_db: f32) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(level_db);
    }

    /// Median of the window, or `None` before the first sample.
    pub fn current_floor(&self) -> Option<f32> {
        if self.window.is_empty() {
            return None;
        }
        let mut sorted: Vec<f32> = self.window.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
