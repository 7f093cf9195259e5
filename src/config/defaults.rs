use std::ops::RangeInclusive;

pub const DEFAULT_PTT_KEY: &str = "v";
pub const DEFAULT_WINDOW_SECS: u32 = 5;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

pub(super) const FRAME_SIZE_RANGE: RangeInclusive<usize> = 64..=16_384;
pub(super) const WINDOW_SECS_RANGE: RangeInclusive<u32> = 1..=60;
pub(super) const POLL_INTERVAL_RANGE_MS: RangeInclusive<u64> = 5..=1_000;
pub(super) const CALIBRATION_FRAMES_RANGE: RangeInclusive<usize> = 1..=10_000;
pub(super) const CHANNEL_CAPACITY_RANGE: RangeInclusive<usize> = 4..=1_024;
/// Device names containing these are rejected before they reach cpal.
pub(super) const FORBIDDEN_DEVICE_CHARS: &[char] = &['\0', '\n', '\r'];
