//! Microphone capture and loudness measurement.
//!
//! The cpal input stream is downmixed to mono, converted to signed 16-bit
//! samples and cut into fixed-size frames that the monitor consumes one at a
//! time. Levels are reported in dBFS.

/// Samples per frame handed to the monitor.
pub const DEFAULT_FRAME_SIZE: usize = 1024;

/// Sample rate assumed when the device does not report one.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

mod dispatch;
mod frame;
mod meter;
mod recorder;

pub use frame::{AudioFrame, FrameSource};
pub use meter::{level_db, LEVEL_FLOOR_DB};
pub use recorder::{CaptureStream, Recorder};
