use super::Monitor;
use crate::actuator::KeyActuator;
use crate::audio::FrameSource;
use crate::error::PttError;
use crate::status::{MonitorEvent, StatusSink};
use crate::trigger::{ThresholdState, TriggerSettings};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, warn};

/// Millisecond timestamps for frame evaluation.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since construction, from the monotonic clock.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Longest wait for a frame before the stop flag is checked again.
    pub poll_interval: Duration,
    /// Return as soon as calibration commits a threshold.
    pub stop_after_calibration: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            stop_after_calibration: false,
        }
    }
}

/// Why the loop exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    StreamClosed,
    CalibrationComplete,
    Error(String),
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::Signal => "signal",
            StopReason::StreamClosed => "stream_closed",
            StopReason::CalibrationComplete => "calibration_complete",
            StopReason::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub frames_dropped: usize,
    pub activations: u64,
    pub actuator_failures: u64,
    pub threshold: ThresholdState,
    pub noise_floor_db: Option<f32>,
}

/// Drive `monitor` from `source` until `stop_flag` is set, the stream ends,
/// or (optionally) calibration completes.
///
/// Per-frame problems are reported through `sink` and never end the loop.
/// On every exit path the stream is stopped and the key released.
pub fn run_monitor<A, S, C>(
    source: &mut S,
    monitor: &mut Monitor<A>,
    settings: &TriggerSettings,
    clock: &C,
    stop_flag: &AtomicBool,
    options: &RunOptions,
    sink: &mut dyn StatusSink,
) -> RunSummary
where
    A: KeyActuator,
    S: FrameSource + ?Sized,
    C: Clock + ?Sized,
{
    monitor.start(settings, sink);
    let mut reported_drops = source.dropped_frames();

    let stop_reason = loop {
        if stop_flag.load(Ordering::SeqCst) {
            break StopReason::Signal;
        }
        if options.stop_after_calibration && !monitor.is_calibrating() {
            break StopReason::CalibrationComplete;
        }

        let frame = match source.next_frame(options.poll_interval) {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(PttError::StreamClosed) => break StopReason::StreamClosed,
            Err(err) => {
                error!("capture failed: {err}");
                break StopReason::Error(err.to_string());
            }
        };

        let dropped = source.dropped_frames();
        if dropped > reported_drops {
            warn!(dropped, "capture fell behind; frames dropped");
            sink.event(&MonitorEvent::Warning {
                kind: "frames_dropped",
                message: format!("{} frame(s) dropped upstream", dropped - reported_drops),
            });
            reported_drops = dropped;
        }

        // Malformed frames are already reported by the monitor.
        let _ = monitor.process_frame(&frame, settings, clock.now_ms(), sink);
    };

    source.stop();
    monitor.stop(stop_reason.label(), clock.now_ms(), sink);

    let stats = monitor.stats();
    RunSummary {
        stop_reason,
        frames_processed: stats.frames_processed,
        frames_rejected: stats.frames_rejected,
        frames_dropped: source.dropped_frames(),
        activations: stats.activations,
        actuator_failures: stats.actuator_failures,
        threshold: monitor.threshold_state(),
        noise_floor_db: monitor.noise_floor_db(),
    }
}
