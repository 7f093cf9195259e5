//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use crate::actuator::PttKey;
use crate::audio::DEFAULT_FRAME_SIZE;
use crate::trigger::{
    DEFAULT_CALIBRATION_FRAMES, DEFAULT_MANUAL_THRESHOLD_DB, DEFAULT_RELEASE_DELAY_MS,
    DEFAULT_THRESHOLD_OFFSET_DB,
};
use clap::Parser;

pub use defaults::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PTT_KEY, DEFAULT_WINDOW_SECS,
};

/// CLI options for VoxPTT. Trigger values out of range are clamped with a
/// warning; structural values out of range are rejected.
#[derive(Debug, Parser, Clone)]
#[command(
    about = "VoxPTT: hold a push-to-talk key while your voice is above the noise floor",
    author,
    version
)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Key held while voice is detected (a character, a name like "space" or
    /// "f9", or a raw key code like 0x56)
    #[arg(long = "ptt-key", default_value = DEFAULT_PTT_KEY)]
    pub ptt_key: PttKey,

    /// Decibels added to the noise floor to form the automatic threshold (5-20)
    #[arg(
        long = "threshold-offset-db",
        default_value_t = DEFAULT_THRESHOLD_OFFSET_DB,
        allow_negative_numbers = true
    )]
    pub threshold_offset_db: i32,

    /// Keep the key held this long after the level drops (0-2000 ms)
    #[arg(
        long = "release-delay-ms",
        default_value_t = DEFAULT_RELEASE_DELAY_MS,
        allow_negative_numbers = true
    )]
    pub release_delay_ms: i64,

    /// Use a fixed threshold instead of calibrating (-60 to 0 dB)
    #[arg(long = "manual-threshold", default_value_t = false)]
    pub manual_threshold: bool,

    /// Fixed threshold used with --manual-threshold
    #[arg(
        long = "manual-threshold-db",
        default_value_t = DEFAULT_MANUAL_THRESHOLD_DB,
        allow_negative_numbers = true
    )]
    pub manual_threshold_db: i32,

    /// Run detection without pressing any key
    #[arg(long = "test-mode", default_value_t = false)]
    pub test_mode: bool,

    /// Frames sampled while calibrating the noise floor
    #[arg(long = "calibration-frames", default_value_t = DEFAULT_CALIBRATION_FRAMES)]
    pub calibration_frames: usize,

    /// Threshold saved from an earlier session; skips calibration
    #[arg(
        long = "initial-threshold-db",
        allow_negative_numbers = true,
        conflicts_with = "manual_threshold"
    )]
    pub initial_threshold_db: Option<f32>,

    /// Calibrate, print the noise floor and suggested threshold, then exit
    #[arg(
        long = "calibrate-only",
        default_value_t = false,
        conflicts_with_all = ["manual_threshold", "initial_threshold_db"]
    )]
    pub calibrate_only: bool,

    /// Samples per analysed frame
    #[arg(long = "frame-size", default_value_t = DEFAULT_FRAME_SIZE)]
    pub frame_size: usize,

    /// Seconds of history used for the rolling noise floor
    #[arg(long = "window-secs", default_value_t = DEFAULT_WINDOW_SECS)]
    pub window_secs: u32,

    /// Longest wait for a frame before checking for shutdown (milliseconds)
    #[arg(long = "poll-interval-ms", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Frames buffered between the audio callback and the monitor
    #[arg(long = "channel-capacity", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Emit newline-delimited JSON status instead of the terminal status line
    #[arg(long = "json-status", default_value_t = false)]
    pub json_status: bool,

    /// Write a JSON trace log to the temp directory
    #[arg(long = "logs", env = "VOXPTT_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all logging, overriding --logs
    #[arg(long = "no-logs", env = "VOXPTT_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}
