use super::defaults::{
    CALIBRATION_FRAMES_RANGE, CHANNEL_CAPACITY_RANGE, FORBIDDEN_DEVICE_CHARS, FRAME_SIZE_RANGE,
    POLL_INTERVAL_RANGE_MS, WINDOW_SECS_RANGE,
};
use super::AppConfig;
use crate::error::PttError;
use crate::monitor::{MonitorConfig, RunOptions};
use crate::trigger::{NoiseFloorEstimator, TriggerSettings};
use anyhow::{bail, Result};
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::time::Duration;

impl AppConfig {
    /// Reject structural values and clamp the trigger values in place.
    pub fn validate(&mut self) -> Result<Vec<PttError>> {
        check_range("--frame-size", self.frame_size, FRAME_SIZE_RANGE)?;
        check_range("--window-secs", self.window_secs, WINDOW_SECS_RANGE)?;
        check_range(
            "--poll-interval-ms",
            self.poll_interval_ms,
            POLL_INTERVAL_RANGE_MS,
        )?;
        check_range(
            "--calibration-frames",
            self.calibration_frames,
            CALIBRATION_FRAMES_RANGE,
        )?;
        check_range(
            "--channel-capacity",
            self.channel_capacity,
            CHANNEL_CAPACITY_RANGE,
        )?;

        if let Some(device) = self.input_device.as_deref() {
            if device.trim().is_empty() {
                bail!("--input-device must not be empty");
            }
            if device.contains(FORBIDDEN_DEVICE_CHARS) {
                bail!("--input-device contains control characters");
            }
        }
        if let Some(db) = self.initial_threshold_db {
            if !db.is_finite() || !(-200.0..=0.0).contains(&db) {
                bail!("--initial-threshold-db must be between -200 and 0 dB, got {db}");
            }
        }

        let raw = TriggerSettings {
            threshold_offset_db: self.threshold_offset_db,
            release_delay_ms: self.release_delay_ms,
            manual_threshold_db: Some(self.manual_threshold_db),
            test_mode: self.test_mode,
        };
        let (clamped, mut warnings) = raw.sanitize();
        self.threshold_offset_db = clamped.threshold_offset_db;
        self.release_delay_ms = clamped.release_delay_ms;
        if let Some(db) = clamped.manual_threshold_db {
            self.manual_threshold_db = db;
        }
        // The manual value only matters when manual mode is on.
        if !self.manual_threshold {
            warnings.retain(|warning| {
                !matches!(
                    warning,
                    PttError::ConfigOutOfRange {
                        field: "manual_threshold_db",
                        ..
                    }
                )
            });
        }
        Ok(warnings)
    }

    /// Session trigger settings.
    pub fn trigger_settings(&self) -> TriggerSettings {
        TriggerSettings {
            threshold_offset_db: self.threshold_offset_db,
            release_delay_ms: self.release_delay_ms,
            manual_threshold_db: self.manual_threshold.then_some(self.manual_threshold_db),
            test_mode: self.test_mode,
        }
    }

    /// Monitor sizing for a stream running at `sample_rate`.
    pub fn monitor_config(&self, sample_rate: u32) -> MonitorConfig {
        MonitorConfig {
            frame_size: self.frame_size,
            window_capacity: NoiseFloorEstimator::capacity_for(
                self.window_secs,
                sample_rate,
                self.frame_size,
            ),
            calibration_frames: self.calibration_frames,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            stop_after_calibration: self.calibrate_only,
        }
    }
}

fn check_range<T>(flag: &str, value: T, range: RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + Display,
{
    if !range.contains(&value) {
        bail!(
            "{flag} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        );
    }
    Ok(())
}
