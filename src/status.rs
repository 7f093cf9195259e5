//! Per-frame status and discrete events for whoever is watching the monitor.
//!
//! Two sinks ship with the crate: a single-line terminal display and
//! newline-delimited JSON for external frontends.

use crate::trigger::{ThresholdState, TriggerState};
use serde::{Serialize, Serializer};
use std::io::Write;

fn round_db(db: f32) -> f64 {
    (f64::from(db) * 100.0).round() / 100.0
}

fn serialize_db<S: Serializer>(db: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_db(*db))
}

fn serialize_opt_db<S: Serializer>(db: &Option<f32>, serializer: S) -> Result<S::Ok, S::Error> {
    match db {
        Some(db) => serializer.serialize_some(&round_db(*db)),
        None => serializer.serialize_none(),
    }
}

/// Snapshot emitted after every processed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub at_ms: u64,
    /// Serialized with two decimals, like the text display.
    #[serde(serialize_with = "serialize_db")]
    pub level_db: f32,
    /// `None` while the threshold is unresolved.
    #[serde(serialize_with = "serialize_opt_db")]
    pub threshold_db: Option<f32>,
    pub threshold: ThresholdState,
    pub trigger: TriggerState,
    /// Present only while calibrating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration_percent: Option<u8>,
    pub key_held: bool,
    pub test_mode: bool,
}

impl StatusReport {
    pub fn level_text(&self) -> String {
        format!("{:.2} dB", self.level_db)
    }

    pub fn threshold_text(&self) -> String {
        match self.threshold_db {
            Some(db) => format!("{db:.2} dB"),
            None => "unresolved".to_string(),
        }
    }

    /// One-line human summary of what the trigger is doing.
    pub fn headline(&self) -> String {
        if let Some(percent) = self.calibration_percent {
            if self.threshold.is_calibrating() {
                return format!("Calibrating noise floor... {percent}% (please remain silent)");
            }
        }
        match (self.trigger, self.test_mode) {
            (TriggerState::Active, false) => "Voice detected! Push-to-Talk activated.".to_string(),
            (TriggerState::Active, true) => {
                "Voice detected! (Test Mode - No Key Press)".to_string()
            }
            (TriggerState::Releasing { .. }, false) => {
                "Timeout active - Push-to-Talk still on.".to_string()
            }
            (TriggerState::Releasing { .. }, true) => {
                "Timeout active (Test Mode - No Key Press)".to_string()
            }
            (TriggerState::Idle, _) if self.threshold_db.is_none() => {
                "Waiting for a threshold...".to_string()
            }
            (TriggerState::Idle, false) => "Monitoring audio...".to_string(),
            (TriggerState::Idle, true) => "Monitoring audio... (Test Mode)".to_string(),
        }
    }
}

/// Things worth a line of their own, outside the per-frame stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    MonitoringStarted {
        threshold: ThresholdState,
        key: String,
        test_mode: bool,
    },
    CalibrationStarted {
        required_frames: usize,
    },
    CalibrationComplete {
        noise_floor_db: f32,
        threshold_db: f32,
    },
    CalibrationAbandoned {
        manual_threshold_db: f32,
    },
    KeyPressed {
        key: String,
        at_ms: u64,
    },
    KeyReleased {
        key: String,
        at_ms: u64,
    },
    Warning {
        kind: &'static str,
        message: String,
    },
    MonitoringStopped {
        reason: String,
    },
}

impl MonitorEvent {
    pub fn warning(err: &crate::error::PttError) -> Self {
        MonitorEvent::Warning {
            kind: err.label(),
            message: err.to_string(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            MonitorEvent::MonitoringStarted { threshold, key, test_mode } => {
                let mode = if *test_mode { " (Test Mode)" } else { "" };
                match threshold {
                    ThresholdState::Manual { db } => format!(
                        "Monitoring with manual threshold {db:.2} dB, key {key}{mode}"
                    ),
                    _ => format!("Monitoring started, key {key}{mode}"),
                }
            }
            MonitorEvent::CalibrationStarted { required_frames } => format!(
                "Calibrating noise floor over {required_frames} frames... Please remain silent."
            ),
            MonitorEvent::CalibrationComplete {
                noise_floor_db,
                threshold_db,
            } => format!(
                "Calibration complete. Noise floor {noise_floor_db:.2} dB, threshold {threshold_db:.2} dB."
            ),
            MonitorEvent::CalibrationAbandoned {
                manual_threshold_db,
            } => format!(
                "Calibration abandoned; using manual threshold {manual_threshold_db:.2} dB."
            ),
            MonitorEvent::KeyPressed { key, at_ms } => format!("[{at_ms} ms] {key} pressed"),
            MonitorEvent::KeyReleased { key, at_ms } => format!("[{at_ms} ms] {key} released"),
            MonitorEvent::Warning { message, .. } => format!("Warning: {message}"),
            MonitorEvent::MonitoringStopped { reason } => format!("Monitoring stopped ({reason})"),
        }
    }
}

/// Receives the monitor's output.
pub trait StatusSink {
    fn report(&mut self, report: &StatusReport);
    fn event(&mut self, event: &MonitorEvent);
}

/// Width the status line is padded to so shorter lines erase longer ones.
const STATUS_LINE_WIDTH: usize = 96;

/// Redraws one terminal line per frame; events get their own lines.
pub struct TextStatusSink<W: Write> {
    out: W,
    line_open: bool,
}

impl<W: Write> TextStatusSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            line_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn close_line(&mut self) {
        if self.line_open {
            let _ = writeln!(self.out);
            self.line_open = false;
        }
    }
}

impl<W: Write> StatusSink for TextStatusSink<W> {
    fn report(&mut self, report: &StatusReport) {
        let line = format!(
            "{} | Level: {} | Threshold: {}",
            report.headline(),
            report.level_text(),
            report.threshold_text()
        );
        let _ = write!(self.out, "\r{line:<STATUS_LINE_WIDTH$}");
        let _ = self.out.flush();
        self.line_open = true;
    }

    fn event(&mut self, event: &MonitorEvent) {
        self.close_line();
        let _ = writeln!(self.out, "{}", event.describe());
        let _ = self.out.flush();
    }
}

#[derive(Serialize)]
struct StatusLine<'a> {
    event: &'static str,
    #[serde(flatten)]
    report: &'a StatusReport,
}

/// Newline-delimited JSON, one object per report or event.
pub struct JsonStatusSink<W: Write> {
    out: W,
}

impl<W: Write> JsonStatusSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_json<T: Serialize>(&mut self, value: &T) {
        match serde_json::to_string(value) {
            Ok(line) => {
                let _ = writeln!(self.out, "{line}");
                let _ = self.out.flush();
            }
            Err(err) => tracing::warn!("failed to encode status line: {err}"),
        }
    }
}

impl<W: Write> StatusSink for JsonStatusSink<W> {
    fn report(&mut self, report: &StatusReport) {
        self.write_json(&StatusLine {
            event: "status",
            report,
        });
    }

    fn event(&mut self, event: &MonitorEvent) {
        self.write_json(event);
    }
}
