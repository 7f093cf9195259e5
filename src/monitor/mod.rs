//! Per-frame orchestration: level, calibration, threshold, trigger, key.
//!
//! [`Monitor`] owns every piece of mutable trigger state and is driven one
//! frame at a time, either by [`run_monitor`] against a live stream or
//! directly by tests with synthetic frames and timestamps.

mod run;

pub use run::{run_monitor, Clock, MonotonicClock, RunOptions, RunSummary, StopReason};

use crate::actuator::{KeyActuator, KeyHold};
use crate::audio::{level_db, AudioFrame};
use crate::error::{PttError, PttResult};
use crate::status::{MonitorEvent, StatusReport, StatusSink};
use crate::trigger::{
    resolve, settle, CalibrationController, CalibrationStep, KeyEdge, NoiseFloorEstimator,
    ThresholdState, TriggerSettings, TriggerState, TriggerStateMachine,
    DEFAULT_CALIBRATION_FRAMES,
};
use tracing::{debug, info, warn};

/// Sizes fixed for the life of one monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Exact sample count every frame must carry.
    pub frame_size: usize,
    /// Levels kept for the rolling noise-floor median.
    pub window_capacity: usize,
    /// Frames sampled before the first automatic threshold.
    pub calibration_frames: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let frame_size = crate::audio::DEFAULT_FRAME_SIZE;
        Self {
            frame_size,
            window_capacity: NoiseFloorEstimator::capacity_for(
                5,
                crate::audio::DEFAULT_SAMPLE_RATE,
                frame_size,
            ),
            calibration_frames: DEFAULT_CALIBRATION_FRAMES,
        }
    }
}

/// Running counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub frames_processed: u64,
    pub frames_rejected: u64,
    /// Idle to active transitions, counted in test mode too.
    pub activations: u64,
    pub actuator_failures: u64,
}

pub struct Monitor<A: KeyActuator> {
    config: MonitorConfig,
    estimator: NoiseFloorEstimator,
    calibration: CalibrationController,
    threshold: ThresholdState,
    trigger: TriggerStateMachine,
    key: KeyHold<A>,
    stats: MonitorStats,
    running: bool,
}

impl<A: KeyActuator> Monitor<A> {
    pub fn new(config: MonitorConfig, key: KeyHold<A>) -> Self {
        Self {
            config,
            estimator: NoiseFloorEstimator::new(config.window_capacity),
            calibration: CalibrationController::new(config.calibration_frames),
            threshold: ThresholdState::Uncalibrated,
            trigger: TriggerStateMachine::new(),
            key,
            stats: MonitorStats::default(),
            running: false,
        }
    }

    /// Start from a threshold found in an earlier session instead of
    /// calibrating. Adaptive updates take over from the first frame.
    pub fn seed_threshold(&mut self, threshold_db: f32) {
        self.threshold = ThresholdState::Resolved { db: threshold_db };
    }

    pub fn config(&self) -> MonitorConfig {
        self.config
    }

    pub fn threshold_state(&self) -> ThresholdState {
        self.threshold
    }

    pub fn trigger_state(&self) -> TriggerState {
        self.trigger.state()
    }

    pub fn key_held(&self) -> bool {
        self.key.is_held()
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_running()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn noise_floor_db(&self) -> Option<f32> {
        self.estimator.current_floor()
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Begin monitoring. Calibration starts unless a manual threshold is set
    /// or a threshold is already known.
    pub fn start(&mut self, settings: &TriggerSettings, sink: &mut dyn StatusSink) {
        self.running = true;
        if let Some(manual) = settings.manual_db() {
            self.threshold = ThresholdState::Manual { db: manual };
        }
        sink.event(&MonitorEvent::MonitoringStarted {
            threshold: self.threshold,
            key: self.key.key().to_string(),
            test_mode: settings.test_mode,
        });
        info!(
            threshold = self.threshold.label(),
            key = %self.key.key(),
            actuator = self.key.actuator().name(),
            test_mode = settings.test_mode,
            "monitoring started"
        );

        if matches!(self.threshold, ThresholdState::Uncalibrated) {
            self.calibration.begin(&mut self.threshold);
            sink.event(&MonitorEvent::CalibrationStarted {
                required_frames: self.calibration.required(),
            });
            info!(frames = self.calibration.required(), "calibration started");
        }
    }

    /// Evaluate one frame captured at `now_ms`.
    ///
    /// A frame of the wrong size is rejected before any state changes.
    /// Actuator failures are reported to `sink` and do not stop monitoring.
    pub fn process_frame(
        &mut self,
        frame: &AudioFrame,
        settings: &TriggerSettings,
        now_ms: u64,
        sink: &mut dyn StatusSink,
    ) -> PttResult<StatusReport> {
        if frame.len() != self.config.frame_size {
            let err = PttError::MalformedFrame {
                expected: self.config.frame_size,
                actual: frame.len(),
            };
            self.stats.frames_rejected += 1;
            warn!("{err}");
            sink.event(&MonitorEvent::warning(&err));
            return Err(err);
        }

        let level = level_db(frame.samples());
        let manual = settings.manual_db();
        let offset = settings.offset_db();

        if let Some(manual_db) = manual {
            if self.calibration.is_running() {
                self.calibration.abandon(&mut self.threshold, manual_db);
                info!(manual_db, "calibration abandoned for manual threshold");
                sink.event(&MonitorEvent::CalibrationAbandoned {
                    manual_threshold_db: manual_db,
                });
            }
        }

        let mut calibration_percent = None;
        match self
            .calibration
            .observe(level, &mut self.estimator, &mut self.threshold, offset)
        {
            CalibrationStep::Idle => {}
            CalibrationStep::Progress { percent, .. } => calibration_percent = Some(percent),
            CalibrationStep::Complete {
                noise_floor_db,
                threshold_db,
            } => {
                calibration_percent = Some(100);
                info!(noise_floor_db, threshold_db, "calibration complete");
                sink.event(&MonitorEvent::CalibrationComplete {
                    noise_floor_db,
                    threshold_db,
                });
            }
        }

        let threshold_db = resolve(
            &self.threshold,
            manual,
            self.estimator.current_floor(),
            offset,
        );
        self.threshold = settle(self.threshold, manual, threshold_db);

        let decision =
            self.trigger
                .evaluate(level, threshold_db, settings.release_delay(), now_ms);
        if decision.edge == Some(KeyEdge::Press) {
            self.stats.activations += 1;
        }
        if decision.previous != decision.state {
            debug!(
                from = decision.previous.label(),
                to = decision.state.label(),
                level_db = level,
                "trigger transition"
            );
        }

        let key_name = self.key.key().to_string();
        match self.key.apply(decision.key_asserted, settings.test_mode) {
            Ok(Some(KeyEdge::Press)) => sink.event(&MonitorEvent::KeyPressed {
                key: key_name,
                at_ms: now_ms,
            }),
            Ok(Some(KeyEdge::Release)) => sink.event(&MonitorEvent::KeyReleased {
                key: key_name,
                at_ms: now_ms,
            }),
            Ok(None) => {}
            Err(err) => {
                self.stats.actuator_failures += 1;
                warn!("{err}");
                sink.event(&MonitorEvent::warning(&err));
            }
        }

        self.stats.frames_processed += 1;
        let report = StatusReport {
            at_ms: now_ms,
            level_db: level,
            threshold_db,
            threshold: self.threshold,
            trigger: decision.state,
            calibration_percent,
            key_held: self.key.is_held(),
            test_mode: settings.test_mode,
        };
        sink.report(&report);
        Ok(report)
    }

    /// End monitoring: the key is released and the trigger returns to idle.
    ///
    /// Safe to call repeatedly; only the first call emits anything.
    pub fn stop(&mut self, reason: &str, now_ms: u64, sink: &mut dyn StatusSink) {
        match self.key.release() {
            Ok(true) => sink.event(&MonitorEvent::KeyReleased {
                key: self.key.key().to_string(),
                at_ms: now_ms,
            }),
            Ok(false) => {}
            Err(err) => {
                self.stats.actuator_failures += 1;
                warn!("failed to release key on stop: {err}");
                sink.event(&MonitorEvent::warning(&err));
            }
        }
        self.trigger.reset();
        if self.running {
            self.running = false;
            info!(reason, "monitoring stopped");
            sink.event(&MonitorEvent::MonitoringStopped {
                reason: reason.to_string(),
            });
        }
    }
}
