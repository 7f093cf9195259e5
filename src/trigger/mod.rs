//! Trigger core: noise-floor tracking, threshold resolution and the
//! hysteresis state machine that decides when the PTT key is held.
//!
//! Everything here is single-owner and allocation-light; the monitor calls
//! into it once per captured frame.

mod calibration;
mod noise_floor;
mod settings;
mod state;
mod threshold;

pub use calibration::{CalibrationController, CalibrationStep, DEFAULT_CALIBRATION_FRAMES};
pub use noise_floor::NoiseFloorEstimator;
pub use settings::{
    TriggerSettings, DEFAULT_MANUAL_THRESHOLD_DB, DEFAULT_RELEASE_DELAY_MS,
    DEFAULT_THRESHOLD_OFFSET_DB, MANUAL_THRESHOLD_RANGE_DB, RELEASE_DELAY_RANGE_MS,
    THRESHOLD_OFFSET_RANGE_DB,
};
pub use state::{transition, KeyEdge, Transition, TriggerDecision, TriggerState, TriggerStateMachine};
pub use threshold::{resolve, settle, ThresholdState};
