use super::noise_floor::NoiseFloorEstimator;
use super::threshold::ThresholdState;

/// Frames sampled before the first threshold is committed (~2.3 s at
/// 44.1 kHz with 1024-sample frames).
pub const DEFAULT_CALIBRATION_FRAMES: usize = 100;

/// What one observed frame did to the calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStep {
    /// Not calibrating; the sample only fed the window.
    Idle,
    Progress { collected: usize, percent: u8 },
    Complete { noise_floor_db: f32, threshold_db: f32 },
}

/// Drives the silent-period sampling that seeds the noise floor.
#[derive(Debug, Clone)]
pub struct CalibrationController {
    required: usize,
    collected: usize,
    running: bool,
}

impl CalibrationController {
    pub fn new(required: usize) -> Self {
        Self {
            required: required.max(1),
            collected: 0,
            running: false,
        }
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn begin(&mut self, state: &mut ThresholdState) {
        self.collected = 0;
        self.running = true;
        *state = ThresholdState::Calibrating {
            collected: 0,
            required: self.required,
        };
    }

    /// Feed one level into the window and, while calibrating, count it.
    ///
    /// Completion commits `median + offset` exactly when the counter reaches
    /// the required count.
    pub fn observe(
        &mut self,
        level_db: f32,
        estimator: &mut NoiseFloorEstimator,
        state: &mut ThresholdState,
        offset_db: f32,
    ) -> CalibrationStep {
        estimator.observe(level_db);
        if !self.running {
            return CalibrationStep::Idle;
        }

        self.collected += 1;
        if self.collected < self.required {
            *state = ThresholdState::Calibrating {
                collected: self.collected,
                required: self.required,
            };
            return CalibrationStep::Progress {
                collected: self.collected,
                percent: self.percent(),
            };
        }

        self.running = false;
        // The window was fed above, so it holds at least this sample.
        let noise_floor_db = estimator.current_floor().unwrap_or(level_db);
        let threshold_db = noise_floor_db + offset_db;
        *state = ThresholdState::Resolved { db: threshold_db };
        CalibrationStep::Complete {
            noise_floor_db,
            threshold_db,
        }
    }

    /// Stop without committing anything; manual mode takes over.
    pub fn abandon(&mut self, state: &mut ThresholdState, manual_db: f32) {
        self.running = false;
        self.collected = 0;
        *state = ThresholdState::Manual { db: manual_db };
    }

    fn percent(&self) -> u8 {
        ((self.collected * 100) / self.required).min(100) as u8
    }
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_FRAMES)
    }
}
