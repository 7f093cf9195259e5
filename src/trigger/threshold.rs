use serde::Serialize;

/// Where the decision threshold currently comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdState {
    /// No usable threshold yet.
    Uncalibrated,
    /// Collecting the silent-period samples that seed the floor.
    Calibrating { collected: usize, required: usize },
    /// Automatic: rolling floor plus offset, refreshed every frame.
    Resolved { db: f32 },
    /// Forced by the user.
    Manual { db: f32 },
}

impl ThresholdState {
    pub fn is_calibrating(&self) -> bool {
        matches!(self, ThresholdState::Calibrating { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThresholdState::Uncalibrated => "uncalibrated",
            ThresholdState::Calibrating { .. } => "calibrating",
            ThresholdState::Resolved { .. } => "resolved",
            ThresholdState::Manual { .. } => "manual",
        }
    }
}

/// Decide the threshold for this frame. Rules, first match wins:
///
/// | manual | state                    | result                 |
/// |--------|--------------------------|------------------------|
/// | `Some` | any                      | manual value           |
/// | `None` | `Resolved` / `Manual`    | `floor + offset`       |
/// | `None` | `Uncalibrated` / `Calibrating` | unresolved (`None`) |
///
/// A `Manual` state with no manual value means manual mode was just switched
/// off; the threshold was already known, so the adaptive rule applies.
pub fn resolve(
    state: &ThresholdState,
    manual_db: Option<f32>,
    floor_db: Option<f32>,
    offset_db: f32,
) -> Option<f32> {
    match (manual_db, state) {
        (Some(manual), _) => Some(manual),
        (None, ThresholdState::Resolved { .. } | ThresholdState::Manual { .. }) => {
            floor_db.map(|floor| floor + offset_db)
        }
        (None, ThresholdState::Uncalibrated | ThresholdState::Calibrating { .. }) => None,
    }
}

/// Record the outcome of [`resolve`] back into the state.
pub fn settle(state: ThresholdState, manual_db: Option<f32>, resolved: Option<f32>) -> ThresholdState {
    match (manual_db, resolved) {
        (Some(db), _) => ThresholdState::Manual { db },
        (None, Some(db)) => ThresholdState::Resolved { db },
        (None, None) => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_always_wins() {
        let state = ThresholdState::Resolved { db: -25.0 };
        assert_eq!(resolve(&state, Some(-10.0), Some(-50.0), 10.0), Some(-10.0));

        let calibrating = ThresholdState::Calibrating {
            collected: 3,
            required: 100,
        };
        assert_eq!(resolve(&calibrating, Some(-12.0), None, 10.0), Some(-12.0));
    }

    #[test]
    fn resolved_tracks_the_current_floor() {
        let state = ThresholdState::Resolved { db: -25.0 };
        assert_eq!(resolve(&state, None, Some(-48.0), 10.0), Some(-38.0));
        assert_eq!(resolve(&state, None, Some(-40.0), 10.0), Some(-30.0));
    }

    #[test]
    fn uncalibrated_and_calibrating_are_unresolved() {
        assert_eq!(
            resolve(&ThresholdState::Uncalibrated, None, Some(-50.0), 10.0),
            None
        );
        let calibrating = ThresholdState::Calibrating {
            collected: 99,
            required: 100,
        };
        assert_eq!(resolve(&calibrating, None, Some(-50.0), 10.0), None);
    }

    #[test]
    fn leaving_manual_mode_switches_to_adaptive() {
        let state = ThresholdState::Manual { db: -20.0 };
        assert_eq!(resolve(&state, None, Some(-45.0), 15.0), Some(-30.0));
    }

    #[test]
    fn resolved_without_samples_is_unresolved() {
        let state = ThresholdState::Resolved { db: -25.0 };
        assert_eq!(resolve(&state, None, None, 10.0), None);
    }

    #[test]
    fn settle_writes_back_the_source() {
        let state = ThresholdState::Uncalibrated;
        assert_eq!(
            settle(state, Some(-10.0), Some(-10.0)),
            ThresholdState::Manual { db: -10.0 }
        );
        assert_eq!(
            settle(state, None, Some(-33.0)),
            ThresholdState::Resolved { db: -33.0 }
        );
        assert_eq!(settle(state, None, None), ThresholdState::Uncalibrated);
    }
}
