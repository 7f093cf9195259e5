//! Hysteresis engine: instant activation on a loud frame, delayed release.

use serde::Serialize;

/// Trigger phase. The key is held iff the state is `Active` or `Releasing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TriggerState {
    Idle,
    /// Level is above the threshold.
    Active,
    /// Level dropped below the threshold at `since_ms`; still inside the
    /// release delay.
    Releasing { since_ms: u64 },
}

impl TriggerState {
    pub fn holds_key(&self) -> bool {
        !matches!(self, TriggerState::Idle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TriggerState::Idle => "idle",
            TriggerState::Active => "active",
            TriggerState::Releasing { .. } => "releasing",
        }
    }
}

/// Result of one pure transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: TriggerState,
    pub last_active_ms: u64,
    pub key_asserted: bool,
}

/// Compute the next state for one frame.
///
/// The release delay is measured from the last loud frame (`last_active_ms`),
/// not from the moment the grace window opened. An unresolved threshold
/// forces `Idle`, which releases a held key.
pub fn transition(
    state: TriggerState,
    last_active_ms: u64,
    level_db: f32,
    threshold_db: Option<f32>,
    release_delay_ms: u64,
    now_ms: u64,
) -> Transition {
    let Some(threshold_db) = threshold_db else {
        return Transition {
            next: TriggerState::Idle,
            last_active_ms,
            key_asserted: false,
        };
    };

    if level_db > threshold_db {
        return Transition {
            next: TriggerState::Active,
            last_active_ms: now_ms,
            key_asserted: true,
        };
    }

    let next = match state {
        TriggerState::Idle => TriggerState::Idle,
        TriggerState::Active | TriggerState::Releasing { .. } => {
            if now_ms.saturating_sub(last_active_ms) < release_delay_ms {
                let since_ms = match state {
                    TriggerState::Releasing { since_ms } => since_ms,
                    _ => now_ms,
                };
                TriggerState::Releasing { since_ms }
            } else {
                TriggerState::Idle
            }
        }
    };
    Transition {
        next,
        last_active_ms,
        key_asserted: next.holds_key(),
    }
}

/// Key edge implied by a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEdge {
    Press,
    Release,
}

/// Outcome of [`TriggerStateMachine::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerDecision {
    pub previous: TriggerState,
    pub state: TriggerState,
    pub key_asserted: bool,
    pub edge: Option<KeyEdge>,
}

/// Stateful wrapper around [`transition`].
#[derive(Debug, Clone)]
pub struct TriggerStateMachine {
    state: TriggerState,
    last_active_ms: u64,
}

impl TriggerStateMachine {
    pub fn new() -> Self {
        Self {
            state: TriggerState::Idle,
            last_active_ms: 0,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn last_active_ms(&self) -> u64 {
        self.last_active_ms
    }

    pub fn evaluate(
        &mut self,
        level_db: f32,
        threshold_db: Option<f32>,
        release_delay_ms: u64,
        now_ms: u64,
    ) -> TriggerDecision {
        let previous = self.state;
        let step = transition(
            previous,
            self.last_active_ms,
            level_db,
            threshold_db,
            release_delay_ms,
            now_ms,
        );
        self.state = step.next;
        self.last_active_ms = step.last_active_ms;

        let edge = match (previous.holds_key(), step.key_asserted) {
            (false, true) => Some(KeyEdge::Press),
            (true, false) => Some(KeyEdge::Release),
            _ => None,
        };
        TriggerDecision {
            previous,
            state: step.next,
            key_asserted: step.key_asserted,
            edge,
        }
    }

    /// Drop back to `Idle`, e.g. when monitoring stops.
    pub fn reset(&mut self) {
        self.state = TriggerState::Idle;
        self.last_active_ms = 0;
    }
}

impl Default for TriggerStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loud_frame_activates_from_idle() {
        let step = transition(TriggerState::Idle, 0, -20.0, Some(-30.0), 500, 50);
        assert_eq!(step.next, TriggerState::Active);
        assert_eq!(step.last_active_ms, 50);
        assert!(step.key_asserted);
    }

    #[test]
    fn level_equal_to_threshold_is_quiet() {
        let step = transition(TriggerState::Idle, 0, -30.0, Some(-30.0), 500, 50);
        assert_eq!(step.next, TriggerState::Idle);
        assert!(!step.key_asserted);
    }

    #[test]
    fn quiet_frame_inside_delay_keeps_releasing() {
        let step = transition(TriggerState::Active, 50, -35.0, Some(-30.0), 500, 100);
        assert_eq!(step.next, TriggerState::Releasing { since_ms: 100 });
        assert!(step.key_asserted);

        let step = transition(step.next, 50, -35.0, Some(-30.0), 500, 549);
        assert_eq!(step.next, TriggerState::Releasing { since_ms: 100 });
        assert!(step.key_asserted);
    }

    #[test]
    fn delay_is_measured_from_last_active_frame() {
        let step = transition(
            TriggerState::Releasing { since_ms: 100 },
            50,
            -35.0,
            Some(-30.0),
            500,
            550,
        );
        assert_eq!(step.next, TriggerState::Idle);
        assert!(!step.key_asserted);
    }

    #[test]
    fn loud_frame_while_releasing_reactivates() {
        let step = transition(
            TriggerState::Releasing { since_ms: 100 },
            50,
            -10.0,
            Some(-30.0),
            500,
            300,
        );
        assert_eq!(step.next, TriggerState::Active);
        assert_eq!(step.last_active_ms, 300);
    }

    #[test]
    fn zero_delay_releases_on_first_quiet_frame() {
        let step = transition(TriggerState::Active, 50, -35.0, Some(-30.0), 0, 100);
        assert_eq!(step.next, TriggerState::Idle);
        assert!(!step.key_asserted);

        let step = transition(TriggerState::Active, 100, -35.0, Some(-30.0), 0, 100);
        assert_eq!(step.next, TriggerState::Idle);
    }

    #[test]
    fn unresolved_threshold_forces_release() {
        let step = transition(TriggerState::Active, 50, 0.0, None, 500, 60);
        assert_eq!(step.next, TriggerState::Idle);
        assert!(!step.key_asserted);
        assert_eq!(step.last_active_ms, 50);

        let step = transition(TriggerState::Idle, 0, 0.0, None, 500, 60);
        assert_eq!(step.next, TriggerState::Idle);
    }

    #[test]
    fn end_to_end_sequence_matches_expected_states() {
        let mut machine = TriggerStateMachine::new();
        let frames = [(-35.0, 0), (-20.0, 50), (-35.0, 100), (-35.0, 600)];
        let mut states = Vec::new();
        let mut edges = Vec::new();
        for (level, now) in frames {
            let decision = machine.evaluate(level, Some(-30.0), 500, now);
            states.push(decision.state.label());
            if let Some(edge) = decision.edge {
                edges.push((edge, now));
            }
        }
        assert_eq!(states, vec!["idle", "active", "releasing", "idle"]);
        assert_eq!(edges, vec![(KeyEdge::Press, 50), (KeyEdge::Release, 600)]);
    }

    #[test]
    fn repeated_input_is_idempotent() {
        let mut machine = TriggerStateMachine::new();
        let first = machine.evaluate(-20.0, Some(-30.0), 500, 50);
        let second = machine.evaluate(-20.0, Some(-30.0), 500, 50);
        assert_eq!(first.state, second.state);
        assert_eq!(first.edge, Some(KeyEdge::Press));
        assert_eq!(second.edge, None);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut machine = TriggerStateMachine::new();
        machine.evaluate(-20.0, Some(-30.0), 500, 50);
        machine.reset();
        assert_eq!(machine.state(), TriggerState::Idle);
        assert_eq!(machine.last_active_ms(), 0);
    }
}
