//! Reconciliation state machine types

use std::fmt;

use serde::{Deserialize, Serialize};

/// States of one reconciliation pass
///
/// Nothing is persisted between passes: every event starts from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileState {
    Idle,
    Validating,
    Rendering,
    Comparing,
    /// Persisted config already matches the rendered one
    Unchanged,
    Writing,
    Restarting,
    LivenessChecking,
    Active,
    Blocked,
}

impl ReconcileState {
    /// Whether the transition is part of the state machine
    #[must_use]
    pub fn can_transition_to(self, next: ReconcileState) -> bool {
        use ReconcileState::{
            Active, Blocked, Comparing, Idle, LivenessChecking, Rendering, Restarting, Unchanged,
            Validating, Writing,
        };

        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Rendering | Blocked)
                | (Rendering, Comparing | Blocked)
                | (Comparing, Unchanged | Writing | Blocked)
                | (Unchanged, LivenessChecking)
                | (Writing, Restarting | Blocked)
                // After a config write the pass re-checks liveness; after a
                // liveness-triggered restart it is done
                | (Restarting, LivenessChecking | Active | Blocked)
                | (LivenessChecking, Restarting | Active | Blocked)
                | (Active | Blocked, Idle)
        )
    }
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcileState::Idle => "idle",
            ReconcileState::Validating => "validating",
            ReconcileState::Rendering => "rendering",
            ReconcileState::Comparing => "comparing",
            ReconcileState::Unchanged => "unchanged",
            ReconcileState::Writing => "writing",
            ReconcileState::Restarting => "restarting",
            ReconcileState::LivenessChecking => "liveness_checking",
            ReconcileState::Active => "active",
            ReconcileState::Blocked => "blocked",
        };
        f.write_str(name)
    }
}
