//! Run limits, counters, and terminal outcomes for a mission.

use std::fmt;

/// Fixed limits for one mission run, read-only once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Bounded retries per failing step.
    pub max_correction_attempts: u32,
    /// Total script files allowed across the whole run, corrections included.
    pub max_scripts: u32,
}

/// Counters threaded through the mission loop as an immutable value.
///
/// Each loop iteration receives a state and returns an updated copy; nothing
/// mutates counters in place. `scripts_written` only increases, and script
/// indices are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunState {
    pub scripts_written: u32,
    pub steps_completed: u32,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index to assign to the next script file (1-based, monotonic).
    pub fn next_script_index(&self) -> u32 {
        self.scripts_written + 1
    }

    #[must_use]
    pub fn record_script(self) -> Self {
        Self {
            scripts_written: self.scripts_written + 1,
            ..self
        }
    }

    #[must_use]
    pub fn record_step(self) -> Self {
        Self {
            steps_completed: self.steps_completed + 1,
            ..self
        }
    }

    /// True once the run has consumed its entire script budget. Reaching the
    /// budget fails the run even when the latest execution succeeded.
    pub fn script_budget_exhausted(&self, limits: &RunLimits) -> bool {
        self.scripts_written >= limits.max_scripts
    }
}

/// Why a run was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    ScriptLimitExceeded { limit: u32 },
    CorrectionLimitExceeded { limit: u32 },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::ScriptLimitExceeded { limit } => {
                write!(f, "script limit exceeded ({limit} files written)")
            }
            AbortReason::CorrectionLimitExceeded { limit } => {
                write!(f, "correction limit exceeded ({limit} attempts)")
            }
        }
    }
}

/// Terminal outcome of a mission, returned up the call stack so the CLI
/// decides process exit behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionOutcome {
    Completed,
    Aborted(AbortReason),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_indices_are_monotonic() {
        let state = RunState::new();
        assert_eq!(state.next_script_index(), 1);

        let state = state.record_script();
        assert_eq!(state.scripts_written, 1);
        assert_eq!(state.next_script_index(), 2);

        let state = state.record_script().record_script();
        assert_eq!(state.next_script_index(), 4);
    }

    #[test]
    fn budget_exhausted_at_limit_not_before() {
        let limits = RunLimits {
            max_correction_attempts: 5,
            max_scripts: 2,
        };
        let state = RunState::new().record_script();
        assert!(!state.script_budget_exhausted(&limits));
        let state = state.record_script();
        assert!(state.script_budget_exhausted(&limits));
    }

    #[test]
    fn record_step_leaves_script_counter_untouched() {
        let state = RunState::new().record_script().record_step();
        assert_eq!(state.scripts_written, 1);
        assert_eq!(state.steps_completed, 1);
    }

    #[test]
    fn abort_reasons_render_for_console() {
        let reason = AbortReason::CorrectionLimitExceeded { limit: 5 };
        assert_eq!(reason.to_string(), "correction limit exceeded (5 attempts)");
    }
}
