//! Pipeline lifecycle state machine.

use std::time::Instant;

/// Decode pipeline state.
///
/// All transitions go through the controller and are validated, so a
/// half-configured pipeline can never be observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No hardware resources held; submissions are refused.
    Stopped,

    /// Hardware bring-up in progress (transitioning to Running).
    Starting,

    /// Accepting access units and displaying frames.
    Running {
        /// When the current configuration went live.
        since: Instant,
    },

    /// Tearing down and rebuilding at new stream dimensions.
    Reconfiguring,
}

impl PipelineState {
    /// Check if this state transition is valid.
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        match (self, target) {
            // From Stopped
            (Stopped, Starting) => true,

            // From Starting
            (Starting, Running { .. }) => true,
            (Starting, Stopped) => true, // bring-up failed

            // From Running
            (Running { .. }, Reconfiguring) => true,
            (Running { .. }, Stopped) => true,

            // From Reconfiguring
            (Reconfiguring, Running { .. }) => true,
            (Reconfiguring, Stopped) => true, // rebuild failed

            // Self-transitions
            (a, b) if a == b => true,

            // All other transitions invalid
            _ => false,
        }
    }

    /// Get a human-readable description of this state.
    pub fn description(&self) -> &'static str {
        match self {
            PipelineState::Stopped => "Stopped",
            PipelineState::Starting => "Starting",
            PipelineState::Running { .. } => "Running",
            PipelineState::Reconfiguring => "Reconfiguring",
        }
    }

    /// Check if the pipeline is accepting access units.
    pub fn is_running(&self) -> bool {
        matches!(self, PipelineState::Running { .. })
    }

    /// Check if the pipeline holds no hardware resources.
    pub fn is_stopped(&self) -> bool {
        matches!(self, PipelineState::Stopped)
    }

    /// Get the duration since the current configuration went live.
    pub fn running_duration(&self) -> Option<std::time::Duration> {
        if let PipelineState::Running { since } = self {
            Some(since.elapsed())
        } else {
            None
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
