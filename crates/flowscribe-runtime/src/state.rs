//! Orchestrator state machine.

use std::fmt;

/// Where the orchestrator is in its run.
///
/// `Idle -> NavigatingList -> (Selecting -> Locating -> Inspecting ->
/// Assembling -> Saving)* -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    #[default]
    Idle,
    NavigatingList,
    Selecting,
    Locating,
    Inspecting,
    Assembling,
    Saving,
}

impl OrchestratorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::NavigatingList => "navigating_list",
            Self::Selecting => "selecting",
            Self::Locating => "locating",
            Self::Inspecting => "inspecting",
            Self::Assembling => "assembling",
            Self::Saving => "saving",
        }
    }

    /// Whether the orchestrator is inside one workflow.
    pub fn is_per_item(&self) -> bool {
        !matches!(self, Self::Idle | Self::NavigatingList)
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
