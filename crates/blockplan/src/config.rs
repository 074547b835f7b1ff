//! Planner configuration types.

use std::time::Duration;

/// Configuration for a `plan()` invocation
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Hard ceiling on A* expansions before the search gives up
    pub max_states: usize,
    /// Optional wall-clock deadline for a single search
    pub timeout: Option<Duration>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            max_states: 20_000,
            timeout: None,
        }
    }
}
