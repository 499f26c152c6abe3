// crates/gatework-core/src/summary.rs
// ============================================================================
// Module: Run Summary
// Description: The final, serializable record of one completed run.
// Purpose: Give callers (demos, system tests, a future CLI) a single value
//          describing what happened without re-reading the audit log.
// Dependencies: crate::model
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::RunId;
use crate::identifiers::StepId;
use crate::model::ArtifactDescriptor;
use crate::model::StepResult;

/// A run's terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every step succeeded (or was skipped by its own `when` predicate).
    Succeeded,
    /// At least one step failed and `fail_fast` stopped the run, or every
    /// step ran but a block-severity gate failed somewhere.
    Failed,
    /// The run was cancelled before reaching a terminal step.
    Aborted,
}

impl RunStatus {
    /// The stable lower-case string for this status, used in audit events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }
}

/// The complete record of one run, returned once it reaches a terminal
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// The run this summarizes.
    pub run_id: RunId,
    /// The run's terminal status.
    pub status: RunStatus,
    /// Every step's result, in the order steps were executed.
    pub step_results: Vec<StepResult>,
    /// Every artifact written during the run, keyed by run-relative path.
    pub artifacts_index: BTreeMap<String, ArtifactDescriptor>,
    /// Total tokens spent across every step.
    pub tokens_used_total: u64,
    /// Budget remaining at the end of the run. Negative if the run entered
    /// drain mode.
    pub budget_remaining: i64,
}

impl RunSummary {
    /// The result recorded for `step_id`, if that step ran.
    #[must_use]
    pub fn result_for(&self, step_id: &StepId) -> Option<&StepResult> {
        self.step_results.iter().find(|result| &result.step_id == step_id)
    }
}
