// crates/gatework-core/src/audit.rs
// ============================================================================
// Module: Audit Log (trait seam)
// Description: The backend-agnostic interface the Executor emits structured
//              run events through.
// Purpose: Let `gatework-store` supply the concrete append-only JSONL sink
//          while `gatework-core` stays free of any logging crate dependency;
//          the audit log is this system's only structured-logging surface.
// Dependencies: crate::error, crate::model, crate::router
// ============================================================================

//! ## Overview
//! Every event kind a run can emit is represented as one variant of
//! [`AuditEventKind`]. [`AuditSink`] is implemented by `gatework-store`'s
//! `JsonlAuditLog`, which appends one JSON object per line and is flushed
//! before the run's [`crate::summary::RunSummary`] is returned.

use serde::Deserialize;
use serde::Serialize;

use crate::error::AuditError;
use crate::identifiers::AdapterName;
use crate::identifiers::RunId;
use crate::identifiers::StepId;
use crate::model::GateResult;
use crate::model::StepStatus;
use crate::router::RoutingDecision;

/// One structured event in a run's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// RFC3339 timestamp, monotonic within a single run.
    pub ts: String,
    /// The run this event belongs to.
    pub run_id: RunId,
    /// The event payload.
    pub kind: AuditEventKind,
}

/// The mandatory event kinds a run's audit trail records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEventKind {
    /// `run.started`: a run began.
    RunStarted {
        /// The workflow's declared name.
        workflow_name: String,
    },
    /// `run.ended`: a run reached a terminal state.
    RunEnded {
        /// The terminal status.
        status: String,
        /// Total tokens spent across every step.
        tokens_used_total: u64,
    },
    /// `step.routed`: a step was routed to an adapter, or routing failed.
    StepRouted {
        /// The routing decision, including rejected candidates.
        decision: RoutingDecision,
    },
    /// `step.started`: a step began execution.
    StepStarted {
        /// The step starting.
        step_id: StepId,
        /// The adapter chosen for this attempt.
        adapter: AdapterName,
        /// 1-based attempt number, including retries.
        attempt: u32,
    },
    /// `step.ended`: a step reached a terminal state.
    StepEnded {
        /// The step that ended.
        step_id: StepId,
        /// The step's terminal status.
        status: StepStatus,
        /// Tokens actually spent by this step.
        tokens_used: u64,
    },
    /// `step.skipped`: a step's `when` predicate was not satisfied.
    StepSkipped {
        /// The step that was skipped.
        step_id: StepId,
        /// Why it was skipped.
        reason: String,
    },
    /// `gate.evaluated`: one gate on one step was evaluated.
    GateEvaluated {
        /// The step the gate ran against.
        step_id: StepId,
        /// The gate's outcome.
        result: GateResult,
    },
    /// `cost.update`: a reservation was settled against the run's budget.
    CostUpdate {
        /// The step that triggered this settle, if any.
        step_id: Option<StepId>,
        /// Tokens debited by this settle.
        delta: i64,
        /// Budget remaining after this settle.
        remaining: i64,
    },
    /// `error`: an error occurred outside the normal step lifecycle.
    Error {
        /// The step associated with the error, if any.
        step_id: Option<StepId>,
        /// The stable error kind string.
        kind: String,
        /// Human-readable message.
        message: String,
    },
}

/// An append-only sink for a run's [`AuditEvent`] trail.
pub trait AuditSink {
    /// Appends `event` to the trail.
    ///
    /// # Errors
    /// Returns [`AuditError::Append`] if the event cannot be written.
    fn append(&self, event: &AuditEvent) -> Result<(), AuditError>;

    /// Flushes any buffered events to durable storage. Called once, after
    /// a run's final event, before its [`crate::summary::RunSummary`] is
    /// returned.
    ///
    /// # Errors
    /// Returns [`AuditError::Flush`] if buffered events cannot be
    /// persisted.
    fn flush(&self) -> Result<(), AuditError>;
}
