// crates/gatework-core/src/model.rs
// ============================================================================
// Module: Data Model
// Description: Typed records for workflows, steps, gates, adapters, and run
//              results.
// Purpose: Replace free-form maps with validated, strongly typed records
//          deserialized directly from the workflow document.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every document the orchestrator reads or writes is modeled as a typed
//! struct or enum, never a dynamic `HashMap<String, Value>` tree. The one
//! deliberate exception is [`Step::with`], which stays an opaque JSON
//! payload: its shape is actor-specific and is validated only at the
//! step's own schema, not by the core data model.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::comparator::Comparator;
use crate::identifiers::AdapterName;
use crate::identifiers::SchemaId;
use crate::identifiers::StepId;

// ============================================================================
// SECTION: Workflow
// ============================================================================

/// A declarative workflow document: ordered steps plus run-wide policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Workflow {
    /// Human-readable workflow name.
    pub name: String,
    /// Caller-supplied inputs, available to `with` templating (opaque to
    /// the core itself).
    #[serde(default)]
    pub inputs: BTreeMap<String, serde_json::Value>,
    /// Run-wide policy (budget, retry, fail-fast).
    #[serde(default)]
    pub policy: Policy,
    /// The workflow's steps, in document order.
    pub steps: Vec<Step>,
}

/// Run-wide policy applied by the Router, Executor, and Cost Tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    /// Maximum tokens/credits this run may spend. Zero means no budget
    /// beyond what steps actually cost.
    #[serde(default)]
    pub max_tokens: u64,
    /// Prefer deterministic adapters over AI adapters when both satisfy a
    /// step's capability requirements.
    #[serde(default)]
    pub prefer_deterministic: bool,
    /// Stop the run at the first failed step rather than continuing to
    /// independent siblings.
    #[serde(default)]
    pub fail_fast: bool,
    /// Retry behavior for transient adapter/timeout failures.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for Policy {
    fn default() -> Self {
        Self { max_tokens: 0, prefer_deterministic: false, fail_fast: false, retry: RetryPolicy::default() }
    }
}

/// Retry behavior for a step that fails with a retryable error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Maximum attempts for a step, including the first. Zero and one
    /// both mean "no retry." Clamped to the range `0..=5`.
    #[serde(default)]
    pub max_attempts: u8,
    /// Backoff, in milliseconds, before each retry attempt. Indexed by
    /// `attempt - 1`; the last entry repeats if there are more retries
    /// than entries.
    #[serde(default)]
    pub backoff_ms: Vec<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 0, backoff_ms: Vec::new() }
    }
}

impl RetryPolicy {
    /// The backoff to wait before the given 1-based retry attempt.
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> u64 {
        if self.backoff_ms.is_empty() {
            return 0;
        }
        let index = (attempt.saturating_sub(1)) as usize;
        let index = index.min(self.backoff_ms.len() - 1);
        self.backoff_ms[index]
    }
}

// ============================================================================
// SECTION: Step
// ============================================================================

/// A single unit of work within a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Unique step identifier, matching `^\d+\.\d{3}$`.
    pub id: StepId,
    /// Human-readable step name.
    pub name: String,
    /// The actor kind this step requires (e.g. `"lint"`, `"typecheck"`,
    /// `"ai_review"`). Used by the Router to query the Adapter Registry.
    pub actor: String,
    /// Opaque, actor-specific configuration payload.
    #[serde(default)]
    pub with: serde_json::Value,
    /// Artifact paths this step declares it will emit on success.
    #[serde(default)]
    pub emits: Vec<String>,
    /// Verification gates evaluated after the step completes.
    #[serde(default)]
    pub gates: Vec<Gate>,
    /// An optional predicate gating whether this step runs at all.
    #[serde(default)]
    pub when: Option<WhenPredicate>,
    /// Step ids that must reach a terminal state before this step starts.
    ///
    /// `None` (the key omitted entirely) means "depend on the immediately
    /// preceding step in document order" (the first step becomes a root).
    /// `Some(vec![])` explicitly marks this step a root regardless of its
    /// position. `Some(non_empty)` is an explicit dependency list.
    #[serde(default)]
    pub depends_on: Option<Vec<StepId>>,
}

/// Severity of a gate: whether failure fails the step or is only
/// recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateSeverity {
    /// A failing gate fails the step.
    Block,
    /// A failing gate is recorded in the gate report but does not fail
    /// the step.
    Warn,
}

/// A verification gate evaluated after a step completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gate {
    /// Passes when a conventional `test_report.json` artifact reports at
    /// least one passing test and zero failures.
    TestsPass {
        /// Gate severity.
        severity: GateSeverity,
    },
    /// Passes when the changed-line count of a diff-shaped artifact does
    /// not exceed `max_lines`.
    DiffLimits {
        /// Maximum permitted changed lines. Defaults to 500.
        #[serde(default = "default_diff_limit")]
        max_lines: u64,
        /// Gate severity.
        severity: GateSeverity,
    },
    /// Passes when the named artifact validates against a registered
    /// schema.
    SchemaValid {
        /// Artifact path to validate.
        path: String,
        /// Schema to validate against.
        schema_id: SchemaId,
        /// Gate severity.
        severity: GateSeverity,
    },
    /// Passes when the named artifact exists in the run's artifact
    /// index.
    ArtifactExists {
        /// Artifact path to check.
        path: String,
        /// Gate severity.
        severity: GateSeverity,
    },
    /// Delegates to a custom gate plugin registered by name.
    Custom {
        /// Registered plugin name.
        name: String,
        /// Plugin-specific parameters.
        #[serde(default)]
        params: serde_json::Value,
        /// Gate severity.
        severity: GateSeverity,
    },
}

impl Gate {
    /// This gate's severity.
    #[must_use]
    pub const fn severity(&self) -> GateSeverity {
        match self {
            Self::TestsPass { severity }
            | Self::DiffLimits { severity, .. }
            | Self::SchemaValid { severity, .. }
            | Self::ArtifactExists { severity, .. }
            | Self::Custom { severity, .. } => *severity,
        }
    }

    /// This gate's kind, as it appears in a [`GateResult`].
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TestsPass { .. } => "tests_pass",
            Self::DiffLimits { .. } => "diff_limits",
            Self::SchemaValid { .. } => "schema_valid",
            Self::ArtifactExists { .. } => "artifact_exists",
            Self::Custom { .. } => "custom",
        }
    }
}

const fn default_diff_limit() -> u64 {
    500
}

/// A predicate gating whether a step runs, restricted to referencing the
/// producing step's own predecessors' outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WhenPredicate {
    /// True when the named artifact exists in the run's artifact index.
    ArtifactExists {
        /// Artifact path to check.
        path: String,
    },
    /// True when a JSON Pointer into the named artifact compares true
    /// against `expected` under `comparator`.
    ArtifactProperty {
        /// Artifact path to read.
        path: String,
        /// JSON Pointer (RFC 6901) into the artifact's parsed content.
        pointer: String,
        /// Comparator to apply.
        comparator: Comparator,
        /// Expected value.
        expected: serde_json::Value,
    },
}

// ============================================================================
// SECTION: Adapter Descriptor
// ============================================================================

/// The kind of work an adapter performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Deterministic tool (linter, type checker, formatter, ...).
    Deterministic,
    /// AI-backed adapter (model call).
    Ai,
}

/// Static description of an adapter registered with the
/// [`crate::registry::AdapterRegistry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    /// Registry key.
    pub name: AdapterName,
    /// Deterministic or AI.
    pub kind: AdapterKind,
    /// Actor kinds this adapter can service (matched against
    /// [`Step::actor`]).
    pub actor_kinds_supported: Vec<String>,
    /// Capability tags this adapter advertises.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Estimated cost, in tokens/credits, of a single invocation.
    pub estimated_cost_per_invocation: u64,
    /// Whether the adapter is currently available for routing.
    pub available: bool,
    /// Tags describing side effects this adapter has beyond its declared
    /// emitted artifacts (e.g. `"network"`, `"mutates_workspace"`). Empty
    /// when the adapter is free of side effects.
    #[serde(default)]
    pub side_effects: BTreeSet<String>,
}

// ============================================================================
// SECTION: Artifact Descriptor
// ============================================================================

/// Metadata recorded for an artifact written through the Artifact Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Run-relative path.
    pub path: String,
    /// Lowercase hex-encoded SHA-256 digest of the artifact's bytes.
    pub digest: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// The step that produced this artifact.
    pub produced_by: StepId,
    /// An optional MIME type hint.
    #[serde(default)]
    pub mime_hint: Option<String>,
}

// ============================================================================
// SECTION: Step Result
// ============================================================================

/// The terminal state of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step completed and all block gates passed.
    Succeeded,
    /// The step's adapter failed, timed out past retry, or a block gate
    /// failed.
    Failed,
    /// The step's `when` predicate evaluated false.
    Skipped,
    /// The step was aborted by cancellation.
    Aborted,
}

/// A structured error recorded against a failed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    /// Stable error kind string (see [`crate::error::OrchestrationError::kind`]).
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Whether this error was eligible for retry.
    pub retryable: bool,
}

/// The recorded outcome of executing one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// The step this result describes.
    pub step_id: StepId,
    /// The adapter chosen by the Router, if routing succeeded.
    pub chosen_adapter: Option<AdapterName>,
    /// Terminal status.
    pub status: StepStatus,
    /// RFC3339 start timestamp.
    pub started_at: String,
    /// RFC3339 end timestamp.
    pub ended_at: String,
    /// Tokens/credits actually spent by this step.
    pub tokens_used: u64,
    /// Paths this step actually emitted.
    pub emitted_paths: Vec<String>,
    /// Gate evaluation results for this step.
    pub gate_report: Vec<GateResult>,
    /// The error that caused a non-`Succeeded` status, if any.
    #[serde(default)]
    pub error: Option<StepError>,
}

/// The result of evaluating a single gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Gate kind (`tests_pass`, `diff_limits`, ...).
    pub kind: String,
    /// Whether the gate passed.
    pub passed: bool,
    /// The gate's configured severity.
    pub severity: GateSeverity,
    /// Human-readable detail explaining the outcome.
    pub details: String,
}
