// crates/gatework-core/src/error.rs
// ============================================================================
// Module: Orchestration Errors
// Description: Stable error taxonomy for the orchestration kernel.
// Purpose: Every fallible operation in gatework-core returns a
//          `thiserror`-derived error whose kind string is stable across
//          releases, for audit-log and RunSummary reporting.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Component-level errors (schema, planning, routing, execution, gates,
//! cost) are modeled as their own enums, grounded on the same one-enum-
//! per-concern style as the rest of this workspace's interfaces. They
//! aggregate into [`OrchestrationError`], whose [`OrchestrationError::kind`]
//! returns the stable kind string from the error handling design so audit
//! events and [`crate::summary::RunSummary`] fields never need a second
//! mapping table.

use thiserror::Error;

use crate::identifiers::AdapterName;
use crate::identifiers::IdentifierError;
use crate::identifiers::StepId;

// ============================================================================
// SECTION: Schema errors
// ============================================================================

/// Errors from the [`crate::schema::SchemaRegistry`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No schema is registered under the requested logical name.
    #[error("unknown schema id {0:?}")]
    UnknownSchema(String),
    /// The schema document itself failed to compile.
    #[error("schema {schema_id:?} failed to compile: {message}")]
    InvalidSchema {
        /// Logical schema name.
        schema_id: String,
        /// Compiler error message.
        message: String,
    },
    /// A document failed validation against its schema.
    #[error("document failed validation against schema {schema_id:?}: {errors:?}")]
    ValidationFailed {
        /// Logical schema name.
        schema_id: String,
        /// One message per validation error encountered.
        errors: Vec<String>,
    },
}

// ============================================================================
// SECTION: Plan errors
// ============================================================================

/// Errors from the [`crate::loader`] workflow loader and planner.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Two steps declared the same `id`.
    #[error("duplicate step id {0}")]
    DuplicateStepId(StepId),
    /// A step's `depends_on` referenced an id not present in the workflow.
    #[error("step {step} depends on unknown step {depends_on}")]
    UnknownDependency {
        /// The step with the dangling dependency.
        step: StepId,
        /// The missing dependency id.
        depends_on: StepId,
    },
    /// The dependency graph contains a cycle.
    #[error("dependency cycle detected among steps: {cycle:?}")]
    Cycle {
        /// The step ids participating in the cycle, in encounter order.
        cycle: Vec<StepId>,
    },
    /// Two steps declared the same emitted artifact path.
    #[error("steps {first} and {second} both emit {path:?}")]
    EmitPathCollision {
        /// The first step to declare the path.
        first: StepId,
        /// The second step to declare the path.
        second: StepId,
        /// The colliding path.
        path: String,
    },
    /// A `when` predicate referenced a path outside the producing step's
    /// own predecessors.
    #[error("step {step}'s `when` predicate references {path:?}, which is not reachable through its depends_on")]
    WhenScopeViolation {
        /// The step with the out-of-scope predicate.
        step: StepId,
        /// The referenced path.
        path: String,
    },
    /// An identifier embedded in the workflow document was malformed.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    /// The document could not be parsed as YAML or JSON.
    #[error("failed to parse workflow document: {0}")]
    Parse(String),
    /// The document failed schema validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// ============================================================================
// SECTION: Router / Registry errors
// ============================================================================

/// Errors from the [`crate::registry::AdapterRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An adapter with this name is already registered.
    #[error("adapter {0} is already registered")]
    DuplicateAdapter(AdapterName),
}

/// Errors from the [`crate::router`].
#[derive(Debug, Error)]
pub enum RouterError {
    /// No registered adapter satisfies the step's actor kind, capability,
    /// and policy constraints.
    #[error("no adapter available for step {0}")]
    NoAdapterAvailable(StepId),
    /// Every adapter that could satisfy the step costs more than the
    /// budget remaining.
    #[error("budget exhausted routing step {0}")]
    BudgetExhaustedForStep(StepId),
}

// ============================================================================
// SECTION: Gate / Verifier errors
// ============================================================================

/// Errors from the [`crate::verifier`].
#[derive(Debug, Error)]
pub enum GateError {
    /// A block-severity gate did not pass.
    #[error("gate {kind} failed for step {step}: {details}")]
    Failed {
        /// Step under evaluation.
        step: StepId,
        /// Gate kind (`tests_pass`, `diff_limits`, ...).
        kind: String,
        /// Human-readable detail.
        details: String,
    },
    /// A referenced custom-gate plugin is not registered.
    #[error("custom gate plugin {0:?} is not registered")]
    UnknownCustomGate(String),
}

// ============================================================================
// SECTION: Cost Tracker errors
// ============================================================================

/// Errors from the [`crate::cost::CostTracker`].
#[derive(Debug, Error)]
pub enum CostError {
    /// A settle pushed total spend past `i64::MAX`.
    #[error("cost tracker overflow settling {amount} tokens")]
    Overflow {
        /// The amount that overflowed the tracker.
        amount: u64,
    },
}

// ============================================================================
// SECTION: Artifact Store errors
// ============================================================================

/// Errors from the [`crate::artifact::ArtifactStore`] trait and its
/// filesystem implementation.
#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    /// The path was absolute, escaped the run namespace via `..`, or was
    /// otherwise rejected.
    #[error("artifact path {0:?} is not a valid run-relative path")]
    InvalidPath(String),
    /// Two writes targeted the same path with different content.
    #[error("artifact path {0:?} was already written with different content")]
    Collision(String),
    /// A read was attempted for a path never catalogued by a write.
    #[error("artifact path {0:?} was never written in this run")]
    NotCatalogued(String),
    /// The underlying filesystem operation failed.
    #[error("artifact store io error on {path:?}: {message}")]
    Io {
        /// The path being read or written.
        path: String,
        /// The underlying error message.
        message: String,
    },
}

// ============================================================================
// SECTION: Audit Log errors
// ============================================================================

/// Errors from the [`crate::audit::AuditSink`] trait and its JSONL
/// implementation.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The event could not be serialized or appended to the sink.
    #[error("audit log append failed: {0}")]
    Append(String),
    /// The sink could not be flushed before the run summary was returned.
    #[error("audit log flush failed: {0}")]
    Flush(String),
}

// ============================================================================
// SECTION: Top-level orchestration error
// ============================================================================

/// The stable orchestration-level error kind, carried by
/// [`crate::model::StepResult::error`] and the `error` audit event.
///
/// Variant names are exactly the stable kind strings from the error
/// handling design; [`Self::kind`] exposes them as `&'static str` so
/// audit events and [`crate::summary::RunSummary`] fields never need a
/// second mapping table.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The workflow document failed schema validation. Fatal before the
    /// run starts.
    #[error(transparent)]
    SchemaValidationError(#[from] SchemaError),
    /// The workflow document failed to load or plan. Fatal before the
    /// run starts.
    #[error(transparent)]
    PlanError(#[from] PlanError),
    /// No adapter could be routed to a step. The step fails; honors
    /// `fail_fast`.
    #[error(transparent)]
    NoAdapterAvailable(#[from] RouterError),
    /// The step was skipped because routing it would exceed the budget.
    /// Drain mode; the run fails only if a block gate depended on the
    /// skipped step's output.
    #[error("budget exhausted for step {0}")]
    BudgetExhausted(StepId),
    /// A step's declared `emits` path does not exist after it reported
    /// success. Non-retryable.
    #[error("step {step} did not emit declared artifact {path:?}")]
    MissingEmittedArtifact {
        /// The step that failed to emit.
        step: StepId,
        /// The missing path.
        path: String,
    },
    /// A block-severity gate failed.
    #[error(transparent)]
    GateFailed(#[from] GateError),
    /// An adapter reported a transient failure. Retried per policy.
    #[error("adapter {adapter} reported a transient failure on step {step}: {message}")]
    AdapterTransient {
        /// The step being executed.
        step: StepId,
        /// The adapter invoked.
        adapter: AdapterName,
        /// The adapter's error message.
        message: String,
    },
    /// An adapter reported a permanent failure. Not retried.
    #[error("adapter {adapter} reported a permanent failure on step {step}: {message}")]
    AdapterPermanent {
        /// The step being executed.
        step: StepId,
        /// The adapter invoked.
        adapter: AdapterName,
        /// The adapter's error message.
        message: String,
    },
    /// A step exceeded its per-step timeout. Retryable once if the retry
    /// policy allows it.
    #[error("step {0} timed out")]
    Timeout(StepId),
    /// The run was cancelled before the step or run terminated naturally.
    #[error("run was cancelled")]
    Cancelled,
    /// An internal invariant was violated. Non-retryable; the run fails.
    #[error("internal error: {0}")]
    InternalError(String),
}

impl OrchestrationError {
    /// The stable kind string for this error, as it appears in audit log
    /// `error` events and [`crate::summary::RunSummary`] fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SchemaValidationError(_) => "SchemaValidationError",
            Self::PlanError(_) => "PlanError",
            Self::NoAdapterAvailable(_) => "NoAdapterAvailable",
            Self::BudgetExhausted(_) => "BudgetExhausted",
            Self::MissingEmittedArtifact { .. } => "MissingEmittedArtifact",
            Self::GateFailed(_) => "GateFailed",
            Self::AdapterTransient { .. } => "AdapterTransient",
            Self::AdapterPermanent { .. } => "AdapterPermanent",
            Self::Timeout(_) => "Timeout",
            Self::Cancelled => "Cancelled",
            Self::InternalError(_) => "InternalError",
        }
    }

    /// Whether this error is retryable under the step's retry policy.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::AdapterTransient { .. } | Self::Timeout(_))
    }
}

impl From<ArtifactStoreError> for OrchestrationError {
    fn from(value: ArtifactStoreError) -> Self {
        Self::InternalError(value.to_string())
    }
}

impl From<AuditError> for OrchestrationError {
    fn from(value: AuditError) -> Self {
        Self::InternalError(value.to_string())
    }
}

impl From<CostError> for OrchestrationError {
    fn from(value: CostError) -> Self {
        Self::InternalError(value.to_string())
    }
}
