// crates/gatework-core/src/lib.rs
// ============================================================================
// Module: Gatework Core Library
// Description: Public API surface for the Gatework orchestration kernel.
// Purpose: Expose the schema validator, loader/planner, adapter registry,
//          router, executor, verifier, and audit log as one coherent,
//          backend-agnostic library.
// Dependencies: crate::{artifact, audit, comparator, context, cost, error,
//               executor, identifiers, loader, model, registry, router,
//               schema, summary, verifier}
// ============================================================================

//! ## Overview
//! Gatework is a deterministic, one-shot workflow orchestration kernel: it
//! loads a workflow document, plans it into a DAG, and drives that DAG to a
//! terminal [`summary::RunSummary`] through a fixed pool of worker threads.
//! It is not a daemon and holds no state between runs; callers own the
//! process lifecycle, adapter registration, and artifact/audit backends.
//!
//! The crate is backend-agnostic by design: [`artifact::ArtifactStore`] and
//! [`audit::AuditSink`] are trait seams implemented elsewhere (`gatework-store`
//! supplies the namespaced filesystem writer and the JSONL audit log), and
//! [`registry::Adapter`] is the seam adapters (deterministic tools, AI
//! actors, human gates) implement to participate in a run.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod artifact;
pub mod audit;
pub mod comparator;
pub mod context;
pub mod cost;
pub mod error;
pub mod executor;
pub mod identifiers;
pub mod loader;
pub mod model;
pub mod registry;
pub mod router;
pub mod schema;
pub mod summary;
pub mod verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use comparator::evaluate_comparator;
pub use context::RunContext;
pub use cost::CostTracker;
pub use cost::Reservation;
pub use error::OrchestrationError;
pub use executor::run;
pub use identifiers::AdapterName;
pub use identifiers::IdentifierError;
pub use identifiers::RunId;
pub use identifiers::SchemaId;
pub use identifiers::StepId;
pub use loader::PlanNode;
pub use loader::RunPlan;
pub use loader::load_workflow;
pub use loader::plan;
pub use model::Workflow;
pub use registry::Adapter;
pub use registry::AdapterAccessPolicy;
pub use registry::AdapterRegistry;
pub use registry::AdapterResult;
pub use router::RoutingDecision;
pub use router::route;
pub use schema::SchemaRegistry;
pub use summary::RunStatus;
pub use summary::RunSummary;
pub use verifier::CustomGatePlugin;
pub use verifier::GateEngine;

use serde::Deserialize;
use serde::Serialize;

use crate::artifact::ArtifactStore;
use crate::error::SchemaError;
use crate::identifiers::RunId as RunIdentifier;
use crate::identifiers::SchemaId as SchemaIdentifier;

/// The outcome of validating one already-written artifact against a
/// registered schema, independent of any particular run step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether `path` conforms to the schema registered under `schema_id`.
    pub valid: bool,
    /// One message per validation failure. Empty when `valid` is `true`.
    pub errors: Vec<String>,
}

/// Validates the artifact written at `path` within `run_id`'s namespace
/// against the schema registered under `schema_id`.
///
/// This is the one entry point that lets a caller (a demo, a custom gate
/// plugin, a future CLI) check an artifact outside the gate engine's own
/// `SchemaValid` gate, which calls the same underlying check during a run.
#[must_use]
pub fn validate_artifact(
    artifacts: &dyn ArtifactStore,
    run_id: &RunIdentifier,
    path: &str,
    schema_id: &SchemaIdentifier,
    schemas: &SchemaRegistry,
) -> ValidationResult {
    let bytes = match artifacts.read(run_id, path) {
        Ok(bytes) => bytes,
        Err(err) => return ValidationResult { valid: false, errors: vec![err.to_string()] },
    };
    let document: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(document) => document,
        Err(err) => {
            return ValidationResult {
                valid: false,
                errors: vec![format!("{path} is not valid JSON: {err}")],
            };
        }
    };
    match schemas.validate(schema_id, &document) {
        Ok(()) => ValidationResult { valid: true, errors: Vec::new() },
        Err(SchemaError::ValidationFailed { errors, .. }) => {
            ValidationResult { valid: false, errors }
        }
        Err(err) => ValidationResult { valid: false, errors: vec![err.to_string()] },
    }
}
