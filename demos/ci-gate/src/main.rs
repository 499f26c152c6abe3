// demos/ci-gate/src/main.rs
// ============================================================================
// Module: Gatework CI Gate Demo
// Description: Scenario gating a release step on two independent upstream
//              checks passing, via a custom gate plugin.
// Purpose: Demonstrate parallel sibling steps and Gate::Custom dispatch.
// Dependencies: gatework-core, gatework-adapters, gatework-store
// ============================================================================

//! ## Overview
//! This demo models a CI gate that requires both a passing CI status and a
//! minimum number of approvals before a release step is allowed to run.
//! `ci-status` and `approvals` are independent roots executed in parallel;
//! `release` depends on both and is only permitted to pass once
//! [`CiApprovalGate`] confirms both conditions from their emitted artifacts.

use std::io::Write;
use std::sync::Arc;

use gatework_adapters::registry::register_builtin_adapters;
use gatework_adapters::registry::BuiltinAdapterConfigs;
use gatework_core::artifact::ArtifactStore;
use gatework_core::context::RunContext;
use gatework_core::error::GateError;
use gatework_core::identifiers::RunId;
use gatework_core::identifiers::StepId;
use gatework_core::loader::load_workflow;
use gatework_core::loader::plan;
use gatework_core::registry::AdapterAccessPolicy;
use gatework_core::registry::AdapterRegistry;
use gatework_core::schema::SchemaRegistry;
use gatework_core::model::StepStatus;
use gatework_core::summary::RunStatus;
use gatework_core::verifier::CustomGatePlugin;
use gatework_core::verifier::GateEngine;
use gatework_store::FsArtifactStore;
use gatework_store::JsonlAuditLog;
use serde_json::Value;

const WORKFLOW_DOCUMENT: &str = r#"
name: ci-gate
policy:
  max_tokens: 100
  prefer_deterministic: true
steps:
  - id: "1.000"
    name: ci-status
    actor: fixture
    depends_on: []
    with:
      emit:
        ci_status.json: '{"status":"passed"}'
      tokens_used: 1
    emits:
      - ci_status.json
  - id: "1.001"
    name: approvals
    actor: fixture
    depends_on: []
    with:
      emit:
        approvals.json: '{"count":2}'
      tokens_used: 1
    emits:
      - approvals.json
  - id: "2.000"
    name: release
    actor: fixture
    depends_on: ["1.000", "1.001"]
    with:
      emit:
        release.json: '{"released":true}'
      tokens_used: 1
    emits:
      - release.json
    gates:
      - kind: custom
        name: ci_approved
        severity: block
"#;

/// Passes only when `ci_status.json` reports `"passed"` and
/// `approvals.json` reports a count of at least two.
struct CiApprovalGate;

impl CustomGatePlugin for CiApprovalGate {
    fn evaluate(
        &self,
        _step_id: &StepId,
        _params: &Value,
        context: &RunContext,
    ) -> Result<bool, GateError> {
        let ci_passed = read_json(context, "ci_status.json")
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| status == "passed");
        let approvals = read_json(context, "approvals.json").get("count").and_then(Value::as_u64).unwrap_or(0);
        Ok(ci_passed && approvals >= 2)
    }
}

/// Reads and parses `path` as JSON, returning `Value::Null` if the
/// artifact is missing or malformed.
fn read_json(context: &RunContext, path: &str) -> Value {
    context
        .artifacts()
        .read(context.run_id(), path)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or(Value::Null)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let schemas = SchemaRegistry::new();
    let workflow = load_workflow(WORKFLOW_DOCUMENT, &schemas)?;
    let run_plan = plan(&workflow)?;

    let mut registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
    register_builtin_adapters(&mut registry, BuiltinAdapterConfigs::all_defaults())?;

    let mut gates = GateEngine::new();
    gates.register_custom("ci_approved", CiApprovalGate);

    let workdir = tempfile::tempdir()?;
    let run_id = RunId::generate();
    let artifacts = Arc::new(FsArtifactStore::new(workdir.path()));
    let audit = JsonlAuditLog::new(workdir.path(), &run_id)?;
    let context = RunContext::new(
        run_id.clone(),
        "2026-07-27T00:00:00Z",
        workflow.inputs.clone(),
        workflow.policy.max_tokens,
        artifacts.clone() as Arc<dyn ArtifactStore + Send + Sync>,
    );

    let summary =
        gatework_core::executor::run(&workflow, &run_plan, &context, &registry, &schemas, &gates, &audit, 2);
    artifacts.write_manifest(&run_id, &summary)?;

    write_line("Status", status_label(summary.status))?;
    for result in &summary.step_results {
        write_line(result.step_id.as_str(), step_status_label(result.status))?;
    }
    Ok(())
}

/// Returns a stable label for the run status.
const fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Succeeded => "succeeded",
        RunStatus::Failed => "failed",
        RunStatus::Aborted => "aborted",
    }
}

/// Returns a stable label for a step's terminal status.
const fn step_status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Succeeded => "succeeded",
        StepStatus::Failed => "failed",
        StepStatus::Skipped => "skipped",
        StepStatus::Aborted => "aborted",
    }
}

/// Writes a labeled line to stdout.
fn write_line(label: &str, value: &str) -> Result<(), std::io::Error> {
    let mut out = std::io::stdout();
    writeln!(out, "{label}: {value}")?;
    Ok(())
}
