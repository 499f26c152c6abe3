// demos/minimal/src/main.rs
// ============================================================================
// Module: Gatework Minimal Demo
// Description: Minimal end-to-end Gatework run using the built-in fixture
//              adapter.
// Purpose: Demonstrate load_workflow/plan/run and artifact/audit backends.
// Dependencies: gatework-core, gatework-adapters, gatework-store
// ============================================================================

//! ## Overview
//! Runs a single-step workflow through the fixture adapter, writing its
//! artifact and audit log under a temporary directory, and prints the
//! resulting run summary. This demo is backend-agnostic and suitable for
//! quick verification that the kernel is wired up correctly.

use std::io::Write;
use std::sync::Arc;

use gatework_adapters::registry::register_builtin_adapters;
use gatework_adapters::registry::BuiltinAdapterConfigs;
use gatework_core::artifact::ArtifactStore;
use gatework_core::context::RunContext;
use gatework_core::identifiers::RunId;
use gatework_core::loader::load_workflow;
use gatework_core::loader::plan;
use gatework_core::registry::AdapterAccessPolicy;
use gatework_core::registry::AdapterRegistry;
use gatework_core::schema::SchemaRegistry;
use gatework_core::summary::RunStatus;
use gatework_core::verifier::GateEngine;
use gatework_store::FsArtifactStore;
use gatework_store::JsonlAuditLog;

const WORKFLOW_DOCUMENT: &str = r#"
name: minimal
policy:
  max_tokens: 100
steps:
  - id: "1.000"
    name: write-greeting
    actor: fixture
    with:
      emit:
        greeting.json: '{"hello":"world"}'
      tokens_used: 5
    emits:
      - greeting.json
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let schemas = SchemaRegistry::new();
    let workflow = load_workflow(WORKFLOW_DOCUMENT, &schemas)?;
    let run_plan = plan(&workflow)?;

    let mut registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
    register_builtin_adapters(&mut registry, BuiltinAdapterConfigs::all_defaults())?;

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
        gatework_core::executor::run(&workflow, &run_plan, &context, &registry, &schemas, &GateEngine::new(), &audit, 1);
    artifacts.write_manifest(&run_id, &summary)?;

    write_line("Status", status_label(summary.status))?;
    write_line("Tokens used", &summary.tokens_used_total.to_string())?;
    write_line("Audit log", &audit.path().display().to_string())?;
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

/// Writes a labeled line to stdout.
fn write_line(label: &str, value: &str) -> Result<(), std::io::Error> {
    let mut out = std::io::stdout();
    writeln!(out, "{label}: {value}")?;
    Ok(())
}
