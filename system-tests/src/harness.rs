// system-tests/src/harness.rs
// ============================================================================
// Module: Run Harness
// Description: Builds and runs a workflow against real filesystem-backed
//              backends, for use by every test suite in this crate.
// Purpose: Keep the load/plan/register/run/inspect boilerplate in one
//          place so suites read as scenario + assertions.
// Dependencies: gatework-core, gatework-adapters, gatework-store, tempfile
// ============================================================================

use std::sync::Arc;

use gatework_adapters::registry::BuiltinAdapterConfigs;
use gatework_adapters::registry::register_builtin_adapters;
use gatework_core::artifact::ArtifactStore;
use gatework_core::context::RunContext;
use gatework_core::identifiers::RunId;
use gatework_core::loader::load_workflow;
use gatework_core::loader::plan;
use gatework_core::registry::AdapterAccessPolicy;
use gatework_core::registry::AdapterRegistry;
use gatework_core::schema::SchemaRegistry;
use gatework_core::summary::RunSummary;
use gatework_core::verifier::GateEngine;
use gatework_store::FsArtifactStore;
use gatework_store::JsonlAuditLog;
use tempfile::TempDir;

/// A fully wired run, holding the backing temp directory alive so a test
/// can inspect artifacts and the audit log after the run returns.
pub struct RunFixture {
    /// The temp directory backing this run's artifact store and audit
    /// log. Dropped (and deleted) when the fixture goes out of scope.
    pub workdir: TempDir,
    /// This run's identifier.
    pub run_id: RunId,
    /// The artifact store the run wrote to.
    pub artifacts: Arc<FsArtifactStore>,
    /// The run's terminal summary.
    pub summary: RunSummary,
}

impl RunFixture {
    /// Reads this run's audit log and parses each line as a JSON value.
    ///
    /// # Errors
    /// Returns an error if the log file cannot be read or a line is not
    /// valid JSON.
    pub fn audit_events(&self) -> Result<Vec<serde_json::Value>, Box<dyn std::error::Error>> {
        let path = self.workdir.path().join("logs").join(format!("{}.jsonl", self.run_id));
        let contents = std::fs::read_to_string(path)?;
        contents.lines().map(|line| Ok(serde_json::from_str(line)?)).collect()
    }

    /// The manifest this run wrote to `manifest.json`, parsed back as a
    /// [`RunSummary`].
    ///
    /// # Errors
    /// Returns an error if the manifest cannot be read or parsed.
    pub fn manifest(&self) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let path = self.workdir.path().join("artifacts").join(self.run_id.as_str()).join("manifest.json");
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Loads, plans, and runs `document` to completion against a fresh
/// temp-directory-backed run, with the given adapter set and worker
/// count, and without any pre-run cancellation.
///
/// # Errors
/// Returns an error if the document fails to load or plan, if an adapter
/// fails to register, or if a backend I/O operation fails.
pub fn run_workflow(
    document: &str,
    adapters: BuiltinAdapterConfigs,
    worker_count: usize,
) -> Result<RunFixture, Box<dyn std::error::Error>> {
    run_workflow_with(document, adapters, worker_count, &GateEngine::new(), false)
}

/// As [`run_workflow`], but with a caller-supplied [`GateEngine`] (for
/// custom gate plugins) and an option to request cancellation before the
/// first step starts, to exercise the Executor's abort path.
///
/// # Errors
/// Returns an error if the document fails to load or plan, if an adapter
/// fails to register, or if a backend I/O operation fails.
pub fn run_workflow_with(
    document: &str,
    adapters: BuiltinAdapterConfigs,
    worker_count: usize,
    gates: &GateEngine,
    cancel_before_start: bool,
) -> Result<RunFixture, Box<dyn std::error::Error>> {
    let mut registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
    register_builtin_adapters(&mut registry, adapters)?;
    run_with_registry(document, registry, worker_count, gates, cancel_before_start)
}

/// As [`run_workflow_with`], but with a caller-supplied, already-populated
/// [`AdapterRegistry`] instead of the built-in adapter set. Lets a suite
/// register an adapter whose descriptor advertises a nonzero cost, to
/// exercise routing-time budget rejection.
///
/// # Errors
/// Returns an error if the document fails to load or plan, or if a
/// backend I/O operation fails.
pub fn run_with_registry(
    document: &str,
    registry: AdapterRegistry,
    worker_count: usize,
    gates: &GateEngine,
    cancel_before_start: bool,
) -> Result<RunFixture, Box<dyn std::error::Error>> {
    let schemas = SchemaRegistry::new();
    let workflow = load_workflow(document, &schemas)?;
    let run_plan = plan(&workflow)?;

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
    if cancel_before_start {
        context.cancel();
    }

    let summary = gatework_core::executor::run(
        &workflow,
        &run_plan,
        &context,
        &registry,
        &schemas,
        gates,
        &audit,
        worker_count,
    );
    artifacts.write_manifest(&run_id, &summary)?;

    Ok(RunFixture { workdir, run_id, artifacts, summary })
}

/// Strips every volatile field (timestamps, run id) from a [`RunSummary`]
/// so two runs of the same workflow can be compared for determinism.
#[must_use]
pub fn normalize_for_comparison(summary: &RunSummary) -> serde_json::Value {
    let mut value = serde_json::to_value(summary).unwrap_or(serde_json::Value::Null);
    if let Some(object) = value.as_object_mut() {
        object.remove("run_id");
        if let Some(steps) = object.get_mut("step_results").and_then(|steps| steps.as_array_mut()) {
            for step in steps {
                if let Some(step) = step.as_object_mut() {
                    step.remove("started_at");
                    step.remove("ended_at");
                }
            }
        }
    }
    value
}
