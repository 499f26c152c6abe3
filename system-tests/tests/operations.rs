// system-tests/tests/operations.rs
// ============================================================================
// Module: Operations Suite
// Description: Boundary behavior for the loader/planner, the `when`
//              predicate, and the standalone artifact validation
//              entry point.
// Purpose: Exercise planning failures that must never reach the
//          Executor, conditional step skipping, and schema validation
//          of an already-written artifact outside a run.
// Dependencies: system-tests::harness, gatework-core, gatework-adapters
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Integration tests may panic on setup failure.")]

use gatework_adapters::registry::BuiltinAdapterConfigs;
use gatework_core::error::PlanError;
use gatework_core::identifiers::RunId;
use gatework_core::identifiers::SchemaId;
use gatework_core::loader::load_workflow;
use gatework_core::model::StepStatus;
use gatework_core::schema::SchemaRegistry;
use gatework_core::summary::RunStatus;
use gatework_core::validate_artifact;
use system_tests::harness::run_workflow;

/// Two steps whose `depends_on` declarations form a cycle.
const CYCLIC_WORKFLOW: &str = r#"
name: cyclic
steps:
  - id: "1.000"
    name: first
    actor: fixture
    depends_on: ["2.000"]
    emits: []
  - id: "2.000"
    name: second
    actor: fixture
    depends_on: ["1.000"]
    emits: []
"#;

#[test]
fn a_dependency_cycle_is_rejected_at_plan_time() {
    let schemas = SchemaRegistry::new();
    let workflow = load_workflow(CYCLIC_WORKFLOW, &schemas).expect("document parses");
    let outcome = gatework_core::loader::plan(&workflow);
    assert!(matches!(outcome, Err(PlanError::Cycle { .. })));
}

/// A second step gated on a JSON property of the first step's artifact.
const CONDITIONAL_STEP: &str = r#"
name: conditional-step
policy:
  max_tokens: 100
steps:
  - id: "1.000"
    name: report-status
    actor: fixture
    with:
      emit:
        status.json: '{"ready":false}'
      tokens_used: 1
    emits:
      - status.json
  - id: "2.000"
    name: only-when-ready
    actor: fixture
    when:
      kind: artifact_property
      path: status.json
      pointer: /ready
      comparator: equals
      expected: true
    with:
      emit:
        followup.json: '{"ok":true}'
      tokens_used: 1
    emits:
      - followup.json
"#;

#[test]
fn when_predicate_false_skips_the_step_without_failing_the_run() {
    let fixture = run_workflow(CONDITIONAL_STEP, BuiltinAdapterConfigs::all_defaults(), 1)
        .expect("run should complete");

    assert_eq!(fixture.summary.status, RunStatus::Succeeded);
    let followup = fixture.summary.step_results.last().expect("second step recorded");
    assert_eq!(followup.step_id.as_str(), "2.000");
    assert_eq!(followup.status, StepStatus::Skipped);
    assert!(!fixture.artifacts.exists(&fixture.run_id, "followup.json"));
}

const REQUIRED_FIELDS_SCHEMA: &str = r#"{
    "$schema": "https://json-schema.org/draft/2020-12/schema",
    "type": "object",
    "required": ["ok"],
    "properties": { "ok": { "type": "boolean" } }
}"#;

/// Validating an artifact a run already wrote, outside the gate engine,
/// against a schema registered after the run completed.
#[test]
fn validate_artifact_checks_an_already_written_artifact_against_a_registered_schema() {
    let fixture = run_workflow(
        r#"
name: single-emit
policy:
  max_tokens: 10
steps:
  - id: "1.000"
    name: emit-ok
    actor: fixture
    with:
      emit:
        result.json: '{"ok":true}'
      tokens_used: 1
    emits:
      - result.json
"#,
        BuiltinAdapterConfigs::all_defaults(),
        1,
    )
    .expect("run should complete");

    let mut schemas = SchemaRegistry::new();
    let schema_document: serde_json::Value =
        serde_json::from_str(REQUIRED_FIELDS_SCHEMA).expect("schema document parses");
    schemas.register(SchemaId::new("result"), &schema_document).expect("schema compiles");

    let result = validate_artifact(
        fixture.artifacts.as_ref(),
        &fixture.run_id,
        "result.json",
        &SchemaId::new("result"),
        &schemas,
    );
    assert!(result.valid);
    assert!(result.errors.is_empty());

    let missing_result = validate_artifact(
        fixture.artifacts.as_ref(),
        &RunId::generate(),
        "result.json",
        &SchemaId::new("result"),
        &schemas,
    );
    assert!(!missing_result.valid, "a run id that never wrote this artifact must fail validation");
}
