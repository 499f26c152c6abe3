// system-tests/tests/determinism.rs
// ============================================================================
// Module: Determinism Suite
// Description: Coverage of repeatability across independent runs of the
//              same workflow, including parallel sibling dispatch.
// Purpose: Confirm that running the same deterministic workflow twice
//          produces identical step outcomes and artifact digests, with a
//          worker pool wide enough to actually interleave sibling steps.
// Dependencies: system-tests::harness, gatework-core, gatework-adapters
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Integration tests may panic on setup failure.")]

use gatework_adapters::registry::BuiltinAdapterConfigs;
use gatework_core::summary::RunStatus;
use system_tests::harness::normalize_for_comparison;
use system_tests::harness::run_workflow;

/// Three independent root steps plus a step that depends on all of them,
/// wide enough that a worker count above one actually interleaves the
/// roots.
const PARALLEL_SIBLINGS: &str = r#"
name: parallel-siblings
policy:
  max_tokens: 1000
  prefer_deterministic: true
steps:
  - id: "1.000"
    name: root-a
    actor: fixture
    depends_on: []
    with:
      emit:
        a.json: '{"branch":"a"}'
      tokens_used: 1
    emits:
      - a.json
  - id: "1.001"
    name: root-b
    actor: fixture
    depends_on: []
    with:
      emit:
        b.json: '{"branch":"b"}'
      tokens_used: 1
    emits:
      - b.json
  - id: "1.002"
    name: root-c
    actor: fixture
    depends_on: []
    with:
      emit:
        c.json: '{"branch":"c"}'
      tokens_used: 1
    emits:
      - c.json
  - id: "2.000"
    name: join
    actor: fixture
    depends_on: ["1.000", "1.001", "1.002"]
    with:
      emit:
        joined.json: '{"ok":true}'
      tokens_used: 1
    emits:
      - joined.json
"#;

#[test]
fn repeated_runs_of_the_same_workflow_agree_on_status_and_digests() {
    let first = run_workflow(PARALLEL_SIBLINGS, BuiltinAdapterConfigs::all_defaults(), 4)
        .expect("first run should complete");
    let second = run_workflow(PARALLEL_SIBLINGS, BuiltinAdapterConfigs::all_defaults(), 4)
        .expect("second run should complete");

    assert_eq!(first.summary.status, RunStatus::Succeeded);
    assert_eq!(second.summary.status, RunStatus::Succeeded);
    assert_eq!(normalize_for_comparison(&first.summary), normalize_for_comparison(&second.summary));

    for path in ["a.json", "b.json", "c.json", "joined.json"] {
        let left = first.summary.artifacts_index.get(path).expect("artifact indexed");
        let right = second.summary.artifacts_index.get(path).expect("artifact indexed");
        assert_eq!(left.digest, right.digest, "{path} must hash identically across runs");
    }
}

#[test]
fn join_step_only_runs_after_every_root_reaches_a_terminal_state() {
    let fixture = run_workflow(PARALLEL_SIBLINGS, BuiltinAdapterConfigs::all_defaults(), 4)
        .expect("run should complete");

    let join = fixture.summary.step_results.last().expect("join step ran");
    assert_eq!(join.step_id.as_str(), "2.000");
    assert!(fixture.artifacts.exists(&fixture.run_id, "joined.json"));
}
