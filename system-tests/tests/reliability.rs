// system-tests/tests/reliability.rs
// ============================================================================
// Module: Reliability Suite
// Description: Coverage of retry behavior against the flaky adapter and
//              fail-closed gate evaluation on missing evidence.
// Purpose: Exercise the Executor's retry loop (attempt counting, backoff
//          indexing, retryable vs. permanent classification) and the
//          Verifier's fail-closed posture when a gate's expected artifact
//          never materializes.
// Dependencies: system-tests::harness, gatework-core, gatework-adapters
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Integration tests may panic on setup failure.")]

use gatework_adapters::registry::BuiltinAdapterConfigs;
use gatework_adapters::registry::FlakyAdapterConfig;
use gatework_core::model::StepStatus;
use gatework_core::summary::RunStatus;
use system_tests::harness::run_workflow;

/// A single step on the flaky actor, configured to fail once before
/// succeeding, with enough retry attempts to recover.
const RETRIES_UNTIL_SUCCESS: &str = r#"
name: retries-until-success
policy:
  max_tokens: 100
  retry:
    max_attempts: 3
    backoff_ms: [0]
steps:
  - id: "1.000"
    name: flaky-step
    actor: flaky
    with:
      emit:
        out.json: '{"ok":true}'
      tokens_used: 5
    emits:
      - out.json
"#;

/// Registers only the flaky adapter, configured to fail its first
/// `fail_first_n` invocations.
fn flaky_adapters(fail_first_n: u32) -> BuiltinAdapterConfigs {
    BuiltinAdapterConfigs {
        fixture: None,
        flaky: Some(FlakyAdapterConfig { fail_first_n, ..FlakyAdapterConfig::default() }),
    }
}

#[test]
fn transient_failure_is_retried_and_eventually_succeeds() {
    let fixture =
        run_workflow(RETRIES_UNTIL_SUCCESS, flaky_adapters(1), 1).expect("run should complete");

    assert_eq!(fixture.summary.status, RunStatus::Succeeded);
    let result = fixture.summary.step_results.first().expect("step ran");
    assert_eq!(result.status, StepStatus::Succeeded);
    assert_eq!(result.tokens_used, 5);

    let events = fixture.audit_events().expect("audit log readable");
    let attempts = events
        .iter()
        .filter(|event| event.get("event").and_then(|v| v.as_str()) == Some("step_started"))
        .count();
    assert_eq!(attempts, 2, "one failed attempt, then one successful attempt");
}

#[test]
fn retries_exhausted_fails_permanently_with_retryable_flag() {
    let fixture = run_workflow(RETRIES_UNTIL_SUCCESS, flaky_adapters(10), 1).expect("run should complete");

    assert_eq!(fixture.summary.status, RunStatus::Failed);
    let result = fixture.summary.step_results.first().expect("step ran");
    assert_eq!(result.status, StepStatus::Failed);
    let error = result.error.as_ref().expect("failure is recorded");
    assert!(error.retryable, "the adapter's failure kind was transient even though retries ran out");

    let events = fixture.audit_events().expect("audit log readable");
    let attempts = events
        .iter()
        .filter(|event| event.get("event").and_then(|v| v.as_str()) == Some("step_started"))
        .count();
    assert_eq!(attempts, 3, "max_attempts caps retries even though the adapter keeps failing");
}

/// A step gated on `artifact_exists` for a path it never emits.
const MISSING_ARTIFACT_GATE: &str = r#"
name: missing-artifact-gate
policy:
  max_tokens: 100
steps:
  - id: "1.000"
    name: writes-nothing-useful
    actor: fixture
    with:
      emit:
        unrelated.json: '{"ok":true}'
      tokens_used: 1
    emits:
      - unrelated.json
    gates:
      - kind: artifact_exists
        path: expected.json
        severity: block
"#;

#[test]
fn artifact_exists_gate_fails_closed_when_the_path_was_never_written() {
    let fixture =
        run_workflow(MISSING_ARTIFACT_GATE, BuiltinAdapterConfigs::all_defaults(), 1).expect("run should complete");

    assert_eq!(fixture.summary.status, RunStatus::Failed);
    let result = fixture.summary.step_results.first().expect("step ran");
    assert_eq!(result.status, StepStatus::Failed);
    let gate = result.gate_report.iter().find(|gate| gate.kind == "artifact_exists").expect("gate ran");
    assert!(!gate.passed);
}
