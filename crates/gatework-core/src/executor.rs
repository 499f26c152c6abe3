// crates/gatework-core/src/executor.rs
// ============================================================================
// Module: Executor
// Description: Coordinator and bounded worker pool driving one run to a
//              terminal state.
// Purpose: Walk the run plan in topological order, dispatching ready steps
//          to a fixed pool of `std::thread` workers, honoring `when`
//          predicates, retries, fail-fast, gates, and the cost budget.
// Dependencies: crate::cost, crate::loader, crate::registry, crate::router,
//               crate::verifier, std::thread, std::sync::mpsc
// ============================================================================

//! ## Overview
//! The Executor is intentionally not a daemon: [`run`] drives a single
//! [`crate::loader::RunPlan`] to completion and returns. Concurrency comes
//! from a fixed-size worker pool built on `std::thread::scope` and
//! `std::sync::mpsc`, never an async runtime. A step becomes ready once
//! every predecessor has reached a terminal state; the coordinator feeds
//! ready steps to workers and folds their results back into the plan's
//! remaining-predecessor counts until no step can make further progress.
//!
//! With the default worker count of one, dispatch collapses to strictly
//! sequential execution in topological order — useful for reproducing a
//! run deterministically when diagnosing a failure.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::Duration;

use crate::audit::AuditEvent;
use crate::audit::AuditEventKind;
use crate::audit::AuditSink;
use crate::comparator::evaluate_comparator;
use crate::context::RunContext;
use crate::error::RouterError;
use crate::identifiers::AdapterName;
use crate::identifiers::StepId;
use crate::loader::RunPlan;
use crate::model::ArtifactDescriptor;
use crate::model::Step;
use crate::model::StepError;
use crate::model::StepResult;
use crate::model::StepStatus;
use crate::model::WhenPredicate;
use crate::model::Workflow;
use crate::registry::AdapterRegistry;
use crate::registry::AdapterResult;
use crate::registry::AdapterStatus;
use crate::router::route;
use crate::schema::SchemaRegistry;
use crate::summary::RunStatus;
use crate::summary::RunSummary;
use crate::verifier::GateEngine;

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_owned())
}

/// Drives `plan` to completion against `context`, returning the run's
/// terminal [`RunSummary`].
///
/// `worker_count` is clamped to at least one. Workers are plain
/// `std::thread`s scoped to this call; no step outlives `run`.
#[must_use]
pub fn run(
    workflow: &Workflow,
    plan: &RunPlan,
    context: &RunContext,
    registry: &AdapterRegistry,
    schemas: &SchemaRegistry,
    gates: &GateEngine,
    audit: &(dyn AuditSink + Sync),
    worker_count: usize,
) -> RunSummary {
    let worker_count = worker_count.max(1);
    let _ = audit.append(&AuditEvent {
        ts: now_rfc3339(),
        run_id: context.run_id().clone(),
        kind: AuditEventKind::RunStarted { workflow_name: workflow.name.clone() },
    });

    let steps_by_id: BTreeMap<StepId, &Step> =
        plan.nodes.iter().map(|(id, node)| (id.clone(), &node.step)).collect();

    let remaining: Mutex<BTreeMap<StepId, usize>> =
        Mutex::new(plan.nodes.iter().map(|(id, node)| (id.clone(), node.preds.len())).collect());

    let (work_tx, work_rx) = mpsc::channel::<StepId>();
    let work_rx = Mutex::new(work_rx);
    let (result_tx, result_rx) = mpsc::channel::<StepResult>();

    for root in &plan.roots {
        let _ = work_tx.send(root.clone());
    }

    let mut in_flight = plan.roots.len();
    let mut fail_fast_triggered = false;
    let mut step_results: Vec<StepResult> = Vec::with_capacity(plan.nodes.len());

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            let work_rx = &work_rx;
            let result_tx = result_tx.clone();
            let steps_by_id = &steps_by_id;
            scope.spawn(move || {
                loop {
                    let next = {
                        let rx = work_rx.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                        rx.recv()
                    };
                    let Ok(step_id) = next else { break };
                    let Some(step) = steps_by_id.get(&step_id) else { break };
                    let result = execute_step(step, workflow, context, registry, schemas, gates, audit);
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }

        while in_flight > 0 {
            let Ok(result) = result_rx.recv() else { break };
            in_flight -= 1;
            if !matches!(result.status, StepStatus::Succeeded | StepStatus::Skipped)
                && workflow.policy.fail_fast
            {
                fail_fast_triggered = true;
            }

            let node = &plan.nodes[&result.step_id];
            step_results.push(result);

            if fail_fast_triggered || context.is_cancelled() {
                continue;
            }

            let mut remaining_guard =
                remaining.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            for succ in &node.succs {
                if let Some(count) = remaining_guard.get_mut(succ) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        in_flight += 1;
                        let _ = work_tx.send(succ.clone());
                    }
                }
            }
        }

        drop(work_tx);
    });

    step_results.sort_by_key(|result| {
        plan.nodes.get(&result.step_id).map_or(u32::MAX, |node| node.rank)
    });

    let ran_ids: std::collections::BTreeSet<&StepId> =
        step_results.iter().map(|result| &result.step_id).collect();
    for id in plan.nodes.keys() {
        if !ran_ids.contains(id) {
            let status = if context.is_cancelled() { StepStatus::Aborted } else { StepStatus::Skipped };
            let reason = if context.is_cancelled() {
                "run was cancelled before this step was dispatched".to_owned()
            } else {
                "run entered fail_fast after an earlier step did not succeed".to_owned()
            };
            let _ = audit.append(&AuditEvent {
                ts: now_rfc3339(),
                run_id: context.run_id().clone(),
                kind: AuditEventKind::StepSkipped { step_id: id.clone(), reason },
            });
            step_results.push(StepResult {
                step_id: id.clone(),
                chosen_adapter: None,
                status,
                started_at: now_rfc3339(),
                ended_at: now_rfc3339(),
                tokens_used: 0,
                emitted_paths: Vec::new(),
                gate_report: Vec::new(),
                error: None,
            });
        }
    }
    step_results.sort_by_key(|result| {
        plan.nodes.get(&result.step_id).map_or(u32::MAX, |node| node.rank)
    });

    let any_failed = step_results.iter().any(|result| result.status == StepStatus::Failed);
    let status = if context.is_cancelled() {
        RunStatus::Aborted
    } else if any_failed {
        RunStatus::Failed
    } else {
        RunStatus::Succeeded
    };

    let tokens_used_total: u64 = step_results.iter().map(|result| result.tokens_used).sum();
    let budget_remaining = context.cost().remaining();

    let mut artifacts_index: BTreeMap<String, ArtifactDescriptor> = BTreeMap::new();
    for result in &step_results {
        for path in &result.emitted_paths {
            if let Some(descriptor) = context.artifacts().descriptor(context.run_id(), path) {
                artifacts_index.insert(path.clone(), descriptor);
            }
        }
    }

    let _ = audit.append(&AuditEvent {
        ts: now_rfc3339(),
        run_id: context.run_id().clone(),
        kind: AuditEventKind::RunEnded { status: status.as_str().to_owned(), tokens_used_total },
    });
    let _ = audit.flush();

    RunSummary { run_id: context.run_id().clone(), status, step_results, artifacts_index, tokens_used_total, budget_remaining }
}

fn execute_step(
    step: &Step,
    workflow: &Workflow,
    context: &RunContext,
    registry: &AdapterRegistry,
    schemas: &SchemaRegistry,
    gates: &GateEngine,
    audit: &(dyn AuditSink + Sync),
) -> StepResult {
    let started_at = now_rfc3339();

    if context.is_cancelled() {
        return terminal(step, None, StepStatus::Aborted, &started_at, 0, Vec::new(), Vec::new(), None);
    }

    if let Some(skip_reason) = should_skip(step, context) {
        let _ = audit.append(&AuditEvent {
            ts: now_rfc3339(),
            run_id: context.run_id().clone(),
            kind: AuditEventKind::StepSkipped { step_id: step.id.clone(), reason: skip_reason },
        });
        return terminal(step, None, StepStatus::Skipped, &started_at, 0, Vec::new(), Vec::new(), None);
    }

    let decision =
        route(step, registry, context.cost(), workflow.policy.prefer_deterministic, &requested_capabilities(step));
    let routing_decision = match &decision {
        Ok(decision) => decision.clone(),
        Err(_) => crate::router::RoutingDecision {
            step_id: step.id.clone(),
            chosen: None,
            considered: Vec::new(),
            rejected: Vec::new(),
            fallback: false,
        },
    };
    let _ = audit.append(&AuditEvent {
        ts: now_rfc3339(),
        run_id: context.run_id().clone(),
        kind: AuditEventKind::StepRouted { decision: routing_decision },
    });

    let adapter_name = match decision {
        Ok(decision) => match decision.chosen {
            Some(name) => name,
            None => {
                let error = StepError {
                    kind: "NoAdapterAvailable".to_owned(),
                    message: format!("no adapter available for step {}", step.id),
                    retryable: false,
                };
                return terminal(step, None, StepStatus::Failed, &started_at, 0, Vec::new(), Vec::new(), Some(error));
            }
        },
        Err(RouterError::NoAdapterAvailable(_)) => {
            let error = StepError {
                kind: "NoAdapterAvailable".to_owned(),
                message: format!("no adapter available for step {}", step.id),
                retryable: false,
            };
            return terminal(step, None, StepStatus::Failed, &started_at, 0, Vec::new(), Vec::new(), Some(error));
        }
        Err(RouterError::BudgetExhaustedForStep(_)) => {
            let reason = format!("budget exhausted routing step {}", step.id);
            let _ = audit.append(&AuditEvent {
                ts: now_rfc3339(),
                run_id: context.run_id().clone(),
                kind: AuditEventKind::StepSkipped { step_id: step.id.clone(), reason: reason.clone() },
            });
            let error = StepError { kind: "BudgetExhausted".to_owned(), message: reason, retryable: false };
            return terminal(step, None, StepStatus::Skipped, &started_at, 0, Vec::new(), Vec::new(), Some(error));
        }
    };

    let Some(adapter) = registry.lookup(&adapter_name) else {
        let error = StepError {
            kind: "InternalError".to_owned(),
            message: format!("adapter {adapter_name} vanished from registry after routing"),
            retryable: false,
        };
        return terminal(step, Some(adapter_name), StepStatus::Failed, &started_at, 0, Vec::new(), Vec::new(), Some(error));
    };

    let max_attempts = workflow.policy.retry.max_attempts.min(5).max(1);
    let mut attempt = 1u32;
    loop {
        let _ = audit.append(&AuditEvent {
            ts: now_rfc3339(),
            run_id: context.run_id().clone(),
            kind: AuditEventKind::StepStarted { step_id: step.id.clone(), adapter: adapter_name.clone(), attempt },
        });

        let estimate = adapter.descriptor().estimated_cost_per_invocation;
        let reservation = context.cost().reserve(estimate);
        let outcome = adapter.execute(step, context);
        let settled = context.cost().settle(reservation, outcome.tokens_used);
        let remaining = settled.unwrap_or(context.cost().remaining());
        let _ = audit.append(&AuditEvent {
            ts: now_rfc3339(),
            run_id: context.run_id().clone(),
            kind: AuditEventKind::CostUpdate {
                step_id: Some(step.id.clone()),
                delta: i64::try_from(outcome.tokens_used).unwrap_or(i64::MAX),
                remaining,
            },
        });

        match outcome.status {
            AdapterStatus::Ok => {
                if let Some(missing) = first_missing_emit(step, &outcome, context) {
                    let error = StepError {
                        kind: "MissingEmittedArtifact".to_owned(),
                        message: format!("step {} did not emit declared artifact {missing:?}", step.id),
                        retryable: false,
                    };
                    return finish_failed(step, &adapter_name, &started_at, &outcome, Some(error));
                }
                return finish_succeeded(step, &adapter_name, &started_at, &outcome, context, gates, schemas, audit);
            }
            AdapterStatus::Failed => {
                let adapter_error = outcome.error.clone();
                let retryable = adapter_error
                    .as_ref()
                    .is_some_and(|err| err.kind == crate::registry::AdapterErrorKind::Transient);
                if retryable && attempt < u32::from(max_attempts) {
                    let backoff = workflow.policy.retry.backoff_for_attempt(attempt);
                    if backoff > 0 {
                        std::thread::sleep(Duration::from_millis(backoff));
                    }
                    attempt += 1;
                    continue;
                }
                let error = StepError {
                    kind: if retryable { "AdapterTransient" } else { "AdapterPermanent" }.to_owned(),
                    message: adapter_error.map_or_else(|| "adapter reported failure".to_owned(), |err| err.message),
                    retryable,
                };
                return finish_failed(step, &adapter_name, &started_at, &outcome, Some(error));
            }
        }
    }
}

fn finish_succeeded(
    step: &Step,
    adapter_name: &AdapterName,
    started_at: &str,
    outcome: &AdapterResult,
    context: &RunContext,
    gates: &GateEngine,
    schemas: &SchemaRegistry,
    audit: &(dyn AuditSink + Sync),
) -> StepResult {
    let (gate_report, any_block_failed) = gates.evaluate_all(&step.gates, &step.id, context, schemas);
    for result in &gate_report {
        let _ = audit.append(&AuditEvent {
            ts: now_rfc3339(),
            run_id: context.run_id().clone(),
            kind: AuditEventKind::GateEvaluated { step_id: step.id.clone(), result: result.clone() },
        });
    }

    let status = if any_block_failed { StepStatus::Failed } else { StepStatus::Succeeded };
    let error = if any_block_failed {
        let failing = gate_report.iter().find(|result| {
            !result.passed && result.severity == crate::model::GateSeverity::Block
        });
        Some(StepError {
            kind: "GateFailed".to_owned(),
            message: failing.map_or_else(
                || "a block-severity gate failed".to_owned(),
                |result| format!("gate {} failed: {}", result.kind, result.details),
            ),
            retryable: false,
        })
    } else {
        None
    };

    let result = StepResult {
        step_id: step.id.clone(),
        chosen_adapter: Some(adapter_name.clone()),
        status,
        started_at: started_at.to_owned(),
        ended_at: now_rfc3339(),
        tokens_used: outcome.tokens_used,
        emitted_paths: outcome.emitted_artifacts.clone(),
        gate_report,
        error,
    };
    let _ = audit.append(&AuditEvent {
        ts: now_rfc3339(),
        run_id: context.run_id().clone(),
        kind: AuditEventKind::StepEnded { step_id: step.id.clone(), status: result.status, tokens_used: result.tokens_used },
    });
    result
}

fn finish_failed(
    step: &Step,
    adapter_name: &AdapterName,
    started_at: &str,
    outcome: &AdapterResult,
    error: Option<StepError>,
) -> StepResult {
    terminal(
        step,
        Some(adapter_name.clone()),
        StepStatus::Failed,
        started_at,
        outcome.tokens_used,
        outcome.emitted_artifacts.clone(),
        Vec::new(),
        error,
    )
}

fn terminal(
    step: &Step,
    chosen_adapter: Option<AdapterName>,
    status: StepStatus,
    started_at: &str,
    tokens_used: u64,
    emitted_paths: Vec<String>,
    gate_report: Vec<crate::model::GateResult>,
    error: Option<StepError>,
) -> StepResult {
    StepResult {
        step_id: step.id.clone(),
        chosen_adapter,
        status,
        started_at: started_at.to_owned(),
        ended_at: now_rfc3339(),
        tokens_used,
        emitted_paths,
        gate_report,
        error,
    }
}

fn first_missing_emit(step: &Step, outcome: &AdapterResult, context: &RunContext) -> Option<String> {
    step.emits
        .iter()
        .find(|path| {
            !outcome.emitted_artifacts.iter().any(|emitted| emitted == *path)
                || !context.artifacts().exists(context.run_id(), path)
        })
        .cloned()
}

/// Reads the capability names a step requests from its `with` payload's
/// `capabilities` array, for the Router's capability filter.
fn requested_capabilities(step: &Step) -> Vec<String> {
    step.with
        .get("capabilities")
        .and_then(serde_json::Value::as_array)
        .map(|values| values.iter().filter_map(|value| value.as_str().map(str::to_owned)).collect())
        .unwrap_or_default()
}

fn should_skip(step: &Step, context: &RunContext) -> Option<String> {
    let when = step.when.as_ref()?;
    let satisfied = match when {
        WhenPredicate::ArtifactExists { path } => {
            context.artifacts().exists(context.run_id(), path)
        }
        WhenPredicate::ArtifactProperty { path, pointer, comparator, expected } => {
            let Ok(bytes) = context.artifacts().read(context.run_id(), path) else {
                return Some(format!("cannot read {path} for `when` predicate"));
            };
            let Ok(document) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
                return Some(format!("{path} is not valid JSON for `when` predicate"));
            };
            let observed = document.pointer(pointer);
            evaluate_comparator(*comparator, observed, Some(expected)).is_true()
        }
    };
    if satisfied { None } else { Some(format!("`when` predicate for step {} was not satisfied", step.id)) }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use std::collections::BTreeMap;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::run;
    use crate::artifact::ArtifactStore;
    use crate::audit::AuditEvent;
    use crate::audit::AuditSink;
    use crate::context::RunContext;
    use crate::error::ArtifactStoreError;
    use crate::error::AuditError;
    use crate::identifiers::AdapterName;
    use crate::identifiers::RunId;
    use crate::identifiers::StepId;
    use crate::loader::plan;
    use crate::model::AdapterDescriptor;
    use crate::model::AdapterKind;
    use crate::model::ArtifactDescriptor;
    use crate::model::Policy;
    use crate::model::Step;
    use crate::model::Workflow;
    use crate::registry::Adapter;
    use crate::registry::AdapterAccessPolicy;
    use crate::registry::AdapterRegistry;
    use crate::registry::AdapterResult;
    use crate::registry::AdapterStatus;
    use crate::schema::SchemaRegistry;
    use crate::summary::RunStatus;
    use crate::verifier::GateEngine;

    struct InMemoryStore {
        files: Mutex<BTreeMap<String, (Vec<u8>, StepId)>>,
    }

    impl InMemoryStore {
        fn new() -> Self {
            Self { files: Mutex::new(BTreeMap::new()) }
        }
    }

    impl ArtifactStore for InMemoryStore {
        fn write(
            &self,
            _run_id: &RunId,
            path: &str,
            produced_by: &StepId,
            bytes: &[u8],
        ) -> Result<ArtifactDescriptor, ArtifactStoreError> {
            self.files
                .lock()
                .expect("lock")
                .insert(path.to_owned(), (bytes.to_vec(), produced_by.clone()));
            Ok(ArtifactDescriptor {
                path: path.to_owned(),
                digest: "deadbeef".to_owned(),
                size_bytes: bytes.len() as u64,
                produced_by: produced_by.clone(),
                mime_hint: None,
            })
        }

        fn read(&self, _run_id: &RunId, path: &str) -> Result<Vec<u8>, ArtifactStoreError> {
            self.files
                .lock()
                .expect("lock")
                .get(path)
                .map(|(bytes, _)| bytes.clone())
                .ok_or_else(|| ArtifactStoreError::NotCatalogued(path.to_owned()))
        }

        fn exists(&self, _run_id: &RunId, path: &str) -> bool {
            self.files.lock().expect("lock").contains_key(path)
        }

        fn descriptor(&self, _run_id: &RunId, path: &str) -> Option<ArtifactDescriptor> {
            self.files.lock().expect("lock").get(path).map(|(bytes, producer)| ArtifactDescriptor {
                path: path.to_owned(),
                digest: "deadbeef".to_owned(),
                size_bytes: bytes.len() as u64,
                produced_by: producer.clone(),
                mime_hint: None,
            })
        }
    }

    struct NullAudit;

    impl AuditSink for NullAudit {
        fn append(&self, _event: &AuditEvent) -> Result<(), AuditError> {
            Ok(())
        }

        fn flush(&self) -> Result<(), AuditError> {
            Ok(())
        }
    }

    struct EchoAdapter {
        descriptor: AdapterDescriptor,
        store: Arc<InMemoryStore>,
    }

    impl Adapter for EchoAdapter {
        fn descriptor(&self) -> &AdapterDescriptor {
            &self.descriptor
        }

        fn execute(&self, step: &Step, context: &RunContext) -> AdapterResult {
            let mut emitted = Vec::new();
            for path in &step.emits {
                let _ = self.store.write(context.run_id(), path, &step.id, b"{}");
                emitted.push(path.clone());
            }
            AdapterResult {
                status: AdapterStatus::Ok,
                tokens_used: 10,
                emitted_artifacts: emitted,
                diagnostics: serde_json::Value::Null,
                error: None,
            }
        }
    }

    fn step(id: &str, depends_on: Option<Vec<&str>>, emits: Vec<&str>) -> Step {
        Step {
            id: StepId::parse(id).expect("valid"),
            name: id.to_owned(),
            actor: "noop".to_owned(),
            with: serde_json::Value::Null,
            emits: emits.into_iter().map(str::to_owned).collect(),
            gates: Vec::new(),
            when: None,
            depends_on: depends_on
                .map(|deps| deps.into_iter().map(|d| StepId::parse(d).expect("valid")).collect()),
        }
    }

    #[test]
    fn sequential_workflow_succeeds_end_to_end() {
        let store = Arc::new(InMemoryStore::new());
        let workflow = Workflow {
            name: "demo".to_owned(),
            inputs: BTreeMap::new(),
            policy: Policy::default(),
            steps: vec![
                step("1.000", None, vec!["a.json"]),
                step("1.001", None, vec!["b.json"]),
            ],
        };
        let run_plan = plan(&workflow).expect("plans");

        let mut registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
        registry
            .register(EchoAdapter {
                descriptor: AdapterDescriptor {
                    name: AdapterName::new("echo"),
                    kind: AdapterKind::Deterministic,
                    actor_kinds_supported: vec!["noop".to_owned()],
                    capabilities: Vec::new(),
                    estimated_cost_per_invocation: 1,
                    available: true,
                    side_effects: BTreeSet::new(),
                },
                store: Arc::clone(&store),
            })
            .expect("registers");

        let context = RunContext::new(
            RunId::generate(),
            "2026-07-27T00:00:00Z",
            BTreeMap::new(),
            1000,
            store as Arc<dyn ArtifactStore + Send + Sync>,
        );

        let summary = run(
            &workflow,
            &run_plan,
            &context,
            &registry,
            &SchemaRegistry::new(),
            &GateEngine::new(),
            &NullAudit,
            1,
        );

        assert_eq!(summary.status, RunStatus::Succeeded);
        assert_eq!(summary.step_results.len(), 2);
        assert_eq!(summary.tokens_used_total, 20);
    }
}
