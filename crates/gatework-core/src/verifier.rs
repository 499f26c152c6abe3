// crates/gatework-core/src/verifier.rs
// ============================================================================
// Module: Verifier / Gate Engine
// Description: Evaluates a step's declared gates against its emitted
//              artifacts and the run's schema registry.
// Purpose: Turn a step's raw adapter result into a pass/fail verdict per
//          gate, fail-closed on missing or malformed evidence.
// Dependencies: crate::context, crate::model, crate::schema
// ============================================================================

//! ## Overview
//! Every [`Gate`] variant is evaluated independently and every result is
//! recorded, regardless of severity; only [`GateSeverity::Block`] failures
//! fail the step. [`Gate::TestsPass`] reads the conventional
//! `test_report.json` artifact; [`Gate::DiffLimits`] reads the conventional
//! `diff.patch` artifact. Both are fail-closed: a missing or unparsable
//! artifact is a gate failure, never a pass.

use std::collections::BTreeMap;

use crate::context::RunContext;
use crate::error::GateError;
use crate::identifiers::StepId;
use crate::model::Gate;
use crate::model::GateResult;
use crate::model::GateSeverity;
use crate::schema::SchemaRegistry;

const TEST_REPORT_PATH: &str = "test_report.json";
const DIFF_PATH: &str = "diff.patch";

/// A registered plugin evaluating a [`Gate::Custom`] gate.
pub trait CustomGatePlugin {
    /// Evaluates this plugin's gate for `step_id` against `params`.
    ///
    /// # Errors
    /// Returns [`GateError`] if evaluation cannot proceed (missing
    /// required evidence, malformed params).
    fn evaluate(
        &self,
        step_id: &StepId,
        params: &serde_json::Value,
        context: &RunContext,
    ) -> Result<bool, GateError>;
}

/// Evaluates a step's gates, dispatching [`Gate::Custom`] to registered
/// plugins.
pub struct GateEngine {
    custom: BTreeMap<String, Box<dyn CustomGatePlugin + Send + Sync>>,
}

impl GateEngine {
    /// Creates an engine with no custom plugins registered.
    #[must_use]
    pub fn new() -> Self {
        Self { custom: BTreeMap::new() }
    }

    /// Registers a custom gate plugin under `name`.
    pub fn register_custom(
        &mut self,
        name: impl Into<String>,
        plugin: impl CustomGatePlugin + Send + Sync + 'static,
    ) {
        self.custom.insert(name.into(), Box::new(plugin));
    }

    /// Evaluates every gate for `step_id`, returning each gate's result in
    /// order and whether any block-severity gate failed.
    #[must_use]
    pub fn evaluate_all(
        &self,
        gates: &[Gate],
        step_id: &StepId,
        context: &RunContext,
        schemas: &SchemaRegistry,
    ) -> (Vec<GateResult>, bool) {
        let mut results = Vec::with_capacity(gates.len());
        let mut any_block_failed = false;
        for gate in gates {
            let result = self.evaluate_gate(gate, step_id, context, schemas);
            if !result.passed && result.severity == GateSeverity::Block {
                any_block_failed = true;
            }
            results.push(result);
        }
        (results, any_block_failed)
    }

    fn evaluate_gate(
        &self,
        gate: &Gate,
        step_id: &StepId,
        context: &RunContext,
        schemas: &SchemaRegistry,
    ) -> GateResult {
        let kind = gate.kind().to_owned();
        let severity = gate.severity();
        let (passed, details) = match gate {
            Gate::TestsPass { .. } => evaluate_tests_pass(context),
            Gate::DiffLimits { max_lines, .. } => evaluate_diff_limits(context, *max_lines),
            Gate::SchemaValid { path, schema_id, .. } => {
                evaluate_schema_valid(context, schemas, path, schema_id)
            }
            Gate::ArtifactExists { path, .. } => evaluate_artifact_exists(context, path),
            Gate::Custom { name, params, .. } => {
                self.evaluate_custom(step_id, name, params, context)
            }
        };
        GateResult { kind, passed, severity, details }
    }

    fn evaluate_custom(
        &self,
        step_id: &StepId,
        name: &str,
        params: &serde_json::Value,
        context: &RunContext,
    ) -> (bool, String) {
        match self.custom.get(name) {
            None => (false, format!("no custom gate plugin registered under {name:?}")),
            Some(plugin) => match plugin.evaluate(step_id, params, context) {
                Ok(true) => (true, "custom gate passed".to_owned()),
                Ok(false) => (false, "custom gate reported failure".to_owned()),
                Err(err) => (false, err.to_string()),
            },
        }
    }
}

impl Default for GateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn evaluate_tests_pass(context: &RunContext) -> (bool, String) {
    let bytes = match context.artifacts().read(context.run_id(), TEST_REPORT_PATH) {
        Ok(bytes) => bytes,
        Err(err) => return (false, format!("cannot read {TEST_REPORT_PATH}: {err}")),
    };
    let report: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => return (false, format!("{TEST_REPORT_PATH} is not valid JSON: {err}")),
    };
    let pass_count = report.get("pass_count").and_then(serde_json::Value::as_u64).unwrap_or(0);
    let failures = report.get("failures").and_then(serde_json::Value::as_u64).unwrap_or(u64::MAX);
    if failures == 0 && pass_count >= 1 {
        (true, format!("{pass_count} test(s) passed, 0 failures"))
    } else {
        (false, format!("{pass_count} test(s) passed, {failures} failures"))
    }
}

fn evaluate_diff_limits(context: &RunContext, max_lines: u64) -> (bool, String) {
    let bytes = match context.artifacts().read(context.run_id(), DIFF_PATH) {
        Ok(bytes) => bytes,
        Err(err) => return (false, format!("cannot read {DIFF_PATH}: {err}")),
    };
    let text = String::from_utf8_lossy(&bytes);
    let changed = text
        .lines()
        .filter(|line| {
            (line.starts_with('+') && !line.starts_with("+++"))
                || (line.starts_with('-') && !line.starts_with("---"))
        })
        .count() as u64;
    if changed <= max_lines {
        (true, format!("{changed} changed line(s), limit {max_lines}"))
    } else {
        (false, format!("{changed} changed line(s) exceeds limit {max_lines}"))
    }
}

fn evaluate_schema_valid(
    context: &RunContext,
    schemas: &SchemaRegistry,
    path: &str,
    schema_id: &crate::identifiers::SchemaId,
) -> (bool, String) {
    let bytes = match context.artifacts().read(context.run_id(), path) {
        Ok(bytes) => bytes,
        Err(err) => return (false, format!("cannot read {path}: {err}")),
    };
    let document: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => return (false, format!("{path} is not valid JSON: {err}")),
    };
    match schemas.validate(schema_id, &document) {
        Ok(()) => (true, format!("{path} validates against {schema_id}")),
        Err(err) => (false, err.to_string()),
    }
}

fn evaluate_artifact_exists(context: &RunContext, path: &str) -> (bool, String) {
    if context.artifacts().exists(context.run_id(), path) {
        (true, format!("{path} exists"))
    } else {
        (false, format!("{path} does not exist"))
    }
}
