// crates/gatework-adapters/src/fixture.rs
// ============================================================================
// Module: Fixture Adapter
// Description: A deterministic adapter that writes inline fixture content
//              declared in a step's `with` payload.
// Purpose: Exercise the Router, Executor, and Verifier in demos and
//          system tests without a real external tool behind the adapter.
// Dependencies: gatework-core, serde_json
// ============================================================================

//! ## Overview
//! [`FixtureAdapter`] reads its per-step payload from [`Step::with`] as a
//! [`FixtureDirective`]: a map of emitted path to literal UTF-8 content,
//! plus a reported token cost. It is deterministic by construction (the
//! same directive always produces the same bytes) and never touches the
//! filesystem directly; all writes go through the run's
//! [`gatework_core::artifact::ArtifactStore`].

use std::collections::BTreeMap;

use gatework_core::context::RunContext;
use gatework_core::model::AdapterDescriptor;
use gatework_core::model::Step;
use gatework_core::registry::Adapter;
use gatework_core::registry::AdapterErrorKind;
use gatework_core::registry::AdapterResult;
use gatework_core::registry::AdapterResultError;
use gatework_core::registry::AdapterStatus;
use serde::Deserialize;

/// The per-step payload a [`FixtureAdapter`] expects in [`Step::with`].
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDirective {
    /// Inline content written verbatim to each run-relative path.
    #[serde(default)]
    pub emit: BTreeMap<String, String>,
    /// Tokens to report as spent for this invocation.
    #[serde(default)]
    pub tokens_used: u64,
}

/// A deterministic adapter driven entirely by its step's `with` payload.
pub struct FixtureAdapter {
    descriptor: AdapterDescriptor,
}

impl FixtureAdapter {
    /// Wraps `descriptor` as a fixture adapter. `descriptor.kind` should
    /// normally be [`gatework_core::model::AdapterKind::Deterministic`].
    #[must_use]
    pub const fn new(descriptor: AdapterDescriptor) -> Self {
        Self { descriptor }
    }
}

impl Adapter for FixtureAdapter {
    fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    fn execute(&self, step: &Step, context: &RunContext) -> AdapterResult {
        let directive = match parse_directive(step) {
            Ok(directive) => directive,
            Err(message) => return permanent_failure(message),
        };

        let mut emitted = Vec::with_capacity(directive.emit.len());
        for (path, content) in &directive.emit {
            if let Err(err) = context.artifacts().write(context.run_id(), path, &step.id, content.as_bytes())
            {
                return permanent_failure(format!("writing {path} failed: {err}"));
            }
            emitted.push(path.clone());
        }

        AdapterResult {
            status: AdapterStatus::Ok,
            tokens_used: directive.tokens_used,
            emitted_artifacts: emitted,
            diagnostics: serde_json::Value::Null,
            error: None,
        }
    }
}

fn parse_directive(step: &Step) -> Result<FixtureDirective, String> {
    if step.with.is_null() {
        return Ok(FixtureDirective { emit: BTreeMap::new(), tokens_used: 0 });
    }
    serde_json::from_value(step.with.clone())
        .map_err(|err| format!("step {} has an invalid fixture directive: {err}", step.id))
}

fn permanent_failure(message: String) -> AdapterResult {
    AdapterResult {
        status: AdapterStatus::Failed,
        tokens_used: 0,
        emitted_artifacts: Vec::new(),
        diagnostics: serde_json::Value::Null,
        error: Some(AdapterResultError { kind: AdapterErrorKind::Permanent, message }),
    }
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

    use super::FixtureAdapter;
    use gatework_core::artifact::ArtifactStore;
    use gatework_core::context::RunContext;
    use gatework_core::error::ArtifactStoreError;
    use gatework_core::identifiers::AdapterName;
    use gatework_core::identifiers::RunId;
    use gatework_core::identifiers::StepId;
    use gatework_core::model::AdapterDescriptor;
    use gatework_core::model::AdapterKind;
    use gatework_core::model::ArtifactDescriptor;
    use gatework_core::model::Step;
    use gatework_core::registry::Adapter;
    use gatework_core::registry::AdapterStatus;
    use serde_json::json;

    struct InMemoryStore {
        files: Mutex<BTreeMap<String, Vec<u8>>>,
    }

    impl ArtifactStore for InMemoryStore {
        fn write(
            &self,
            _run_id: &RunId,
            path: &str,
            produced_by: &StepId,
            bytes: &[u8],
        ) -> Result<ArtifactDescriptor, ArtifactStoreError> {
            self.files.lock().expect("lock").insert(path.to_owned(), bytes.to_vec());
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
                .cloned()
                .ok_or_else(|| ArtifactStoreError::NotCatalogued(path.to_owned()))
        }

        fn exists(&self, _run_id: &RunId, path: &str) -> bool {
            self.files.lock().expect("lock").contains_key(path)
        }

        fn descriptor(&self, _run_id: &RunId, _path: &str) -> Option<ArtifactDescriptor> {
            None
        }
    }

    fn descriptor() -> AdapterDescriptor {
        AdapterDescriptor {
            name: AdapterName::new("fixture"),
            kind: AdapterKind::Deterministic,
            actor_kinds_supported: vec!["diag".to_owned()],
            capabilities: Vec::new(),
            estimated_cost_per_invocation: 0,
            available: true,
            side_effects: BTreeSet::new(),
        }
    }

    #[test]
    fn writes_every_declared_emit_with_inline_content() {
        let store = Arc::new(InMemoryStore { files: Mutex::new(BTreeMap::new()) });
        let context = RunContext::new(
            RunId::generate(),
            "2026-07-27T00:00:00Z",
            BTreeMap::new(),
            1000,
            store as Arc<dyn ArtifactStore + Send + Sync>,
        );
        let step = Step {
            id: StepId::parse("1.000").expect("valid"),
            name: "diag".to_owned(),
            actor: "diag".to_owned(),
            with: json!({"emit": {"diagnostics.json": "{\"ok\":true}"}, "tokens_used": 5}),
            emits: vec!["diagnostics.json".to_owned()],
            gates: Vec::new(),
            when: None,
            depends_on: None,
        };

        let adapter = FixtureAdapter::new(descriptor());
        let outcome = adapter.execute(&step, &context);

        assert_eq!(outcome.status, AdapterStatus::Ok);
        assert_eq!(outcome.tokens_used, 5);
        assert_eq!(outcome.emitted_artifacts, vec!["diagnostics.json".to_owned()]);
        assert!(context.artifacts().exists(context.run_id(), "diagnostics.json"));
    }

    #[test]
    fn invalid_directive_fails_permanently() {
        let store = Arc::new(InMemoryStore { files: Mutex::new(BTreeMap::new()) });
        let context = RunContext::new(
            RunId::generate(),
            "2026-07-27T00:00:00Z",
            BTreeMap::new(),
            1000,
            store as Arc<dyn ArtifactStore + Send + Sync>,
        );
        let step = Step {
            id: StepId::parse("1.000").expect("valid"),
            name: "diag".to_owned(),
            actor: "diag".to_owned(),
            with: json!("not an object"),
            emits: Vec::new(),
            gates: Vec::new(),
            when: None,
            depends_on: None,
        };

        let adapter = FixtureAdapter::new(descriptor());
        let outcome = adapter.execute(&step, &context);
        assert_eq!(outcome.status, AdapterStatus::Failed);
    }
}
