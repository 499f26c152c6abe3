// crates/gatework-adapters/src/flaky.rs
// ============================================================================
// Module: Flaky Adapter
// Description: A deterministic adapter that fails its first N invocations
//              before succeeding, for exercising retry policy.
// Purpose: Give demos and system tests a way to trigger the Executor's
//          retry loop without a real transient external dependency.
// Dependencies: gatework-core, serde_json
// ============================================================================

//! ## Overview
//! [`FlakyAdapter`] wraps the same fixture directive [`FixtureAdapter`]
//! understands, but fails the configured number of times first, reporting
//! [`AdapterErrorKind::Transient`] so the Executor retries per the
//! workflow's retry policy. The failure count is shared across every
//! invocation of one adapter instance (not per step), since the Executor
//! calls the same registered adapter object on each retry attempt.

use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use gatework_core::context::RunContext;
use gatework_core::model::AdapterDescriptor;
use gatework_core::model::Step;
use gatework_core::registry::Adapter;
use gatework_core::registry::AdapterErrorKind;
use gatework_core::registry::AdapterResult;
use gatework_core::registry::AdapterResultError;
use gatework_core::registry::AdapterStatus;

use crate::fixture::FixtureAdapter;

/// A deterministic adapter that fails transiently `fail_first_n` times,
/// then delegates to a [`FixtureAdapter`] running the same step payload.
pub struct FlakyAdapter {
    descriptor: AdapterDescriptor,
    fixture: FixtureAdapter,
    remaining_failures: AtomicU32,
    failure_message: String,
}

impl FlakyAdapter {
    /// Creates an adapter that fails the first `fail_first_n` invocations
    /// with a transient error carrying `failure_message`, then behaves
    /// exactly like a [`FixtureAdapter`].
    #[must_use]
    pub fn new(descriptor: AdapterDescriptor, fail_first_n: u32, failure_message: impl Into<String>) -> Self {
        let fixture = FixtureAdapter::new(descriptor.clone());
        Self {
            descriptor,
            fixture,
            remaining_failures: AtomicU32::new(fail_first_n),
            failure_message: failure_message.into(),
        }
    }
}

impl Adapter for FlakyAdapter {
    fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    fn execute(&self, step: &Step, context: &RunContext) -> AdapterResult {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0
            && self
                .remaining_failures
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return AdapterResult {
                status: AdapterStatus::Failed,
                tokens_used: 0,
                emitted_artifacts: Vec::new(),
                diagnostics: serde_json::Value::Null,
                error: Some(AdapterResultError {
                    kind: AdapterErrorKind::Transient,
                    message: self.failure_message.clone(),
                }),
            };
        }
        self.fixture.execute(step, context)
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

    use super::FlakyAdapter;
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

    struct EmptyStore;

    impl ArtifactStore for EmptyStore {
        fn write(
            &self,
            _run_id: &RunId,
            path: &str,
            produced_by: &StepId,
            bytes: &[u8],
        ) -> Result<ArtifactDescriptor, ArtifactStoreError> {
            Ok(ArtifactDescriptor {
                path: path.to_owned(),
                digest: "deadbeef".to_owned(),
                size_bytes: bytes.len() as u64,
                produced_by: produced_by.clone(),
                mime_hint: None,
            })
        }

        fn read(&self, _run_id: &RunId, path: &str) -> Result<Vec<u8>, ArtifactStoreError> {
            Err(ArtifactStoreError::NotCatalogued(path.to_owned()))
        }

        fn exists(&self, _run_id: &RunId, _path: &str) -> bool {
            false
        }

        fn descriptor(&self, _run_id: &RunId, _path: &str) -> Option<ArtifactDescriptor> {
            None
        }
    }

    fn context() -> RunContext {
        RunContext::new(
            RunId::generate(),
            "2026-07-27T00:00:00Z",
            BTreeMap::new(),
            1000,
            Arc::new(EmptyStore) as Arc<dyn ArtifactStore + Send + Sync>,
        )
    }

    fn descriptor() -> AdapterDescriptor {
        AdapterDescriptor {
            name: AdapterName::new("flaky"),
            kind: AdapterKind::Deterministic,
            actor_kinds_supported: vec!["fixer".to_owned()],
            capabilities: Vec::new(),
            estimated_cost_per_invocation: 0,
            available: true,
            side_effects: BTreeSet::new(),
        }
    }

    #[test]
    fn fails_transiently_then_succeeds() {
        let adapter = FlakyAdapter::new(descriptor(), 1, "not ready yet");
        let step = Step {
            id: StepId::parse("1.000").expect("valid"),
            name: "fixer".to_owned(),
            actor: "fixer".to_owned(),
            with: json!({"emit": {}, "tokens_used": 3}),
            emits: Vec::new(),
            gates: Vec::new(),
            when: None,
            depends_on: None,
        };
        let context = context();

        let first = adapter.execute(&step, &context);
        assert_eq!(first.status, AdapterStatus::Failed);

        let second = adapter.execute(&step, &context);
        assert_eq!(second.status, AdapterStatus::Ok);
        assert_eq!(second.tokens_used, 3);
    }
}
