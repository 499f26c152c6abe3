// crates/gatework-core/src/context.rs
// ============================================================================
// Module: Run Context
// Description: The run-scoped state shared between the Executor, the
//              Router, and every Adapter invocation.
// Purpose: Give adapters read access to inputs and the artifact store, and
//          give the Executor a single shared handle to the run's budget and
//          cancellation flag, without adapters needing their own copies.
// Dependencies: crate::artifact, crate::cost, crate::identifiers
// ============================================================================

//! ## Overview
//! A [`RunContext`] is created once per run and shared behind an `Arc` with
//! every worker thread. Adapters read from it (inputs, the artifact store)
//! but never mutate it directly; the Executor is the only caller that
//! settles cost or flips the cancellation flag.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde_json::Value;

use crate::artifact::ArtifactStore;
use crate::cost::CostTracker;
use crate::identifiers::RunId;

/// Run-scoped state visible to the Router and every [`crate::registry::Adapter`]
/// invocation.
pub struct RunContext {
    run_id: RunId,
    started_at: String,
    inputs: BTreeMap<String, Value>,
    cost: CostTracker,
    artifacts: Arc<dyn ArtifactStore + Send + Sync>,
    cancelled: AtomicBool,
}

impl RunContext {
    /// Creates a new run context. `started_at` is an RFC3339 timestamp
    /// captured once, by the caller, at run start.
    #[must_use]
    pub fn new(
        run_id: RunId,
        started_at: impl Into<String>,
        inputs: BTreeMap<String, Value>,
        max_tokens: u64,
        artifacts: Arc<dyn ArtifactStore + Send + Sync>,
    ) -> Self {
        Self {
            run_id,
            started_at: started_at.into(),
            inputs,
            cost: CostTracker::new(max_tokens),
            artifacts,
            cancelled: AtomicBool::new(false),
        }
    }

    /// This run's identifier.
    #[must_use]
    pub const fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// When this run started, as an RFC3339 timestamp.
    #[must_use]
    pub fn started_at(&self) -> &str {
        &self.started_at
    }

    /// The named top-level input the workflow was invoked with.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    /// Every top-level input the workflow was invoked with.
    #[must_use]
    pub const fn inputs(&self) -> &BTreeMap<String, Value> {
        &self.inputs
    }

    /// This run's budget tracker.
    #[must_use]
    pub const fn cost(&self) -> &CostTracker {
        &self.cost
    }

    /// This run's artifact store.
    #[must_use]
    pub fn artifacts(&self) -> &(dyn ArtifactStore + Send + Sync) {
        self.artifacts.as_ref()
    }

    /// Requests cancellation. Observed by the Executor between steps; does
    /// not interrupt a step already in flight.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
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
    use std::sync::Arc;

    use super::RunContext;
    use crate::artifact::ArtifactStore;
    use crate::error::ArtifactStoreError;
    use crate::identifiers::RunId;
    use crate::identifiers::StepId;
    use crate::model::ArtifactDescriptor;

    struct EmptyStore;

    impl ArtifactStore for EmptyStore {
        fn write(
            &self,
            _run_id: &RunId,
            _path: &str,
            _produced_by: &StepId,
            _bytes: &[u8],
        ) -> Result<ArtifactDescriptor, ArtifactStoreError> {
            Err(ArtifactStoreError::InvalidPath("test store is read-only".to_owned()))
        }

        fn read(&self, _run_id: &RunId, _path: &str) -> Result<Vec<u8>, ArtifactStoreError> {
            Err(ArtifactStoreError::NotCatalogued("test store is empty".to_owned()))
        }

        fn exists(&self, _run_id: &RunId, _path: &str) -> bool {
            false
        }

        fn descriptor(&self, _run_id: &RunId, _path: &str) -> Option<ArtifactDescriptor> {
            None
        }
    }

    #[test]
    fn cancellation_flag_round_trips() {
        let context = RunContext::new(
            RunId::generate(),
            "2026-07-27T00:00:00Z",
            BTreeMap::new(),
            1000,
            Arc::new(EmptyStore),
        );
        assert!(!context.is_cancelled());
        context.cancel();
        assert!(context.is_cancelled());
    }

    #[test]
    fn inputs_are_readable_by_name() {
        let mut inputs = BTreeMap::new();
        inputs.insert("pr_number".to_owned(), serde_json::json!(42));
        let context = RunContext::new(
            RunId::generate(),
            "2026-07-27T00:00:00Z",
            inputs,
            1000,
            Arc::new(EmptyStore),
        );
        assert_eq!(context.input("pr_number"), Some(&serde_json::json!(42)));
        assert_eq!(context.input("missing"), None);
    }
}
