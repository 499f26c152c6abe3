// crates/gatework-core/src/registry.rs
// ============================================================================
// Module: Adapter Contract & Registry
// Description: The adapter execution contract and the registry that holds
//              adapter descriptors and implementations.
// Purpose: Let the Router query available adapters by actor kind and
//          capability without knowing their concrete implementations.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! An [`Adapter`] is a black box behind [`Adapter::execute`]: the core
//! never inspects how a deterministic tool or an AI call actually works,
//! only its declared [`AdapterDescriptor`] and its [`AdapterResult`]. The
//! [`AdapterRegistry`] holds adapter implementations keyed by name,
//! enforces unique registration, and answers capability queries the
//! Router ranks.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::context::RunContext;
use crate::error::RegistryError;
use crate::identifiers::AdapterName;
use crate::model::AdapterDescriptor;
use crate::model::AdapterKind;
use crate::model::Step;

// ============================================================================
// SECTION: Adapter Contract
// ============================================================================

/// The outcome reported by an adapter after [`Adapter::execute`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterStatus {
    /// The adapter completed its work successfully.
    Ok,
    /// The adapter's work failed; see [`AdapterResult::error`].
    Failed,
}

/// Whether an adapter failure should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterErrorKind {
    /// The failure is expected to be transient; retry per policy.
    Transient,
    /// The failure will not resolve on retry.
    Permanent,
}

/// An adapter-reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterResultError {
    /// Whether this failure is retryable.
    pub kind: AdapterErrorKind,
    /// Human-readable message.
    pub message: String,
}

/// The result of invoking an adapter for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterResult {
    /// Overall outcome.
    pub status: AdapterStatus,
    /// Tokens/credits actually spent.
    pub tokens_used: u64,
    /// Run-relative paths the adapter wrote.
    pub emitted_artifacts: Vec<String>,
    /// Free-form diagnostic payload (e.g. lint findings), opaque to the
    /// core.
    #[serde(default)]
    pub diagnostics: serde_json::Value,
    /// Present when `status` is [`AdapterStatus::Failed`].
    #[serde(default)]
    pub error: Option<AdapterResultError>,
}

/// A black-box unit of work the Router can dispatch a step to.
///
/// Implementations must be deterministic in their declared
/// [`AdapterDescriptor::kind`] and must never mutate the
/// [`RunContext`] directly; all observable effects go through the
/// artifact store and the result they return.
pub trait Adapter {
    /// This adapter's static descriptor.
    fn descriptor(&self) -> &AdapterDescriptor;

    /// Executes `step`, writing any emitted artifacts through
    /// `context`'s artifact store.
    fn execute(&self, step: &Step, context: &RunContext) -> AdapterResult;
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Access policy controlling which adapters may be routed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterAccessPolicy {
    /// When set, only adapters named here may be routed to.
    pub allowlist: Option<BTreeSet<AdapterName>>,
    /// Adapters named here are never routed to, even if allowlisted.
    pub denylist: BTreeSet<AdapterName>,
}

impl AdapterAccessPolicy {
    /// A policy permitting every registered adapter.
    #[must_use]
    pub fn allow_all() -> Self {
        Self { allowlist: None, denylist: BTreeSet::new() }
    }

    /// Whether `name` is permitted by this policy.
    #[must_use]
    pub fn is_allowed(&self, name: &AdapterName) -> bool {
        if self.denylist.contains(name) {
            return false;
        }
        self.allowlist.as_ref().is_none_or(|allowlist| allowlist.contains(name))
    }
}

/// Holds adapter implementations keyed by name and answers the Router's
/// capability queries.
pub struct AdapterRegistry {
    adapters: BTreeMap<AdapterName, Box<dyn Adapter + Send + Sync>>,
    policy: AdapterAccessPolicy,
}

impl AdapterRegistry {
    /// Creates an empty registry with the given access policy.
    #[must_use]
    pub fn new(policy: AdapterAccessPolicy) -> Self {
        Self { adapters: BTreeMap::new(), policy }
    }

    /// Registers `adapter` under its own descriptor's name.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateAdapter`] if an adapter with the
    /// same name is already registered.
    pub fn register(
        &mut self,
        adapter: impl Adapter + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        let name = adapter.descriptor().name.clone();
        if self.adapters.contains_key(&name) {
            return Err(RegistryError::DuplicateAdapter(name));
        }
        self.adapters.insert(name, Box::new(adapter));
        Ok(())
    }

    /// Looks up a registered adapter by name.
    #[must_use]
    pub fn lookup(&self, name: &AdapterName) -> Option<&(dyn Adapter + Send + Sync)> {
        self.adapters.get(name).map(std::convert::AsRef::as_ref)
    }

    /// The configured access policy.
    #[must_use]
    pub const fn policy(&self) -> &AdapterAccessPolicy {
        &self.policy
    }

    /// Returns every allowed adapter whose descriptor supports
    /// `actor_kind` and advertises every tag in `capabilities`, ranked per
    /// §4.3: availability first, then (if `prefer_deterministic`)
    /// deterministic adapters first, then ascending estimated cost, then
    /// name.
    #[must_use]
    pub fn query(
        &self,
        actor_kind: &str,
        capabilities: &[String],
        prefer_deterministic: bool,
    ) -> Vec<&AdapterDescriptor> {
        let mut matches: Vec<&AdapterDescriptor> = self
            .adapters
            .values()
            .map(|adapter| adapter.descriptor())
            .filter(|descriptor| self.policy.is_allowed(&descriptor.name))
            .filter(|descriptor| {
                descriptor.actor_kinds_supported.iter().any(|kind| kind == actor_kind)
            })
            .filter(|descriptor| {
                capabilities.iter().all(|cap| descriptor.capabilities.iter().any(|c| c == cap))
            })
            .collect();

        matches.sort_by(|a, b| ranking_key(a, prefer_deterministic).cmp(&ranking_key(b, prefer_deterministic)));
        matches
    }
}

fn ranking_key(descriptor: &AdapterDescriptor, prefer_deterministic: bool) -> (bool, bool, u64, &str) {
    let deterministic_first = prefer_deterministic && descriptor.kind != AdapterKind::Deterministic;
    (!descriptor.available, deterministic_first, descriptor.estimated_cost_per_invocation, descriptor.name.as_str())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use std::collections::BTreeSet;

    use super::AdapterAccessPolicy;
    use super::AdapterDescriptor;
    use crate::identifiers::AdapterName;
    use crate::model::AdapterKind;

    fn descriptor(name: &str, kind: AdapterKind, cost: u64, available: bool) -> AdapterDescriptor {
        AdapterDescriptor {
            name: AdapterName::new(name),
            kind,
            actor_kinds_supported: vec!["lint".to_owned()],
            capabilities: Vec::new(),
            estimated_cost_per_invocation: cost,
            available,
            side_effects: BTreeSet::new(),
        }
    }

    #[test]
    fn policy_denylist_overrides_allowlist() {
        let mut policy = AdapterAccessPolicy::allow_all();
        policy.allowlist = Some([AdapterName::new("eslint")].into_iter().collect());
        policy.denylist.insert(AdapterName::new("eslint"));
        assert!(!policy.is_allowed(&AdapterName::new("eslint")));
    }

    #[test]
    fn unavailable_adapters_rank_last() {
        let available = descriptor("a", AdapterKind::Deterministic, 10, true);
        let unavailable = descriptor("b", AdapterKind::Deterministic, 1, false);
        let mut list = vec![&unavailable, &available];
        list.sort_by_key(|d| (!d.available, d.estimated_cost_per_invocation));
        assert_eq!(list[0].name.as_str(), "a");
    }
}
