// crates/gatework-core/src/router.rs
// ============================================================================
// Module: Router
// Description: Per-step policy engine selecting one adapter from the
//              registry.
// Purpose: Turn a step's actor/capability requirements, the run's budget,
//          and policy preferences into a single routing decision.
// Dependencies: crate::registry, crate::cost
// ============================================================================

//! ## Overview
//! Routing is the seven-step algorithm from the component design: resolve
//! the step's actor kind, query the registry for candidates, filter by
//! remaining budget, apply the `prefer_deterministic` restriction, filter
//! by declared capabilities (falling back to an unrestricted query and
//! annotating the result if that fallback was needed), and choose the
//! first survivor by the registry's ranking order.

use serde::Deserialize;
use serde::Serialize;

use crate::cost::CostTracker;
use crate::error::RouterError;
use crate::identifiers::AdapterName;
use crate::identifiers::StepId;
use crate::model::AdapterDescriptor;
use crate::model::Step;
use crate::registry::AdapterRegistry;

/// A capability requirement attached to a step's routing, beyond its bare
/// actor kind (e.g. `"supports_autofix"`).
pub type Capability = String;

/// The outcome of routing one step, recorded verbatim in the audit log's
/// `step.routed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The step being routed.
    pub step_id: StepId,
    /// The adapter chosen, if any.
    pub chosen: Option<AdapterName>,
    /// Every adapter name that satisfied actor kind and budget, in ranked
    /// order, before the capability filter was applied.
    pub considered: Vec<AdapterName>,
    /// Adapter names that were considered but rejected, with a reason
    /// each.
    pub rejected: Vec<(AdapterName, String)>,
    /// Whether the capability filter had to fall back to an unrestricted
    /// query because no adapter satisfied every requested capability.
    pub fallback: bool,
}

/// Routes `step` to a single adapter, or explains why none is available.
///
/// # Errors
/// Returns [`RouterError::BudgetExhaustedForStep`] if every adapter that
/// could satisfy the step costs more than `cost.remaining()`, or
/// [`RouterError::NoAdapterAvailable`] if no adapter satisfies the step's
/// actor kind regardless of budget.
pub fn route(
    step: &Step,
    registry: &AdapterRegistry,
    cost: &CostTracker,
    prefer_deterministic: bool,
    capabilities: &[Capability],
) -> Result<RoutingDecision, RouterError> {
    let candidates = registry.query(&step.actor, &[], prefer_deterministic);
    if candidates.is_empty() {
        return Err(RouterError::NoAdapterAvailable(step.id.clone()));
    }

    let remaining = cost.remaining();
    let mut rejected = Vec::new();
    let affordable: Vec<&AdapterDescriptor> = candidates
        .iter()
        .copied()
        .filter(|descriptor| {
            let affordable = descriptor.estimated_cost_per_invocation == 0
                || i64::try_from(descriptor.estimated_cost_per_invocation)
                    .is_ok_and(|estimate| estimate <= remaining);
            if !affordable {
                rejected.push((descriptor.name.clone(), "exceeds remaining budget".to_owned()));
            }
            affordable
        })
        .collect();

    if affordable.is_empty() {
        return Err(RouterError::BudgetExhaustedForStep(step.id.clone()));
    }

    let considered: Vec<AdapterName> = affordable.iter().map(|d| d.name.clone()).collect();

    let (chosen_pool, fallback) = if capabilities.is_empty() {
        (affordable.clone(), false)
    } else {
        let with_capabilities: Vec<&AdapterDescriptor> = affordable
            .iter()
            .copied()
            .filter(|descriptor| {
                capabilities.iter().all(|cap| descriptor.capabilities.iter().any(|c| c == cap))
            })
            .collect();
        if with_capabilities.is_empty() {
            for descriptor in &affordable {
                rejected.push((
                    descriptor.name.clone(),
                    "missing requested capabilities; used fallback pool".to_owned(),
                ));
            }
            (affordable, true)
        } else {
            (with_capabilities, false)
        }
    };

    let chosen = chosen_pool.first().map(|descriptor| descriptor.name.clone());

    Ok(RoutingDecision { step_id: step.id.clone(), chosen, considered, rejected, fallback })
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use std::collections::BTreeSet;

    use super::route;
    use crate::cost::CostTracker;
    use crate::identifiers::AdapterName;
    use crate::identifiers::StepId;
    use crate::model::AdapterDescriptor;
    use crate::model::AdapterKind;
    use crate::model::Step;
    use crate::registry::Adapter;
    use crate::registry::AdapterAccessPolicy;
    use crate::registry::AdapterRegistry;
    use crate::registry::AdapterResult;
    use crate::registry::AdapterStatus;
    use crate::context::RunContext;

    struct Noop(AdapterDescriptor);

    impl Adapter for Noop {
        fn descriptor(&self) -> &AdapterDescriptor {
            &self.0
        }

        fn execute(&self, _step: &Step, _context: &RunContext) -> AdapterResult {
            AdapterResult {
                status: AdapterStatus::Ok,
                tokens_used: 0,
                emitted_artifacts: Vec::new(),
                diagnostics: serde_json::Value::Null,
                error: None,
            }
        }
    }

    fn step() -> Step {
        Step {
            id: StepId::parse("1.000").expect("valid"),
            name: "lint".to_owned(),
            actor: "lint".to_owned(),
            with: serde_json::Value::Null,
            emits: Vec::new(),
            gates: Vec::new(),
            when: None,
            depends_on: None,
        }
    }

    #[test]
    fn routes_to_cheapest_affordable_adapter() {
        let mut registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
        registry
            .register(Noop(AdapterDescriptor {
                name: AdapterName::new("expensive"),
                kind: AdapterKind::Deterministic,
                actor_kinds_supported: vec!["lint".to_owned()],
                capabilities: Vec::new(),
                estimated_cost_per_invocation: 900,
                available: true,
                side_effects: BTreeSet::new(),
            }))
            .expect("registers");
        registry
            .register(Noop(AdapterDescriptor {
                name: AdapterName::new("cheap"),
                kind: AdapterKind::Deterministic,
                actor_kinds_supported: vec!["lint".to_owned()],
                capabilities: Vec::new(),
                estimated_cost_per_invocation: 100,
                available: true,
                side_effects: BTreeSet::new(),
            }))
            .expect("registers");

        let cost = CostTracker::new(1000);
        let decision = route(&step(), &registry, &cost, false, &[]).expect("routes");
        assert_eq!(decision.chosen, Some(AdapterName::new("cheap")));
    }

    #[test]
    fn budget_exhausted_rejects_all_candidates() {
        let mut registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
        registry
            .register(Noop(AdapterDescriptor {
                name: AdapterName::new("ai"),
                kind: AdapterKind::Ai,
                actor_kinds_supported: vec!["lint".to_owned()],
                capabilities: Vec::new(),
                estimated_cost_per_invocation: 600,
                available: true,
                side_effects: BTreeSet::new(),
            }))
            .expect("registers");

        let cost = CostTracker::new(100);
        let result = route(&step(), &registry, &cost, false, &[]);
        assert!(result.is_err());
    }

    #[test]
    fn no_adapter_for_unknown_actor() {
        let registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
        let cost = CostTracker::new(1000);
        assert!(route(&step(), &registry, &cost, false, &[]).is_err());
    }
}
