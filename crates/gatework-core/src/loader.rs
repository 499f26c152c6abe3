// crates/gatework-core/src/loader.rs
// ============================================================================
// Module: Workflow Loader & Planner
// Description: Parses a workflow document, normalizes dependencies, and
//              builds the run plan DAG.
// Purpose: Turn an untrusted document into a validated, topologically
//          ranked execution plan, or reject it before anything runs.
// Dependencies: serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! Loading is pure: it never touches the filesystem, the clock, or any
//! adapter. `load_workflow` parses a document (YAML or JSON; both parse
//! through `serde_yaml`, a YAML superset parser) against the `workflow`
//! schema. `plan` resolves `depends_on` (sequential by default, rooted by
//! an explicit empty list), rejects cycles and dangling references, and
//! assigns each step a topological rank with ties broken lexicographically
//! by step id.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::error::PlanError;
use crate::error::SchemaError;
use crate::identifiers::StepId;
use crate::model::Step;
use crate::model::WhenPredicate;
use crate::model::Workflow;
use crate::schema::SchemaRegistry;

/// Parses `source` as a workflow document (JSON or YAML) and validates it
/// against the `workflow` schema in `schemas`, if one is registered.
///
/// # Errors
/// Returns [`PlanError::Parse`] if the document cannot be parsed, or
/// [`PlanError::Schema`] if a `workflow` schema is registered and the
/// document fails it.
pub fn load_workflow(source: &str, schemas: &SchemaRegistry) -> Result<Workflow, PlanError> {
    let workflow: Workflow =
        serde_yaml::from_str(source).map_err(|err| PlanError::Parse(err.to_string()))?;

    let schema_id = crate::identifiers::SchemaId::new("workflow");
    if schemas.contains(&schema_id) {
        let document = serde_json::to_value(&workflow)
            .map_err(|err| PlanError::Parse(err.to_string()))?;
        schemas
            .validate(&schema_id, &document)
            .map_err(|err| PlanError::Schema(to_schema_error(err)))?;
    }

    Ok(workflow)
}

fn to_schema_error(err: SchemaError) -> SchemaError {
    err
}

// ============================================================================
// SECTION: Run Plan
// ============================================================================

/// One step's position in the run plan's dependency graph.
#[derive(Debug, Clone)]
pub struct PlanNode {
    /// The step itself.
    pub step: Step,
    /// Step ids that must terminate before this step starts.
    pub preds: Vec<StepId>,
    /// Step ids that depend on this step.
    pub succs: Vec<StepId>,
    /// Topological rank, ties broken lexicographically by step id.
    pub rank: u32,
}

/// A validated, topologically ranked execution plan for a workflow.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Step ids with no predecessors, in rank order.
    pub roots: Vec<StepId>,
    /// Every step in the plan, keyed by id.
    pub nodes: BTreeMap<StepId, PlanNode>,
}

impl RunPlan {
    /// Step ids in topological order (rank ascending, lexicographic
    /// tie-break).
    #[must_use]
    pub fn topological_order(&self) -> Vec<StepId> {
        let mut ordered: Vec<&StepId> = self.nodes.keys().collect();
        ordered.sort_by_key(|id| (self.nodes[*id].rank, (*id).clone()));
        ordered.into_iter().cloned().collect()
    }
}

/// Builds a [`RunPlan`] from a validated [`Workflow`].
///
/// # Errors
/// Returns [`PlanError::DuplicateStepId`], [`PlanError::UnknownDependency`],
/// [`PlanError::Cycle`], or [`PlanError::EmitPathCollision`] for the
/// respective malformed input.
pub fn plan(workflow: &Workflow) -> Result<RunPlan, PlanError> {
    let mut preds: BTreeMap<StepId, Vec<StepId>> = BTreeMap::new();

    for (index, step) in workflow.steps.iter().enumerate() {
        if preds.contains_key(&step.id) {
            return Err(PlanError::DuplicateStepId(step.id.clone()));
        }
        let resolved = resolve_depends_on(workflow, index, step);
        preds.insert(step.id.clone(), resolved);
    }

    for (step_id, deps) in &preds {
        for dep in deps {
            if !preds.contains_key(dep) {
                return Err(PlanError::UnknownDependency {
                    step: step_id.clone(),
                    depends_on: dep.clone(),
                });
            }
        }
    }

    check_emit_collisions(workflow)?;

    let ranks = topological_rank(&preds)?;

    check_when_scope(workflow, &preds)?;

    let mut succs: BTreeMap<StepId, Vec<StepId>> =
        preds.keys().map(|id| (id.clone(), Vec::new())).collect();
    for (step_id, deps) in &preds {
        for dep in deps {
            succs.entry(dep.clone()).or_default().push(step_id.clone());
        }
    }
    for list in succs.values_mut() {
        list.sort();
    }

    let mut nodes = BTreeMap::new();
    for step in &workflow.steps {
        let step_preds = preds.remove(&step.id).unwrap_or_default();
        let step_succs = succs.remove(&step.id).unwrap_or_default();
        let rank = ranks[&step.id];
        nodes.insert(
            step.id.clone(),
            PlanNode { step: step.clone(), preds: step_preds, succs: step_succs, rank },
        );
    }

    let mut roots: Vec<StepId> =
        nodes.iter().filter(|(_, node)| node.preds.is_empty()).map(|(id, _)| id.clone()).collect();
    roots.sort_by_key(|id| (nodes[id].rank, id.clone()));

    Ok(RunPlan { roots, nodes })
}

fn resolve_depends_on(workflow: &Workflow, index: usize, step: &Step) -> Vec<StepId> {
    match &step.depends_on {
        Some(explicit) => explicit.clone(),
        None => match index.checked_sub(1) {
            Some(previous) => vec![workflow.steps[previous].id.clone()],
            None => Vec::new(),
        },
    }
}

fn check_emit_collisions(workflow: &Workflow) -> Result<(), PlanError> {
    let mut seen: BTreeMap<&str, &StepId> = BTreeMap::new();
    for step in &workflow.steps {
        for path in &step.emits {
            if let Some(&first) = seen.get(path.as_str()) {
                return Err(PlanError::EmitPathCollision {
                    first: first.clone(),
                    second: step.id.clone(),
                    path: path.clone(),
                });
            }
            seen.insert(path.as_str(), &step.id);
        }
    }
    Ok(())
}

/// Rejects any `when` predicate that references an artifact path whose
/// declared producer is not among the referencing step's own transitive
/// predecessors, so a predicate can never observe a step that has not yet
/// run (or that never runs on this branch of the graph). Paths with no
/// declared producer in this workflow are left unchecked; they may be
/// conventional artifacts (e.g. `test_report.json`) written outside the
/// `emits` declaration.
fn check_when_scope(
    workflow: &Workflow,
    preds: &BTreeMap<StepId, Vec<StepId>>,
) -> Result<(), PlanError> {
    let mut emit_owner: BTreeMap<&str, &StepId> = BTreeMap::new();
    for step in &workflow.steps {
        for path in &step.emits {
            emit_owner.insert(path.as_str(), &step.id);
        }
    }

    let mut cache: BTreeMap<StepId, BTreeSet<StepId>> = BTreeMap::new();
    for step in &workflow.steps {
        let Some(when) = &step.when else { continue };
        let path = match when {
            WhenPredicate::ArtifactExists { path } | WhenPredicate::ArtifactProperty { path, .. } => path,
        };
        let Some(&owner) = emit_owner.get(path.as_str()) else { continue };
        let ancestors = ancestors_of(&step.id, preds, &mut cache);
        if owner == &step.id || !ancestors.contains(owner) {
            return Err(PlanError::WhenScopeViolation { step: step.id.clone(), path: path.clone() });
        }
    }
    Ok(())
}

fn ancestors_of(
    id: &StepId,
    preds: &BTreeMap<StepId, Vec<StepId>>,
    cache: &mut BTreeMap<StepId, BTreeSet<StepId>>,
) -> BTreeSet<StepId> {
    if let Some(cached) = cache.get(id) {
        return cached.clone();
    }
    let mut acc = BTreeSet::new();
    if let Some(deps) = preds.get(id) {
        for dep in deps {
            acc.insert(dep.clone());
            acc.extend(ancestors_of(dep, preds, cache));
        }
    }
    cache.insert(id.clone(), acc.clone());
    acc
}

/// Kahn's algorithm with lexicographic tie-breaking among ready steps, so
/// rank assignment is deterministic regardless of document order.
fn topological_rank(
    preds: &BTreeMap<StepId, Vec<StepId>>,
) -> Result<BTreeMap<StepId, u32>, PlanError> {
    let mut remaining: BTreeMap<StepId, BTreeSet<StepId>> =
        preds.iter().map(|(id, deps)| (id.clone(), deps.iter().cloned().collect())).collect();
    let mut ranks = BTreeMap::new();
    let mut rank = 0u32;
    let mut visited = 0usize;
    let total = preds.len();

    loop {
        let mut ready: Vec<StepId> = remaining
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        if ready.is_empty() {
            break;
        }
        ready.sort();
        for id in &ready {
            ranks.insert(id.clone(), rank);
            remaining.remove(id);
            visited += 1;
        }
        for deps in remaining.values_mut() {
            for id in &ready {
                deps.remove(id);
            }
        }
        rank += 1;
    }

    if visited != total {
        let mut cycle: Vec<StepId> = remaining.keys().cloned().collect();
        cycle.sort();
        return Err(PlanError::Cycle { cycle });
    }

    Ok(ranks)
}
