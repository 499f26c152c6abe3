// crates/ret-logic/src/requirement.rs
// ============================================================================
// Module: Requirement Tree
// Description: A generic boolean/tri-state requirement tree over an
//              arbitrary leaf condition type `P`.
// ============================================================================

use crate::tristate::GroupCounts;
use crate::tristate::TriLogic;
use crate::tristate::TriState;

/// Evaluates a single leaf condition against a row of evidence.
///
/// Implemented by the condition type `P` embedded in a [`Requirement`]
/// tree. `Reader` is the borrowed evidence view the evaluator is handed;
/// it is a generic associated type so callers can evaluate against
/// columnar batches without per-row allocation.
pub trait TriStateConditionEval {
    /// The borrowed evidence view passed to [`Self::eval_row_tristate`].
    type Reader<'a>
    where
        Self: 'a;

    /// Evaluates this condition against row `row` of `reader`.
    fn eval_row_tristate(&self, reader: &Self::Reader<'_>, row: usize) -> TriState;
}

/// Observes condition evaluations as a [`Requirement`] tree is walked.
pub trait RequirementTrace<P> {
    /// Called once per leaf condition evaluated, in evaluation order.
    fn on_condition_evaluated(&mut self, condition: &P, result: TriState);
}

/// A boolean requirement tree: leaf conditions composed with AND/OR/NOT
/// and threshold groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement<P> {
    /// A single leaf condition.
    Condition(P),
    /// All children must hold.
    And(Vec<Requirement<P>>),
    /// At least one child must hold.
    Or(Vec<Requirement<P>>),
    /// The inner requirement must not hold.
    Not(Box<Requirement<P>>),
    /// At least `min` of `members` must hold.
    RequireGroup {
        /// Minimum number of satisfied members required.
        min: u8,
        /// The group's members.
        members: Vec<Requirement<P>>,
    },
}

impl<P> Requirement<P> {
    /// Builds a leaf [`Requirement::Condition`].
    pub fn condition(condition: P) -> Self {
        Self::Condition(condition)
    }

    /// Builds a [`Requirement::And`] over `members`.
    #[must_use]
    pub fn and(members: Vec<Self>) -> Self {
        Self::And(members)
    }

    /// Builds a [`Requirement::Or`] over `members`.
    #[must_use]
    pub fn or(members: Vec<Self>) -> Self {
        Self::Or(members)
    }

    /// Builds a [`Requirement::Not`] negating `inner`.
    #[must_use]
    pub fn negate(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Builds a [`Requirement::RequireGroup`] requiring at least `min` of
    /// `members`.
    #[must_use]
    pub fn require_group(min: u8, members: Vec<Self>) -> Self {
        Self::RequireGroup { min, members }
    }
}

impl<P> Requirement<P>
where
    P: TriStateConditionEval,
{
    /// Evaluates the tree under the given logic, without short-circuiting:
    /// every child of an AND/OR/group node is evaluated even after an
    /// earlier child has already decided the outcome, so side effects
    /// (tracing, in particular) observe every leaf.
    pub fn eval_tristate(
        &self,
        reader: &P::Reader<'_>,
        row: usize,
        logic: &impl TriLogic,
    ) -> TriState {
        match self {
            Self::Condition(condition) => condition.eval_row_tristate(reader, row),
            Self::And(members) => members
                .iter()
                .map(|member| member.eval_tristate(reader, row, logic))
                .fold(TriState::True, |acc, next| logic.and(acc, next)),
            Self::Or(members) => members
                .iter()
                .map(|member| member.eval_tristate(reader, row, logic))
                .fold(TriState::False, |acc, next| logic.or(acc, next)),
            Self::Not(inner) => logic.not(inner.eval_tristate(reader, row, logic)),
            Self::RequireGroup { min, members } => {
                let counts = tally(members, reader, row, logic);
                logic.require_group(*min, counts)
            }
        }
    }

    /// Like [`Self::eval_tristate`], but reports every leaf evaluation to
    /// `trace` in evaluation order.
    pub fn eval_tristate_with_trace<T>(
        &self,
        reader: &P::Reader<'_>,
        row: usize,
        logic: &impl TriLogic,
        trace: &mut T,
    ) -> TriState
    where
        T: RequirementTrace<P>,
    {
        match self {
            Self::Condition(condition) => {
                let result = condition.eval_row_tristate(reader, row);
                trace.on_condition_evaluated(condition, result);
                result
            }
            Self::And(members) => members
                .iter()
                .map(|member| member.eval_tristate_with_trace(reader, row, logic, trace))
                .fold(TriState::True, |acc, next| logic.and(acc, next)),
            Self::Or(members) => members
                .iter()
                .map(|member| member.eval_tristate_with_trace(reader, row, logic, trace))
                .fold(TriState::False, |acc, next| logic.or(acc, next)),
            Self::Not(inner) => {
                logic.not(inner.eval_tristate_with_trace(reader, row, logic, trace))
            }
            Self::RequireGroup { min, members } => {
                let mut satisfied = 0usize;
                let mut unknown = 0usize;
                for member in members {
                    match member.eval_tristate_with_trace(reader, row, logic, trace) {
                        TriState::True => satisfied += 1,
                        TriState::Unknown => unknown += 1,
                        TriState::False => {}
                    }
                }
                logic.require_group(
                    *min,
                    GroupCounts { satisfied, unknown, total: members.len() },
                )
            }
        }
    }
}

fn tally<P: TriStateConditionEval>(
    members: &[Requirement<P>],
    reader: &P::Reader<'_>,
    row: usize,
    logic: &impl TriLogic,
) -> GroupCounts {
    let mut satisfied = 0usize;
    let mut unknown = 0usize;
    for member in members {
        match member.eval_tristate(reader, row, logic) {
            TriState::True => satisfied += 1,
            TriState::Unknown => unknown += 1,
            TriState::False => {}
        }
    }
    GroupCounts { satisfied, unknown, total: members.len() }
}
