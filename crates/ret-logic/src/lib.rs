// crates/ret-logic/src/lib.rs
// ============================================================================
// Crate: ret-logic
// Description: A generic boolean/tri-state requirement-tree DSL: leaf
//              conditions composed with AND/OR/NOT/require_group, parsed
//              from a small textual grammar, and evaluated under either
//              Kleene or Bochvar tri-state logic.
// ============================================================================

//! ## Overview
//! `ret-logic` models a requirement as a tree of leaf conditions combined
//! with boolean connectives and threshold groups, independent of what a
//! leaf condition actually checks. Evaluation is tri-state
//! (`True`/`False`/`Unknown`) so a tree can report "not yet decidable"
//! instead of guessing, and two tri-state logics (Kleene, Bochvar) are
//! provided for callers with different tolerance for partial evidence.
//!
//! See [`dsl`] for the textual grammar used to author requirement trees
//! by hand.

pub mod dsl;
mod error;
mod requirement;
mod serde_support;
mod tristate;

pub use error::RequirementError;
pub use requirement::Requirement;
pub use requirement::RequirementTrace;
pub use requirement::TriStateConditionEval;
pub use serde_support::RequirementValidator;
pub use tristate::BochvarLogic;
pub use tristate::GroupCounts;
pub use tristate::KleeneLogic;
pub use tristate::LogicMode;
pub use tristate::TriLogic;
pub use tristate::TriState;
