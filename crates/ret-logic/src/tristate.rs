// crates/ret-logic/src/tristate.rs
// ============================================================================
// Module: Tri-State Logic
// Description: Three-valued (True/False/Unknown) logic with pluggable
//              evaluation semantics.
// Purpose: Let requirement trees fail closed on missing or inconclusive
//          evidence instead of forcing a premature true/false answer.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Tri-state logic lets a requirement tree distinguish "definitely false"
//! from "we don't know yet." Two interpretations of AND/OR over `Unknown`
//! are provided: Kleene (strong) logic, where a known `False`/`True`
//! operand can still decide an AND/OR outright, and Bochvar logic, where
//! `Unknown` is infectious and always propagates.

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: TriState
// ============================================================================

/// A three-valued logical result: definitely true, definitely false, or
/// not yet determinable from available evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriState {
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
    /// The condition cannot be determined from available evidence.
    Unknown,
}

impl TriState {
    /// Returns true if this value is [`TriState::True`].
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// Returns true if this value is [`TriState::False`].
    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::False)
    }

    /// Returns true if this value is [`TriState::Unknown`].
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

// ============================================================================
// SECTION: Group Counts
// ============================================================================

/// Tallies of satisfied/unknown/total members under a `require_group` node.
#[derive(Debug, Clone, Copy)]
pub struct GroupCounts {
    /// Number of members that evaluated to [`TriState::True`].
    pub satisfied: usize,
    /// Number of members that evaluated to [`TriState::Unknown`].
    pub unknown: usize,
    /// Total number of members in the group.
    pub total: usize,
}

impl GroupCounts {
    /// Number of members that evaluated to [`TriState::False`].
    #[must_use]
    pub const fn failed(self) -> usize {
        self.total.saturating_sub(self.satisfied).saturating_sub(self.unknown)
    }
}

// ============================================================================
// SECTION: Logic Tables
// ============================================================================

/// A three-valued logic interpretation of AND/OR/NOT and group thresholds.
pub trait TriLogic {
    /// Conjunction of two tri-state values.
    fn and(&self, a: TriState, b: TriState) -> TriState;
    /// Disjunction of two tri-state values.
    fn or(&self, a: TriState, b: TriState) -> TriState;
    /// Negation of a tri-state value.
    fn not(&self, a: TriState) -> TriState;
    /// Evaluates a `require_group(min, ...)` node from member tallies.
    fn require_group(&self, min: u8, counts: GroupCounts) -> TriState;
}

/// Threshold evaluation shared by logics that treat `require_group` the
/// same way: satisfied enough to guarantee the threshold, too few
/// remaining to ever reach it, or genuinely undecided.
fn require_group_by_count(min: u8, counts: GroupCounts) -> TriState {
    let min = usize::from(min);
    if min == 0 {
        return TriState::True;
    }
    if counts.satisfied >= min {
        TriState::True
    } else if counts.satisfied.saturating_add(counts.unknown) < min {
        TriState::False
    } else {
        TriState::Unknown
    }
}

/// Strong Kleene logic: a known operand can decide AND/OR outright even if
/// the other operand is `Unknown` (`False AND Unknown = False`, `True OR
/// Unknown = True`).
#[derive(Debug, Clone, Copy, Default)]
pub struct KleeneLogic;

impl TriLogic for KleeneLogic {
    fn and(&self, a: TriState, b: TriState) -> TriState {
        match (a, b) {
            (TriState::False, _) | (_, TriState::False) => TriState::False,
            (TriState::Unknown, _) | (_, TriState::Unknown) => TriState::Unknown,
            (TriState::True, TriState::True) => TriState::True,
        }
    }

    fn or(&self, a: TriState, b: TriState) -> TriState {
        match (a, b) {
            (TriState::True, _) | (_, TriState::True) => TriState::True,
            (TriState::Unknown, _) | (_, TriState::Unknown) => TriState::Unknown,
            (TriState::False, TriState::False) => TriState::False,
        }
    }

    fn not(&self, a: TriState) -> TriState {
        match a {
            TriState::True => TriState::False,
            TriState::False => TriState::True,
            TriState::Unknown => TriState::Unknown,
        }
    }

    fn require_group(&self, min: u8, counts: GroupCounts) -> TriState {
        require_group_by_count(min, counts)
    }
}

/// Bochvar (weak/internal) logic: `Unknown` is infectious and any operand
/// being `Unknown` forces the result to `Unknown`, regardless of the other
/// operand.
#[derive(Debug, Clone, Copy, Default)]
pub struct BochvarLogic;

impl TriLogic for BochvarLogic {
    fn and(&self, a: TriState, b: TriState) -> TriState {
        if a.is_unknown() || b.is_unknown() {
            return TriState::Unknown;
        }
        TriState::from(a.is_true() && b.is_true())
    }

    fn or(&self, a: TriState, b: TriState) -> TriState {
        if a.is_unknown() || b.is_unknown() {
            return TriState::Unknown;
        }
        TriState::from(a.is_true() || b.is_true())
    }

    fn not(&self, a: TriState) -> TriState {
        match a {
            TriState::True => TriState::False,
            TriState::False => TriState::True,
            TriState::Unknown => TriState::Unknown,
        }
    }

    fn require_group(&self, min: u8, counts: GroupCounts) -> TriState {
        require_group_by_count(min, counts)
    }
}

/// Runtime-selectable logic mode, for callers that pick Kleene vs. Bochvar
/// per request rather than at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicMode {
    /// Strong Kleene semantics (see [`KleeneLogic`]).
    Kleene,
    /// Bochvar semantics (see [`BochvarLogic`]).
    Bochvar,
}

impl TriLogic for LogicMode {
    fn and(&self, a: TriState, b: TriState) -> TriState {
        match self {
            Self::Kleene => KleeneLogic.and(a, b),
            Self::Bochvar => BochvarLogic.and(a, b),
        }
    }

    fn or(&self, a: TriState, b: TriState) -> TriState {
        match self {
            Self::Kleene => KleeneLogic.or(a, b),
            Self::Bochvar => BochvarLogic.or(a, b),
        }
    }

    fn not(&self, a: TriState) -> TriState {
        match self {
            Self::Kleene => KleeneLogic.not(a),
            Self::Bochvar => BochvarLogic.not(a),
        }
    }

    fn require_group(&self, min: u8, counts: GroupCounts) -> TriState {
        match self {
            Self::Kleene => KleeneLogic.require_group(min, counts),
            Self::Bochvar => BochvarLogic.require_group(min, counts),
        }
    }
}
