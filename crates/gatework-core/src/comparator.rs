// crates/gatework-core/src/comparator.rs
// ============================================================================
// Module: Comparator Logic
// Description: Comparator evaluation for gate predicates and `when`
//              conditions.
// Purpose: Convert an observed value and an expected value into a
//          tri-state outcome, fail-closed on anything not decidable.
// Dependencies: bigdecimal, time, ret-logic, serde_json
// ============================================================================

//! ## Overview
//! Comparator evaluation converts a pair of JSON values (an observed value
//! and, where applicable, an expected value) into a [`TriState`] outcome.
//! Missing or incomparable values yield `Unknown` rather than `False`, so a
//! gate or `when` predicate fails closed instead of silently passing.
//! Numeric ordering is decimal-aware via `BigDecimal`; string ordering
//! additionally recognizes RFC3339 timestamps and dates.

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use ret_logic::TriState;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Comparator
// ============================================================================

/// A comparison operator usable in a gate predicate or `when` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// The observed value is present.
    Exists,
    /// The observed value is absent.
    NotExists,
    /// The observed value equals the expected value.
    Equals,
    /// The observed value does not equal the expected value.
    NotEquals,
    /// Numeric/temporal ordering: observed > expected.
    GreaterThan,
    /// Numeric/temporal ordering: observed >= expected.
    GreaterThanOrEqual,
    /// Numeric/temporal ordering: observed < expected.
    LessThan,
    /// Numeric/temporal ordering: observed <= expected.
    LessThanOrEqual,
    /// Lexicographic ordering: observed > expected.
    LexGreaterThan,
    /// Lexicographic ordering: observed >= expected.
    LexGreaterThanOrEqual,
    /// Lexicographic ordering: observed < expected.
    LexLessThan,
    /// Lexicographic ordering: observed <= expected.
    LexLessThanOrEqual,
    /// String substring or array element containment.
    Contains,
    /// Scalar membership in an expected array.
    InSet,
    /// Deep structural equality for arrays/objects.
    DeepEquals,
    /// Deep structural inequality for arrays/objects.
    DeepNotEquals,
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates `comparator` between an `observed` value and an `expected`
/// value, returning [`TriState::Unknown`] whenever the comparison cannot
/// be decided rather than guessing.
#[must_use]
pub fn evaluate_comparator(
    comparator: Comparator,
    observed: Option<&Value>,
    expected: Option<&Value>,
) -> TriState {
    match comparator {
        Comparator::Exists => TriState::from(observed.is_some()),
        Comparator::NotExists => TriState::from(observed.is_none()),
        _ => evaluate_value_comparator(comparator, observed, expected),
    }
}

fn evaluate_value_comparator(
    comparator: Comparator,
    observed: Option<&Value>,
    expected: Option<&Value>,
) -> TriState {
    let (Some(observed), Some(expected)) = (observed, expected) else {
        return TriState::Unknown;
    };
    match comparator {
        Comparator::Equals => compare_equals(observed, expected),
        Comparator::NotEquals => compare_not_equals(observed, expected),
        Comparator::GreaterThan
        | Comparator::GreaterThanOrEqual
        | Comparator::LessThan
        | Comparator::LessThanOrEqual => compare_ordering(comparator, observed, expected),
        Comparator::LexGreaterThan
        | Comparator::LexGreaterThanOrEqual
        | Comparator::LexLessThan
        | Comparator::LexLessThanOrEqual => compare_lexicographic(comparator, observed, expected),
        Comparator::Contains => compare_contains(observed, expected),
        Comparator::InSet => compare_in_set(observed, expected),
        Comparator::DeepEquals => compare_deep_equals(observed, expected),
        Comparator::DeepNotEquals => compare_deep_not_equals(observed, expected),
        Comparator::Exists | Comparator::NotExists => TriState::Unknown,
    }
}

fn compare_equals(left: &Value, right: &Value) -> TriState {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => compare_decimal_equality(left, right, true),
        _ => TriState::from(left == right),
    }
}

fn compare_not_equals(left: &Value, right: &Value) -> TriState {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            compare_decimal_equality(left, right, false)
        }
        _ => TriState::from(left != right),
    }
}

fn compare_ordering(comparator: Comparator, left: &Value, right: &Value) -> TriState {
    if let (Some(left_num), Some(right_num)) = (left.as_number(), right.as_number()) {
        return decimal_cmp(left_num, right_num)
            .map_or(TriState::Unknown, |ordering| TriState::from(order_holds(comparator, ordering)));
    }
    if let (Value::String(left), Value::String(right)) = (left, right)
        && let Some(ordering) = temporal_cmp(left, right)
    {
        return TriState::from(order_holds(comparator, ordering));
    }
    TriState::Unknown
}

fn order_holds(comparator: Comparator, ordering: Ordering) -> bool {
    match comparator {
        Comparator::GreaterThan => ordering.is_gt(),
        Comparator::GreaterThanOrEqual => ordering.is_ge(),
        Comparator::LessThan => ordering.is_lt(),
        Comparator::LessThanOrEqual => ordering.is_le(),
        _ => false,
    }
}

fn compare_lexicographic(comparator: Comparator, left: &Value, right: &Value) -> TriState {
    let (Value::String(left), Value::String(right)) = (left, right) else {
        return TriState::Unknown;
    };
    let ordering = left.cmp(right);
    let result = match comparator {
        Comparator::LexGreaterThan => ordering.is_gt(),
        Comparator::LexGreaterThanOrEqual => ordering.is_ge(),
        Comparator::LexLessThan => ordering.is_lt(),
        Comparator::LexLessThanOrEqual => ordering.is_le(),
        _ => false,
    };
    TriState::from(result)
}

fn compare_deep_equals(left: &Value, right: &Value) -> TriState {
    match (left, right) {
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            TriState::from(left == right)
        }
        _ => TriState::Unknown,
    }
}

fn compare_deep_not_equals(left: &Value, right: &Value) -> TriState {
    match (left, right) {
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            TriState::from(left != right)
        }
        _ => TriState::Unknown,
    }
}

fn compare_contains(left: &Value, right: &Value) -> TriState {
    match (left, right) {
        (Value::String(haystack), Value::String(needle)) => {
            TriState::from(haystack.contains(needle.as_str()))
        }
        (Value::Array(haystack), Value::Array(needle)) => {
            TriState::from(needle.iter().all(|item| haystack.contains(item)))
        }
        _ => TriState::Unknown,
    }
}

fn compare_in_set(value: &Value, expected: &Value) -> TriState {
    let Value::Array(values) = expected else {
        return TriState::Unknown;
    };
    match value {
        Value::Array(_) | Value::Object(_) => TriState::Unknown,
        _ => TriState::from(values.contains(value)),
    }
}

fn compare_decimal_equality(left: &Number, right: &Number, equals: bool) -> TriState {
    let (Some(left), Some(right)) = (decimal_from_number(left), decimal_from_number(right)) else {
        return TriState::Unknown;
    };
    TriState::from(if equals { left == right } else { left != right })
}

fn decimal_cmp(left: &Number, right: &Number) -> Option<Ordering> {
    let left = decimal_from_number(left)?;
    let right = decimal_from_number(right)?;
    Some(left.cmp(&right))
}

fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    BigDecimal::from_str(&number.to_string()).ok()
}

fn temporal_cmp(left: &str, right: &str) -> Option<Ordering> {
    if let (Ok(left), Ok(right)) =
        (OffsetDateTime::parse(left, &Rfc3339), OffsetDateTime::parse(right, &Rfc3339))
    {
        return Some(left.cmp(&right));
    }
    let left = parse_rfc3339_date(left)?;
    let right = parse_rfc3339_date(right)?;
    Some(left.cmp(&right))
}

fn parse_rfc3339_date(value: &str) -> Option<Date> {
    let mut parts = value.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = time::Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
