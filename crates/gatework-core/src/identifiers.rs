// crates/gatework-core/src/identifiers.rs
// ============================================================================
// Module: Identifiers
// Description: Canonical opaque identifiers for runs, steps, adapters, and
//              schemas.
// Purpose: Provide strongly typed, serializable identifiers with stable
//          wire forms instead of passing bare `String`s between components.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Every identifier in the data model is a newtype around `String`, never
//! a bare string passed positionally. `RunId` is always generated by the
//! orchestrator itself; `StepId` is validated against its wire grammar at
//! construction, so a value of this type is always well-formed once built.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier construction errors
// ============================================================================

/// Failure constructing an identifier from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// A `StepId` did not match `^\d+\.\d{3}$`.
    #[error("invalid step id {0:?}: expected the form `<ordinal>.<3 digits>`")]
    InvalidStepId(String),
}

// ============================================================================
// SECTION: RunId
// ============================================================================

/// Identifies a single orchestration run.
///
/// # Invariants
/// - Generated once, at run start, via [`RunId::generate`]. Never supplied
///   by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generates a new, unique run identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: StepId
// ============================================================================

/// Identifies a step within a workflow.
///
/// # Invariants
/// - Matches `^\d+\.\d{3}$` (an ordinal, a dot, and exactly three digits),
///   enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepId(String);

impl StepId {
    /// Parses and validates a step id.
    ///
    /// # Errors
    /// Returns [`IdentifierError::InvalidStepId`] if `raw` does not match
    /// `^\d+\.\d{3}$`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = raw.into();
        if is_valid_step_id(&raw) { Ok(Self(raw)) } else { Err(IdentifierError::InvalidStepId(raw)) }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_step_id(raw: &str) -> bool {
    let Some((ordinal, suffix)) = raw.split_once('.') else {
        return false;
    };
    !ordinal.is_empty()
        && ordinal.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == 3
        && suffix.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for StepId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StepId> for String {
    fn from(value: StepId) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: AdapterName
// ============================================================================

/// Identifies an adapter in the [`crate::registry::AdapterRegistry`].
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by
///   this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdapterName(String);

impl AdapterName {
    /// Creates a new adapter name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdapterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AdapterName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AdapterName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: SchemaId
// ============================================================================

/// Identifies a schema in the [`crate::schema::SchemaRegistry`] by logical
/// name (e.g. `"workflow"`, `"diagnostics"`, `"test_report"`).
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by
///   this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaId(String);

impl SchemaId {
    /// Creates a new schema identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SchemaId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SchemaId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::AdapterName;
    use super::RunId;
    use super::StepId;

    #[test]
    fn step_id_accepts_valid_form() {
        assert!(StepId::parse("1.000").is_ok());
        assert!(StepId::parse("42.007").is_ok());
    }

    #[test]
    fn step_id_rejects_malformed_suffix() {
        assert!(StepId::parse("1.00").is_err());
        assert!(StepId::parse("1.0000").is_err());
        assert!(StepId::parse("1").is_err());
        assert!(StepId::parse(".000").is_err());
        assert!(StepId::parse("a.000").is_err());
    }

    #[test]
    fn run_id_generate_is_unique() {
        assert_ne!(RunId::generate(), RunId::generate());
    }

    #[test]
    fn adapter_name_roundtrips_through_display() {
        let name = AdapterName::new("eslint");
        assert_eq!(name.to_string(), "eslint");
    }
}
