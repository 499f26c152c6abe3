// crates/ret-logic/src/error.rs
// ============================================================================
// Module: Requirement Errors
// Description: Stable error taxonomy for requirement-tree evaluation and
//              validation.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

/// Errors produced while evaluating or validating a requirement tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementError {
    /// A leaf condition evaluated to false.
    ConditionFailed(String),
    /// A leaf condition could not be evaluated at all.
    ConditionError(String),
    /// A `require_group(min, ...)` node did not reach its threshold.
    GroupRequirementFailed {
        /// Members that were satisfied.
        passed: usize,
        /// Members required to satisfy the group.
        required: usize,
    },
    /// Every branch of an OR requirement failed.
    OrAllFailed,
    /// A NOT requirement's inner requirement was satisfied.
    NotFailed,
    /// The evaluation context had no subject to evaluate against.
    SubjectNotAvailable,
    /// The evaluation context had no target to evaluate against.
    TargetNotAvailable,
    /// The evaluation context's world state could not be read.
    WorldStateUnavailable,
    /// The requirement tree itself is malformed.
    InvalidStructure(String),
    /// The requirement tree nests deeper than the configured maximum.
    TooDeep {
        /// Maximum permitted nesting depth.
        max_depth: usize,
        /// Actual nesting depth encountered.
        actual_depth: usize,
    },
    /// Any other failure, carrying a free-form message.
    Other(String),
}

impl RequirementError {
    /// Builds a [`RequirementError::ConditionFailed`].
    pub fn condition_failed(message: impl Into<String>) -> Self {
        Self::ConditionFailed(message.into())
    }

    /// Builds a [`RequirementError::ConditionError`].
    pub fn condition_error(message: impl Into<String>) -> Self {
        Self::ConditionError(message.into())
    }

    /// Builds a [`RequirementError::InvalidStructure`].
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure(message.into())
    }

    /// Builds a [`RequirementError::Other`].
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// A short, user-facing message suitable for surfacing to an operator
    /// without leaking internal evaluation detail.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ConditionFailed(message) => message.clone(),
            Self::ConditionError(_) => {
                "An internal error occurred while checking requirements".to_owned()
            }
            Self::GroupRequirementFailed { passed, required } => {
                let remaining = required.saturating_sub(*passed);
                let noun = if remaining == 1 { "requirement" } else { "requirements" };
                format!("Need {remaining} more {noun}")
            }
            Self::OrAllFailed => "None of the alternative requirements were met".to_owned(),
            Self::NotFailed => "A condition that should not be true was satisfied".to_owned(),
            Self::SubjectNotAvailable => {
                "Cannot evaluate requirement: no subject available".to_owned()
            }
            Self::TargetNotAvailable => {
                "Cannot evaluate requirement: no target available".to_owned()
            }
            Self::WorldStateUnavailable => {
                "Cannot evaluate requirement: world state unavailable".to_owned()
            }
            Self::InvalidStructure(_) => "Invalid requirement configuration".to_owned(),
            Self::TooDeep { .. } => "Requirement too complex to evaluate".to_owned(),
            Self::Other(message) => format!("Requirement not met: {message}"),
        }
    }
}

impl std::fmt::Display for RequirementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConditionFailed(message) => write!(f, "Requirement not met: {message}"),
            Self::ConditionError(message) => write!(f, "Condition evaluation error: {message}"),
            Self::GroupRequirementFailed { passed, required } => {
                write!(f, "Group requirement failed: passed {passed}, needed {required}")
            }
            Self::OrAllFailed => write!(f, "All alternatives in OR requirement failed"),
            Self::NotFailed => write!(f, "NOT requirement failed: inner requirement was satisfied"),
            Self::SubjectNotAvailable => write!(f, "Subject not available in evaluation context"),
            Self::TargetNotAvailable => write!(f, "Target not available in evaluation context"),
            Self::WorldStateUnavailable => write!(f, "World state unavailable or inaccessible"),
            Self::InvalidStructure(message) => {
                write!(f, "Invalid requirement structure: {message}")
            }
            Self::TooDeep { max_depth, actual_depth } => write!(
                f,
                "Requirement nesting too deep: {actual_depth} levels (max {max_depth})"
            ),
            Self::Other(message) => write!(f, "Requirement error: {message}"),
        }
    }
}

impl std::error::Error for RequirementError {}

impl From<&str> for RequirementError {
    fn from(message: &str) -> Self {
        Self::Other(message.to_owned())
    }
}

impl From<String> for RequirementError {
    fn from(message: String) -> Self {
        Self::Other(message)
    }
}
