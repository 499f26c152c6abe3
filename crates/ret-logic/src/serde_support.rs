// crates/ret-logic/src/serde_support.rs
// ============================================================================
// Module: Requirement Validation
// Description: Structural validation of a deserialized requirement tree
//              (depth limits, empty clauses, malformed groups) independent
//              of evaluating it against evidence.
// ============================================================================

use crate::error::RequirementError;
use crate::requirement::Requirement;

/// Default maximum nesting depth permitted by [`RequirementValidator`].
const DEFAULT_MAX_DEPTH: usize = 64;

/// Validates the structural shape of a requirement tree, independent of
/// its leaf condition type.
#[derive(Debug, Clone, Copy)]
pub struct RequirementValidator {
    max_depth: usize,
}

impl RequirementValidator {
    /// A validator with the default nesting-depth limit.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }

    /// A validator with an explicit nesting-depth limit.
    #[must_use]
    pub const fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Validates `requirement`, returning an error describing the first
    /// structural problem encountered.
    pub fn validate<P>(&self, requirement: &Requirement<P>) -> Result<(), RequirementError> {
        self.validate_at_depth(requirement, 0)
    }

    fn validate_at_depth<P>(
        &self,
        requirement: &Requirement<P>,
        depth: usize,
    ) -> Result<(), RequirementError> {
        if depth > self.max_depth {
            return Err(RequirementError::TooDeep {
                max_depth: self.max_depth,
                actual_depth: depth,
            });
        }
        match requirement {
            Requirement::Condition(_) => Ok(()),
            Requirement::And(members) | Requirement::Or(members) => {
                if members.is_empty() {
                    return Err(RequirementError::invalid_structure(
                        "AND/OR requirement has no members",
                    ));
                }
                members.iter().try_for_each(|member| self.validate_at_depth(member, depth + 1))
            }
            Requirement::Not(inner) => self.validate_at_depth(inner, depth + 1),
            Requirement::RequireGroup { min, members } => {
                if members.is_empty() {
                    return Err(RequirementError::invalid_structure(
                        "require_group has no members",
                    ));
                }
                if usize::from(*min) > members.len() {
                    return Err(RequirementError::invalid_structure(
                        "require_group min exceeds member count",
                    ));
                }
                members.iter().try_for_each(|member| self.validate_at_depth(member, depth + 1))
            }
        }
    }
}

impl Default for RequirementValidator {
    fn default() -> Self {
        Self::with_defaults()
    }
}
