// crates/gatework-core/src/schema.rs
// ============================================================================
// Module: Schema Validator
// Description: JSON Schema validation for workflow documents and emitted
//              artifacts.
// Purpose: Preload schemas once at process start and validate documents
//          against them by logical name, never by raw schema bytes.
// Dependencies: jsonschema, serde_json
// ============================================================================

//! ## Overview
//! The schema registry is built once, at process start, and is read-only
//! for the lifetime of the process: no schema is compiled or mutated
//! mid-run. Each schema is keyed by a logical [`SchemaId`]
//! (`"workflow"`, `"diagnostics"`, `"test_report"`, ...) rather than by
//! file path, so callers never need to know where a schema document
//! lives.

use std::collections::BTreeMap;

use jsonschema::Validator;

use crate::error::SchemaError;
use crate::identifiers::SchemaId;

/// A read-only registry of compiled JSON Schema validators, keyed by
/// logical schema name.
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Validator>,
}

impl SchemaRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { schemas: BTreeMap::new() }
    }

    /// Compiles `document` as a draft-2020-12 JSON Schema and registers it
    /// under `schema_id`.
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidSchema`] if `document` does not
    /// compile as a valid schema.
    pub fn register(
        &mut self,
        schema_id: impl Into<SchemaId>,
        document: &serde_json::Value,
    ) -> Result<(), SchemaError> {
        let schema_id = schema_id.into();
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(document)
            .map_err(|err| SchemaError::InvalidSchema {
                schema_id: schema_id.as_str().to_owned(),
                message: err.to_string(),
            })?;
        self.schemas.insert(schema_id.as_str().to_owned(), validator);
        Ok(())
    }

    /// Validates `document` against the schema registered under
    /// `schema_id`.
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownSchema`] if no schema is registered
    /// under that name, or [`SchemaError::ValidationFailed`] if the
    /// document does not conform.
    pub fn validate(
        &self,
        schema_id: &SchemaId,
        document: &serde_json::Value,
    ) -> Result<(), SchemaError> {
        let validator = self
            .schemas
            .get(schema_id.as_str())
            .ok_or_else(|| SchemaError::UnknownSchema(schema_id.as_str().to_owned()))?;

        let errors: Vec<String> =
            validator.iter_errors(document).map(|error| error.to_string()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed { schema_id: schema_id.as_str().to_owned(), errors })
        }
    }

    /// Whether a schema is registered under `schema_id`.
    #[must_use]
    pub fn contains(&self, schema_id: &SchemaId) -> bool {
        self.schemas.contains_key(schema_id.as_str())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use serde_json::json;

    use super::SchemaRegistry;
    use crate::identifiers::SchemaId;

    #[test]
    fn registers_and_validates() {
        let mut registry = SchemaRegistry::new();
        let schema_id = SchemaId::new("test_report");
        registry
            .register(
                schema_id.clone(),
                &json!({
                    "type": "object",
                    "required": ["pass_count", "failures"],
                    "properties": {
                        "pass_count": {"type": "integer", "minimum": 0},
                        "failures": {"type": "integer", "minimum": 0}
                    }
                }),
            )
            .expect("valid schema compiles");

        assert!(registry.validate(&schema_id, &json!({"pass_count": 3, "failures": 0})).is_ok());
        assert!(registry.validate(&schema_id, &json!({"pass_count": "oops"})).is_err());
    }

    #[test]
    fn unknown_schema_id_is_an_error() {
        let registry = SchemaRegistry::new();
        let schema_id = SchemaId::new("nope");
        assert!(registry.validate(&schema_id, &json!({})).is_err());
    }
}
