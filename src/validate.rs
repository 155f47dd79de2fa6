//! JSON Schema validation of assembled specifications
//!
//! Validation itself is delegated to the `jsonschema` crate; this module only
//! compiles the schema and reports every violation in one error.

use serde_json::Value;

use crate::{Result, VlspecError};

/// A compiled schema that can validate many specifications
pub struct SpecValidator {
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for SpecValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecValidator").finish_non_exhaustive()
    }
}

impl SpecValidator {
    /// Compile a schema
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| VlspecError::ValidationError(format!("Invalid schema: {}", e)))?;
        Ok(Self { validator })
    }

    /// Validate a specification, collecting all violations
    pub fn validate(&self, spec: &Value) -> Result<()> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(spec)
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(VlspecError::ValidationError(errors.join("\n")))
        }
    }

    pub fn is_valid(&self, spec: &Value) -> bool {
        self.validator.is_valid(spec)
    }
}

/// Validate a specification against a schema
pub fn validate_spec(spec: &Value, schema: &Value) -> Result<()> {
    SpecValidator::new(schema)?.validate(spec)
}
