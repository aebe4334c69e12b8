use crate::domain::{
    entities::{ProjectVariables, TemplateManifest},
    error::DomainError,
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across entities.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_manifest(manifest: &TemplateManifest) -> Result<(), DomainError> {
        manifest.validate()
    }

    /// Required variables with no usable value, sorted.
    pub fn unresolved(manifest: &TemplateManifest, values: &ProjectVariables) -> Vec<String> {
        manifest
            .variables
            .iter()
            .filter(|(_, spec)| spec.required)
            .filter(|(name, _)| values.get(*name).is_none_or(|v| v.is_empty()))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Type and constraint checks for every declared value.
    pub fn validate_values(
        manifest: &TemplateManifest,
        values: &ProjectVariables,
    ) -> Result<(), DomainError> {
        for (name, value) in values {
            if let Some(spec) = manifest.variables.get(name) {
                spec.validate_value(name, value)?;
            }
        }
        Ok(())
    }
}
