// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

use crate::error::ErrorCategory;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (the workflow keeps the original cause when rolling back)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Directive Errors
    // ========================================================================
    #[error("Invalid directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("Invalid variable name '{name}'")]
    InvalidVariableName { name: String },

    #[error("Unknown variable type '{0}' (expected string, int, number or bool)")]
    UnknownVarType(String),

    // ========================================================================
    // Value Errors
    // ========================================================================
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    // ========================================================================
    // Manifest / Reference Errors
    // ========================================================================
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid template reference '{reference}': {reason}")]
    InvalidTemplateRef { reference: String, reason: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidDirective { directive, .. } => vec![
                format!("Check the directive: {}", directive),
                "Variable directives look like @ign-var:NAME[:TYPE][=DEFAULT]@".into(),
                "Conditional directives look like @ign-if:NAME@".into(),
            ],
            Self::InvalidVariableName { .. } => vec![
                "Variable names start with a letter or underscore".into(),
                "Use letters, digits, '_', '-' and '.' after the first character".into(),
            ],
            Self::UnknownVarType(_) => {
                vec!["Supported types: string, int, number, bool".into()]
            }
            Self::InvalidValue { name, .. } => vec![
                format!("Provide a different value for '{}'", name),
                format!("Example: --var {}=<value>", name),
            ],
            Self::InvalidManifest(_) => vec![
                "Check the template's ign.json".into(),
                "Regenerate declarations with: ign template collect".into(),
            ],
            Self::InvalidTemplateRef { .. } => vec![
                "Local templates: ./path/to/template or /abs/path".into(),
                "Remote templates: github.com/owner/repo[/subdir][@ref]".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingRequiredField { .. } => ErrorCategory::Internal,
            _ => ErrorCategory::Validation,
        }
    }
}
