//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::{ErrorCategory, FailureImpact};

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Validation failed (application-level, not domain).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Project state already exists at target location.
    #[error("Project already exists at {path}")]
    ProjectExists { path: PathBuf },

    /// The provider could not resolve or fetch the template.
    #[error("Failed to fetch template '{reference}': {reason}")]
    FetchFailed { reference: String, reason: String },

    #[error("Failed to hash template tree at {path}: {reason}")]
    HashComputationFailed { path: PathBuf, reason: String },

    #[error("Failed to scan template tree at {path}: {reason}")]
    ScanFailed { path: PathBuf, reason: String },

    /// The template tree no longer matches the digest taken during prepare.
    #[error("Template at {root} changed since it was read")]
    TemplateChanged { root: PathBuf },

    /// The operation was cancelled through its token.
    #[error("Operation cancelled")]
    Cancelled,

    /// Required variables have no value after merging.
    #[error("Missing values for required variables: {}", names.join(", "))]
    UnresolvedVariables { names: Vec<String> },

    /// Writing project state failed; earlier writes were rolled back.
    #[error("Failed to persist {path}: {reason}")]
    PersistenceFailed { path: PathBuf, reason: String },

    /// Rolling back a failed write also failed.
    #[error("Rollback of {path} failed: {reason} (after: {cause})")]
    RollbackFailed {
        path: PathBuf,
        reason: String,
        cause: String,
    },

    /// The generator aborted as a whole.
    #[error("Generation failed: {reason}")]
    GenerationFailed { reason: String },

    /// Store access failed (lock poisoned, etc.).
    #[error("State store error")]
    StoreLockError,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ProjectExists { path } => vec![
                format!("Project state already exists in: {}", path.display()),
                "Use `ign update` to pull template changes".into(),
                "Or pass --force to check out again".into(),
            ],
            Self::FetchFailed { reference, .. } => vec![
                format!("Could not fetch: {}", reference),
                "Check that the template directory exists and contains ign.json".into(),
                "Only local template paths are supported by this build".into(),
            ],
            Self::HashComputationFailed { path, .. } | Self::ScanFailed { path, .. } => vec![
                format!("Failed to read: {}", path.display()),
                "Check that you have read permissions".into(),
            ],
            Self::TemplateChanged { .. } => vec![
                "The template was modified while the command was running".into(),
                "Run the command again".into(),
            ],
            Self::UnresolvedVariables { names } => {
                let mut hints: Vec<String> = names
                    .iter()
                    .map(|n| format!("Provide a value: --var {}=<value>", n))
                    .collect();
                hints.push("Or run interactively to be prompted".into());
                hints
            }
            Self::PersistenceFailed { path, .. } => vec![
                format!("Failed to write: {}", path.display()),
                "Check that you have write permissions".into(),
                "Project state was left as it was before the command".into(),
            ],
            Self::RollbackFailed { path, .. } => vec![
                format!("Inspect {} by hand", path.display()),
                "Project state may be inconsistent".into(),
                "Re-run `ign checkout --force` to rebuild it".into(),
            ],
            Self::StoreLockError => vec![
                "The state store is locked".into(),
                "Try again in a moment".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationFailed(_)
            | Self::ProjectExists { .. }
            | Self::UnresolvedVariables { .. }
            | Self::TemplateChanged { .. }
            | Self::Cancelled => ErrorCategory::Validation,
            Self::FetchFailed { .. } => ErrorCategory::NotFound,
            Self::HashComputationFailed { .. }
            | Self::ScanFailed { .. }
            | Self::PersistenceFailed { .. }
            | Self::GenerationFailed { .. }
            | Self::StoreLockError => ErrorCategory::Internal,
            Self::RollbackFailed { .. } => ErrorCategory::Inconsistent,
        }
    }

    /// Whether project state may have been partially modified.
    pub fn impact(&self) -> FailureImpact {
        match self {
            Self::RollbackFailed { .. } | Self::GenerationFailed { .. } => {
                FailureImpact::PartiallyApplied
            }
            _ => FailureImpact::NothingChanged,
        }
    }
}
