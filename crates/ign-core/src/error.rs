//! Unified error handling for ign core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for ign core operations.
///
/// This enum wraps all possible errors that can occur when using ign-core,
/// providing a unified interface for error handling.
#[derive(Debug, Error, Clone)]
pub enum IgnError {
    /// Errors from the domain layer (invalid directives, values, manifests).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (orchestration failures).
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl IgnError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Internal { .. } => vec![
                "This appears to be a bug in ign".into(),
                "Please report this issue with the output of `ign -vv`".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category(),
            Self::Application(e) => e.category(),
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// What the failed operation left behind on disk.
    pub fn impact(&self) -> FailureImpact {
        match self {
            Self::Application(e) => e.impact(),
            _ => FailureImpact::NothingChanged,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Application(
                ApplicationError::StoreLockError
                    | ApplicationError::FetchFailed { .. }
                    | ApplicationError::Cancelled
            )
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Application(ApplicationError::Cancelled))
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Internal,
    /// On-disk state no longer matches either the old or the new revision.
    Inconsistent,
}

/// Whether a failure left project state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureImpact {
    NothingChanged,
    PartiallyApplied,
}

/// Convenient result type alias.
pub type IgnResult<T> = Result<T, IgnError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> IgnResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> IgnResult<T> {
        self.map_err(|e| IgnError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}
