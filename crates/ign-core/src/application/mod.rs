//! Application layer for ign.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (CheckoutService, TemplateService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. All business rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    CheckoutService, CollectReport, CompleteOptions, CompletionReport, PreparationRecord,
    TemplateService,
};

// Re-export port traits (for adapter implementation)
pub use ports::{
    ContentHasher, DirectiveScanner, FetchedTemplate, GenerationRequest, Generator,
    ProjectStateStore, TemplateManifestStore, TemplateProvider,
};

pub use error::ApplicationError;
