// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for ign.
//!
//! This module contains pure logic: directive parsing, ignore rules,
//! declaration merging and variable reconciliation. All I/O (walking trees,
//! hashing bytes, persisting state, writing files) is handled via ports
//! defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Immutable snapshots**: Scan reports and manifests are plain values
//! - **Rich domain model**: Behavior lives in entities, not services
//!
// Public API - what the world sees
pub mod directive;
pub mod entities;
pub mod error;
pub mod ignore;
pub mod reconcile;
pub mod value_objects;

// Private implementation details - not visible outside domain
mod validation;

// Re-exports for convenience
pub use directive::{Directive, DirectiveExtractor, RegexDirectiveExtractor, VarDirective};
pub use entities::{
    DeclarationSet, FileAction, FileGenerationError, GenerationMetadata, GenerationReport,
    PROJECT_MANIFEST_FILE, PROJECT_STATE_DIR, PROJECT_VARIABLES_FILE, PlannedFile,
    ProjectManifest, ProjectVariables, ScanReport, TemplateFile, TemplateIdentity,
    TemplateManifest, TemplateSettings, TypeConflict, VarConstraints, VarSpec,
    VariableDeclaration, project_manifest_path, project_variables_path,
};
pub use error::DomainError;
pub use ignore::{IgnoreMatcher, TEMPLATE_MANIFEST_FILE, VCS_DIR};
pub use reconcile::{HashState, MergeMode, ReconciliationResult};
pub use validation::DomainValidator;
pub use value_objects::{CheckoutMode, TemplateRef, VarType, VarValue};
