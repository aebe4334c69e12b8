pub mod generation;
pub mod manifest;
pub mod variable;

pub use crate::domain::DomainError;
pub use generation::{FileAction, FileGenerationError, GenerationReport, PlannedFile, TemplateFile};
pub use manifest::{
    GenerationMetadata, PROJECT_MANIFEST_FILE, PROJECT_STATE_DIR, PROJECT_VARIABLES_FILE,
    ProjectManifest, ProjectVariables, TemplateIdentity, TemplateManifest, TemplateSettings,
    VarConstraints, VarSpec, project_manifest_path, project_variables_path,
};
pub use variable::{DeclarationSet, ScanReport, TypeConflict, VariableDeclaration};
