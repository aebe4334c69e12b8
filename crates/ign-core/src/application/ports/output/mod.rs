//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `ign-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use crate::cancel::CancellationToken;
use crate::domain::{
    GenerationReport, IgnoreMatcher, ProjectManifest, ProjectVariables, ScanReport,
    TemplateManifest, TemplateRef,
};
use crate::error::IgnResult;

/// A template resolved to a local directory.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedTemplate {
    pub root: PathBuf,
    pub manifest: TemplateManifest,
}

/// Port for resolving template references to local trees.
///
/// Implemented by:
/// - `ign_adapters::provider::LocalProvider` (local directories)
#[cfg_attr(test, mockall::automock)]
pub trait TemplateProvider: Send + Sync {
    /// Fetch the template and its manifest.
    ///
    /// Fails with `FetchFailed` when the reference cannot be resolved or the
    /// tree has no manifest.
    fn fetch(&self, reference: &TemplateRef, cancel: &CancellationToken)
    -> IgnResult<FetchedTemplate>;
}

/// Port for the deterministic template digest.
///
/// Implemented by:
/// - `ign_adapters::hasher::Sha256Hasher`
#[cfg_attr(test, mockall::automock)]
pub trait ContentHasher: Send + Sync {
    /// Hex digest of every non-excluded file under `root`; empty for an
    /// empty tree.
    fn hash(
        &self,
        root: &Path,
        ignore: &IgnoreMatcher,
        cancel: &CancellationToken,
    ) -> IgnResult<String>;
}

/// Port for directive scanning over a template tree.
///
/// Implemented by:
/// - `ign_adapters::scanner::FsDirectiveScanner`
#[cfg_attr(test, mockall::automock)]
pub trait DirectiveScanner: Send + Sync {
    fn scan(
        &self,
        root: &Path,
        ignore: &IgnoreMatcher,
        cancel: &CancellationToken,
    ) -> IgnResult<ScanReport>;
}

/// Everything the generator needs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub template_root: PathBuf,
    pub ignore: Vec<String>,
    pub values: ProjectVariables,
    pub output_dir: PathBuf,
    pub overwrite: bool,
    pub dry_run: bool,
}

/// Port for materializing template files into a project.
///
/// Implemented by:
/// - `ign_adapters::generator::SimpleGenerator`
#[cfg_attr(test, mockall::automock)]
pub trait Generator: Send + Sync {
    /// Per-file problems are collected in the report; `Err` means the run
    /// aborted as a whole.
    fn generate(&self, request: &GenerationRequest) -> IgnResult<GenerationReport>;
}

/// Port for a project's persisted state under `.ign/`.
///
/// Implemented by:
/// - `ign_adapters::store::JsonProjectStore` (production)
/// - `ign_adapters::store::MemoryProjectStore` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait ProjectStateStore: Send + Sync {
    fn load_manifest(&self, project_dir: &Path) -> IgnResult<Option<ProjectManifest>>;

    /// Exact bytes of the manifest, used to restore it on rollback.
    fn load_manifest_raw(&self, project_dir: &Path) -> IgnResult<Option<Vec<u8>>>;

    fn load_variables(&self, project_dir: &Path) -> IgnResult<Option<ProjectVariables>>;

    fn write_manifest(&self, project_dir: &Path, manifest: &ProjectManifest) -> IgnResult<()>;

    fn write_manifest_raw(&self, project_dir: &Path, bytes: &[u8]) -> IgnResult<()>;

    fn write_variables(&self, project_dir: &Path, values: &ProjectVariables) -> IgnResult<()>;

    /// Remove the manifest, and the state directory once it is empty; absent
    /// manifests are not an error.
    fn remove_manifest(&self, project_dir: &Path) -> IgnResult<()>;
}

/// Port for `ign.json` at a template root.
///
/// Implemented by:
/// - `ign_adapters::store::JsonManifestStore`
#[cfg_attr(test, mockall::automock)]
pub trait TemplateManifestStore: Send + Sync {
    fn load(&self, root: &Path) -> IgnResult<Option<TemplateManifest>>;

    fn save(&self, root: &Path, manifest: &TemplateManifest) -> IgnResult<()>;
}
