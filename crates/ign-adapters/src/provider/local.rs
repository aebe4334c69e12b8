//! Local directory template provider.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use ign_core::{
    application::{
        ApplicationError,
        ports::{FetchedTemplate, TemplateManifestStore, TemplateProvider},
    },
    cancel::CancellationToken,
    domain::{TEMPLATE_MANIFEST_FILE, TemplateRef},
    error::IgnResult,
};

use crate::store::JsonManifestStore;

/// Resolves `TemplateRef::Local` references to directories on disk.
///
/// Remote references are rejected with `FetchFailed`.
#[derive(Debug, Clone, Default)]
pub struct LocalProvider {
    manifests: JsonManifestStore,
}

impl LocalProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute template root for a local reference.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, String> {
        let expanded = expand_home(path);
        let root = expanded
            .canonicalize()
            .map_err(|e| format!("{}: {e}", expanded.display()))?;
        if !root.is_dir() {
            return Err(format!("{} is not a directory", root.display()));
        }
        Ok(root)
    }
}

impl TemplateProvider for LocalProvider {
    #[instrument(skip_all, fields(template = %reference))]
    fn fetch(
        &self,
        reference: &TemplateRef,
        cancel: &CancellationToken,
    ) -> IgnResult<FetchedTemplate> {
        cancel.check()?;

        let fetch_failed = |reason: String| ApplicationError::FetchFailed {
            reference: reference.to_string(),
            reason,
        };

        let path = match reference {
            TemplateRef::Local { path } => path,
            TemplateRef::Remote { .. } => {
                return Err(
                    fetch_failed("remote templates are not supported by this build".into()).into(),
                );
            }
        };

        let root = self.resolve(path).map_err(fetch_failed)?;
        let manifest = self.manifests.load(&root)?.ok_or_else(|| {
            fetch_failed(format!(
                "no {} in {}",
                TEMPLATE_MANIFEST_FILE,
                root.display()
            ))
        })?;

        debug!(root = %root.display(), name = %manifest.name, "Resolved local template");
        Ok(FetchedTemplate { root, manifest })
    }
}

/// `~` and `~/…` relative to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
