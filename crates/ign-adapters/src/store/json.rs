//! JSON files on the local filesystem.
//!
//! ```text
//! <template>/ign.json           ← TemplateManifest  (JsonManifestStore)
//! <project>/.ign/ign.json       ← ProjectManifest   (JsonProjectStore)
//! <project>/.ign/ign-var.json   ← ProjectVariables  (JsonProjectStore)
//! ```
//!
//! Every write goes to a sibling temp file that is then renamed over the
//! target, so a reader never observes a half-written document.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use ign_core::{
    application::{
        ApplicationError,
        ports::{ProjectStateStore, TemplateManifestStore},
    },
    domain::{
        DomainError, ProjectManifest, ProjectVariables, TEMPLATE_MANIFEST_FILE, TemplateManifest,
        project_manifest_path, project_variables_path,
    },
    error::{Context, IgnError, IgnResult},
};

// ── project state ─────────────────────────────────────────────────────────────

/// Project state under `<project>/.ign/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProjectStore;

impl JsonProjectStore {
    pub fn new() -> Self {
        Self
    }
}

impl ProjectStateStore for JsonProjectStore {
    fn load_manifest(&self, project_dir: &Path) -> IgnResult<Option<ProjectManifest>> {
        read_json(&project_manifest_path(project_dir))
    }

    fn load_manifest_raw(&self, project_dir: &Path) -> IgnResult<Option<Vec<u8>>> {
        read_bytes(&project_manifest_path(project_dir))
    }

    fn load_variables(&self, project_dir: &Path) -> IgnResult<Option<ProjectVariables>> {
        read_json(&project_variables_path(project_dir))
    }

    #[instrument(skip_all, fields(project = %project_dir.display()))]
    fn write_manifest(&self, project_dir: &Path, manifest: &ProjectManifest) -> IgnResult<()> {
        write_json(&project_manifest_path(project_dir), manifest)
    }

    #[instrument(skip_all, fields(project = %project_dir.display()))]
    fn write_manifest_raw(&self, project_dir: &Path, bytes: &[u8]) -> IgnResult<()> {
        atomic_write(&project_manifest_path(project_dir), bytes)
    }

    #[instrument(skip_all, fields(project = %project_dir.display()))]
    fn write_variables(&self, project_dir: &Path, values: &ProjectVariables) -> IgnResult<()> {
        write_json(&project_variables_path(project_dir), values)
    }

    /// Remove the manifest, and the state directory once nothing is left in it.
    fn remove_manifest(&self, project_dir: &Path) -> IgnResult<()> {
        let path = project_manifest_path(project_dir);
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed manifest"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(map_io_error(&path, e, "remove")),
        }

        if let Some(state_dir) = path.parent() {
            // Succeeds only once the directory is empty.
            if fs::remove_dir(state_dir).is_ok() {
                debug!(path = %state_dir.display(), "Removed empty state directory");
            }
        }
        Ok(())
    }
}

// ── template manifest ─────────────────────────────────────────────────────────

/// `ign.json` at a template root.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonManifestStore;

impl JsonManifestStore {
    pub fn new() -> Self {
        Self
    }

    pub fn path(root: &Path) -> PathBuf {
        root.join(TEMPLATE_MANIFEST_FILE)
    }
}

impl TemplateManifestStore for JsonManifestStore {
    fn load(&self, root: &Path) -> IgnResult<Option<TemplateManifest>> {
        read_json(&Self::path(root))
    }

    #[instrument(skip_all, fields(root = %root.display()))]
    fn save(&self, root: &Path, manifest: &TemplateManifest) -> IgnResult<()> {
        write_json(&Self::path(root), manifest)
    }
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn read_bytes(path: &Path) -> IgnResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(map_io_error(path, e, "read")),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> IgnResult<Option<T>> {
    let Some(bytes) = read_bytes(path)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        DomainError::InvalidManifest(format!("{}: {e}", path.display())).into()
    })
}

/// Pretty JSON with a trailing newline; maps are already sorted.
pub(crate) fn to_json_bytes<T: Serialize>(value: &T) -> IgnResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value).context("serialize state")?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> IgnResult<()> {
    atomic_write(path, &to_json_bytes(value)?)
}

fn atomic_write(path: &Path, bytes: &[u8]) -> IgnResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| map_io_error(parent, e, "create directory"))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        map_io_error(&tmp, e, "write")
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        map_io_error(path, e, "replace")
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote");
    Ok(())
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> IgnError {
    ApplicationError::PersistenceFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}
