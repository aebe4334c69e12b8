//! In-memory project state store for testing.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use ign_core::{
    application::{ApplicationError, ports::ProjectStateStore},
    domain::{
        DomainError, ProjectManifest, ProjectVariables, project_manifest_path,
        project_variables_path,
    },
    error::IgnResult,
};

use super::json::to_json_bytes;

/// Operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    WriteManifest,
    WriteVariables,
    /// Restoring or removing the manifest during rollback.
    Rollback,
}

/// In-memory project state, keyed by project directory.
///
/// Manifests are kept as serialized bytes so raw reads and restores behave
/// like the JSON store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryProjectStore {
    inner: Arc<RwLock<MemoryProjectStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryProjectStoreInner {
    manifests: HashMap<PathBuf, Vec<u8>>,
    variables: HashMap<PathBuf, ProjectVariables>,
    failures: Vec<FailOn>,
}

impl MemoryProjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `op` fail with `PersistenceFailed`.
    pub fn fail_on(&self, op: FailOn) {
        if let Ok(mut inner) = self.inner.write() {
            inner.failures.push(op);
        }
    }

    /// Raw manifest bytes (testing helper).
    pub fn manifest_bytes(&self, project_dir: &Path) -> Option<Vec<u8>> {
        let inner = self.inner.read().ok()?;
        inner.manifests.get(project_dir).cloned()
    }

    fn check(&self, op: FailOn, path: PathBuf) -> IgnResult<()> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        if inner.failures.contains(&op) {
            return Err(ApplicationError::PersistenceFailed {
                path,
                reason: format!("injected failure: {op:?}"),
            }
            .into());
        }
        Ok(())
    }
}

impl ProjectStateStore for MemoryProjectStore {
    fn load_manifest(&self, project_dir: &Path) -> IgnResult<Option<ProjectManifest>> {
        let Some(bytes) = self.load_manifest_raw(project_dir)? else {
            return Ok(None);
        };
        let manifest = serde_json::from_slice::<ProjectManifest>(&bytes)
            .map_err(|e| DomainError::InvalidManifest(e.to_string()))?;
        Ok(Some(manifest))
    }

    fn load_manifest_raw(&self, project_dir: &Path) -> IgnResult<Option<Vec<u8>>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.manifests.get(project_dir).cloned())
    }

    fn load_variables(&self, project_dir: &Path) -> IgnResult<Option<ProjectVariables>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.variables.get(project_dir).cloned())
    }

    fn write_manifest(&self, project_dir: &Path, manifest: &ProjectManifest) -> IgnResult<()> {
        self.check(FailOn::WriteManifest, project_manifest_path(project_dir))?;
        let bytes = to_json_bytes(manifest)?;
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.manifests.insert(project_dir.to_path_buf(), bytes);
        Ok(())
    }

    fn write_manifest_raw(&self, project_dir: &Path, bytes: &[u8]) -> IgnResult<()> {
        self.check(FailOn::Rollback, project_manifest_path(project_dir))?;
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner
            .manifests
            .insert(project_dir.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn write_variables(&self, project_dir: &Path, values: &ProjectVariables) -> IgnResult<()> {
        self.check(FailOn::WriteVariables, project_variables_path(project_dir))?;
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner
            .variables
            .insert(project_dir.to_path_buf(), values.clone());
        Ok(())
    }

    fn remove_manifest(&self, project_dir: &Path) -> IgnResult<()> {
        self.check(FailOn::Rollback, project_manifest_path(project_dir))?;
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.manifests.remove(project_dir);
        Ok(())
    }
}
