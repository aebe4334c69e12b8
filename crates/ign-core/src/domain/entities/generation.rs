use std::path::Path;

use serde::Serialize;

use crate::domain::error::DomainError;

/// A file collected from a template tree.
///
/// Invariant: `path` is relative and uses `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    path: String,
    content: Vec<u8>,
}

impl TemplateFile {
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Result<Self, DomainError> {
        let path = path.into().replace('\\', "/");
        if path.starts_with('/') || Path::new(&path).is_absolute() {
            return Err(DomainError::AbsolutePathNotAllowed { path });
        }
        Ok(Self { path, content })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// What the generator does with one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Create,
    Overwrite,
    Skip,
}

impl FileAction {
    /// Depends only on whether the target exists and the overwrite flag.
    pub fn decide(exists: bool, overwrite: bool) -> Self {
        match (exists, overwrite) {
            (false, _) => Self::Create,
            (true, true) => Self::Overwrite,
            (true, false) => Self::Skip,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedFile {
    pub path: String,
    pub action: FileAction,
}

/// A non-fatal failure for one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileGenerationError {
    pub path: String,
    pub reason: String,
}

/// Summary of one generator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
    pub overwritten: Vec<String>,
    pub errors: Vec<FileGenerationError>,
    pub preview: Vec<PlannedFile>,
    pub dry_run: bool,
}

impl GenerationReport {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub fn record(&mut self, path: impl Into<String>, action: FileAction) {
        let path = path.into();
        if self.dry_run {
            self.preview.push(PlannedFile { path, action });
            return;
        }
        match action {
            FileAction::Create => self.created.push(path),
            FileAction::Overwrite => self.overwritten.push(path),
            FileAction::Skip => self.skipped.push(path),
        }
    }

    pub fn record_error(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(FileGenerationError {
            path: path.into(),
            reason: reason.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
