//! SHA-256 template digest.
//!
//! Each included file contributes `path \0 content \0` in byte-wise path
//! order. A tree with no included files hashes to the empty string.

use std::{fs, path::Path};

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use ign_core::{
    application::{ApplicationError, ports::ContentHasher},
    cancel::CancellationToken,
    domain::{IgnoreMatcher, TemplateFile},
    error::IgnResult,
};

use crate::walker::{self, WalkOptions};

/// Production hasher over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl ContentHasher for Sha256Hasher {
    #[instrument(skip_all, fields(root = %root.display()))]
    fn hash(
        &self,
        root: &Path,
        ignore: &IgnoreMatcher,
        cancel: &CancellationToken,
    ) -> IgnResult<String> {
        let walked = walker::walk(root, ignore, WalkOptions::default(), cancel).map_err(|e| {
            e.into_ign(|path, reason| ApplicationError::HashComputationFailed { path, reason })
        })?;

        let mut files = Vec::with_capacity(walked.len());
        for file in walked {
            cancel.check()?;
            let content = fs::read(&file.absolute).map_err(|e| {
                ApplicationError::HashComputationFailed {
                    path: file.absolute.clone(),
                    reason: e.to_string(),
                }
            })?;
            files.push(TemplateFile::new(file.relative, content)?);
        }

        let digest = digest_files(&files);
        debug!(files = files.len(), %digest, "Template hashed");
        Ok(digest)
    }
}

/// Digest of already collected files, sorted here so callers need not.
pub fn digest_files(files: &[TemplateFile]) -> String {
    if files.is_empty() {
        return String::new();
    }

    let mut ordered: Vec<&TemplateFile> = files.iter().collect();
    ordered.sort_by(|a, b| a.path().cmp(b.path()));

    let mut hasher = Sha256::new();
    for file in ordered {
        hasher.update(file.path().as_bytes());
        hasher.update([0u8]);
        hasher.update(file.content());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
