//! Filesystem directive scanner.

use std::{fs, path::Path};

use tracing::{debug, instrument};

use ign_core::{
    application::{ApplicationError, ports::DirectiveScanner},
    cancel::CancellationToken,
    domain::{
        DeclarationSet, DirectiveExtractor, IgnoreMatcher, RegexDirectiveExtractor, ScanReport,
    },
    error::IgnResult,
};

use crate::walker::{self, WalkOptions};

/// Walks a template tree and folds every directive into a [`ScanReport`].
///
/// Binary files (by extension) are skipped; other files are decoded lossily
/// so stray non-UTF-8 bytes never fail a scan.
pub struct FsDirectiveScanner {
    extractor: Box<dyn DirectiveExtractor>,
}

impl FsDirectiveScanner {
    pub fn new() -> Self {
        Self::with_extractor(Box::new(RegexDirectiveExtractor::new()))
    }

    pub fn with_extractor(extractor: Box<dyn DirectiveExtractor>) -> Self {
        Self { extractor }
    }
}

impl Default for FsDirectiveScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveScanner for FsDirectiveScanner {
    #[instrument(skip_all, fields(root = %root.display()))]
    fn scan(
        &self,
        root: &Path,
        ignore: &IgnoreMatcher,
        cancel: &CancellationToken,
    ) -> IgnResult<ScanReport> {
        let files = walker::walk(root, ignore, WalkOptions { skip_binary: true }, cancel)
            .map_err(|e| e.into_ign(|path, reason| ApplicationError::ScanFailed { path, reason }))?;

        let mut set = DeclarationSet::new();
        for file in &files {
            cancel.check()?;
            let bytes = fs::read(&file.absolute).map_err(|e| ApplicationError::ScanFailed {
                path: file.absolute.clone(),
                reason: e.to_string(),
            })?;
            let content = String::from_utf8_lossy(&bytes);

            let directives =
                self.extractor
                    .extract(&content)
                    .map_err(|e| ApplicationError::ScanFailed {
                        path: file.absolute.clone(),
                        reason: e.to_string(),
                    })?;
            for directive in &directives {
                set.observe(directive, &file.relative);
            }
        }

        debug!(files = files.len(), variables = set.len(), "Scan finished");
        Ok(set.into_report(files.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ign_core::domain::{VarType, VarValue};
    use tempfile::TempDir;

    fn make_tree(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = temp.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        temp
    }

    fn scan(root: &Path) -> IgnResult<ScanReport> {
        FsDirectiveScanner::new().scan(root, &IgnoreMatcher::empty(), &CancellationToken::new())
    }

    #[test]
    fn collects_declarations_across_files() {
        let tree = make_tree(&[
            ("go.mod", "go @ign-var:GO_VERSION=1.25.4@\n"),
            ("main.go", "// @ign-var:count=42@ @ign-var:name@\n"),
            ("README.md", "# @ign-var:name@\n"),
        ]);
        let report = scan(tree.path()).unwrap();

        assert_eq!(report.files_scanned, 3);
        assert_eq!(
            report.declarations["GO_VERSION"].default,
            Some(VarValue::String("1.25.4".into()))
        );
        assert_eq!(report.declarations["count"].var_type(), VarType::Int);
        assert_eq!(report.declarations["count"].default, Some(VarValue::Int(42)));
        assert_eq!(report.declarations["name"].sources.len(), 2);
    }

    #[test]
    fn binary_and_manifest_files_are_not_scanned() {
        let tree = make_tree(&[
            ("logo.png", "@ign-var:hidden@"),
            ("ign.json", "@ign-var:also_hidden@"),
            ("a.txt", "@ign-var:seen@"),
        ]);
        let report = scan(tree.path()).unwrap();
        assert_eq!(report.names().collect::<Vec<_>>(), vec!["seen"]);
        assert_eq!(report.files_scanned, 1);
    }

    #[test]
    fn non_utf8_content_is_decoded_lossily() {
        let tree = make_tree(&[]);
        fs::write(tree.path().join("data.txt"), b"\xff\xfe @ign-var:name@ \xff").unwrap();
        let report = scan(tree.path()).unwrap();
        assert!(report.declarations.contains_key("name"));
    }

    #[test]
    fn invalid_directive_fails_the_scan() {
        let tree = make_tree(&[("a.txt", "@ign-var:port:int=eighty@")]);
        let err = scan(tree.path()).unwrap_err();
        assert!(err.to_string().contains("a.txt"));
    }

    #[test]
    fn result_is_independent_of_creation_order() {
        let a = make_tree(&[("x.txt", "@ign-var:v=1@"), ("y.txt", "@ign-var:v@")]);
        let b = make_tree(&[("y.txt", "@ign-var:v@"), ("x.txt", "@ign-var:v=1@")]);
        assert_eq!(scan(a.path()).unwrap(), scan(b.path()).unwrap());
    }
}
