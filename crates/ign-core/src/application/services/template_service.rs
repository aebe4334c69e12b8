//! Template Service - template authoring operations.
//!
//! Hashes template trees and collects their directive declarations into
//! `ign.json`. Separated from CheckoutService for single responsibility.

use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    application::ports::{ContentHasher, DirectiveScanner, TemplateManifestStore},
    cancel::CancellationToken,
    domain::{
        DomainValidator as validator, IgnoreMatcher, MergeMode, ReconciliationResult, ScanReport,
        TemplateManifest, TypeConflict, reconcile,
    },
    error::IgnResult,
};

const DEFAULT_TEMPLATE_VERSION: &str = "0.1.0";

/// Outcome of [`TemplateService::collect`].
#[derive(Debug, Clone, Serialize)]
pub struct CollectReport {
    pub manifest: TemplateManifest,
    /// Names added to, and declared-but-unseen names in, the manifest.
    pub reconciliation: ReconciliationResult,
    pub files_scanned: usize,
    #[serde(skip)]
    pub conflicts: Vec<TypeConflict>,
    pub hash_changed: bool,
    /// No `ign.json` existed before.
    pub created: bool,
    /// `false` for dry runs.
    pub saved: bool,
}

/// Service for template authoring.
pub struct TemplateService {
    hasher: Box<dyn ContentHasher>,
    scanner: Box<dyn DirectiveScanner>,
    manifests: Box<dyn TemplateManifestStore>,
}

impl TemplateService {
    /// Create a new template service.
    pub fn new(
        hasher: Box<dyn ContentHasher>,
        scanner: Box<dyn DirectiveScanner>,
        manifests: Box<dyn TemplateManifestStore>,
    ) -> Self {
        Self {
            hasher,
            scanner,
            manifests,
        }
    }

    /// Digest of the template at `root`, honoring its ignore settings.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn hash(&self, root: &Path, cancel: &CancellationToken) -> IgnResult<String> {
        let ignore = self.ignore_for(root)?;
        self.hasher.hash(root, &ignore, cancel)
    }

    /// Declarations found in the template at `root`.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn scan(&self, root: &Path, cancel: &CancellationToken) -> IgnResult<ScanReport> {
        let ignore = self.ignore_for(root)?;
        self.scanner.scan(root, &ignore, cancel)
    }

    /// Scan the template, fold the declarations into `ign.json` and refresh
    /// its hash.
    #[instrument(skip_all, fields(root = %root.display(), mode = %mode, dry_run = dry_run))]
    pub fn collect(
        &self,
        root: &Path,
        mode: MergeMode,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> IgnResult<CollectReport> {
        let existing = self.manifests.load(root)?;
        let created = existing.is_none();
        let mut manifest = existing.unwrap_or_else(|| {
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "template".to_string());
            TemplateManifest::new(name, DEFAULT_TEMPLATE_VERSION)
        });

        let ignore = manifest.ignore_matcher();
        let scan = self.scanner.scan(root, &ignore, cancel)?;

        let reconciliation = reconcile::diff(
            manifest.variables.keys().map(String::as_str),
            &scan.declarations,
        );
        manifest.variables =
            reconcile::merge_declarations(&scan.declarations, &manifest.variables, mode);

        let hash = self.hasher.hash(root, &ignore, cancel)?;
        let hash_changed = hash != manifest.hash;
        manifest.hash = hash;

        validator::validate_manifest(&manifest)?;

        if !dry_run {
            self.manifests.save(root, &manifest)?;
        }

        info!(
            variables = manifest.variables.len(),
            new = reconciliation.new_names.len(),
            hash_changed,
            "Collected"
        );

        Ok(CollectReport {
            manifest,
            reconciliation,
            files_scanned: scan.files_scanned,
            conflicts: scan.conflicts,
            hash_changed,
            created,
            saved: !dry_run,
        })
    }

    fn ignore_for(&self, root: &Path) -> IgnResult<IgnoreMatcher> {
        Ok(self
            .manifests
            .load(root)?
            .map(|m| m.ignore_matcher())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::output::{
        MockContentHasher, MockDirectiveScanner, MockTemplateManifestStore,
    };
    use crate::domain::{VarSpec, VarType, VarValue, VariableDeclaration};
    use std::collections::BTreeMap;

    fn scan_report() -> ScanReport {
        let mut declarations = BTreeMap::new();
        declarations.insert(
            "port".to_string(),
            VariableDeclaration::new("port")
                .with_type(VarType::Int)
                .with_default(VarValue::Int(9090)),
        );
        declarations.insert("name".to_string(), VariableDeclaration::new("name"));
        ScanReport {
            declarations,
            files_scanned: 2,
            conflicts: vec![],
        }
    }

    fn service(manifests: MockTemplateManifestStore) -> TemplateService {
        let mut scanner = MockDirectiveScanner::new();
        scanner
            .expect_scan()
            .returning(|_, _, _| Ok(scan_report()));
        let mut hasher = MockContentHasher::new();
        hasher
            .expect_hash()
            .returning(|_, _, _| Ok("abc".to_string()));
        TemplateService::new(Box::new(hasher), Box::new(scanner), Box::new(manifests))
    }

    #[test]
    fn collect_creates_manifest_from_directory_name() {
        let mut manifests = MockTemplateManifestStore::new();
        manifests.expect_load().returning(|_| Ok(None));
        manifests
            .expect_save()
            .times(1)
            .withf(|_, m| m.name == "go-svc" && m.hash == "abc" && m.variables.len() == 2)
            .returning(|_, _| Ok(()));

        let report = service(manifests)
            .collect(
                Path::new("/work/go-svc"),
                MergeMode::Merge,
                false,
                &CancellationToken::new(),
            )
            .unwrap();
        assert!(report.created);
        assert!(report.saved);
        assert!(report.hash_changed);
        assert_eq!(report.reconciliation.new_names, vec!["name", "port"]);
    }

    #[test]
    fn merge_mode_keeps_authored_entries() {
        let mut existing = TemplateManifest::new("svc", "2.0.0");
        existing.hash = "abc".into();
        existing.variables.insert(
            "port".into(),
            VarSpec {
                var_type: VarType::Int,
                description: Some("listen port".into()),
                default: Some(VarValue::Int(80)),
                required: false,
                constraints: None,
            },
        );

        let mut manifests = MockTemplateManifestStore::new();
        manifests
            .expect_load()
            .returning(move |_| Ok(Some(existing.clone())));
        manifests.expect_save().times(0);

        let report = service(manifests)
            .collect(
                Path::new("/work/svc"),
                MergeMode::Merge,
                true,
                &CancellationToken::new(),
            )
            .unwrap();
        assert!(!report.created);
        assert!(!report.saved);
        assert!(!report.hash_changed);
        assert_eq!(
            report.manifest.variables["port"].default,
            Some(VarValue::Int(80))
        );
        assert_eq!(report.reconciliation.new_names, vec!["name"]);
    }
}
