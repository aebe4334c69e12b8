//! Checkout Service - two-phase prepare/complete workflow.
//!
//! Both `checkout` and `update` run the same protocol:
//! 1. **Prepare** (read-only): fetch the template, hash it, load persisted
//!    state and reconcile variable sets into a [`PreparationRecord`]
//! 2. The caller supplies values for the variables the record asks for
//! 3. **Complete**: merge and validate values, persist the project manifest
//!    and variables (with rollback), then hand off to the generator

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        ports::{
            ContentHasher, FetchedTemplate, GenerationRequest, Generator, ProjectStateStore,
            TemplateProvider,
        },
    },
    cancel::CancellationToken,
    domain::{
        CheckoutMode, DomainValidator as validator, GenerationReport, HashState,
        ProjectManifest, ProjectVariables, ReconciliationResult, TemplateIdentity, TemplateRef,
        VariableDeclaration, project_manifest_path, reconcile,
    },
    error::IgnResult,
};

/// Immutable snapshot produced by prepare and consumed by complete.
///
/// Only the template root is kept, not its contents. `complete` re-hashes the
/// tree and refuses to continue if it no longer matches `hash_state`; edits
/// made after that check but before generation finishes are not detected.
#[derive(Debug, Clone)]
pub struct PreparationRecord {
    id: Uuid,
    mode: CheckoutMode,
    reference: TemplateRef,
    project_dir: PathBuf,
    template: FetchedTemplate,
    declarations: BTreeMap<String, VariableDeclaration>,
    existing_values: ProjectVariables,
    prior_manifest: Option<Vec<u8>>,
    reconciliation: ReconciliationResult,
    hash_state: HashState,
}

impl PreparationRecord {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> CheckoutMode {
        self.mode
    }

    pub fn reference(&self) -> &TemplateRef {
        &self.reference
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn template(&self) -> &FetchedTemplate {
        &self.template
    }

    pub fn declarations(&self) -> &BTreeMap<String, VariableDeclaration> {
        &self.declarations
    }

    pub fn existing_values(&self) -> &ProjectVariables {
        &self.existing_values
    }

    pub fn reconciliation(&self) -> &ReconciliationResult {
        &self.reconciliation
    }

    pub fn hash_state(&self) -> &HashState {
        &self.hash_state
    }

    /// An update with an unchanged template and identical variable sets.
    pub fn is_noop(&self) -> bool {
        self.mode == CheckoutMode::Update
            && !self.hash_state.changed
            && self.reconciliation.is_empty()
    }

    /// Newly declared variables that need a value from the user, by name.
    pub fn prompts(&self) -> Vec<&VariableDeclaration> {
        self.reconciliation
            .new_names
            .iter()
            .filter_map(|n| self.declarations.get(n))
            .filter(|d| reconcile::needs_prompt(d))
            .collect()
    }
}

/// Options for [`CheckoutService::complete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompleteOptions {
    pub overwrite: bool,
    pub dry_run: bool,
}

/// Outcome of a completed checkout or update.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub mode: CheckoutMode,
    pub values: ProjectVariables,
    pub manifest: ProjectManifest,
    pub reconciliation: ReconciliationResult,
    pub hash: HashState,
    pub generation: GenerationReport,
    /// `false` for dry runs.
    pub persisted: bool,
}

/// Checkout and update orchestrator.
pub struct CheckoutService {
    provider: Box<dyn TemplateProvider>,
    hasher: Box<dyn ContentHasher>,
    store: Box<dyn ProjectStateStore>,
    generator: Box<dyn Generator>,
}

impl CheckoutService {
    /// Create a new checkout service with the given adapters.
    pub fn new(
        provider: Box<dyn TemplateProvider>,
        hasher: Box<dyn ContentHasher>,
        store: Box<dyn ProjectStateStore>,
        generator: Box<dyn Generator>,
    ) -> Self {
        Self {
            provider,
            hasher,
            store,
            generator,
        }
    }

    /// Prepare a fresh checkout of `reference` into `project_dir`.
    ///
    /// Fails with `ProjectExists` when the directory already holds project
    /// state, unless `force` is set.
    #[instrument(
        skip_all,
        fields(template = %reference, project = %project_dir.display())
    )]
    pub fn prepare_checkout(
        &self,
        reference: &TemplateRef,
        project_dir: &Path,
        force: bool,
        cancel: &CancellationToken,
    ) -> IgnResult<PreparationRecord> {
        cancel.check()?;

        let prior_manifest = self.store.load_manifest_raw(project_dir)?;
        if prior_manifest.is_some() && !force {
            return Err(ApplicationError::ProjectExists {
                path: project_dir.to_path_buf(),
            }
            .into());
        }

        self.prepare(
            CheckoutMode::Checkout,
            reference.clone(),
            project_dir,
            String::new(),
            ProjectVariables::new(),
            prior_manifest,
            cancel,
        )
    }

    /// Prepare an update of the project in `project_dir`.
    ///
    /// The template recorded in the project manifest is used unless
    /// `override_ref` is given.
    #[instrument(skip_all, fields(project = %project_dir.display()))]
    pub fn prepare_update(
        &self,
        project_dir: &Path,
        override_ref: Option<&TemplateRef>,
        cancel: &CancellationToken,
    ) -> IgnResult<PreparationRecord> {
        cancel.check()?;

        let Some(manifest) = self.store.load_manifest(project_dir)? else {
            return Err(ApplicationError::ValidationFailed(format!(
                "no ign project state in {}; run `ign checkout` first",
                project_dir.display()
            ))
            .into());
        };

        let reference = match override_ref {
            Some(r) => r.clone(),
            None => TemplateRef::parse(&manifest.template.reference)?,
        };
        let existing_values = self.store.load_variables(project_dir)?.unwrap_or_default();
        let prior_manifest = self.store.load_manifest_raw(project_dir)?;

        self.prepare(
            CheckoutMode::Update,
            reference,
            project_dir,
            manifest.hash,
            existing_values,
            prior_manifest,
            cancel,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn prepare(
        &self,
        mode: CheckoutMode,
        reference: TemplateRef,
        project_dir: &Path,
        stored_hash: String,
        existing_values: ProjectVariables,
        prior_manifest: Option<Vec<u8>>,
        cancel: &CancellationToken,
    ) -> IgnResult<PreparationRecord> {
        cancel.check()?;
        let template = self.provider.fetch(&reference, cancel)?;
        validator::validate_manifest(&template.manifest)?;
        info!(
            name = %template.manifest.name,
            version = %template.manifest.version,
            root = %template.root.display(),
            "Template fetched"
        );

        let computed = self.hasher.hash(
            &template.root,
            &template.manifest.ignore_matcher(),
            cancel,
        )?;
        let hash_state = HashState::new(stored_hash, computed);

        let declarations = template.manifest.declarations();
        let reconciliation =
            reconcile::diff(existing_values.keys().map(String::as_str), &declarations);

        let record = PreparationRecord {
            id: Uuid::new_v4(),
            mode,
            reference,
            project_dir: project_dir.to_path_buf(),
            template,
            declarations,
            existing_values,
            prior_manifest,
            reconciliation,
            hash_state,
        };

        info!(
            record = %record.id,
            %mode,
            changed = record.hash_state.changed,
            new = record.reconciliation.new_names.len(),
            removed = record.reconciliation.removed_names.len(),
            "Prepared"
        );
        Ok(record)
    }

    /// Merge, validate, persist and generate.
    ///
    /// Nothing is written when validation fails. If writing the variables
    /// fails after the manifest was written, the manifest is restored to its
    /// pre-operation content.
    #[instrument(
        skip_all,
        fields(record = %record.id, mode = %record.mode, dry_run = options.dry_run)
    )]
    pub fn complete(
        &self,
        record: PreparationRecord,
        supplied: ProjectVariables,
        options: CompleteOptions,
    ) -> IgnResult<CompletionReport> {
        let values = reconcile::merge_values(
            &record.existing_values,
            &record.reconciliation,
            &record.declarations,
            &supplied,
        );

        let manifest = &record.template.manifest;
        let unresolved = validator::unresolved(manifest, &values);
        if !unresolved.is_empty() {
            return Err(ApplicationError::UnresolvedVariables { names: unresolved }.into());
        }
        validator::validate_values(manifest, &values)?;
        self.ensure_unchanged(&record)?;

        let project_manifest = ProjectManifest::new(
            TemplateIdentity {
                reference: record.reference.to_string(),
                name: manifest.name.clone(),
                version: manifest.version.clone(),
            },
            record.hash_state.computed_hash.clone(),
        );

        if options.dry_run {
            debug!("Dry run, project state not persisted");
        } else {
            self.persist(
                &record.project_dir,
                &project_manifest,
                &values,
                record.prior_manifest.as_deref(),
            )?;
        }

        let generation = self.generator.generate(&GenerationRequest {
            template_root: record.template.root.clone(),
            ignore: manifest.settings.ignore.clone(),
            values: values.clone(),
            output_dir: record.project_dir.clone(),
            overwrite: options.overwrite,
            dry_run: options.dry_run,
        })?;

        if generation.has_errors() {
            warn!(errors = generation.errors.len(), "Some files were not generated");
        }
        info!(
            created = generation.created.len(),
            overwritten = generation.overwritten.len(),
            skipped = generation.skipped.len(),
            "Completed"
        );

        Ok(CompletionReport {
            mode: record.mode,
            values,
            manifest: project_manifest,
            reconciliation: record.reconciliation,
            hash: record.hash_state,
            generation,
            persisted: !options.dry_run,
        })
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    /// The generator reads the tree again, so it must still be the one whose
    /// digest gets persisted.
    fn ensure_unchanged(&self, record: &PreparationRecord) -> IgnResult<()> {
        let root = &record.template.root;
        let current = self.hasher.hash(
            root,
            &record.template.manifest.ignore_matcher(),
            &CancellationToken::new(),
        )?;
        if current != record.hash_state.computed_hash {
            warn!(root = %root.display(), "Template changed between prepare and complete");
            return Err(ApplicationError::TemplateChanged { root: root.clone() }.into());
        }
        Ok(())
    }

    /// Manifest first, then variables; roll the manifest back if the second
    /// write fails.
    fn persist(
        &self,
        project_dir: &Path,
        manifest: &ProjectManifest,
        values: &ProjectVariables,
        prior_manifest: Option<&[u8]>,
    ) -> IgnResult<()> {
        self.store.write_manifest(project_dir, manifest)?;

        let Err(cause) = self.store.write_variables(project_dir, values) else {
            info!("Project state persisted");
            return Ok(());
        };

        warn!(error = %cause, "Write failed, attempting rollback");
        let rollback = match prior_manifest {
            Some(bytes) => self.store.write_manifest_raw(project_dir, bytes),
            None => self.store.remove_manifest(project_dir),
        };

        match rollback {
            Ok(()) => {
                info!("Rollback successful");
                Err(cause)
            }
            Err(e) => {
                warn!(error = %e, "Rollback failed");
                Err(ApplicationError::RollbackFailed {
                    path: project_manifest_path(project_dir),
                    reason: e.to_string(),
                    cause: cause.to_string(),
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::output::{
        MockContentHasher, MockGenerator, MockProjectStateStore, MockTemplateProvider,
    };
    use crate::domain::{
        GenerationMetadata, TemplateManifest, VarSpec, VarType, VarValue,
    };
    use crate::error::{FailureImpact, IgnError};

    fn manifest() -> TemplateManifest {
        let mut m = TemplateManifest::new("svc", "1.0.0");
        m.variables.insert(
            "name".into(),
            VarSpec {
                var_type: VarType::String,
                description: None,
                default: None,
                required: true,
                constraints: None,
            },
        );
        m.variables.insert(
            "port".into(),
            VarSpec {
                var_type: VarType::Int,
                description: None,
                default: Some(VarValue::Int(8080)),
                required: false,
                constraints: None,
            },
        );
        m
    }

    fn provider(manifest: TemplateManifest) -> MockTemplateProvider {
        let mut provider = MockTemplateProvider::new();
        provider.expect_fetch().returning(move |_, _| {
            Ok(FetchedTemplate {
                root: PathBuf::from("/tpl"),
                manifest: manifest.clone(),
            })
        });
        provider
    }

    fn hasher(digest: &'static str) -> MockContentHasher {
        let mut hasher = MockContentHasher::new();
        hasher
            .expect_hash()
            .returning(move |_, _, _| Ok(digest.to_string()));
        hasher
    }

    fn generator() -> MockGenerator {
        let mut generator = MockGenerator::new();
        generator.expect_generate().returning(|req| {
            Ok(if req.dry_run {
                GenerationReport::dry_run()
            } else {
                GenerationReport::default()
            })
        });
        generator
    }

    fn stored_manifest(hash: &str) -> ProjectManifest {
        ProjectManifest {
            template: TemplateIdentity {
                reference: "/tpl".into(),
                name: "svc".into(),
                version: "1.0.0".into(),
            },
            hash: hash.into(),
            metadata: GenerationMetadata::now(),
        }
    }

    fn empty_store() -> MockProjectStateStore {
        let mut store = MockProjectStateStore::new();
        store.expect_load_manifest().returning(|_| Ok(None));
        store.expect_load_manifest_raw().returning(|_| Ok(None));
        store.expect_load_variables().returning(|_| Ok(None));
        store
    }

    fn service(store: MockProjectStateStore) -> CheckoutService {
        CheckoutService::new(
            Box::new(provider(manifest())),
            Box::new(hasher("h1")),
            Box::new(store),
            Box::new(generator()),
        )
    }

    fn supplied(name: &str) -> ProjectVariables {
        let mut values = ProjectVariables::new();
        values.insert("name".into(), VarValue::from(name));
        values
    }

    fn persistence_error() -> IgnError {
        ApplicationError::PersistenceFailed {
            path: PathBuf::from("/p/.ign/ign-var.json"),
            reason: "disk full".into(),
        }
        .into()
    }

    #[test]
    fn checkout_marks_every_declaration_new() {
        let svc = service(empty_store());
        let record = svc
            .prepare_checkout(
                &TemplateRef::local("/tpl"),
                Path::new("/p"),
                false,
                &CancellationToken::new(),
            )
            .unwrap();

        assert_eq!(record.mode(), CheckoutMode::Checkout);
        assert_eq!(record.reconciliation().new_names, vec!["name", "port"]);
        assert!(record.hash_state().changed);
        assert!(!record.is_noop());
        let prompts: Vec<_> = record.prompts().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(prompts, vec!["name"]);
    }

    #[test]
    fn checkout_over_existing_state_requires_force() {
        let mut store = MockProjectStateStore::new();
        store
            .expect_load_manifest_raw()
            .returning(|_| Ok(Some(b"{}".to_vec())));
        let mut provider = MockTemplateProvider::new();
        provider.expect_fetch().times(0);
        let svc = CheckoutService::new(
            Box::new(provider),
            Box::new(MockContentHasher::new()),
            Box::new(store),
            Box::new(MockGenerator::new()),
        );

        let err = svc
            .prepare_checkout(
                &TemplateRef::local("/tpl"),
                Path::new("/p"),
                false,
                &CancellationToken::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            IgnError::Application(ApplicationError::ProjectExists { .. })
        ));
    }

    #[test]
    fn cancelled_token_stops_before_fetch() {
        let mut provider = MockTemplateProvider::new();
        provider.expect_fetch().times(0);
        let svc = CheckoutService::new(
            Box::new(provider),
            Box::new(MockContentHasher::new()),
            Box::new(MockProjectStateStore::new()),
            Box::new(MockGenerator::new()),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = svc
            .prepare_checkout(&TemplateRef::local("/tpl"), Path::new("/p"), false, &cancel)
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn update_without_state_fails_validation() {
        let svc = service(empty_store());
        let err = svc
            .prepare_update(Path::new("/p"), None, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            IgnError::Application(ApplicationError::ValidationFailed(_))
        ));
    }

    #[test]
    fn unchanged_update_is_noop() {
        let mut store = MockProjectStateStore::new();
        store
            .expect_load_manifest()
            .returning(|_| Ok(Some(stored_manifest("h1"))));
        store
            .expect_load_manifest_raw()
            .returning(|_| Ok(Some(b"old".to_vec())));
        store.expect_load_variables().returning(|_| {
            let mut values = supplied("svc");
            values.insert("port".into(), VarValue::Int(80));
            Ok(Some(values))
        });

        let record = service(store)
            .prepare_update(Path::new("/p"), None, &CancellationToken::new())
            .unwrap();
        assert_eq!(record.mode(), CheckoutMode::Update);
        assert!(record.is_noop());
        assert!(record.prompts().is_empty());
    }

    #[test]
    fn missing_required_value_writes_nothing() {
        let mut store = empty_store();
        store.expect_write_manifest().times(0);
        store.expect_write_variables().times(0);
        let svc = service(store);

        let record = svc
            .prepare_checkout(
                &TemplateRef::local("/tpl"),
                Path::new("/p"),
                false,
                &CancellationToken::new(),
            )
            .unwrap();
        let err = svc
            .complete(record, ProjectVariables::new(), CompleteOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            IgnError::Application(ApplicationError::UnresolvedVariables { ref names })
                if names == &vec!["name".to_string()]
        ));
    }

    #[test]
    fn template_edited_after_prepare_writes_nothing() {
        let mut store = empty_store();
        store.expect_write_manifest().times(0);
        store.expect_write_variables().times(0);

        let mut hasher = MockContentHasher::new();
        let mut calls = 0;
        hasher.expect_hash().times(2).returning(move |_, _, _| {
            calls += 1;
            Ok(if calls == 1 { "h1" } else { "h2" }.to_string())
        });
        let mut generator = MockGenerator::new();
        generator.expect_generate().times(0);

        let svc = CheckoutService::new(
            Box::new(provider(manifest())),
            Box::new(hasher),
            Box::new(store),
            Box::new(generator),
        );
        let record = svc
            .prepare_checkout(
                &TemplateRef::local("/tpl"),
                Path::new("/p"),
                false,
                &CancellationToken::new(),
            )
            .unwrap();
        let err = svc
            .complete(record, supplied("svc"), CompleteOptions::default())
            .unwrap_err();

        assert!(matches!(
            err,
            IgnError::Application(ApplicationError::TemplateChanged { .. })
        ));
        assert_eq!(err.impact(), FailureImpact::NothingChanged);
    }

    #[test]
    fn mistyped_value_writes_nothing() {
        let mut store = empty_store();
        store.expect_write_manifest().times(0);
        let svc = service(store);
        let record = svc
            .prepare_checkout(
                &TemplateRef::local("/tpl"),
                Path::new("/p"),
                false,
                &CancellationToken::new(),
            )
            .unwrap();

        let mut values = supplied("svc");
        values.insert("port".into(), VarValue::from("http"));
        let err = svc
            .complete(record, values, CompleteOptions::default())
            .unwrap_err();
        assert!(matches!(err, IgnError::Domain(_)));
    }

    #[test]
    fn complete_persists_manifest_then_variables() {
        let mut store = empty_store();
        let mut seq = mockall::Sequence::new();
        store
            .expect_write_manifest()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, m| m.hash == "h1" && m.template.name == "svc")
            .returning(|_, _| Ok(()));
        store
            .expect_write_variables()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, v| v.get("port") == Some(&VarValue::Int(8080)))
            .returning(|_, _| Ok(()));
        let svc = service(store);

        let record = svc
            .prepare_checkout(
                &TemplateRef::local("/tpl"),
                Path::new("/p"),
                false,
                &CancellationToken::new(),
            )
            .unwrap();
        let report = svc
            .complete(record, supplied("svc"), CompleteOptions::default())
            .unwrap();
        assert!(report.persisted);
        assert_eq!(report.values["name"], VarValue::from("svc"));
    }

    #[test]
    fn failed_variable_write_removes_new_manifest() {
        let mut store = empty_store();
        store.expect_write_manifest().returning(|_, _| Ok(()));
        store
            .expect_write_variables()
            .returning(|_, _| Err(persistence_error()));
        store.expect_remove_manifest().times(1).returning(|_| Ok(()));
        store.expect_write_manifest_raw().times(0);
        let svc = service(store);

        let record = svc
            .prepare_checkout(
                &TemplateRef::local("/tpl"),
                Path::new("/p"),
                false,
                &CancellationToken::new(),
            )
            .unwrap();
        let err = svc
            .complete(record, supplied("svc"), CompleteOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            IgnError::Application(ApplicationError::PersistenceFailed { .. })
        ));
        assert_eq!(err.impact(), FailureImpact::NothingChanged);
    }

    #[test]
    fn failed_variable_write_restores_prior_manifest() {
        let mut store = MockProjectStateStore::new();
        store
            .expect_load_manifest()
            .returning(|_| Ok(Some(stored_manifest("h0"))));
        store
            .expect_load_manifest_raw()
            .returning(|_| Ok(Some(b"old".to_vec())));
        store
            .expect_load_variables()
            .returning(|_| Ok(Some(supplied("svc"))));
        store.expect_write_manifest().returning(|_, _| Ok(()));
        store
            .expect_write_variables()
            .returning(|_, _| Err(persistence_error()));
        store
            .expect_write_manifest_raw()
            .withf(|_, bytes| bytes == b"old".as_slice())
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_remove_manifest().times(0);
        let svc = service(store);

        let record = svc
            .prepare_update(Path::new("/p"), None, &CancellationToken::new())
            .unwrap();
        assert!(record.hash_state().changed);
        let err = svc
            .complete(record, ProjectVariables::new(), CompleteOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            IgnError::Application(ApplicationError::PersistenceFailed { .. })
        ));
    }

    #[test]
    fn failed_rollback_is_reported_distinctly() {
        let mut store = empty_store();
        store.expect_write_manifest().returning(|_, _| Ok(()));
        store
            .expect_write_variables()
            .returning(|_, _| Err(persistence_error()));
        store
            .expect_remove_manifest()
            .returning(|_| Err(ApplicationError::StoreLockError.into()));
        let svc = service(store);

        let record = svc
            .prepare_checkout(
                &TemplateRef::local("/tpl"),
                Path::new("/p"),
                false,
                &CancellationToken::new(),
            )
            .unwrap();
        let err = svc
            .complete(record, supplied("svc"), CompleteOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            IgnError::Application(ApplicationError::RollbackFailed { .. })
        ));
        assert_eq!(err.impact(), FailureImpact::PartiallyApplied);
    }

    #[test]
    fn dry_run_does_not_persist() {
        let mut store = empty_store();
        store.expect_write_manifest().times(0);
        store.expect_write_variables().times(0);
        let svc = service(store);

        let record = svc
            .prepare_checkout(
                &TemplateRef::local("/tpl"),
                Path::new("/p"),
                false,
                &CancellationToken::new(),
            )
            .unwrap();
        let report = svc
            .complete(
                record,
                supplied("svc"),
                CompleteOptions {
                    overwrite: false,
                    dry_run: true,
                },
            )
            .unwrap();
        assert!(!report.persisted);
        assert!(report.generation.dry_run);
    }
}
