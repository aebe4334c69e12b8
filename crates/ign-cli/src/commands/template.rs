//! `ign template`: authoring helpers: digest and declaration collection.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::instrument;

use ign_adapters::{FsDirectiveScanner, JsonManifestStore, Sha256Hasher};
use ign_core::{application::TemplateService, cancel::CancellationToken, domain::MergeMode};

use crate::{
    cli::{CollectArgs, CollectMode, TemplateCommands},
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Dispatch to the correct template subcommand.
pub fn execute(cmd: TemplateCommands, output: OutputManager) -> CliResult<()> {
    match cmd {
        TemplateCommands::Hash { path } => hash(&path, &output),
        TemplateCommands::Collect(args) => collect(args, &output),
    }
}

fn template_service() -> TemplateService {
    TemplateService::new(
        Box::new(Sha256Hasher::new()),
        Box::new(FsDirectiveScanner::new()),
        Box::new(JsonManifestStore::new()),
    )
}

#[instrument(skip_all, fields(path = %path.display()))]
fn hash(path: &Path, output: &OutputManager) -> CliResult<()> {
    let root = template_root(path)?;
    let digest = template_service().hash(&root, &CancellationToken::new())?;

    if output.is_json() {
        return output.json(&json!({ "path": root, "hash": digest }));
    }
    if digest.is_empty() {
        output.warning("Template has no hashable files")?;
    }
    output.print(&digest)?;
    Ok(())
}

#[instrument(skip_all, fields(path = %args.path.display()))]
fn collect(args: CollectArgs, output: &OutputManager) -> CliResult<()> {
    let root = template_root(&args.path)?;
    let mode = convert_mode(args.mode);

    let spinner = output.spinner("Scanning template...");
    let collected =
        template_service().collect(&root, mode, args.dry_run, &CancellationToken::new());
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = collected?;

    for conflict in &report.conflicts {
        output.warning(&format!(
            "{}: '{}' declared as {} here but {} earlier; keeping {}",
            conflict.source, conflict.name, conflict.ignored, conflict.kept, conflict.kept
        ))?;
    }

    if output.is_json() {
        return output.json(&report);
    }

    output.header(&format!(
        "{} {}: {} variable(s) from {} file(s)",
        report.manifest.name,
        report.manifest.version,
        report.manifest.variables.len(),
        report.files_scanned
    ))?;
    for name in &report.reconciliation.new_names {
        let spec = &report.manifest.variables[name];
        output.print(&format!("  + {name} ({})", spec.var_type))?;
    }
    if report.hash_changed {
        output.info(&format!("hash: {}", report.manifest.hash))?;
    }

    let manifest_path = JsonManifestStore::path(&root);
    if report.saved {
        let verb = if report.created { "Created" } else { "Updated" };
        output.success(&format!("{verb} {}", manifest_path.display()))?;
    } else {
        output.info(&format!(
            "Dry run: {} not written",
            manifest_path.display()
        ))?;
    }
    Ok(())
}

fn template_root(path: &Path) -> CliResult<PathBuf> {
    if !path.is_dir() {
        return Err(CliError::InvalidInput {
            message: format!("'{}' is not a template directory", path.display()),
            source: None,
        });
    }
    Ok(path.canonicalize()?)
}

fn convert_mode(mode: CollectMode) -> MergeMode {
    match mode {
        CollectMode::Merge => MergeMode::Merge,
        CollectMode::Overwrite => MergeMode::Overwrite,
    }
}
