//! The half of `checkout` and `update` that runs after preparation:
//! collect values, complete, and report.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use ign_adapters::{JsonProjectStore, LocalProvider, Sha256Hasher, SimpleGenerator};
use ign_core::{
    application::{ApplicationError, CheckoutService, CompleteOptions, CompletionReport, PreparationRecord},
    domain::{CheckoutMode, FileAction, TemplateRef},
};

use crate::{
    cli::ApplyArgs,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
    prompt,
};

/// Service wired with the filesystem adapters.
pub fn checkout_service() -> CheckoutService {
    CheckoutService::new(
        Box::new(LocalProvider::new()),
        Box::new(Sha256Hasher::new()),
        Box::new(JsonProjectStore::new()),
        Box::new(SimpleGenerator::new()),
    )
}

/// Parse a template argument, pinning local directories to an absolute
/// path so the persisted reference survives a change of working directory.
pub fn resolve_reference(raw: &str) -> CliResult<TemplateRef> {
    let reference = if Path::new(raw).is_dir() {
        TemplateRef::Local {
            path: PathBuf::from(raw),
        }
    } else {
        TemplateRef::parse(raw)?
    };

    match reference {
        TemplateRef::Local { path } => {
            let path = LocalProvider::new().resolve(&path).map_err(|reason| {
                ApplicationError::FetchFailed {
                    reference: raw.to_string(),
                    reason,
                }
            })?;
            Ok(TemplateRef::Local { path })
        }
        remote => Ok(remote),
    }
}

/// Absolute form of a project directory; it need not exist yet.
pub fn project_dir(path: &Path) -> CliResult<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Gather values, complete the record and print the outcome.
#[instrument(skip_all, fields(record = %record.id()))]
pub fn finish(
    service: &CheckoutService,
    record: PreparationRecord,
    args: ApplyArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let (mut supplied, undeclared) = prompt::parse_supplied(&args.vars, record.declarations())?;
    for name in undeclared {
        output.warning(&format!("'{name}' is not declared by the template; ignored"))?;
    }

    let interactive = !args.yes && config.checkout.interactive && !output.is_json();
    prompt::fill_missing(record.prompts(), &mut supplied, interactive)?;

    let options = CompleteOptions {
        overwrite: args.overwrite || config.checkout.overwrite,
        dry_run: args.dry_run,
    };
    let report = service.complete(record, supplied, options)?;
    info!(
        created = report.generation.created.len(),
        errors = report.generation.errors.len(),
        "Completed"
    );

    render(&report, output)
}

fn render(report: &CompletionReport, output: &OutputManager) -> CliResult<()> {
    if output.is_json() {
        return output.json(report);
    }

    let template = &report.manifest.template;
    let verb = match report.mode {
        CheckoutMode::Checkout => "Checked out",
        CheckoutMode::Update => "Updated from",
    };
    let gen_report = &report.generation;

    if gen_report.dry_run {
        output.header(&format!(
            "Dry run: {} {} {}",
            verb.to_lowercase(),
            template.name,
            template.version
        ))?;
        for planned in &gen_report.preview {
            let label = match planned.action {
                FileAction::Create => "create   ",
                FileAction::Overwrite => "overwrite",
                FileAction::Skip => "skip     ",
            };
            output.print(&format!("  {label} {}", planned.path))?;
        }
    } else {
        for path in &gen_report.created {
            output.print(&format!("  + {path}"))?;
        }
        for path in &gen_report.overwritten {
            output.print(&format!("  ~ {path}"))?;
        }
        if !gen_report.skipped.is_empty() {
            output.info(&format!(
                "{} existing file(s) left untouched (use --overwrite to replace)",
                gen_report.skipped.len()
            ))?;
        }
    }

    for failure in &gen_report.errors {
        output.warning(&format!("{}: {}", failure.path, failure.reason))?;
    }

    if report.persisted {
        output.success(&format!(
            "{verb} {} {} ({} created, {} overwritten, {} skipped)",
            template.name,
            template.version,
            gen_report.created.len(),
            gen_report.overwritten.len(),
            gen_report.skipped.len(),
        ))?;
    } else {
        output.info("Dry run: project state not written")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn local_directories_resolve_to_absolute_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("tpl")).unwrap();
        let raw = temp.path().join("tpl");

        let reference = resolve_reference(&raw.to_string_lossy()).unwrap();
        let TemplateRef::Local { path } = reference else {
            panic!("expected a local reference");
        };
        assert!(path.is_absolute());
        assert_eq!(path, raw.canonicalize().unwrap());
    }

    #[test]
    fn missing_local_directory_is_fetch_failure() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("absent");
        assert!(resolve_reference(&raw.to_string_lossy()).is_err());
    }

    #[test]
    fn remote_references_pass_through() {
        let reference = resolve_reference("github.com/acme/templates@v1").unwrap();
        assert!(matches!(reference, TemplateRef::Remote { .. }));
    }

    #[test]
    fn project_dir_is_absolute() {
        assert!(project_dir(Path::new("some/where")).unwrap().is_absolute());
    }
}
