//! `ign update`: bring an existing project in line with its template.

use serde_json::json;
use tracing::instrument;

use ign_core::cancel::CancellationToken;

use crate::{
    cli::{GlobalArgs, UpdateArgs},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

use super::apply;

#[instrument(skip_all, fields(project = %args.project.display()))]
pub fn execute(
    args: UpdateArgs,
    _global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project_dir = apply::project_dir(&args.project)?;
    let override_ref = args
        .template
        .as_deref()
        .map(apply::resolve_reference)
        .transpose()?;

    let service = apply::checkout_service();
    let cancel = CancellationToken::new();

    let spinner = output.spinner("Checking template for changes...");
    let prepared = service.prepare_update(&project_dir, override_ref.as_ref(), &cancel);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let record = prepared?;

    if record.is_noop() {
        if output.is_json() {
            return output.json(&json!({
                "mode": "update",
                "up_to_date": true,
                "hash": record.hash_state().computed_hash,
            }));
        }
        output.success("Already up to date")?;
        return Ok(());
    }

    let hash = record.hash_state();
    if hash.changed {
        output.info(&format!(
            "Template changed ({} -> {})",
            short(&hash.stored_hash),
            short(&hash.computed_hash)
        ))?;
    }

    // Listed before any prompt.
    let changes = record.reconciliation();
    for name in &changes.new_names {
        output.info(&format!("new variable: {name}"))?;
    }
    for name in &changes.removed_names {
        output.info(&format!("dropped variable: {name}"))?;
    }

    apply::finish(&service, record, args.apply, &config, &output)
}

fn short(digest: &str) -> &str {
    if digest.is_empty() {
        return "none";
    }
    digest.get(..12).unwrap_or(digest)
}
