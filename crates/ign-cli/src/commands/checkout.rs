//! `ign checkout`: materialize a project from a template.
//!
//! Responsibility: translate CLI arguments into a template reference and a
//! project directory, run the prepare step, then hand over to
//! [`super::apply::finish`].  No business logic lives here.

use tracing::{debug, instrument};

use ign_core::cancel::CancellationToken;

use crate::{
    cli::{CheckoutArgs, GlobalArgs},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

use super::apply;

#[instrument(skip_all, fields(template = %args.template))]
pub fn execute(
    args: CheckoutArgs,
    _global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let reference = apply::resolve_reference(&args.template)?;
    let project_dir = apply::project_dir(&args.output)?;
    debug!(%reference, project = %project_dir.display(), "Resolved checkout target");

    let service = apply::checkout_service();
    let cancel = CancellationToken::new();

    let spinner = output.spinner("Reading template...");
    let prepared = service.prepare_checkout(&reference, &project_dir, args.force, &cancel);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let record = prepared?;

    output.header(&format!(
        "Checking out {} {} into {}",
        record.template().manifest.name,
        record.template().manifest.version,
        project_dir.display()
    ))?;

    apply::finish(&service, record, args.apply, &config, &output)
}
