//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "ign",
    bin_name = "ign",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Check out templates and keep projects in step with them",
    long_about = "ign materializes a project from a template directory and later \
                  updates it as the template changes, preserving the variable \
                  values you already chose.",
    after_help = "EXAMPLES:\n\
        \x20 ign checkout ~/templates/service ./my-svc --var name=my-svc\n\
        \x20 ign update ./my-svc\n\
        \x20 ign template collect ~/templates/service\n\
        \x20 ign completions bash > /usr/share/bash-completion/completions/ign",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Materialize a new project from a template.
    #[command(
        visible_alias = "co",
        about = "Check out a template into a directory",
        after_help = "EXAMPLES:\n\
            \x20 ign checkout ./templates/go-service ./svc\n\
            \x20 ign checkout ./tpl ./svc --var name=svc --var port=8080 --yes\n\
            \x20 ign checkout ./tpl ./svc --dry-run"
    )]
    Checkout(CheckoutArgs),

    /// Pull template changes into an existing project.
    #[command(
        visible_alias = "up",
        about = "Update a project from its template",
        after_help = "EXAMPLES:\n\
            \x20 ign update\n\
            \x20 ign update ./svc --overwrite\n\
            \x20 ign update ./svc --template ./templates/go-service-v2"
    )]
    Update(UpdateArgs),

    /// Template authoring helpers.
    #[command(about = "Inspect and maintain templates", subcommand)]
    Template(TemplateCommands),

    /// Initialise an ign configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 ign init           # default location\n\
            \x20 ign init --force   # replace an existing file"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 ign completions bash > ~/.local/share/bash-completion/completions/ign\n\
            \x20 ign completions zsh  > ~/.zfunc/_ign\n\
            \x20 ign completions fish > ~/.config/fish/completions/ign.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the ign configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 ign config get checkout.overwrite\n\
            \x20 ign config list\n\
            \x20 ign config path"
    )]
    Config(ConfigCommands),
}

// ── checkout / update ─────────────────────────────────────────────────────────

/// Flags shared by `checkout` and `update`.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Variable assignment; repeatable.
    #[arg(
        long = "var",
        value_name = "NAME=VALUE",
        value_parser = parse_assignment,
        help = "Set a template variable (repeatable)"
    )]
    pub vars: Vec<(String, String)>,

    /// Replace files that already exist in the project.
    #[arg(long = "overwrite", help = "Overwrite existing files")]
    pub overwrite: bool,

    /// Preview what would be written without touching the project.
    #[arg(long = "dry-run", help = "Show what would change without writing")]
    pub dry_run: bool,

    /// Never prompt; unresolved variables become an error.
    #[arg(
        short = 'y',
        long = "yes",
        help = "Do not prompt; use --var values and defaults only"
    )]
    pub yes: bool,
}

/// Arguments for `ign checkout`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Template reference (a local directory).
    #[arg(value_name = "TEMPLATE", help = "Template directory or reference")]
    pub template: String,

    /// Project directory.
    #[arg(
        value_name = "DIR",
        default_value = ".",
        help = "Project directory (default: current directory)"
    )]
    pub output: PathBuf,

    /// Replace existing project state.
    #[arg(long = "force", help = "Check out over existing ign project state")]
    pub force: bool,

    #[command(flatten)]
    pub apply: ApplyArgs,
}

/// Arguments for `ign update`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Project directory.
    #[arg(
        value_name = "DIR",
        default_value = ".",
        help = "Project directory (default: current directory)"
    )]
    pub project: PathBuf,

    /// Use this template instead of the one recorded in the project.
    #[arg(
        long = "template",
        value_name = "TEMPLATE",
        help = "Override the recorded template reference"
    )]
    pub template: Option<String>,

    #[command(flatten)]
    pub apply: ApplyArgs,
}

/// Split `NAME=VALUE`; the value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

// ── template ──────────────────────────────────────────────────────────────────

/// Subcommands for `ign template`.
#[derive(Debug, Subcommand)]
pub enum TemplateCommands {
    /// Print the content digest of a template.
    Hash {
        /// Template directory.
        #[arg(value_name = "DIR", default_value = ".")]
        path: PathBuf,
    },
    /// Scan a template for directives and update its `ign.json`.
    Collect(CollectArgs),
}

/// Arguments for `ign template collect`.
#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Template directory.
    #[arg(value_name = "DIR", default_value = ".")]
    pub path: PathBuf,

    /// How scanned declarations combine with existing entries.
    #[arg(
        long = "mode",
        value_enum,
        default_value = "merge",
        help = "Merge strategy for existing variables"
    )]
    pub mode: CollectMode,

    /// Report without writing `ign.json`.
    #[arg(long = "dry-run", help = "Show the result without saving")]
    pub dry_run: bool,
}

/// Merge strategy for `template collect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectMode {
    /// Keep existing entries; add new names only.
    Merge,
    /// Replace existing entries with scanned declarations.
    Overwrite,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `ign init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `ign completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `ign config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `checkout.overwrite`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
