//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `scan`: Reconcile references against catalogs, optionally creating entries
//! - `unused`: List (and delete) catalog entries nothing references
//! - `format`: Rewrite catalogs in canonical form
//! - `init`: Initialize the configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::config::OutputFormat;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Scan(cmd)) => cmd.common.verbose,
            Some(Command::Unused(cmd)) => cmd.common.verbose,
            Some(Command::Format(cmd)) => cmd.common.verbose,
            Some(Command::Init(_)) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Project root (default: directory of the config file, else cwd)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Only this package key (overrides `defaultPackage`)
    #[arg(long)]
    pub package: Option<String>,

    /// Only this source name, e.g. `Presentation.Cards`
    #[arg(long)]
    pub source: Option<String>,

    /// Discovery root, relative to the project root (repeatable)
    #[arg(long = "path", value_name = "DIR")]
    pub paths: Vec<String>,

    /// Locales to check, comma or space separated
    #[arg(long)]
    pub locales: Vec<String>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct ScanCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Only identifiers matching this glob (repeatable)
    #[arg(long = "id", value_name = "GLOB")]
    pub ids: Vec<String>,

    /// Create missing catalog entries
    #[arg(long)]
    pub update: bool,

    /// Report what --update would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Do not report placeholder mismatches
    #[arg(long)]
    pub ignore_placeholder_warnings: bool,

    /// Do not mark created entries as needs-review
    #[arg(long)]
    pub no_needs_review: bool,
}

#[derive(Debug, Args)]
pub struct UnusedCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Remove unused entries from their catalogs
    #[arg(long)]
    pub delete: bool,

    /// Report what --delete would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct FormatCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Only report catalogs that are not canonical
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to create the config file in (default: cwd)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find references without catalog entries (and create them with --update)
    Scan(ScanCommand),
    /// Find catalog entries no reference uses (and delete them with --delete)
    Unused(UnusedCommand),
    /// Rewrite catalogs in canonical form
    Format(FormatCommand),
    /// Initialize a new .l10nguy.json configuration file
    Init(InitCommand),
}
