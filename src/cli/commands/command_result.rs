use crate::{cli::exit_status::ExitStatus, config::OutputFormat, issues::Issue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Scan,
    Unused,
    Format,
    Init,
}

#[derive(Debug)]
pub enum CommandSummary {
    Scan(ScanSummary),
    Unused(UnusedSummary),
    Format(FormatSummary),
    Init(InitSummary),
}

/// What a run was limited to, echoed in the report header.
#[derive(Debug, Clone)]
pub struct RunScope {
    pub package: Option<String>,
    pub locales: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct ScanSummary {
    pub scope: RunScope,
    pub unique_references: usize,
    pub duplicate_references: usize,
    pub total_references: usize,
    /// Set when `--update` was given.
    pub write: Option<WriteSummary>,
}

#[derive(Debug)]
pub struct UnusedSummary {
    pub scope: RunScope,
    pub duplicate_references: usize,
    /// Set when `--delete` was given and there was something to delete.
    pub delete: Option<WriteSummary>,
}

/// Outcome of a catalog write or delete pass.
#[derive(Debug)]
pub struct WriteSummary {
    /// Number of entries to add or remove.
    pub planned: usize,
    pub dry_run: bool,
    /// Touched catalogs, relative to the project root.
    pub touched: Vec<String>,
}

#[derive(Debug)]
pub struct FormatSummary {
    pub scope: RunScope,
    pub check: bool,
    pub catalog_count: usize,
    /// Catalogs that were (or, with `--check`, would be) rewritten.
    pub changed: Vec<String>,
}

#[derive(Debug)]
pub struct InitSummary {
    pub file_name: String,
    pub created: bool,
}

/// Result of running an l10nguy command.
pub struct CommandResult {
    pub kind: CommandKind,
    pub summary: CommandSummary,
    pub format: OutputFormat,
    /// All issues found, sorted for display.
    pub issues: Vec<Issue>,
    pub status: ExitStatus,
}
