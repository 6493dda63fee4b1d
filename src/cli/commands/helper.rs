use super::{CommandKind, CommandResult, CommandSummary, RunScope, WriteSummary};
use crate::{
    cli::exit_status::ExitStatus,
    core::{ScanContext, mutation::WriteOutcome},
    issues::{CatalogErrorIssue, DuplicateReferenceIssue, Issue, MissingCatalogIssue},
};

pub fn scope(ctx: &ScanContext, dry_run: bool) -> RunScope {
    RunScope {
        package: ctx.filters.package.clone(),
        locales: ctx.filters.locales.clone(),
        dry_run,
    }
}

/// Index errors and missing catalogs.
pub fn catalog_issues(ctx: &ScanContext) -> Vec<Issue> {
    let catalogs = ctx.catalogs();
    let errors = catalogs
        .errors()
        .iter()
        .map(|e| Issue::CatalogError(CatalogErrorIssue::new(e, &ctx.root_dir)));
    let missing = catalogs
        .missing_catalogs()
        .iter()
        .map(|m| Issue::MissingCatalog(MissingCatalogIssue::new(m)));
    errors.chain(missing).collect()
}

pub fn duplicate_issues(ctx: &ScanContext) -> Vec<Issue> {
    let references = ctx.references();
    references
        .duplicates()
        .keys()
        .filter_map(|key| DuplicateReferenceIssue::new(&references.all_for(key), &ctx.root_dir))
        .map(Issue::DuplicateReference)
        .collect()
}

pub fn write_summary(
    ctx: &ScanContext,
    planned: usize,
    dry_run: bool,
    outcome: &WriteOutcome,
) -> WriteSummary {
    WriteSummary {
        planned,
        dry_run,
        touched: outcome.touched.iter().map(|path| ctx.relative(path)).collect(),
    }
}

/// Catalog errors from a write run, skipping ones the index already reported.
pub fn write_failure_issues(ctx: &ScanContext, outcome: &WriteOutcome, issues: &mut Vec<Issue>) {
    for failure in &outcome.failures {
        let issue = Issue::CatalogError(CatalogErrorIssue::from_catalog_error(
            failure,
            &ctx.root_dir,
        ));
        let reported = issues.iter().any(|existing| match (existing, &issue) {
            (Issue::CatalogError(a), Issue::CatalogError(b)) => {
                a.file == b.file && a.message == b.message
            }
            _ => false,
        });
        if !reported {
            issues.push(issue);
        }
    }
}

pub fn finish(
    kind: CommandKind,
    summary: CommandSummary,
    ctx: &ScanContext,
    mut issues: Vec<Issue>,
    status: ExitStatus,
) -> CommandResult {
    issues.sort();

    CommandResult {
        kind,
        summary,
        format: ctx.config.format,
        issues,
        status,
    }
}
