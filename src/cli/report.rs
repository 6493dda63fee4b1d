//! Report formatting and printing.
//!
//! Table output prints issues in cargo style followed by a summary and the
//! outcome of any catalog writes. JSON output prints one pretty payload per
//! command with paths relative to the project root.

use std::io::{self, Write};

use colored::Colorize;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::error;

use super::commands::{
    CommandResult, CommandSummary, FormatSummary, InitSummary, RunScope, ScanSummary,
    UnusedSummary, WriteSummary,
};
use crate::config::OutputFormat;
use crate::issues::{
    CatalogErrorIssue, DuplicateReferenceIssue, Issue, MissingCatalogIssue,
    MissingTranslationIssue, PlaceholderMismatchIssue, Report, ReportLocation, Severity,
    UnusedEntryIssue,
};
use crate::utils::yes_no;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

pub fn print(result: &CommandResult, verbose: bool) {
    if let CommandSummary::Init(summary) = &result.summary {
        print_init(summary);
        return;
    }
    print_to(result, verbose, &mut io::stdout().lock());
}

/// Print a command result to a custom writer.
pub fn print_to<W: Write>(result: &CommandResult, verbose: bool, writer: &mut W) {
    match (&result.summary, result.format) {
        (CommandSummary::Scan(_), OutputFormat::Json) => {
            print_json(&scan_payload(&result.issues), writer);
        }
        (CommandSummary::Scan(summary), OutputFormat::Table) => {
            print_scan(summary, &result.issues, verbose, writer);
        }
        (CommandSummary::Unused(_), OutputFormat::Json) => {
            print_json(&unused_payload(&result.issues), writer);
        }
        (CommandSummary::Unused(summary), OutputFormat::Table) => {
            print_unused(summary, &result.issues, verbose, writer);
        }
        (CommandSummary::Format(summary), _) => print_format(summary, writer),
        (CommandSummary::Init(_), _) => {}
    }
}

// ============================================================
// Table output
// ============================================================

fn print_scan<W: Write>(summary: &ScanSummary, issues: &[Issue], verbose: bool, writer: &mut W) {
    print_header("Prepared scan for", &summary.scope, writer);
    let _ = writeln!(
        writer,
        "Reference index: {} unique ({} duplicates flagged across {} occurrences).",
        summary.unique_references, summary.duplicate_references, summary.total_references
    );

    report_to(issues, verbose, writer);
    if !issues.iter().any(|i| matches!(i, Issue::MissingTranslation(_))) {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            "No missing translations detected.".green()
        );
    }
    print_duplicate_count(summary.duplicate_references, writer);

    if let Some(write) = &summary.write {
        if write.planned == 0 {
            let _ = writeln!(writer, "No catalog entries need to be created.");
        } else if write.touched.is_empty() {
            let _ = writeln!(writer, "Catalog writer did not touch any files.");
        } else {
            print_touched(write, writer);
        }
    }
}

fn print_unused<W: Write>(
    summary: &UnusedSummary,
    issues: &[Issue],
    verbose: bool,
    writer: &mut W,
) {
    print_header("Prepared unused sweep for", &summary.scope, writer);

    report_to(issues, verbose, writer);
    if !issues.iter().any(|i| matches!(i, Issue::UnusedEntry(_))) {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            "No unused translations detected.".green()
        );
    }
    print_duplicate_count(summary.duplicate_references, writer);

    if let Some(delete) = &summary.delete {
        if delete.touched.is_empty() {
            let _ = writeln!(writer, "No catalog entries were deleted.");
        } else {
            print_touched(delete, writer);
        }
    }
}

fn print_format<W: Write>(summary: &FormatSummary, writer: &mut W) {
    let _ = writeln!(
        writer,
        "Prepared format run for {} (locales: {}, check-only: {}).",
        package_label(&summary.scope),
        locales_label(&summary.scope),
        yes_no(summary.check)
    );

    if summary.catalog_count == 0 {
        let _ = writeln!(writer, "No catalogs matched the given filters.");
        return;
    }

    if summary.check {
        if summary.changed.is_empty() {
            let _ = writeln!(writer, "All catalogs already match the canonical format.");
        }
        for file in &summary.changed {
            let _ = writeln!(writer, "Catalog requires formatting: {}", file);
        }
        return;
    }

    for file in &summary.changed {
        let _ = writeln!(writer, "Formatted catalog: {}", file);
    }
    if summary.changed.is_empty() {
        let _ = writeln!(writer, "Catalogs already normalized.");
    }
}

fn print_init(summary: &InitSummary) {
    if summary.created {
        println!(
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", summary.file_name).green()
        );
    } else {
        eprintln!("Error: {} already exists", summary.file_name);
    }
}

fn print_header<W: Write>(title: &str, scope: &RunScope, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} {} (locales: {}, format: table, dry-run: {}).",
        title,
        package_label(scope),
        locales_label(scope),
        yes_no(scope.dry_run)
    );
}

fn package_label(scope: &RunScope) -> &str {
    scope.package.as_deref().unwrap_or("all packages")
}

fn locales_label(scope: &RunScope) -> String {
    if scope.locales.is_empty() {
        "<none>".to_string()
    } else {
        scope.locales.join(", ")
    }
}

fn print_duplicate_count<W: Write>(count: usize, writer: &mut W) {
    if count > 0 {
        let _ = writeln!(writer, "Duplicate ids detected ({} occurrences).", count);
    }
}

fn print_touched<W: Write>(write: &WriteSummary, writer: &mut W) {
    for file in &write.touched {
        if write.dry_run {
            let _ = writeln!(writer, "{} {}", "Would touch catalog:".yellow(), file);
        } else {
            let _ = writeln!(writer, "{} {}", "Touched catalog:".green(), file);
        }
    }
}

/// Print issues in cargo style, then a problem count.
///
/// Duplicate references are only listed in verbose mode; their count is
/// always reported separately.
fn report_to<W: Write>(issues: &[Issue], verbose: bool, writer: &mut W) {
    let shown: Vec<&Issue> = issues
        .iter()
        .filter(|i| verbose || !matches!(i, Issue::DuplicateReference(_)))
        .collect();
    if shown.is_empty() {
        return;
    }

    for issue in &shown {
        print_issue(issue, writer);
    }
    print_summary(&shown, writer);
}

fn print_issue<W: Write>(issue: &Issue, writer: &mut W) {
    let severity_str = match issue.report_severity() {
        Severity::Error => "error".bold().red(),
        Severity::Warning => "warning".bold().yellow(),
    };

    let _ = writeln!(
        writer,
        "{}: \"{}\"  {}",
        severity_str,
        issue.message(),
        issue.report_rule().to_string().dimmed().cyan()
    );

    match issue.location() {
        ReportLocation::Line { path, line } => {
            let _ = writeln!(writer, "  {} {}:{}", "-->".blue(), path, line);
        }
        ReportLocation::File { path } => {
            let _ = writeln!(writer, "  {} {}", "-->".blue(), path);
        }
        ReportLocation::None => {}
    }

    for details in issue.details() {
        let _ = writeln!(writer, "   {} {} {}", "=".blue(), "note:".bold(), details);
    }

    if let Some(hint) = issue.hint() {
        let _ = writeln!(writer, "   {} {} {}", "=".blue(), "hint:".bold().cyan(), hint);
    }

    let _ = writeln!(writer); // Empty line between issues
}

fn print_summary<W: Write>(issues: &[&Issue], writer: &mut W) {
    let total_errors = issues
        .iter()
        .filter(|i| i.report_severity() == Severity::Error)
        .count();
    let total_warnings = issues.len() - total_errors;

    let _ = writeln!(
        writer,
        "{} {} problems ({} {}, {} {})",
        FAILURE_MARK.red(),
        issues.len(),
        total_errors,
        if total_errors == 1 { "error" } else { "errors" }.red(),
        total_warnings,
        if total_warnings == 1 {
            "warning"
        } else {
            "warnings"
        }
        .yellow()
    );
}

// ============================================================
// JSON output
// ============================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanPayload<'a> {
    missing: Vec<MissingRow<'a>>,
    warnings: Vec<WarningRow<'a>>,
    duplicates: Vec<DuplicateRow<'a>>,
    diagnostics: Diagnostics<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnusedPayload<'a> {
    unused: Vec<UnusedRow<'a>>,
    duplicates: Vec<DuplicateRow<'a>>,
    diagnostics: Diagnostics<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MissingRow<'a> {
    locale: &'a str,
    package: &'a str,
    source: &'a str,
    id: &'a str,
    issue: &'static str,
    fallback: Option<&'a str>,
    placeholders: &'a [String],
    file: &'a str,
    line: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WarningRow<'a> {
    locale: &'a str,
    package: &'a str,
    source: &'a str,
    id: &'a str,
    issue: &'static str,
    missing_placeholders: &'a [String],
    reference_placeholders: &'a [String],
    catalog_placeholders: &'a [String],
    file: &'a str,
    line: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnusedRow<'a> {
    locale: &'a str,
    package: &'a str,
    source: &'a str,
    id: &'a str,
    issue: &'static str,
    state: Option<&'a str>,
    source_text: Option<&'a str>,
    target_text: Option<&'a str>,
    file: &'a str,
}

#[derive(Serialize)]
struct DuplicateRow<'a> {
    package: &'a str,
    source: &'a str,
    id: &'a str,
    occurrences: usize,
    files: Vec<FileLine<'a>>,
}

#[derive(Serialize)]
struct FileLine<'a> {
    file: &'a str,
    line: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Diagnostics<'a> {
    errors: Vec<ErrorRow<'a>>,
    missing_catalogs: Vec<MissingCatalogRow<'a>>,
}

#[derive(Serialize)]
struct ErrorRow<'a> {
    message: &'a str,
    context: IndexMap<&'a str, &'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MissingCatalogRow<'a> {
    locale: &'a str,
    package_key: &'a str,
    source_name: &'a str,
}

fn scan_payload(issues: &[Issue]) -> ScanPayload<'_> {
    ScanPayload {
        missing: issues
            .iter()
            .filter_map(|issue| match issue {
                Issue::MissingTranslation(missing) => Some(missing_row(missing)),
                _ => None,
            })
            .collect(),
        warnings: issues
            .iter()
            .filter_map(|issue| match issue {
                Issue::PlaceholderMismatch(mismatch) => Some(warning_row(mismatch)),
                _ => None,
            })
            .collect(),
        duplicates: duplicate_rows(issues),
        diagnostics: diagnostics(issues),
    }
}

fn unused_payload(issues: &[Issue]) -> UnusedPayload<'_> {
    UnusedPayload {
        unused: issues
            .iter()
            .filter_map(|issue| match issue {
                Issue::UnusedEntry(unused) => Some(unused_row(unused)),
                _ => None,
            })
            .collect(),
        duplicates: duplicate_rows(issues),
        diagnostics: diagnostics(issues),
    }
}

fn missing_row(missing: &MissingTranslationIssue) -> MissingRow<'_> {
    MissingRow {
        locale: &missing.locale,
        package: &missing.key.package_key,
        source: &missing.key.source_name,
        id: &missing.key.identifier,
        issue: "missing",
        fallback: missing.fallback.as_deref(),
        placeholders: &missing.placeholders,
        file: &missing.occurrence.file,
        line: missing.occurrence.line,
    }
}

fn warning_row(mismatch: &PlaceholderMismatchIssue) -> WarningRow<'_> {
    WarningRow {
        locale: &mismatch.locale,
        package: &mismatch.key.package_key,
        source: &mismatch.key.source_name,
        id: &mismatch.key.identifier,
        issue: "placeholder-mismatch",
        missing_placeholders: &mismatch.missing,
        reference_placeholders: &mismatch.reference_placeholders,
        catalog_placeholders: &mismatch.catalog_placeholders,
        file: &mismatch.occurrence.file,
        line: mismatch.occurrence.line,
    }
}

fn unused_row(unused: &UnusedEntryIssue) -> UnusedRow<'_> {
    UnusedRow {
        locale: &unused.locale,
        package: &unused.key.package_key,
        source: &unused.key.source_name,
        id: &unused.key.identifier,
        issue: "unused",
        state: unused.state.as_deref(),
        source_text: unused.source_text.as_deref(),
        target_text: unused.target_text.as_deref(),
        file: &unused.file,
    }
}

fn duplicate_rows(issues: &[Issue]) -> Vec<DuplicateRow<'_>> {
    let mut duplicates: Vec<&DuplicateReferenceIssue> = issues
        .iter()
        .filter_map(|issue| match issue {
            Issue::DuplicateReference(duplicate) => Some(duplicate),
            _ => None,
        })
        .collect();
    duplicates.sort_by(|a, b| a.key.cmp(&b.key));

    duplicates
        .into_iter()
        .map(|duplicate| DuplicateRow {
            package: &duplicate.key.package_key,
            source: &duplicate.key.source_name,
            id: &duplicate.key.identifier,
            occurrences: duplicate.occurrences.len(),
            files: duplicate
                .occurrences
                .iter()
                .map(|o| FileLine {
                    file: &o.file,
                    line: o.line,
                })
                .collect(),
        })
        .collect()
}

fn diagnostics(issues: &[Issue]) -> Diagnostics<'_> {
    Diagnostics {
        errors: issues
            .iter()
            .filter_map(|issue| match issue {
                Issue::CatalogError(error) => Some(error_row(error)),
                _ => None,
            })
            .collect(),
        missing_catalogs: issues
            .iter()
            .filter_map(|issue| match issue {
                Issue::MissingCatalog(missing) => Some(missing_catalog_row(missing)),
                _ => None,
            })
            .collect(),
    }
}

fn error_row(error: &CatalogErrorIssue) -> ErrorRow<'_> {
    let mut context: IndexMap<&str, &str> = IndexMap::new();
    if let Some(file) = &error.file {
        context.insert("file", file);
    }
    for (name, value) in &error.context {
        context.insert(name, value);
    }
    ErrorRow {
        message: &error.message,
        context,
    }
}

fn missing_catalog_row(missing: &MissingCatalogIssue) -> MissingCatalogRow<'_> {
    MissingCatalogRow {
        locale: &missing.locale,
        package_key: &missing.package_key,
        source_name: &missing.source_name,
    }
}

fn print_json<W: Write, T: Serialize>(payload: &T, writer: &mut W) {
    match serde_json::to_string_pretty(payload) {
        Ok(json) => {
            let _ = writeln!(writer, "{}", json);
        }
        Err(e) => error!("failed to serialize report: {}", e),
    }
}

// ============================================================
// Tests
// ============================================================
