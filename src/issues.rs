//! Issue types for reconciliation results.
//!
//! Each issue is self-contained with everything the reporter needs. Paths
//! are stored relative to the project root.

use std::path::Path;

use enum_dispatch::enum_dispatch;

use crate::core::{
    catalog::CatalogError,
    catalog_index::{CatalogEntry, IndexError, MissingCatalog},
    file_scanner::relative_slash_path,
    key::{TranslationKey, TranslationReference},
    reconcile::{MissingTranslation, PlaceholderMismatch},
};

// ============================================================
// Severity and Rule
// ============================================================

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Rule identifier for each issue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rule {
    CatalogError,
    MissingTranslation,
    PlaceholderMismatch,
    UnusedEntry,
    DuplicateReference,
    MissingCatalog,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::CatalogError => write!(f, "catalog-error"),
            Rule::MissingTranslation => write!(f, "missing"),
            Rule::PlaceholderMismatch => write!(f, "placeholder-mismatch"),
            Rule::UnusedEntry => write!(f, "unused"),
            Rule::DuplicateReference => write!(f, "duplicate"),
            Rule::MissingCatalog => write!(f, "missing-catalog"),
        }
    }
}

/// A file position shown as `path:line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub file: String,
    pub line: usize,
}

impl Occurrence {
    pub fn of(reference: &TranslationReference, root: &Path) -> Self {
        Self {
            file: relative_slash_path(root, &reference.file_path),
            line: reference.line,
        }
    }
}

// ============================================================
// Issue Types - References
// ============================================================

/// A referenced key with no catalog entry for a locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTranslationIssue {
    pub locale: String,
    pub key: TranslationKey,
    /// Fallback text given at the reference, if any.
    pub fallback: Option<String>,
    pub placeholders: Vec<String>,
    pub occurrence: Occurrence,
}

impl MissingTranslationIssue {
    pub fn new(missing: &MissingTranslation, root: &Path) -> Self {
        let reference = &missing.reference;
        Self {
            locale: missing.locale.clone(),
            key: missing.key.clone(),
            fallback: reference.fallback.clone(),
            placeholders: reference.placeholders.keys().cloned().collect(),
            occurrence: Occurrence::of(reference, root),
        }
    }

    pub fn fallback_text(&self) -> Option<&str> {
        self.fallback.as_deref().filter(|f| !f.trim().is_empty())
    }

    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::MissingTranslation
    }
}

/// Placeholders used in catalog or fallback text but not passed by the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMismatchIssue {
    pub locale: String,
    pub key: TranslationKey,
    pub missing: Vec<String>,
    pub reference_placeholders: Vec<String>,
    pub catalog_placeholders: Vec<String>,
    pub occurrence: Occurrence,
}

impl PlaceholderMismatchIssue {
    pub fn new(mismatch: &PlaceholderMismatch, root: &Path) -> Self {
        Self {
            locale: mismatch.locale.clone(),
            key: mismatch.key.clone(),
            missing: mismatch.missing.clone(),
            reference_placeholders: mismatch.reference_placeholders.clone(),
            catalog_placeholders: mismatch.catalog_placeholders.clone(),
            occurrence: Occurrence::of(&mismatch.reference, root),
        }
    }

    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::PlaceholderMismatch
    }
}

/// The same key referenced more than once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReferenceIssue {
    pub key: TranslationKey,
    /// Canonical occurrence first.
    pub occurrences: Vec<Occurrence>,
}

impl DuplicateReferenceIssue {
    pub fn new(references: &[&TranslationReference], root: &Path) -> Option<Self> {
        let first = references.first()?;
        Some(Self {
            key: first.key.clone(),
            occurrences: references.iter().map(|r| Occurrence::of(r, root)).collect(),
        })
    }

    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::DuplicateReference
    }
}

// ============================================================
// Issue Types - Catalogs
// ============================================================

/// Catalog entry no reference points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedEntryIssue {
    pub locale: String,
    pub key: TranslationKey,
    pub state: Option<String>,
    pub source_text: Option<String>,
    pub target_text: Option<String>,
    pub file: String,
}

impl UnusedEntryIssue {
    pub fn new(entry: &CatalogEntry, root: &Path) -> Self {
        Self {
            locale: entry.locale.clone(),
            key: entry.key.clone(),
            state: entry.state.clone(),
            source_text: entry.source.clone(),
            target_text: entry.target.clone(),
            file: relative_slash_path(root, &entry.file_path),
        }
    }

    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::UnusedEntry
    }
}

/// A catalog that could not be indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogErrorIssue {
    pub message: String,
    pub file: Option<String>,
    /// Remaining context, excluding `file`.
    pub context: Vec<(String, String)>,
}

impl CatalogErrorIssue {
    pub fn new(error: &IndexError, root: &Path) -> Self {
        Self {
            message: error.message.clone(),
            file: error
                .context
                .get("file")
                .map(|file| relative_slash_path(root, Path::new(file))),
            context: error
                .context
                .iter()
                .filter(|(name, _)| *name != "file")
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }

    /// A catalog that failed while writing or deleting entries.
    pub fn from_catalog_error(error: &CatalogError, root: &Path) -> Self {
        Self {
            message: error.to_string(),
            file: Some(relative_slash_path(root, error.path())),
            context: Vec::new(),
        }
    }

    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::CatalogError
    }
}

/// A configured locale without a catalog for a known source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCatalogIssue {
    pub locale: String,
    pub package_key: String,
    pub source_name: String,
}

impl MissingCatalogIssue {
    pub fn new(missing: &MissingCatalog) -> Self {
        Self {
            locale: missing.locale.clone(),
            package_key: missing.package_key.clone(),
            source_name: missing.source_name.clone(),
        }
    }

    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::MissingCatalog
    }
}

// ============================================================
// Issue Enum
// ============================================================

#[enum_dispatch(Report)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    MissingTranslation(MissingTranslationIssue),
    PlaceholderMismatch(PlaceholderMismatchIssue),
    DuplicateReference(DuplicateReferenceIssue),
    UnusedEntry(UnusedEntryIssue),
    CatalogError(CatalogErrorIssue),
    MissingCatalog(MissingCatalogIssue),
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::MissingTranslation(_) => MissingTranslationIssue::severity(),
            Issue::PlaceholderMismatch(_) => PlaceholderMismatchIssue::severity(),
            Issue::DuplicateReference(_) => DuplicateReferenceIssue::severity(),
            Issue::UnusedEntry(_) => UnusedEntryIssue::severity(),
            Issue::CatalogError(_) => CatalogErrorIssue::severity(),
            Issue::MissingCatalog(_) => MissingCatalogIssue::severity(),
        }
    }

    pub fn rule(&self) -> Rule {
        match self {
            Issue::MissingTranslation(_) => MissingTranslationIssue::rule(),
            Issue::PlaceholderMismatch(_) => PlaceholderMismatchIssue::rule(),
            Issue::DuplicateReference(_) => DuplicateReferenceIssue::rule(),
            Issue::UnusedEntry(_) => UnusedEntryIssue::rule(),
            Issue::CatalogError(_) => CatalogErrorIssue::rule(),
            Issue::MissingCatalog(_) => MissingCatalogIssue::rule(),
        }
    }
}

// ============================================================
// Report Trait (for CLI output)
// ============================================================

/// Location information for report output.
pub enum ReportLocation<'a> {
    /// A line in a source file.
    Line { path: &'a str, line: usize },
    /// A whole file (catalogs).
    File { path: &'a str },
    /// Not tied to a file.
    None,
}

/// Trait for types that can be reported to CLI.
#[enum_dispatch]
pub trait Report {
    fn location(&self) -> ReportLocation<'_>;

    /// Primary message to display (key, error text).
    fn message(&self) -> String;

    fn report_severity(&self) -> Severity;

    fn report_rule(&self) -> Rule;

    /// Optional details for the "= note:" lines.
    fn details(&self) -> Vec<String> {
        Vec::new()
    }

    fn hint(&self) -> Option<String> {
        None
    }
}

// ============================================================
// Report Implementations
// ============================================================

impl Report for MissingTranslationIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Line {
            path: &self.occurrence.file,
            line: self.occurrence.line,
        }
    }

    fn message(&self) -> String {
        self.key.to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn details(&self) -> Vec<String> {
        match self.fallback_text() {
            Some(fallback) => vec![format!("missing in {} (\"{}\")", self.locale, fallback)],
            None => vec![format!("missing in {}", self.locale)],
        }
    }
}

impl Report for PlaceholderMismatchIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Line {
            path: &self.occurrence.file,
            line: self.occurrence.line,
        }
    }

    fn message(&self) -> String {
        self.key.to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn details(&self) -> Vec<String> {
        vec![
            format!(
                "{}: placeholders not passed by the reference: {}",
                self.locale,
                self.missing.join(", ")
            ),
            format!(
                "reference passes: {}",
                list_or_none(&self.reference_placeholders)
            ),
        ]
    }
}

impl Report for DuplicateReferenceIssue {
    fn location(&self) -> ReportLocation<'_> {
        match self.occurrences.first() {
            Some(first) => ReportLocation::Line {
                path: &first.file,
                line: first.line,
            },
            None => ReportLocation::None,
        }
    }

    fn message(&self) -> String {
        self.key.to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn details(&self) -> Vec<String> {
        self.occurrences
            .iter()
            .skip(1)
            .map(|o| format!("also referenced at {}:{}", o.file, o.line))
            .collect()
    }
}

impl Report for UnusedEntryIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::File { path: &self.file }
    }

    fn message(&self) -> String {
        self.key.to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn details(&self) -> Vec<String> {
        let text = self
            .target_text
            .as_deref()
            .or(self.source_text.as_deref())
            .unwrap_or_default();
        vec![format!("{} (\"{}\")", self.locale, text)]
    }
}

impl Report for CatalogErrorIssue {
    fn location(&self) -> ReportLocation<'_> {
        match &self.file {
            Some(path) => ReportLocation::File { path },
            None => ReportLocation::None,
        }
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn details(&self) -> Vec<String> {
        if self.context.is_empty() {
            return Vec::new();
        }
        let context: Vec<String> = self
            .context
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        vec![context.join(" ")]
    }
}

impl Report for MissingCatalogIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::None
    }

    fn message(&self) -> String {
        format!("{}:{}", self.package_key, self.source_name)
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn details(&self) -> Vec<String> {
        vec![format!("no catalog for locale {}", self.locale)]
    }

    fn hint(&self) -> Option<String> {
        Some("run `l10nguy scan --update` to create it".to_string())
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "<none>".to_string()
    } else {
        items.join(", ")
    }
}

// ============================================================
// Ordering for Issue (for sorting in reports)
// ============================================================

impl Issue {
    fn sort_file_path(&self) -> Option<&str> {
        match self.location() {
            ReportLocation::Line { path, .. } | ReportLocation::File { path } => Some(path),
            ReportLocation::None => None,
        }
    }

    fn sort_line(&self) -> usize {
        match self.location() {
            ReportLocation::Line { line, .. } => line,
            _ => 0,
        }
    }
}

impl Ord for Issue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        // file path (None last), line, rule, message
        match (self.sort_file_path(), other.sort_file_path()) {
            (Some(a), Some(b)) => a
                .cmp(b)
                .then_with(|| self.sort_line().cmp(&other.sort_line()))
                .then_with(|| self.rule().cmp(&other.rule()))
                .then_with(|| self.message().cmp(&other.message()))
                .then_with(|| self.details().cmp(&other.details())),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self
                .rule()
                .cmp(&other.rule())
                .then_with(|| self.message().cmp(&other.message()))
                .then_with(|| self.details().cmp(&other.details())),
        }
    }
}

impl PartialOrd for Issue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================
// Tests
// ============================================================
