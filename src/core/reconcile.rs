//! Reconciliation of references against catalogs.
//!
//! For every canonical reference and locale a catalog entry is expected.
//! Plural references expect one entry per form in [`PLURAL_FORMS`]. Entries
//! that exist are checked for placeholders the reference does not pass.

use std::{collections::BTreeSet, sync::LazyLock};

use glob::Pattern;
use regex::Regex;
use tracing::warn;

use crate::core::{
    catalog_index::{CatalogEntry, CatalogIndex},
    key::{PLURAL_FORMS, TranslationKey, TranslationReference, split_plural_form},
    reference_index::ReferenceIndex,
};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_.:-]+)\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTranslation {
    pub locale: String,
    pub key: TranslationKey,
    pub reference: TranslationReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMismatch {
    pub locale: String,
    pub key: TranslationKey,
    /// Names found in catalog or fallback text but not passed by the
    /// reference, sorted.
    pub missing: Vec<String>,
    /// Names the reference passes, in call order.
    pub reference_placeholders: Vec<String>,
    /// Names found in the catalog entry, sorted.
    pub catalog_placeholders: Vec<String>,
    pub reference: TranslationReference,
    pub entry: Option<CatalogEntry>,
}

/// Scope of a reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Locales to check. Empty means every locale known to the catalogs.
    pub locales: Vec<String>,
    pub package: Option<String>,
    pub source: Option<String>,
    /// Only identifiers matching one of these patterns. Empty means all.
    pub id_patterns: Vec<Pattern>,
}

impl ReconcileOptions {
    fn accepts(&self, key: &TranslationKey) -> bool {
        self.package.as_deref().is_none_or(|p| p == key.package_key)
            && self.source.as_deref().is_none_or(|s| s == key.source_name)
            && (self.id_patterns.is_empty()
                || self.id_patterns.iter().any(|p| p.matches(&key.identifier)))
    }
}

#[derive(Debug, Default)]
pub struct Reconciliation {
    pub missing: Vec<MissingTranslation>,
    pub mismatches: Vec<PlaceholderMismatch>,
}

pub fn reconcile(
    references: &ReferenceIndex,
    catalogs: &CatalogIndex,
    options: &ReconcileOptions,
) -> Reconciliation {
    let locales = if options.locales.is_empty() {
        catalogs.locales()
    } else {
        options.locales.clone()
    };

    let mut result = Reconciliation::default();
    for reference in references.references() {
        if !options.accepts(&reference.key) {
            continue;
        }
        for locale in &locales {
            reconcile_reference(&mut result, reference, catalogs, locale);
        }
    }

    for mismatch in &result.mismatches {
        warn!(
            locale = %mismatch.locale,
            key = %mismatch.key,
            missing = ?mismatch.missing,
            "placeholder mismatch"
        );
    }
    result
}

fn reconcile_reference(
    result: &mut Reconciliation,
    reference: &TranslationReference,
    catalogs: &CatalogIndex,
    locale: &str,
) {
    let key = &reference.key;
    let missing = |key: TranslationKey| MissingTranslation {
        locale: locale.to_string(),
        key,
        reference: reference.clone(),
    };

    if reference.is_plural {
        let forms = catalogs.plural_group(locale, key).unwrap_or_default();
        let present: Vec<usize> = forms
            .iter()
            .filter_map(|id| split_plural_form(id).map(|(_, index)| index))
            .collect();
        for index in PLURAL_FORMS {
            if !present.contains(&index) {
                result.missing.push(missing(key.plural_form(index)));
            }
        }
        check_group(result, reference, catalogs, locale, forms);
        return;
    }

    match catalogs.entry(locale, key) {
        Some(entry) => check_entry(result, reference, locale, key, Some(entry)),
        None => match catalogs.plural_group(locale, key) {
            Some(forms) => check_group(result, reference, catalogs, locale, forms),
            None => result.missing.push(missing(key.clone())),
        },
    }
}

fn check_group(
    result: &mut Reconciliation,
    reference: &TranslationReference,
    catalogs: &CatalogIndex,
    locale: &str,
    forms: &[String],
) {
    for form in forms {
        let key = reference.key.with_identifier(form.as_str());
        if let Some(entry) = catalogs.entry(locale, &key) {
            check_entry(result, reference, locale, &key, Some(entry));
        }
    }
}

fn check_entry(
    result: &mut Reconciliation,
    reference: &TranslationReference,
    locale: &str,
    key: &TranslationKey,
    entry: Option<&CatalogEntry>,
) {
    if let Some(mismatch) = detect_mismatch(reference, locale, key, entry) {
        result.mismatches.push(mismatch);
    }
}

/// Compare the placeholders used in catalog and fallback text with the
/// ones the reference passes.
pub fn detect_mismatch(
    reference: &TranslationReference,
    locale: &str,
    key: &TranslationKey,
    entry: Option<&CatalogEntry>,
) -> Option<PlaceholderMismatch> {
    let catalog_placeholders: BTreeSet<String> = entry
        .into_iter()
        .flat_map(|e| [e.source.as_deref(), e.target.as_deref()])
        .flatten()
        .flat_map(placeholder_names)
        .collect();

    let mut expected = catalog_placeholders.clone();
    expected.extend(reference.fallback.as_deref().map(placeholder_names).unwrap_or_default());

    let missing: Vec<String> = expected
        .into_iter()
        .filter(|name| !reference.placeholders.contains_key(name))
        .collect();
    if missing.is_empty() {
        return None;
    }

    Some(PlaceholderMismatch {
        locale: locale.to_string(),
        key: key.clone(),
        missing,
        reference_placeholders: reference.placeholders.keys().cloned().collect(),
        catalog_placeholders: catalog_placeholders.into_iter().collect(),
        reference: reference.clone(),
        entry: entry.cloned(),
    })
}

/// Sorted, unique `{name}` tokens of `text`.
pub fn placeholder_names(text: &str) -> BTreeSet<String> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Catalog entries no reference points at.
///
/// An entry counts as used when its key is referenced, or when it is a
/// plural form whose base is referenced.
pub fn find_unused<'a>(
    references: &ReferenceIndex,
    catalogs: &'a CatalogIndex,
    options: &ReconcileOptions,
) -> Vec<&'a CatalogEntry> {
    catalogs
        .entries()
        .filter(|entry| options.locales.is_empty() || options.locales.contains(&entry.locale))
        .filter(|entry| options.accepts(&entry.key))
        .filter(|entry| !is_referenced(references, &entry.key))
        .collect()
}

fn is_referenced(references: &ReferenceIndex, key: &TranslationKey) -> bool {
    if references.contains(key) {
        return true;
    }
    split_plural_form(&key.identifier)
        .is_some_and(|(base, _)| references.contains(&key.with_identifier(base)))
}
