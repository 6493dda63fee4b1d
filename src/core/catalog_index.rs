//! Index of catalog entries by locale, package and source.
//!
//! Built in two steps: [`load_catalogs`] parses every catalog file that
//! follows the path contract, then [`build_index`] registers them for the
//! requested locales. Entry texts go through a [`LocaleMergeProvider`] so a
//! regional catalog can inherit texts from its language catalog.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::{Result, bail};
use indexmap::IndexMap;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, error, warn};

use crate::core::{
    catalog::{
        CatalogDocument, CatalogError, CatalogMetadata, CatalogUnit, TransUnit,
        path::{CatalogLocation, is_catalog_file},
    },
    key::{TranslationKey, plural_form_id},
};

pub const MERGE_PROVIDER_FAILED: &str = "Failed to load catalog via locale merge provider";

static LOCALE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2,3}(?:[_-][A-Za-z0-9]{2,8})*$").unwrap());

/// One unit of an existing catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub locale: String,
    pub key: TranslationKey,
    pub file_path: PathBuf,
    pub source: Option<String>,
    pub target: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFile {
    pub path: PathBuf,
    pub metadata: CatalogMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MissingCatalog {
    pub locale: String,
    pub package_key: String,
    pub source_name: String,
}

/// A problem found while building the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexError {
    pub message: String,
    pub context: IndexMap<String, String>,
}

/// Which catalogs take part in a run.
#[derive(Debug, Clone, Default)]
pub struct IndexFilters {
    /// Locales to index and check for missing catalogs. Empty means all.
    pub locales: Vec<String>,
    pub package: Option<String>,
    pub source: Option<String>,
}

impl IndexFilters {
    pub fn accepts(&self, package_key: &str, source_name: &str) -> bool {
        self.package.as_deref().is_none_or(|p| p == package_key)
            && self.source.as_deref().is_none_or(|s| s == source_name)
    }

    fn accepts_locale(&self, locale: &str) -> bool {
        self.locales.is_empty() || self.locales.iter().any(|l| l == locale)
    }
}

#[derive(Debug, Default)]
pub struct CatalogIndex {
    entries: BTreeMap<String, BTreeMap<TranslationKey, CatalogEntry>>,
    plural_groups: BTreeMap<String, BTreeMap<TranslationKey, Vec<String>>>,
    files: BTreeMap<String, BTreeMap<(String, String), CatalogFile>>,
    sources: BTreeSet<(String, String)>,
    missing_catalogs: Vec<MissingCatalog>,
    errors: Vec<IndexError>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: CatalogEntry) {
        self.sources.insert((
            entry.key.package_key.clone(),
            entry.key.source_name.clone(),
        ));
        self.entries
            .entry(entry.locale.clone())
            .or_default()
            .insert(entry.key.clone(), entry);
    }

    /// Record `form_id` as a form of the plural group `base`.
    pub fn add_plural_form(&mut self, locale: &str, base: TranslationKey, form_id: String) {
        let forms = self
            .plural_groups
            .entry(locale.to_string())
            .or_default()
            .entry(base)
            .or_default();
        if !forms.contains(&form_id) {
            forms.push(form_id);
        }
    }

    pub fn register_catalog_file(
        &mut self,
        locale: &str,
        package_key: &str,
        source_name: &str,
        path: PathBuf,
        metadata: CatalogMetadata,
    ) {
        self.sources
            .insert((package_key.to_string(), source_name.to_string()));
        self.files.entry(locale.to_string()).or_default().insert(
            (package_key.to_string(), source_name.to_string()),
            CatalogFile { path, metadata },
        );
    }

    fn catalog_file(&self, locale: &str, package_key: &str, source_name: &str) -> Option<&CatalogFile> {
        self.files
            .get(locale)?
            .get(&(package_key.to_string(), source_name.to_string()))
    }

    pub fn catalog_path(&self, locale: &str, package_key: &str, source_name: &str) -> Option<&Path> {
        self.catalog_file(locale, package_key, source_name)
            .map(|file| file.path.as_path())
    }

    pub fn catalog_metadata(
        &self,
        locale: &str,
        package_key: &str,
        source_name: &str,
    ) -> Option<&CatalogMetadata> {
        self.catalog_file(locale, package_key, source_name)
            .map(|file| &file.metadata)
    }

    /// Every registered catalog as `(locale, package, source, file)`.
    pub fn catalog_files(&self) -> impl Iterator<Item = (&str, &str, &str, &CatalogFile)> {
        self.files.iter().flat_map(|(locale, files)| {
            files.iter().map(move |((package, source), file)| {
                (locale.as_str(), package.as_str(), source.as_str(), file)
            })
        })
    }

    /// Locales with a catalog file or an entry, sorted.
    pub fn locales(&self) -> Vec<String> {
        let locales: BTreeSet<&String> = self.files.keys().chain(self.entries.keys()).collect();
        locales.into_iter().cloned().collect()
    }

    pub fn entry(&self, locale: &str, key: &TranslationKey) -> Option<&CatalogEntry> {
        self.entries.get(locale)?.get(key)
    }

    /// All entries, by locale then key.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values().flat_map(|entries| entries.values())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Concrete form ids of the plural group `base`, if there is one.
    pub fn plural_group(&self, locale: &str, base: &TranslationKey) -> Option<&[String]> {
        self.plural_groups
            .get(locale)?
            .get(base)
            .map(Vec::as_slice)
    }

    /// Known `(package, source)` pairs, sorted.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources
            .iter()
            .map(|(package, source)| (package.as_str(), source.as_str()))
    }

    pub fn mark_missing_catalog(&mut self, locale: &str, package_key: &str, source_name: &str) {
        self.missing_catalogs.push(MissingCatalog {
            locale: locale.to_string(),
            package_key: package_key.to_string(),
            source_name: source_name.to_string(),
        });
    }

    pub fn missing_catalogs(&self) -> &[MissingCatalog] {
        &self.missing_catalogs
    }

    pub fn add_error(&mut self, message: impl Into<String>, context: IndexMap<String, String>) {
        self.errors.push(IndexError {
            message: message.into(),
            context,
        });
    }

    pub fn errors(&self) -> &[IndexError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ============================================================
// Locale merging
// ============================================================

/// Merged source and target text of one unit in one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedUnit {
    pub source: Option<String>,
    pub target: Option<String>,
}

impl MergedUnit {
    fn from_unit(unit: &TransUnit) -> Self {
        Self {
            source: unit.source.clone(),
            target: unit.target.clone(),
        }
    }
}

/// Resolves the texts a locale sees for one catalog, after fallback.
///
/// `file_id` is `<package>:<source>`. Each identifier maps to its
/// candidates, most specific first.
pub trait LocaleMergeProvider {
    fn merged_units(
        &self,
        file_id: &str,
        locale: &str,
    ) -> Result<IndexMap<String, Vec<MergedUnit>>>;
}

/// Merges the loaded catalogs along a locale chain: the locale, its
/// parents (`de_CH` then `de`), then the configured fallback locales.
#[derive(Debug, Default)]
pub struct FallbackChainProvider {
    catalogs: HashMap<(String, String), Vec<(String, MergedUnit)>>,
    fallback_locales: Vec<String>,
}

impl FallbackChainProvider {
    pub fn new(catalogs: &[LoadedCatalog], fallback_locales: &[String]) -> Self {
        let mut by_locale = HashMap::new();
        for catalog in catalogs {
            let Ok(document) = &catalog.document else {
                continue;
            };
            let units = document
                .concrete_units()
                .into_iter()
                .map(|(id, unit)| (id, MergedUnit::from_unit(unit)))
                .collect();
            by_locale.insert(
                (catalog.location.locale.clone(), catalog.file_id()),
                units,
            );
        }
        Self {
            catalogs: by_locale,
            fallback_locales: fallback_locales.to_vec(),
        }
    }

    pub fn locale_chain(&self, locale: &str) -> Result<Vec<String>> {
        if !LOCALE.is_match(locale) {
            bail!("\"{}\" is not a valid locale identifier", locale);
        }
        let mut chain = vec![locale.to_string()];
        let mut current = locale;
        while let Some(position) = current.rfind(['_', '-']) {
            current = &current[..position];
            chain.push(current.to_string());
        }
        for fallback in &self.fallback_locales {
            if !chain.contains(fallback) {
                chain.push(fallback.clone());
            }
        }
        Ok(chain)
    }
}

impl LocaleMergeProvider for FallbackChainProvider {
    fn merged_units(
        &self,
        file_id: &str,
        locale: &str,
    ) -> Result<IndexMap<String, Vec<MergedUnit>>> {
        let mut merged: IndexMap<String, Vec<MergedUnit>> = IndexMap::new();
        for chain_locale in self.locale_chain(locale)? {
            let Some(units) = self.catalogs.get(&(chain_locale, file_id.to_string())) else {
                continue;
            };
            for (id, unit) in units {
                merged.entry(id.clone()).or_default().push(unit.clone());
            }
        }
        Ok(merged)
    }
}

// ============================================================
// Building
// ============================================================

/// A catalog file with its inferred location and parse result.
#[derive(Debug)]
pub struct LoadedCatalog {
    pub path: PathBuf,
    pub location: CatalogLocation,
    pub document: Result<CatalogDocument, CatalogError>,
}

impl LoadedCatalog {
    pub fn file_id(&self) -> String {
        format!(
            "{}:{}",
            self.location.package_key, self.location.source_name
        )
    }
}

/// Parse every catalog file among `files` that matches the path contract
/// and the package/source filters. Locale filtering happens later so that
/// fallback locales stay available for merging.
pub fn load_catalogs(files: &[PathBuf], filters: &IndexFilters) -> Vec<LoadedCatalog> {
    let candidates: Vec<(PathBuf, CatalogLocation)> = files
        .iter()
        .filter(|path| is_catalog_file(path))
        .filter_map(|path| {
            let location = CatalogLocation::from_path(path, filters.package.as_deref());
            if location.is_none() {
                debug!(path = %path.display(), "not a catalog location, skipping");
            }
            location.map(|location| (path.clone(), location))
        })
        .filter(|(_, location)| filters.accepts(&location.package_key, &location.source_name))
        .collect();

    candidates
        .into_par_iter()
        .map(|(path, location)| {
            let document = CatalogDocument::load(&path);
            LoadedCatalog {
                path,
                location,
                document,
            }
        })
        .collect()
}

/// Register the loaded catalogs for the filtered locales and record
/// catalogs missing for any configured locale.
pub fn build_index(
    catalogs: &[LoadedCatalog],
    filters: &IndexFilters,
    provider: &dyn LocaleMergeProvider,
) -> CatalogIndex {
    let mut index = CatalogIndex::new();

    for catalog in catalogs {
        let location = &catalog.location;
        if !filters.accepts_locale(&location.locale) {
            continue;
        }

        match &catalog.document {
            Ok(document) => {
                index.register_catalog_file(
                    &location.locale,
                    &location.package_key,
                    &location.source_name,
                    catalog.path.clone(),
                    document.metadata.clone(),
                );
                add_entries(&mut index, catalog, document, provider);
            }
            Err(e) => {
                error!(file = %catalog.path.display(), "{}", e);
                index.add_error(e.to_string(), catalog_context(catalog));
                index.register_catalog_file(
                    &location.locale,
                    &location.package_key,
                    &location.source_name,
                    catalog.path.clone(),
                    CatalogMetadata::default(),
                );
            }
        }
    }

    detect_missing_catalogs(&mut index, filters);
    index
}

fn add_entries(
    index: &mut CatalogIndex,
    catalog: &LoadedCatalog,
    document: &CatalogDocument,
    provider: &dyn LocaleMergeProvider,
) {
    if document.is_empty() {
        return;
    }

    let location = &catalog.location;
    let merged = match provider.merged_units(&catalog.file_id(), &location.locale) {
        Ok(merged) => merged,
        Err(e) => {
            error!(file = %catalog.path.display(), "{}: {}", MERGE_PROVIDER_FAILED, e);
            let mut context = catalog_context(catalog);
            context.insert("reason".to_string(), e.to_string());
            index.add_error(MERGE_PROVIDER_FAILED, context);
            IndexMap::new()
        }
    };

    let base_key = TranslationKey::new(&location.package_key, &location.source_name, "");
    let add = |index: &mut CatalogIndex, id: String, unit: &TransUnit| {
        let resolved = merged
            .get(&id)
            .and_then(|candidates| candidates.first().cloned())
            .unwrap_or_else(|| MergedUnit::from_unit(unit));
        index.add_entry(CatalogEntry {
            locale: location.locale.clone(),
            key: base_key.with_identifier(id),
            file_path: catalog.path.clone(),
            source: resolved.source,
            target: resolved.target,
            state: unit.state.clone(),
        });
    };

    for (id, unit) in &document.units {
        match unit {
            CatalogUnit::Single(unit) => add(index, id.clone(), unit),
            CatalogUnit::Plural(group) => {
                for (form_index, form) in &group.forms {
                    let form_id = plural_form_id(id, *form_index);
                    index.add_plural_form(
                        &location.locale,
                        base_key.with_identifier(id.as_str()),
                        form_id.clone(),
                    );
                    add(index, form_id, form);
                }
            }
        }
    }
}

fn catalog_context(catalog: &LoadedCatalog) -> IndexMap<String, String> {
    IndexMap::from([
        ("file".to_string(), catalog.path.display().to_string()),
        ("locale".to_string(), catalog.location.locale.clone()),
        ("packageKey".to_string(), catalog.location.package_key.clone()),
        ("sourceName".to_string(), catalog.location.source_name.clone()),
    ])
}

fn detect_missing_catalogs(index: &mut CatalogIndex, filters: &IndexFilters) {
    let sources: Vec<(String, String)> = index
        .sources()
        .filter(|(package, source)| filters.accepts(package, source))
        .map(|(package, source)| (package.to_string(), source.to_string()))
        .collect();

    for (package, source) in sources {
        for locale in &filters.locales {
            if index.catalog_path(locale, &package, &source).is_none() {
                warn!(%locale, %package, %source, "missing catalog");
                index.mark_missing_catalog(locale, &package, &source);
            }
        }
    }
}
