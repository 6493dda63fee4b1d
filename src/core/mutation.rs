//! Turning missing translations into catalog edits, and applying them.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::{
    catalog::{
        CatalogDocument, CatalogError, NOTE_AUTHOR, Note, TransUnit,
        path::resolve_catalog_path,
        writer::{CatalogRenderer, ResolvedMetadata, persist},
    },
    catalog_index::{CatalogEntry, CatalogIndex},
    key::TranslationKey,
    reconcile::MissingTranslation,
};

/// Where an LLM-provided text came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmProvenance {
    pub provider: Option<String>,
    pub model: Option<String>,
    /// RFC 3339 timestamp.
    pub generated_at: Option<String>,
}

/// A unit to add to a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMutation {
    pub locale: String,
    pub key: TranslationKey,
    pub fallback: String,
    pub source: String,
    pub target: String,
    pub placeholders: IndexMap<String, String>,
    pub llm: Option<LlmProvenance>,
}

impl CatalogMutation {
    pub fn new(
        locale: impl Into<String>,
        key: TranslationKey,
        fallback: impl Into<String>,
        placeholders: IndexMap<String, String>,
    ) -> Self {
        let fallback = fallback.into();
        Self {
            locale: locale.into(),
            key: key.with_identifier(key.identifier.trim()),
            source: fallback.clone(),
            target: fallback.clone(),
            fallback,
            placeholders,
            llm: None,
        }
    }

    pub fn is_llm_generated(&self) -> bool {
        self.llm.is_some()
    }

    pub fn from_missing(missing: &MissingTranslation) -> Self {
        let reference = &missing.reference;
        let fallback = reference.fallback_text().map_or_else(
            || fallback_with_placeholder_hints(&missing.key.identifier, &reference.placeholders),
            str::to_string,
        );
        Self::new(
            &missing.locale,
            missing.key.clone(),
            fallback,
            reference.placeholders.clone(),
        )
    }
}

pub fn mutations_from_missing(missing: &[MissingTranslation]) -> Vec<CatalogMutation> {
    missing.iter().map(CatalogMutation::from_missing).collect()
}

/// `identifier {a} {b}` for references without a literal fallback.
pub fn fallback_with_placeholder_hints(
    identifier: &str,
    placeholders: &IndexMap<String, String>,
) -> String {
    let hints: Vec<String> = placeholders.keys().map(|name| format!("{{{}}}", name)).collect();
    format!("{} {}", identifier, hints.join(" ")).trim().to_string()
}

/// State written on new units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitState {
    pub state: Option<String>,
    pub qualifier: Option<String>,
}

impl UnitState {
    pub fn new(state: Option<&str>, qualifier: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            state: clean(state),
            qualifier: clean(qualifier),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WriterSettings {
    pub renderer: CatalogRenderer,
    /// State for regular new units.
    pub state: UnitState,
    /// State for LLM-generated units. Unset parts fall back to `state`.
    pub llm_state: UnitState,
    /// Add a provenance `<note>` to LLM-generated units.
    pub llm_notes: bool,
    pub dry_run: bool,
}

/// Result of a write or delete run.
///
/// A catalog that cannot be loaded or persisted fails only its own group.
#[derive(Debug, Default)]
pub struct WriteOutcome {
    /// Files that were (or, in dry-run mode, would be) touched.
    pub touched: Vec<PathBuf>,
    pub failures: Vec<CatalogError>,
}

impl WriteOutcome {
    fn record(&mut self, path: &Path) {
        if !self.touched.iter().any(|p| p == path) {
            self.touched.push(path.to_path_buf());
        }
    }

    fn fail(&mut self, error: CatalogError) {
        warn!(error = %error, "skipping catalog");
        self.failures.push(error);
    }
}

/// Applies mutations and deletions to catalog files.
pub struct CatalogWriter<'a> {
    base_dir: &'a Path,
    paths: &'a [String],
    settings: WriterSettings,
}

impl<'a> CatalogWriter<'a> {
    /// `paths` are the configured discovery roots, used to place catalogs
    /// that do not exist yet.
    pub fn new(base_dir: &'a Path, paths: &'a [String], settings: WriterSettings) -> Self {
        Self {
            base_dir,
            paths,
            settings,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.settings.dry_run
    }

    /// Add the mutations to their catalogs. Existing units are never
    /// replaced.
    pub fn write(&self, mutations: &[CatalogMutation], catalogs: &CatalogIndex) -> WriteOutcome {
        let mut groups: IndexMap<(&str, &str, &str), Vec<&CatalogMutation>> = IndexMap::new();
        for mutation in mutations {
            groups
                .entry((
                    mutation.locale.as_str(),
                    mutation.key.package_key.as_str(),
                    mutation.key.source_name.as_str(),
                ))
                .or_default()
                .push(mutation);
        }

        let mut outcome = WriteOutcome::default();
        for ((locale, package_key, source_name), group) in groups {
            let path = catalogs
                .catalog_path(locale, package_key, source_name)
                .map(Path::to_path_buf)
                .or_else(|| {
                    resolve_catalog_path(self.base_dir, self.paths, package_key, locale, source_name)
                });
            let Some(path) = path else {
                debug!(locale, package_key, source_name, "no catalog location, skipping");
                continue;
            };

            let mut document = match CatalogDocument::load(&path) {
                Ok(document) => document,
                Err(e) => {
                    outcome.fail(e);
                    continue;
                }
            };
            let metadata = ResolvedMetadata::resolve(&document.metadata, package_key, locale);
            let write_target = metadata.writes_target(locale);

            let mut updated = false;
            for mutation in group {
                let unit = self.build_unit(mutation, write_target);
                updated |= document.insert_unit(&mutation.key.identifier, unit);
            }
            if !updated {
                continue;
            }

            match self.persist(&path, &document, &metadata) {
                Ok(()) => outcome.record(&path),
                Err(e) => outcome.fail(e),
            }
        }

        outcome
    }

    /// Remove the given entries from their catalog files.
    pub fn delete_entries(&self, entries: &[&CatalogEntry]) -> WriteOutcome {
        let mut groups: IndexMap<&Path, Vec<&CatalogEntry>> = IndexMap::new();
        for entry in entries {
            groups.entry(entry.file_path.as_path()).or_default().push(entry);
        }

        let mut outcome = WriteOutcome::default();
        for (path, group) in groups {
            if !path.is_file() {
                continue;
            }

            let mut document = match CatalogDocument::load(path) {
                Ok(document) => document,
                Err(e) => {
                    outcome.fail(e);
                    continue;
                }
            };
            let first = group[0];
            let metadata = ResolvedMetadata::resolve(
                &document.metadata,
                &first.key.package_key,
                &first.locale,
            );

            let mut updated = false;
            for entry in group {
                updated |= document.remove_unit(&entry.key.identifier);
            }
            if !updated {
                continue;
            }

            match self.persist(path, &document, &metadata) {
                Ok(()) => outcome.record(path),
                Err(e) => outcome.fail(e),
            }
        }

        outcome
    }

    fn persist(
        &self,
        path: &Path,
        document: &CatalogDocument,
        metadata: &ResolvedMetadata,
    ) -> Result<(), CatalogError> {
        if self.settings.dry_run {
            debug!(path = %path.display(), "dry run, not writing");
            return Ok(());
        }
        persist(path, &self.settings.renderer.render(document, metadata))
    }

    fn build_unit(&self, mutation: &CatalogMutation, write_target: bool) -> TransUnit {
        let state = self.state_for(mutation);

        let mut source = mutation.source.clone();
        if !write_target && !mutation.target.is_empty() && mutation.target != source {
            source = mutation.target.clone();
        }

        let mut source_attributes = Vec::new();
        let mut target_attributes = Vec::new();
        let attributes = if write_target {
            &mut target_attributes
        } else {
            &mut source_attributes
        };
        if !write_target && let Some(value) = &state.state {
            attributes.push(("state".to_string(), value.clone()));
        }
        if let Some(qualifier) = &state.qualifier {
            attributes.push(("state-qualifier".to_string(), qualifier.clone()));
        }

        TransUnit {
            source: Some(source),
            target: write_target.then(|| mutation.target.clone()),
            state: state.state.filter(|_| write_target),
            source_attributes,
            target_attributes,
            has_source: true,
            has_target: write_target && !mutation.target.is_empty(),
            notes: self.notes_for(mutation),
            ..Default::default()
        }
    }

    fn state_for(&self, mutation: &CatalogMutation) -> UnitState {
        let regular = &self.settings.state;
        if !mutation.is_llm_generated() {
            return regular.clone();
        }
        let llm = &self.settings.llm_state;
        UnitState {
            state: llm.state.clone().or_else(|| regular.state.clone()),
            qualifier: llm.qualifier.clone().or_else(|| regular.qualifier.clone()),
        }
    }

    fn notes_for(&self, mutation: &CatalogMutation) -> Vec<Note> {
        let Some(provenance) = mutation.llm.as_ref().filter(|_| self.settings.llm_notes) else {
            return Vec::new();
        };

        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        let parts: Vec<String> = [
            non_empty(&provenance.provider).map(|p| format!("provider:{}", p)),
            non_empty(&provenance.model).map(|m| format!("model:{}", m)),
            non_empty(&provenance.generated_at).map(|g| format!("generated:{}", g)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            return Vec::new();
        }
        vec![Note {
            from: Some(NOTE_AUTHOR.to_string()),
            content: parts.join(" "),
        }]
    }
}
