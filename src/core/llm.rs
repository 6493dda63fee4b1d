//! Machine translation of missing entries through an external provider.
//!
//! No provider ships with the crate. Anything implementing
//! [`TranslationProvider`] can fill the targets of pending mutations.

use std::{fs, path::Path};

use anyhow::{Result, bail};
use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use tracing::debug;

use crate::core::{
    key::{ReferenceFormat, TranslationKey, TranslationReference},
    mutation::{CatalogMutation, LlmProvenance},
    reconcile::MissingTranslation,
};

pub const DEFAULT_CONTEXT_WINDOW_LINES: usize = 5;

/// One key to translate into one or more locales.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub key: TranslationKey,
    pub fallback: String,
    pub placeholders: Vec<String>,
    pub target_locales: Vec<String>,
    /// Source lines around the reference, or the NodeType block for YAML.
    pub context: Option<String>,
}

pub trait TranslationProvider {
    fn name(&self) -> &str;

    fn model(&self) -> Option<&str> {
        None
    }

    /// Returns one `locale -> text` map per request, in request order.
    fn translate(
        &self,
        requests: &[TranslationRequest],
        system_prompt: &str,
    ) -> Result<Vec<IndexMap<String, String>>>;
}

/// Build one request per key, collecting the locales it is missing in.
pub fn build_requests(
    missing: &[MissingTranslation],
    mutations: &[CatalogMutation],
    context_window_lines: usize,
) -> Vec<TranslationRequest> {
    let mut requests: IndexMap<&TranslationKey, TranslationRequest> = IndexMap::new();
    for (missing, mutation) in missing.iter().zip(mutations) {
        let request = requests.entry(&mutation.key).or_insert_with(|| TranslationRequest {
            key: mutation.key.clone(),
            fallback: mutation.fallback.clone(),
            placeholders: mutation.placeholders.keys().cloned().collect(),
            target_locales: Vec::new(),
            context: context_snippet(&missing.reference, context_window_lines),
        });
        if !request.target_locales.contains(&mutation.locale) {
            request.target_locales.push(mutation.locale.clone());
        }
    }
    requests.into_values().collect()
}

/// The YAML schema block, or the lines around the reference.
pub fn context_snippet(reference: &TranslationReference, window: usize) -> Option<String> {
    if reference.format == ReferenceFormat::Yaml && reference.schema_context.is_some() {
        return reference.schema_context.clone();
    }
    source_lines(&reference.file_path, reference.line, window)
}

fn source_lines(path: &Path, line: usize, window: usize) -> Option<String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %path.display(), "cannot read context: {}", e);
            return None;
        }
    };
    let lines: Vec<&str> = contents.lines().collect();
    if line == 0 || line > lines.len() {
        return None;
    }
    let start = line.saturating_sub(window + 1);
    let end = (line + window).min(lines.len());
    Some(lines[start..end].join("\n"))
}

/// Copy provider texts into the matching mutations' targets.
///
/// Mutations without a non-empty text for their locale are left alone.
/// Returns how many mutations were filled.
pub fn apply_translations(
    mutations: &mut [CatalogMutation],
    requests: &[TranslationRequest],
    responses: &[IndexMap<String, String>],
    provenance: &LlmProvenance,
) -> usize {
    let mut applied = 0;
    for (request, response) in requests.iter().zip(responses) {
        for mutation in mutations.iter_mut().filter(|m| m.key == request.key) {
            let Some(text) = response.get(&mutation.locale).map(|t| t.trim()) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            mutation.target = text.to_string();
            mutation.llm = Some(provenance.clone());
            applied += 1;
        }
    }
    applied
}

/// Ask `provider` for all pending mutations and apply the answers.
pub fn translate_mutations(
    provider: &dyn TranslationProvider,
    system_prompt: &str,
    missing: &[MissingTranslation],
    mutations: &mut [CatalogMutation],
    context_window_lines: usize,
) -> Result<usize> {
    let requests = build_requests(missing, mutations, context_window_lines);
    if requests.is_empty() {
        return Ok(0);
    }

    let responses = provider.translate(&requests, system_prompt)?;
    if responses.len() != requests.len() {
        bail!(
            "Translation provider '{}' returned {} results for {} requests",
            provider.name(),
            responses.len(),
            requests.len()
        );
    }

    let provenance = LlmProvenance {
        provider: Some(provider.name().to_string()),
        model: provider.model().map(str::to_string),
        generated_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)),
    };
    Ok(apply_translations(mutations, &requests, &responses, &provenance))
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::core::{llm::*, mutation::mutations_from_missing};

    struct Echo;

    impl TranslationProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> Option<&str> {
            Some("mirror-1")
        }

        fn translate(
            &self,
            requests: &[TranslationRequest],
            _system_prompt: &str,
        ) -> Result<Vec<IndexMap<String, String>>> {
            Ok(requests
                .iter()
                .map(|r| {
                    r.target_locales
                        .iter()
                        .filter(|l| *l != "fr")
                        .map(|l| (l.clone(), format!("[{}] {}", l, r.fallback)))
                        .collect()
                })
                .collect())
        }
    }

    fn missing(locale: &str, id: &str, file: PathBuf, line: usize) -> MissingTranslation {
        let key = TranslationKey::new("Acme.Site", "Main", id);
        let mut reference = TranslationReference::new(key.clone(), ReferenceFormat::Php, file, line);
        reference.fallback = Some(format!("Text {}", id));
        MissingTranslation {
            locale: locale.to_string(),
            key,
            reference,
        }
    }

    #[test]
    fn test_requests_group_locales_per_key() {
        let missing = vec![
            missing("de", "a", PathBuf::from("/nope.php"), 1),
            missing("fr", "a", PathBuf::from("/nope.php"), 1),
            missing("de", "b", PathBuf::from("/nope.php"), 1),
        ];
        let mutations = mutations_from_missing(&missing);

        let requests = build_requests(&missing, &mutations, DEFAULT_CONTEXT_WINDOW_LINES);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].target_locales, vec!["de", "fr"]);
        assert_eq!(requests[0].fallback, "Text a");
        assert_eq!(requests[0].context, None);
        assert_eq!(requests[1].target_locales, vec!["de"]);
    }

    #[test]
    fn test_context_snippet_uses_window() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Card.php");
        let source: Vec<String> = (1..=10).map(|n| format!("line {}", n)).collect();
        fs::write(&file, source.join("\n")).unwrap();

        let reference = missing("de", "a", file, 5).reference;
        assert_eq!(
            context_snippet(&reference, 1).as_deref(),
            Some("line 4\nline 5\nline 6")
        );
        assert_eq!(
            context_snippet(&reference, 10).map(|c| c.lines().count()),
            Some(10)
        );
    }

    #[test]
    fn test_context_snippet_prefers_schema() {
        let mut reference = missing("de", "a", PathBuf::from("/nope.yaml"), 1).reference;
        reference.format = ReferenceFormat::Yaml;
        reference.schema_context = Some("'Acme.Site:Card':\n  ui:\n    label: i18n".to_string());
        assert_eq!(
            context_snippet(&reference, 5),
            reference.schema_context.clone()
        );
    }

    #[test]
    fn test_translate_mutations_skips_empty_answers() {
        let missing = vec![
            missing("de", "a", PathBuf::from("/nope.php"), 1),
            missing("fr", "a", PathBuf::from("/nope.php"), 1),
        ];
        let mut mutations = mutations_from_missing(&missing);

        let applied = translate_mutations(&Echo, "", &missing, &mut mutations, 5).unwrap();

        assert_eq!(applied, 1);
        assert_eq!(mutations[0].target, "[de] Text a");
        let provenance = mutations[0].llm.as_ref().unwrap();
        assert_eq!(provenance.provider.as_deref(), Some("echo"));
        assert_eq!(provenance.model.as_deref(), Some("mirror-1"));
        assert!(provenance.generated_at.as_deref().unwrap().ends_with("+00:00"));

        assert_eq!(mutations[1].target, "Text a");
        assert!(!mutations[1].is_llm_generated());
    }

    #[test]
    fn test_apply_translations_ignores_blank_text() {
        let missing = vec![missing("de", "a", PathBuf::from("/nope.php"), 1)];
        let mut mutations = mutations_from_missing(&missing);
        let requests = build_requests(&missing, &mutations, 0);
        let responses = vec![IndexMap::from([("de".to_string(), "   ".to_string())])];

        let applied =
            apply_translations(&mut mutations, &requests, &responses, &LlmProvenance::default());
        assert_eq!(applied, 0);
        assert_eq!(mutations[0].llm, None);
    }
}
