//! Translation keys and source references.
//!
//! A [`TranslationKey`] identifies one translatable message across the
//! project (`package:source:identifier`). A [`TranslationReference`] is one
//! place in the source tree where such a key is used.

use std::{fmt, path::PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

/// Source name used when a reference or catalog does not name one.
pub const DEFAULT_SOURCE: &str = "Main";

/// Plural forms every plural reference is expected to provide.
pub const PLURAL_FORMS: [usize; 2] = [0, 1];

/// Fully qualified translation key.
///
/// Ordering is lexicographic on `(package, source, identifier)` so that
/// maps keyed by `TranslationKey` iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TranslationKey {
    pub package_key: String,
    pub source_name: String,
    pub identifier: String,
}

impl TranslationKey {
    pub fn new(
        package_key: impl Into<String>,
        source_name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            package_key: package_key.into(),
            source_name: source_name.into(),
            identifier: identifier.into(),
        }
    }

    /// Same package and source, different identifier.
    pub fn with_identifier(&self, identifier: impl Into<String>) -> Self {
        Self {
            package_key: self.package_key.clone(),
            source_name: self.source_name.clone(),
            identifier: identifier.into(),
        }
    }

    /// Key of the concrete plural form `<identifier>[<index>]`.
    pub fn plural_form(&self, index: usize) -> Self {
        self.with_identifier(plural_form_id(&self.identifier, index))
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.package_key, self.source_name, self.identifier
        )
    }
}

/// Builds the identifier of a plural form, e.g. `cards.count[1]`.
pub fn plural_form_id(base: &str, index: usize) -> String {
    format!("{}[{}]", base, index)
}

/// Splits `base[n]` into `("base", n)`.
///
/// Returns `None` for identifiers without a numeric form suffix.
pub fn split_plural_form(identifier: &str) -> Option<(&str, usize)> {
    let open = identifier.rfind('[')?;
    let inner = identifier[open + 1..].strip_suffix(']')?;
    if open == 0 || inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = inner.parse().ok()?;
    Some((&identifier[..open], index))
}

/// Source language a reference was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceFormat {
    Php,
    Fusion,
    Yaml,
}

impl fmt::Display for ReferenceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceFormat::Php => write!(f, "php"),
            ReferenceFormat::Fusion => write!(f, "fusion"),
            ReferenceFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// One occurrence of a translation key in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationReference {
    pub key: TranslationKey,
    pub format: ReferenceFormat,
    pub file_path: PathBuf,
    /// 1-based line of the call or label.
    pub line: usize,
    pub fallback: Option<String>,
    /// Placeholder name to the expression text passed for it.
    pub placeholders: IndexMap<String, String>,
    pub is_plural: bool,
    /// Verbatim YAML block of the enclosing NodeType, for schema labels.
    pub schema_context: Option<String>,
}

impl TranslationReference {
    pub fn new(key: TranslationKey, format: ReferenceFormat, file_path: PathBuf, line: usize) -> Self {
        Self {
            key,
            format,
            file_path,
            line,
            fallback: None,
            placeholders: IndexMap::new(),
            is_plural: false,
            schema_context: None,
        }
    }

    /// Fallback text if present and not blank.
    pub fn fallback_text(&self) -> Option<&str> {
        self.fallback.as_deref().filter(|f| !f.trim().is_empty())
    }
}
