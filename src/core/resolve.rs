//! Metadata resolution: turning a raw `(identifier, package, source)` triple
//! collected from source code into a canonical [`TranslationKey`].
//!
//! All three collectors pass what they extracted through [`resolve_key`], so
//! the shorthand `Package:Source:id` form and source-name normalization
//! behave identically for PHP, Fusion and YAML references.

use crate::core::key::{DEFAULT_SOURCE, TranslationKey};

/// Resolve a raw identifier and optional package/source into a key.
///
/// - The identifier is trimmed. An empty identifier yields `None`.
/// - `Package:Source:id` shorthand fills in the package and source when they
///   were not given explicitly.
/// - An empty package yields `None`. The reference is dropped silently.
/// - The source is normalized with [`normalize_source`].
pub fn resolve_key(
    identifier: &str,
    package: Option<&str>,
    source: Option<&str>,
) -> Option<TranslationKey> {
    let mut identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }

    let mut package = package.map(str::to_string);
    let mut source = source.map(str::to_string);

    if identifier.contains(':') {
        let parts: Vec<&str> = identifier.splitn(3, ':').collect();
        if let [shorthand_package, shorthand_source, id] = parts.as_slice() {
            if package.as_deref().is_none_or(str::is_empty) {
                package = Some(shorthand_package.to_string());
            }
            if source.as_deref().is_none_or(str::is_empty) {
                source = Some(shorthand_source.to_string());
            }
            identifier = id.trim();
        }
    }

    if identifier.is_empty() {
        return None;
    }

    let package = package.as_deref().map(str::trim).unwrap_or_default();
    if package.is_empty() {
        return None;
    }

    Some(TranslationKey::new(
        package,
        normalize_source(source.as_deref()),
        identifier,
    ))
}

/// Normalize a source name as written in code.
///
/// Anything after the first `:` is dropped, then path separators are folded
/// as in [`fold_source_path`].
pub fn normalize_source(source: Option<&str>) -> String {
    let Some(source) = source.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_SOURCE.to_string();
    };
    let head = source.split(':').next().unwrap_or_default();
    fold_source_path(head)
}

/// Fold `/` and `\` to `.` and trim surrounding dots.
///
/// `Forms/Contact` and `Forms\Contact` both become `Forms.Contact`.
/// Returns [`DEFAULT_SOURCE`] if nothing is left.
pub fn fold_source_path(path: &str) -> String {
    let folded = path.replace(['\\', '/'], ".");
    let trimmed = folded.trim_matches('.');
    if trimmed.is_empty() {
        DEFAULT_SOURCE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::core::resolve::*;

    #[test]
    fn test_resolve_plain_identifier() {
        let key = resolve_key("  hello  ", Some("Vendor.Site"), None).unwrap();
        assert_eq!(key, TranslationKey::new("Vendor.Site", "Main", "hello"));
    }

    #[test]
    fn test_resolve_empty_identifier() {
        assert_eq!(resolve_key("   ", Some("Vendor.Site"), None), None);
    }

    #[test]
    fn test_resolve_missing_package_is_dropped() {
        assert_eq!(resolve_key("hello", None, Some("Main")), None);
        assert_eq!(resolve_key("hello", Some("  "), Some("Main")), None);
    }

    #[test]
    fn test_resolve_shorthand_fills_package_and_source() {
        let key = resolve_key("Vendor.Site:Forms/Contact:label.name", None, None).unwrap();
        assert_eq!(
            key,
            TranslationKey::new("Vendor.Site", "Forms.Contact", "label.name")
        );
    }

    #[test]
    fn test_resolve_shorthand_keeps_explicit_values() {
        let key = resolve_key("Other.Pkg:Other:label", Some("Vendor.Site"), Some("Main")).unwrap();
        assert_eq!(key, TranslationKey::new("Vendor.Site", "Main", "label"));
    }

    #[test]
    fn test_resolve_two_part_identifier_is_verbatim() {
        let key = resolve_key("Vendor.Site:label", Some("Vendor.Site"), None).unwrap();
        assert_eq!(key.identifier, "Vendor.Site:label");
    }

    #[test]
    fn test_normalize_source() {
        assert_eq!(normalize_source(None), "Main");
        assert_eq!(normalize_source(Some("")), "Main");
        assert_eq!(normalize_source(Some("NodeTypes/Content")), "NodeTypes.Content");
        assert_eq!(normalize_source(Some("Forms\\Contact")), "Forms.Contact");
        assert_eq!(normalize_source(Some("Main:ignored")), "Main");
        assert_eq!(normalize_source(Some("/.")), "Main");
    }

    #[test]
    fn test_fold_source_path() {
        assert_eq!(fold_source_path("Presentation/Cards/"), "Presentation.Cards");
        assert_eq!(fold_source_path(""), "Main");
    }
}
