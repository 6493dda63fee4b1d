//! NodeType YAML reference collector.
//!
//! Neos NodeType definitions mark translatable labels with `label: i18n`.
//! The translation identifier is derived from where the marker sits:
//!
//! ```yaml
//! 'Vendor.Site:Content.Card':
//!   ui:
//!     label: i18n                # ui.label
//!     inspector:
//!       groups:
//!         card:
//!           label: i18n          # groups.card
//!   properties:
//!     title:
//!       ui:
//!         label: i18n            # properties.title
//! ```
//!
//! The package is the part of the NodeType name before the `:`. The source
//! comes from the file location (`NodeTypes/Content/Card.yaml` gives
//! `NodeTypes.Content`) and defaults to `NodeTypes`.
//!
//! This is a line walker, not a YAML parser. Flow mappings, anchors and
//! multi-line scalars are not understood.

use std::{
    collections::HashMap,
    path::Path,
    sync::LazyLock,
};

use regex::Regex;

use super::ReferenceCollector;
use crate::core::{
    key::{ReferenceFormat, TranslationReference},
    resolve::resolve_key,
};

/// `key: value`, with single- or double-quoted keys. An unquoted key ends at
/// the first `:` followed by whitespace or the end of the line.
static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^("([^"]+)"|'([^']+)'|([^:]+(?::[^:\s]+)*)):(\s.*)?$"#).unwrap()
});

static NODE_TYPES_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(NodeTypes/.*?)/[^/]+\.ya?ml$").unwrap());

const DEFAULT_NODE_TYPES_SOURCE: &str = "NodeTypes";

pub struct YamlCollector;

impl ReferenceCollector for YamlCollector {
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml"))
    }

    fn collect_source(&self, path: &Path, source: &str) -> Vec<TranslationReference> {
        let lines: Vec<&str> = source.lines().collect();
        let contexts = node_type_contexts(&lines);
        let source_name = source_from_path(path);

        let mut references = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if is_skipped(trimmed) {
                continue;
            }

            let indent = count_indent(line);
            while stack.last().is_some_and(|f| f.indent >= indent) {
                stack.pop();
            }

            let Some((key, value)) = split_key_line(trimmed) else {
                continue;
            };

            if value.is_empty() {
                stack.push(Frame { key, indent });
                continue;
            }

            let normalized = value.trim_matches(|c| matches!(c, ' ' | '\t' | '"' | '\''));
            if key == "label" && normalized == "i18n" {
                let mut path_keys: Vec<&str> = stack.iter().map(|f| f.key.as_str()).collect();
                path_keys.push(&key);
                if let Some(reference) =
                    reference_from_path(&path_keys, path, &source_name, index + 1, &contexts)
                {
                    references.push(reference);
                }
            }

            while stack.last().is_some_and(|f| f.indent == indent) {
                stack.pop();
            }
        }

        references
    }
}

struct Frame {
    key: String,
    indent: usize,
}

fn is_skipped(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn count_indent(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Unquoted key and trimmed value of a `key: value` line.
fn split_key_line(trimmed: &str) -> Option<(String, String)> {
    let captures = KEY_LINE.captures(trimmed)?;
    let raw_key = captures.get(1)?.as_str();
    let value = captures.get(5).map_or("", |m| m.as_str()).trim();
    Some((normalize_key(raw_key), value.to_string()))
}

fn normalize_key(raw: &str) -> String {
    let key = raw.trim();
    let quoted = key.len() >= 2 && (key.starts_with('"') || key.starts_with('\''));
    if quoted {
        key[1..key.len() - 1].to_string()
    } else {
        key.to_string()
    }
}

fn reference_from_path(
    path_keys: &[&str],
    file_path: &Path,
    source_name: &str,
    line: usize,
    contexts: &HashMap<String, String>,
) -> Option<TranslationReference> {
    let (node_type, rest) = path_keys.split_first()?;
    let (package, _) = node_type.split_once(':')?;
    let identifier = derive_identifier(rest)?;
    let key = resolve_key(&identifier, Some(package), Some(source_name))?;

    let mut reference = TranslationReference::new(
        key,
        ReferenceFormat::Yaml,
        file_path.to_path_buf(),
        line,
    );
    reference.schema_context = contexts.get(*node_type).cloned();
    Some(reference)
}

/// Translation identifier for a label nested under `segments`.
fn derive_identifier(segments: &[&str]) -> Option<String> {
    let segments: Vec<&str> = segments.iter().copied().filter(|s| !s.is_empty()).collect();
    let identifier = match segments.as_slice() {
        [] => return None,
        ["properties", name, ..] => format!("properties.{}", name),
        ["ui", "inspector", "groups", name, ..] => format!("groups.{}", name),
        ["ui", "inspector", "tabs", name, ..] => format!("tabs.{}", name),
        ["ui", rest @ ..] => format!("ui.{}", rest.join(".")),
        ["groups", name, ..] => format!("groups.{}", name),
        all => all.join("."),
    };
    Some(identifier)
}

fn source_from_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    NODE_TYPES_DIR
        .captures(&normalized)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace('/', "."))
        .unwrap_or_else(|| DEFAULT_NODE_TYPES_SOURCE.to_string())
}

/// Verbatim block of every root-level NodeType, keyed by its name.
fn node_type_contexts(lines: &[&str]) -> HashMap<String, String> {
    let mut contexts = HashMap::new();
    let mut current: Option<(String, usize)> = None;

    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if is_skipped(trimmed) || count_indent(line) != 0 {
            continue;
        }
        let Some((name, _)) = split_key_line(trimmed) else {
            continue;
        };
        if let Some((previous, start)) = current.take() {
            contexts.insert(previous, lines[start..index].join("\n"));
        }
        current = Some((name, index));
    }

    if let Some((name, start)) = current {
        contexts.insert(name, lines[start..].join("\n"));
    }
    contexts
}
