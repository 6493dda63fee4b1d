//! PHP reference collector.
//!
//! Parses the file with tree-sitter and walks the tree looking for:
//!
//! - `I18n::translate($id, $fallback, $arguments, $source, $package)`
//! - `I18n::plural(...)`, same argument layout, marked plural
//! - `$translator->translateById($id, $arguments, $quantity, $locale, $source, $package)`
//!
//! The class may be written as `I18n`, `Neos\Flow\I18n` or with a leading
//! backslash. Only plain string literals count as identifier, fallback,
//! source or package.

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;
use tree_sitter::{Node, Parser};

use super::ReferenceCollector;
use crate::core::{
    file_scanner::has_extension,
    key::{ReferenceFormat, TranslationReference},
    resolve::resolve_key,
};

const I18N_CLASSES: &[&str] = &["I18n", "Neos\\Flow\\I18n"];

/// Argument positions of one recognized call shape.
struct CallShape {
    identifier: usize,
    fallback: Option<usize>,
    placeholders: usize,
    source: usize,
    package: usize,
    is_plural: bool,
}

const TRANSLATE: CallShape = CallShape {
    identifier: 0,
    fallback: Some(1),
    placeholders: 2,
    source: 3,
    package: 4,
    is_plural: false,
};

const PLURAL: CallShape = CallShape {
    is_plural: true,
    ..TRANSLATE
};

const TRANSLATE_BY_ID: CallShape = CallShape {
    identifier: 0,
    fallback: None,
    placeholders: 1,
    source: 4,
    package: 5,
    is_plural: false,
};

pub struct PhpCollector;

impl ReferenceCollector for PhpCollector {
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["php"])
    }

    fn collect_source(&self, path: &Path, source: &str) -> Vec<TranslationReference> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&tree_sitter_php::LANGUAGE_PHP.into()) {
            debug!("php grammar unavailable: {}", e);
            return Vec::new();
        }
        let Some(tree) = parser.parse(source, None) else {
            debug!(file = %path.display(), "php parser produced no tree");
            return Vec::new();
        };
        let root = tree.root_node();
        if root.has_error() {
            debug!(file = %path.display(), "skipping php file with syntax errors");
            return Vec::new();
        }

        let src = source.as_bytes();
        let mut references = Vec::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if let Some(shape) = call_shape(node, src)
                && let Some(reference) = build_reference(node, shape, src, path)
            {
                references.push(reference);
            }

            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        references
    }
}

fn call_shape(node: Node, src: &[u8]) -> Option<&'static CallShape> {
    match node.kind() {
        "scoped_call_expression" => {
            let scope = text(node.child_by_field_name("scope")?, src);
            let class = scope.trim_start_matches('\\');
            if !I18N_CLASSES.contains(&class) {
                return None;
            }
            let method = text(node.child_by_field_name("name")?, src);
            if method.eq_ignore_ascii_case("translate") {
                Some(&TRANSLATE)
            } else if method.eq_ignore_ascii_case("plural") {
                Some(&PLURAL)
            } else {
                None
            }
        }
        "member_call_expression" | "nullsafe_member_call_expression" => {
            let method = text(node.child_by_field_name("name")?, src);
            method
                .eq_ignore_ascii_case("translateById")
                .then_some(&TRANSLATE_BY_ID)
        }
        _ => None,
    }
}

fn build_reference(
    call: Node,
    shape: &CallShape,
    src: &[u8],
    path: &Path,
) -> Option<TranslationReference> {
    let arguments = call_arguments(call)?;
    let literal_at = |index: usize| arguments.get(index).and_then(|n| string_literal(*n, src));

    let identifier = literal_at(shape.identifier)?;
    let key = resolve_key(
        &identifier,
        literal_at(shape.package).as_deref(),
        literal_at(shape.source).as_deref(),
    )?;

    let mut reference = TranslationReference::new(
        key,
        ReferenceFormat::Php,
        path.to_path_buf(),
        call.start_position().row + 1,
    );
    reference.fallback = shape.fallback.and_then(literal_at);
    reference.placeholders = arguments
        .get(shape.placeholders)
        .map(|n| placeholder_map(*n, src))
        .unwrap_or_default();
    reference.is_plural = shape.is_plural;
    Some(reference)
}

/// Value expressions of the call's arguments, in positional order.
fn call_arguments(call: Node) -> Option<Vec<Node>> {
    let arguments = call.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let values = arguments
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "argument")
        .filter_map(|argument| {
            let count = argument.named_child_count();
            argument.named_child(count.checked_sub(1)?)
        })
        .collect();
    Some(values)
}

/// Keys given as string literals, mapped to the source text of their value.
fn placeholder_map(node: Node, src: &[u8]) -> IndexMap<String, String> {
    let mut placeholders = IndexMap::new();
    if node.kind() != "array_creation_expression" {
        return placeholders;
    }

    let mut cursor = node.walk();
    for element in node.named_children(&mut cursor) {
        if element.kind() != "array_element_initializer" || element.named_child_count() < 2 {
            continue;
        }
        let (Some(key_node), Some(value_node)) = (
            element.named_child(0),
            element.named_child(element.named_child_count() - 1),
        ) else {
            continue;
        };
        if let Some(name) = string_literal(key_node, src) {
            placeholders.insert(name, collapse_whitespace(text(value_node, src)));
        }
    }

    placeholders
}

/// Decoded value of a non-interpolated string literal.
fn string_literal(node: Node, src: &[u8]) -> Option<String> {
    let raw = text(node, src);
    match node.kind() {
        "string" => {
            let inner = strip_quotes(raw, '\'')?;
            Some(unescape_single_quoted(inner))
        }
        "encapsed_string" => {
            let mut cursor = node.walk();
            let interpolated = node
                .named_children(&mut cursor)
                .any(|c| {
                    !matches!(
                        c.kind(),
                        "string_content" | "string_value" | "escape_sequence"
                    )
                });
            if interpolated {
                return None;
            }
            let inner = strip_quotes(raw, '"')?;
            Some(unescape_double_quoted(inner))
        }
        _ => None,
    }
}

fn strip_quotes(raw: &str, quote: char) -> Option<&str> {
    let raw = raw.strip_prefix(['b', 'B']).unwrap_or(raw);
    raw.strip_prefix(quote)?.strip_suffix(quote)
}

fn unescape_single_quoted(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && (next == '\'' || next == '\\')
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

fn unescape_double_quoted(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let replacement = match chars.peek() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('v') => '\u{0b}',
            Some('e') => '\u{1b}',
            Some('f') => '\u{0c}',
            Some('\\') => '\\',
            Some('$') => '$',
            Some('"') => '"',
            _ => {
                out.push('\\');
                continue;
            }
        };
        out.push(replacement);
        chars.next();
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text<'a>(node: Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or_default()
}
