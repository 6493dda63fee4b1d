//! Fusion and AFX reference collector.
//!
//! Fusion has no grammar available here, so calls are found by scanning for
//! fixed tokens and reading balanced argument lists after them. Two call
//! families are recognized.
//!
//! Inline helpers take positional arguments
//! `(id, fallback, {placeholders}, source, package)`:
//!
//! ```text
//! ${I18n.translate('title', 'Title', {}, 'Main', 'Vendor.Site')}
//! ${I18n.plural('cards.count', null, {count: q(items).count()}, 'Cards', 'Vendor.Site')}
//! ```
//!
//! Fluent chains start with an identifier and configure it through method
//! calls:
//!
//! ```text
//! ${Translation.id('title').package('Vendor.Site').source('Main').value('Title')}
//! ```

use std::{collections::HashSet, path::Path};

use indexmap::IndexMap;

use super::{ReferenceCollector, line_at};
use crate::core::{
    file_scanner::has_extension,
    key::{ReferenceFormat, TranslationReference},
    resolve::resolve_key,
};

const INLINE_TOKENS: &[(&str, bool)] = &[("I18n.translate", false), ("I18n.plural", true)];

const FLUENT_TOKENS: &[(&str, bool)] = &[
    ("Translation.id", false),
    ("Translation.plural", true),
    ("I18n.id", false),
    ("I18n.plural", true),
];

pub struct FusionCollector;

impl ReferenceCollector for FusionCollector {
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["fusion", "afx"])
    }

    fn collect_source(&self, path: &Path, source: &str) -> Vec<TranslationReference> {
        let mut references = Vec::new();
        let mut consumed: HashSet<usize> = HashSet::new();

        for &(token, is_plural) in INLINE_TOKENS {
            collect_inline_calls(path, source, token, is_plural, &mut consumed, &mut references);
        }
        for &(token, is_plural) in FLUENT_TOKENS {
            collect_fluent_calls(path, source, token, is_plural, &consumed, &mut references);
        }

        references
    }
}

/// Raw pieces of a call before metadata resolution.
#[derive(Default)]
struct RawCall {
    identifier: Option<String>,
    fallback: Option<String>,
    placeholders: IndexMap<String, String>,
    source: Option<String>,
    package: Option<String>,
    is_plural: bool,
}

impl RawCall {
    fn into_reference(self, path: &Path, line: usize) -> Option<TranslationReference> {
        let identifier = self.identifier?;
        let key = resolve_key(&identifier, self.package.as_deref(), self.source.as_deref())?;
        let mut reference =
            TranslationReference::new(key, ReferenceFormat::Fusion, path.to_path_buf(), line);
        reference.fallback = self.fallback;
        reference.placeholders = self.placeholders;
        reference.is_plural = self.is_plural;
        Some(reference)
    }
}

fn collect_inline_calls(
    path: &Path,
    source: &str,
    token: &str,
    is_plural: bool,
    consumed: &mut HashSet<usize>,
    references: &mut Vec<TranslationReference>,
) {
    let mut offset = 0;
    while let Some(found) = source[offset..].find(token) {
        let position = offset + found;
        offset = position + token.len();

        if !at_word_start(source, position) {
            continue;
        }
        let Some(call) = extract_call(source, offset) else {
            continue;
        };
        consumed.insert(position);
        offset = call.end;

        let arguments = split_arguments(call.arguments);
        let argument = |index: usize| arguments.get(index).map(String::as_str);
        let raw = RawCall {
            identifier: argument(0).and_then(string_literal),
            fallback: argument(1).and_then(string_literal),
            placeholders: argument(2).map(placeholder_map).unwrap_or_default(),
            source: argument(3).and_then(string_literal),
            package: argument(4).and_then(string_literal),
            is_plural,
        };
        if let Some(reference) = raw.into_reference(path, line_at(source, position)) {
            references.push(reference);
        }
    }
}

fn collect_fluent_calls(
    path: &Path,
    source: &str,
    token: &str,
    is_plural: bool,
    consumed: &HashSet<usize>,
    references: &mut Vec<TranslationReference>,
) {
    let mut offset = 0;
    while let Some(found) = source[offset..].find(token) {
        let position = offset + found;
        let token_end = position + token.len();
        offset = token_end;

        if consumed.contains(&position) || !at_word_start(source, position) {
            continue;
        }
        let Some(root) = extract_call(source, token_end) else {
            continue;
        };

        let mut raw = RawCall {
            identifier: string_literal(root.arguments),
            is_plural,
            ..RawCall::default()
        };

        let mut cursor = root.end;
        loop {
            let dot = skip_whitespace(source, cursor);
            if source.as_bytes().get(dot) != Some(&b'.') {
                break;
            }
            let method = read_identifier(source, dot + 1);
            if method.is_empty() {
                break;
            }
            let Some(call) = extract_call(source, dot + 1 + method.len()) else {
                break;
            };
            match method {
                "package" => raw.package = string_literal(call.arguments),
                "source" => raw.source = string_literal(call.arguments),
                "arguments" => raw.placeholders = placeholder_map(call.arguments),
                "value" => raw.fallback = string_literal(call.arguments),
                "plural" => raw.is_plural = true,
                _ => {}
            }
            cursor = call.end;
        }

        if let Some(reference) = raw.into_reference(path, line_at(source, position)) {
            references.push(reference);
        }
        offset = cursor.max(token_end);
    }
}

/// A parenthesized argument list found in the source.
struct ExtractedCall<'a> {
    /// Text between the parentheses.
    arguments: &'a str,
    /// Byte offset just past the closing parenthesis.
    end: usize,
}

/// Read a balanced `( ... )` starting at `offset`, after optional whitespace.
///
/// Parentheses inside quoted strings are ignored.
fn extract_call(source: &str, offset: usize) -> Option<ExtractedCall<'_>> {
    let bytes = source.as_bytes();
    let open = skip_whitespace(source, offset);
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let start = open + 1;
    let mut depth = 1;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(ExtractedCall {
                        arguments: &source[start..i],
                        end: i + 1,
                    });
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Offset just past the quoted string starting at `offset`.
fn skip_quoted(bytes: &[u8], offset: usize) -> usize {
    let quote = bytes[offset];
    let mut i = offset + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_whitespace(source: &str, offset: usize) -> usize {
    let bytes = source.as_bytes();
    let mut i = offset;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Whether a token at `position` is not the tail of a longer identifier,
/// as in `MyI18n.translate`.
fn at_word_start(source: &str, position: usize) -> bool {
    match position.checked_sub(1).and_then(|i| source.as_bytes().get(i)) {
        Some(&b) => !(b.is_ascii_alphanumeric() || b == b'_'),
        None => true,
    }
}

fn read_identifier(source: &str, offset: usize) -> &str {
    let rest = source.get(offset..).unwrap_or_default();
    let len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    &rest[..len]
}

/// Split an argument list on top-level commas.
fn split_arguments(arguments: &str) -> Vec<String> {
    let bytes = arguments.as_bytes();
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(arguments[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    let tail = arguments.get(start..).unwrap_or_default().trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail.to_string());
    }
    parts
}

/// Unquoted value of `'...'` or `"..."`, with C-style escapes resolved.
fn string_literal(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    let quote = candidate.chars().next()?;
    if candidate.len() < 2 || !(quote == '\'' || quote == '"') || !candidate.ends_with(quote) {
        return None;
    }
    Some(strip_c_slashes(&candidate[1..candidate.len() - 1]))
}

/// Parse `{name: expr, other: expr}` into an ordered map.
///
/// Commas inside nested braces do not split pairs.
fn placeholder_map(argument: &str) -> IndexMap<String, String> {
    let mut placeholders = IndexMap::new();
    let argument = argument.trim();
    if !argument.starts_with('{') {
        return placeholders;
    }

    let body = argument.trim_matches(|c: char| c == '{' || c == '}' || c.is_whitespace());
    for pair in split_outside_braces(body) {
        let Some((name, value)) = pair.split_once(':') else {
            continue;
        };
        let name = name.trim_matches(|c: char| c.is_whitespace() || c == '\'' || c == '"');
        if name.is_empty() {
            continue;
        }
        placeholders.insert(name.to_string(), value.trim().to_string());
    }
    placeholders
}

fn split_outside_braces(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn strip_c_slashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            break;
        };
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'v' => out.push('\u{0b}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'x' => {
                let mut hex = String::new();
                while hex.len() < 2
                    && let Some(&h) = chars.peek()
                    && h.is_ascii_hexdigit()
                {
                    hex.push(h);
                    chars.next();
                }
                match u8::from_str_radix(&hex, 16) {
                    Ok(value) => out.push(char::from(value)),
                    Err(_) => out.push('x'),
                }
            }
            other => out.push(other),
        }
    }
    out
}
