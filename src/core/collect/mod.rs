//! Reference collection: finding translation-key references in source files.
//!
//! Each source language has its own collector. A file is handed to the first
//! collector whose [`ReferenceCollector::supports`] accepts it:
//!
//! - [`PhpCollector`]: `I18n::translate()`, `I18n::plural()` and
//!   `->translateById()` calls in `.php` files
//! - [`FusionCollector`]: `I18n.translate()` and fluent `Translation.id()`
//!   chains in `.fusion` and `.afx` files
//! - [`YamlCollector`]: `label: i18n` markers in NodeType `.yaml` files
//!
//! Collectors never fail. An unreadable or unparsable file yields no
//! references and a debug event.

pub mod fusion;
pub mod php;
pub mod yaml;

use std::{fs, path::Path, path::PathBuf};

use enum_dispatch::enum_dispatch;
use rayon::prelude::*;
use tracing::debug;

pub use fusion::FusionCollector;
pub use php::PhpCollector;
pub use yaml::YamlCollector;

use crate::core::key::TranslationReference;

#[enum_dispatch]
pub trait ReferenceCollector {
    /// Whether this collector handles the given file.
    fn supports(&self, path: &Path) -> bool;

    /// Extract references from already loaded file contents.
    fn collect_source(&self, path: &Path, source: &str) -> Vec<TranslationReference>;

    /// Read `path` and extract its references.
    fn collect(&self, path: &Path) -> Vec<TranslationReference> {
        match fs::read_to_string(path) {
            Ok(source) => self.collect_source(path, &source),
            Err(e) => {
                debug!(file = %path.display(), "skipping unreadable file: {}", e);
                Vec::new()
            }
        }
    }
}

#[enum_dispatch(ReferenceCollector)]
pub enum Collector {
    Php(PhpCollector),
    Fusion(FusionCollector),
    Yaml(YamlCollector),
}

/// The ordered set of collectors used for a scan.
pub struct Collectors {
    collectors: Vec<Collector>,
}

impl Default for Collectors {
    fn default() -> Self {
        Self {
            collectors: vec![
                Collector::from(PhpCollector),
                Collector::from(FusionCollector),
                Collector::from(YamlCollector),
            ],
        }
    }
}

impl Collectors {
    /// Whether any collector handles the file.
    pub fn supports(&self, path: &Path) -> bool {
        self.collectors.iter().any(|c| c.supports(path))
    }

    /// References from a single file, using the first supporting collector.
    pub fn collect_file(&self, path: &Path) -> Vec<TranslationReference> {
        self.collectors
            .iter()
            .find(|c| c.supports(path))
            .map(|c| c.collect(path))
            .unwrap_or_default()
    }

    /// References from all files, in file order then source order.
    ///
    /// Files are processed in parallel. The result order only depends on the
    /// order of `files`.
    pub fn collect_all(&self, files: &[PathBuf]) -> Vec<TranslationReference> {
        files
            .par_iter()
            .map(|path| self.collect_file(path))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }
}

/// 1-based line number of a byte offset.
pub(crate) fn line_at(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}
