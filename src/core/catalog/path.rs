//! Catalog file locations.
//!
//! Catalogs live at
//! `<package>/Resources/Private/Translations/<locale>/<source path>.xlf`,
//! where the package directory sits under one of the known package roots.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use crate::core::resolve::fold_source_path;

static TRANSLATIONS_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/Resources/Private/Translations/([^/]+)/(.+)\.xlf$").unwrap()
});

static PACKAGE_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:DistributionPackages|Packages/(?:Application|Framework|Plugins|Sites))/([^/]+)/")
        .unwrap()
});

const PACKAGE_CANDIDATES: [&str; 3] = [
    "DistributionPackages",
    "Packages/Application",
    "Packages/Sites",
];

/// Locale, package and source of a catalog file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLocation {
    pub locale: String,
    pub package_key: String,
    pub source_name: String,
}

impl CatalogLocation {
    /// Infer the location from a catalog path.
    ///
    /// `package_override` replaces the package found in the path. Paths
    /// outside the translations directory, or without a recognizable
    /// package, give `None`.
    pub fn from_path(path: &Path, package_override: Option<&str>) -> Option<Self> {
        let normalized = path.to_string_lossy().replace('\\', "/");
        let captures = TRANSLATIONS_DIR.captures(&normalized)?;
        let locale = captures.get(1)?.as_str().to_string();
        let source_name = fold_source_path(captures.get(2)?.as_str());

        let package_key = match package_override {
            Some(package) => package.to_string(),
            None => PACKAGE_DIR
                .captures(&normalized)?
                .get(1)?
                .as_str()
                .to_string(),
        };

        Some(Self {
            locale,
            package_key,
            source_name,
        })
    }
}

pub fn is_catalog_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlf"))
}

/// Where a new catalog for `(package, locale, source)` should be created.
///
/// With configured paths the first one is taken as the package directory.
/// Otherwise the first existing package directory under the known roots is
/// used. Returns `None` when no candidate exists.
pub fn resolve_catalog_path(
    base_dir: &Path,
    paths: &[String],
    package_key: &str,
    locale: &str,
    source_name: &str,
) -> Option<PathBuf> {
    let relative = PathBuf::from("Resources/Private/Translations")
        .join(locale)
        .join(format!("{}.xlf", source_name.replace('.', "/")));

    if let Some(first) = paths.first() {
        return Some(base_dir.join(first).join(relative));
    }

    PACKAGE_CANDIDATES
        .iter()
        .map(|root| base_dir.join(root).join(package_key))
        .find(|dir| dir.is_dir())
        .map(|dir| dir.join(relative))
}
